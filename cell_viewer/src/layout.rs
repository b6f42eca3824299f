//! Screen regions of the explorer window, derived from the window size and
//! the layout preset, plus the control rectangles placed inside them.

use cell_model::charts::Rect;
use winit::dpi::PhysicalSize;

use crate::cli::LayoutPreset;

pub const PANEL_PADDING: f32 = 16.0;
pub const HEADER_HEIGHT: f32 = 56.0;
pub const DASHBOARD_HEIGHT: f32 = 280.0;
pub const INFO_PANEL_FRACTION: f32 = 0.32;
pub const FONT_SIZE: f32 = 16.0;

const INFO_PANEL_MIN_FRACTION: f32 = 0.2;
const INFO_PANEL_MAX_FRACTION: f32 = 0.5;
const DASHBOARD_MAX_SHARE: f32 = 0.4;
const NAV_BUTTON_WIDTH: f32 = 120.0;
const SCENE_BUTTON_WIDTH: f32 = 168.0;
const BUTTON_HEIGHT: f32 = 36.0;
const BUTTON_GAP: f32 = 8.0;
const SLIDER_WIDTH: f32 = 360.0;
const SLIDER_HEIGHT: f32 = 112.0;
const SLIDER_TRACK_TOP: f32 = 40.0;
const SLIDER_TRACK_HEIGHT: f32 = 8.0;
const CAPTION_WIDTH: f32 = 300.0;
const CAPTION_HEIGHT: f32 = 30.0;

/// Screen regions of the explorer window, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerLayout {
    pub window: Rect,
    pub header: Rect,
    pub scene: Rect,
    pub info_panel: Rect,
    pub dashboard: Rect,
    pub padding: f32,
    pub font_size: f32,
}

impl ViewerLayout {
    pub fn compute(window: PhysicalSize<u32>, preset: &LayoutPreset) -> Self {
        let width = window.width.max(1) as f32;
        let height = window.height.max(1) as f32;

        let padding = positive(preset.panel_padding).unwrap_or(PANEL_PADDING);
        let font_size = positive(preset.font_size).unwrap_or(FONT_SIZE);
        let header_height = positive(preset.header_height)
            .unwrap_or(HEADER_HEIGHT)
            .min(height * 0.25);
        let dashboard_height = positive(preset.dashboard_height)
            .unwrap_or(DASHBOARD_HEIGHT)
            .min(height * DASHBOARD_MAX_SHARE);
        let info_fraction = positive(preset.info_panel_fraction)
            .unwrap_or(INFO_PANEL_FRACTION)
            .clamp(INFO_PANEL_MIN_FRACTION, INFO_PANEL_MAX_FRACTION);

        let body_top = header_height;
        let body_height = (height - header_height - dashboard_height).max(1.0);
        let info_width = (width * info_fraction).max(1.0);
        let scene_width = (width - info_width).max(1.0);

        Self {
            window: Rect::new(0.0, 0.0, width, height),
            header: Rect::new(0.0, 0.0, width, header_height),
            info_panel: Rect::new(0.0, body_top, info_width, body_height),
            scene: Rect::new(info_width, body_top, scene_width, body_height),
            dashboard: Rect::new(0.0, body_top + body_height, width, dashboard_height),
            padding,
            font_size,
        }
    }

    pub fn scene_aspect(&self) -> f32 {
        self.scene.width.max(1.0) / self.scene.height.max(1.0)
    }

    /// Pointer position in scene-viewport normalized device coordinates, or
    /// `None` when the pointer is outside the scene.
    pub fn scene_ndc(&self, x: f32, y: f32) -> Option<[f32; 2]> {
        if !self.scene.contains(x, y) {
            return None;
        }
        let u = (x - self.scene.x) / self.scene.width.max(1.0);
        let v = (y - self.scene.y) / self.scene.height.max(1.0);
        Some([u * 2.0 - 1.0, 1.0 - v * 2.0])
    }

    /// Inverse of [`Self::scene_ndc`].
    pub fn scene_pixel(&self, ndc: [f32; 2]) -> [f32; 2] {
        [
            self.scene.x + (ndc[0] + 1.0) * 0.5 * self.scene.width,
            self.scene.y + (1.0 - ndc[1]) * 0.5 * self.scene.height,
        ]
    }

    /// Header navigation buttons, right-aligned: Overview then Technology.
    pub fn nav_buttons(&self) -> [Rect; 2] {
        let y = self.header.y + (self.header.height - BUTTON_HEIGHT).max(0.0) * 0.5;
        let technology_x = self.header.right() - self.padding - NAV_BUTTON_WIDTH;
        let overview_x = technology_x - BUTTON_GAP - NAV_BUTTON_WIDTH;
        [
            Rect::new(overview_x, y, NAV_BUTTON_WIDTH, BUTTON_HEIGHT),
            Rect::new(technology_x, y, NAV_BUTTON_WIDTH, BUTTON_HEIGHT),
        ]
    }

    pub fn exploded_toggle(&self) -> Rect {
        Rect::new(
            self.scene.right() - self.padding - SCENE_BUTTON_WIDTH,
            self.scene.y + self.padding,
            SCENE_BUTTON_WIDTH,
            BUTTON_HEIGHT,
        )
    }

    pub fn close_micro(&self) -> Rect {
        Rect::new(
            self.scene.x + self.padding,
            self.scene.y + self.padding,
            SCENE_BUTTON_WIDTH,
            BUTTON_HEIGHT,
        )
    }

    /// Panel buttons stacked upwards from the bottom of the info panel, in
    /// the order the panel lists them.
    pub fn panel_buttons(&self, count: usize) -> Vec<Rect> {
        let inner = self.info_panel.inset(self.padding);
        let stride = BUTTON_HEIGHT + BUTTON_GAP;
        let top = inner.bottom() - count as f32 * stride + BUTTON_GAP;
        (0..count)
            .map(|index| Rect::new(inner.x, top + index as f32 * stride, inner.width, BUTTON_HEIGHT))
            .collect()
    }

    /// Scene caption pill, centred along the bottom of the scene.
    pub fn caption(&self) -> Rect {
        let width = CAPTION_WIDTH.min(self.scene.width - self.padding * 2.0).max(1.0);
        Rect::new(
            self.scene.x + (self.scene.width - width) * 0.5,
            self.scene.bottom() - self.padding - CAPTION_HEIGHT,
            width,
            CAPTION_HEIGHT,
        )
    }

    /// Frame around the infusion slider: title, track, end labels and
    /// status line. Sits just above the caption.
    pub fn slider(&self) -> Rect {
        let width = SLIDER_WIDTH.min(self.scene.width - self.padding * 2.0).max(1.0);
        Rect::new(
            self.scene.x + (self.scene.width - width) * 0.5,
            self.caption().y - self.padding * 0.5 - SLIDER_HEIGHT,
            width,
            SLIDER_HEIGHT,
        )
    }

    pub fn slider_track(&self) -> Rect {
        let frame = self.slider();
        Rect::new(
            frame.x + self.padding,
            frame.y + SLIDER_TRACK_TOP,
            (frame.width - self.padding * 2.0).max(1.0),
            SLIDER_TRACK_HEIGHT,
        )
    }

    /// Infusion value under a pointer x position, clamped to the track.
    pub fn slider_value(&self, x: f32) -> f32 {
        let track = self.slider_track();
        ((x - track.x) / track.width.max(1.0)).clamp(0.0, 1.0)
    }
}

fn positive(value: Option<f32>) -> Option<f32> {
    value.filter(|value| value.is_finite() && *value > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> ViewerLayout {
        ViewerLayout::compute(PhysicalSize::new(1280, 800), &LayoutPreset::default())
    }

    #[test]
    fn regions_tile_the_window() {
        let layout = layout();
        assert_eq!(layout.header.bottom(), layout.scene.y);
        assert_eq!(layout.info_panel.right(), layout.scene.x);
        assert_eq!(layout.scene.right(), 1280.0);
        assert_eq!(layout.dashboard.bottom(), 800.0);
        assert_eq!(layout.scene.bottom(), layout.dashboard.y);
    }

    #[test]
    fn preset_overrides_and_clamps() {
        let preset = LayoutPreset {
            info_panel_fraction: Some(0.9),
            dashboard_height: Some(2000.0),
            font_size: Some(-3.0),
            ..LayoutPreset::default()
        };
        let layout = ViewerLayout::compute(PhysicalSize::new(1000, 1000), &preset);
        assert_eq!(layout.info_panel.width, 500.0);
        assert_eq!(layout.dashboard.height, 400.0);
        assert_eq!(layout.font_size, FONT_SIZE);
    }

    #[test]
    fn scene_ndc_round_trips_corners() {
        let layout = layout();
        let center = [
            layout.scene.x + layout.scene.width * 0.5,
            layout.scene.y + layout.scene.height * 0.5,
        ];
        let ndc = layout.scene_ndc(center[0], center[1]).expect("inside scene");
        assert!(ndc[0].abs() < 1e-5 && ndc[1].abs() < 1e-5);
        let top_left = layout.scene_pixel([-1.0, 1.0]);
        assert_eq!(top_left, [layout.scene.x, layout.scene.y]);
        assert!(layout.scene_ndc(layout.info_panel.x + 1.0, center[1]).is_none());
    }

    #[test]
    fn panel_buttons_stay_inside_the_panel() {
        let layout = layout();
        let buttons = layout.panel_buttons(2);
        assert_eq!(buttons.len(), 2);
        for button in &buttons {
            assert!(button.y >= layout.info_panel.y);
            assert!(button.bottom() <= layout.info_panel.bottom());
        }
        assert!(buttons[0].bottom() < buttons[1].y);
    }

    #[test]
    fn slider_value_clamps_to_track() {
        let layout = layout();
        let track = layout.slider_track();
        assert_eq!(layout.slider_value(track.x - 50.0), 0.0);
        assert_eq!(layout.slider_value(track.right() + 50.0), 1.0);
        let mid = layout.slider_value(track.x + track.width * 0.25);
        assert!((mid - 0.25).abs() < 1e-5);
    }
}
