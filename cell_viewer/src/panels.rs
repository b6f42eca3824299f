//! Draws the 2D parts of the explorer (header, info panel, scene HUD and
//! dashboard) into a [`Canvas`]. Everything here is a pure function of the
//! session's derived views and the window layout.

use cell_model::charts::{self, ChartSpec, FeatureCard, Orientation, Rect, KEY_METRICS};
use cell_model::info_panel::{LayerSummary, MicroText};
use cell_model::micro::cathode::{SLIDER_MAX_LABEL, SLIDER_MIN_LABEL, SLIDER_TITLE};
use cell_model::scene::LabelAlign;
use cell_model::{
    InfoContent, MicroFrame, PanelAction, Rgb, SceneContent, SceneFrame, Session, ViewMode,
};
use glam::Vec3;

use crate::canvas::{Canvas, rgba};
use crate::controls::{Control, VisibleControls};
use crate::layout::ViewerLayout;
use crate::text::Typeface;

pub const BRAND_TITLE: &str = "Johnson Energy Storage";
pub const BRAND_SUBTITLE: &str = "GLASS BATTERY TECH";
pub const BENCHMARK_TITLE: &str = "Performance Benchmarks";
pub const BENCHMARK_SUBTITLE: &str = "Johnson Energy Storage vs. Conventional Li-Ion (2021 Baseline)";
pub const EXPLODED_TOGGLE_LABEL: &str = "Exploded View";

const WHITE: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];
const SLATE_50: [u8; 4] = [0xF8, 0xFA, 0xFC, 0xFF];
const SLATE_100: [u8; 4] = [0xF1, 0xF5, 0xF9, 0xFF];
const SLATE_200: [u8; 4] = [0xE2, 0xE8, 0xF0, 0xFF];
const SLATE_300: [u8; 4] = [0xCB, 0xD5, 0xE1, 0xFF];
const SLATE_400: [u8; 4] = [0x94, 0xA3, 0xB8, 0xFF];
const SLATE_500: [u8; 4] = [0x64, 0x74, 0x8B, 0xFF];
const SLATE_600: [u8; 4] = [0x47, 0x55, 0x69, 0xFF];
const SLATE_800: [u8; 4] = [0x1E, 0x29, 0x3B, 0xFF];
const SLATE_900: [u8; 4] = [0x0F, 0x17, 0x2A, 0xFF];
const BLUE_50: [u8; 4] = [0xEF, 0xF6, 0xFF, 0xFF];
const BLUE_200: [u8; 4] = [0xBF, 0xDB, 0xFE, 0xFF];
const BLUE_600: [u8; 4] = [0x25, 0x63, 0xEB, 0xFF];
const GREEN_100: [u8; 4] = [0xDC, 0xFC, 0xE7, 0xFF];
const GREEN_600: [u8; 4] = [0x16, 0xA3, 0x4A, 0xFF];
const HUD_BACKDROP: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xE6];
const CARD_TILE_DARK: [u8; 4] = [0xFF, 0xFF, 0xFF, 0x0D];
const CARD_DIVIDER_DARK: [u8; 4] = [0xFF, 0xFF, 0xFF, 0x1A];

/// A scene label projected into window pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenLabel {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub color: [u8; 4],
    pub align: LabelAlign,
}

/// Everything the 2D pass needs for one frame.
pub struct UiView<'a> {
    pub mode: ViewMode,
    pub info: &'a InfoContent,
    pub controls: &'a VisibleControls,
    pub hovered_control: Option<Control>,
    pub caption: &'static str,
    pub labels: Vec<ScreenLabel>,
    pub cathode_status: Option<&'static str>,
}

impl<'a> UiView<'a> {
    pub fn new(
        session: &Session,
        frame: &SceneFrame,
        info: &'a InfoContent,
        controls: &'a VisibleControls,
        layout: &ViewerLayout,
        hovered_control: Option<Control>,
    ) -> Self {
        let cathode_status = match &frame.content {
            SceneContent::Micro(MicroFrame::Cathode(cathode)) => Some(cathode.status),
            _ => None,
        };
        Self {
            mode: session.state().mode,
            info,
            controls,
            hovered_control,
            caption: frame.caption,
            labels: scene_labels(session, frame, layout),
            cathode_status,
        }
    }
}

/// Project the frame's world-space labels through the orbit camera. Labels
/// behind the camera or outside the scene are dropped.
pub fn scene_labels(session: &Session, frame: &SceneFrame, layout: &ViewerLayout) -> Vec<ScreenLabel> {
    let aspect = layout.scene_aspect();
    frame
        .labels
        .iter()
        .filter(|label| label.opacity > 0.0)
        .filter_map(|label| {
            let ndc = session
                .orbit()
                .project(Vec3::from_array(label.position), aspect)?;
            if ndc[0].abs() > 1.0 || ndc[1].abs() > 1.0 {
                return None;
            }
            let [x, y] = layout.scene_pixel(ndc);
            Some(ScreenLabel {
                text: label.text.clone(),
                x,
                y,
                color: rgba(label.color, label.opacity),
                align: label.align,
            })
        })
        .collect()
}

/// Canvas, font and base text size bundled for the draw helpers. Text calls
/// are skipped when no font is installed but still advance the layout.
pub struct Painter<'a> {
    canvas: &'a mut Canvas,
    font: Option<Typeface>,
    base_size: f32,
}

impl<'a> Painter<'a> {
    pub fn new(canvas: &'a mut Canvas, font: Option<Typeface>, base_size: f32) -> Self {
        Self {
            canvas,
            font,
            base_size,
        }
    }

    fn size(&self, scale: f32) -> f32 {
        (self.base_size * scale).max(6.0)
    }

    fn line(&self, scale: f32) -> f32 {
        let size = self.size(scale);
        match self.font {
            Some(font) => font.line_height(size),
            None => (size * 1.25).ceil(),
        }
    }

    fn measure(&self, text: &str, scale: f32) -> f32 {
        let size = self.size(scale);
        match self.font {
            Some(font) => font.measure(text, size),
            None => text.chars().count() as f32 * size * 0.5,
        }
    }

    fn text(&mut self, x: f32, y: f32, text: &str, scale: f32, color: [u8; 4]) -> f32 {
        let size = self.size(scale);
        if let Some(font) = self.font {
            font.draw(self.canvas, x, y, text, size, color);
        }
        y + self.line(scale)
    }

    fn text_centered(&mut self, rect: Rect, text: &str, scale: f32, color: [u8; 4]) {
        let x = rect.x + (rect.width - self.measure(text, scale)).max(0.0) * 0.5;
        let y = rect.y + (rect.height - self.line(scale)).max(0.0) * 0.5;
        self.text(x, y, text, scale, color);
    }

    fn wrapped(&mut self, x: f32, y: f32, width: f32, text: &str, scale: f32, color: [u8; 4]) -> f32 {
        let size = self.size(scale);
        match self.font {
            Some(font) => font.draw_wrapped(self.canvas, x, y, width, text, size, color),
            None => {
                let per_line = (width / (size * 0.5)).max(1.0);
                let lines = (text.chars().count() as f32 / per_line).ceil().max(1.0);
                y + lines * self.line(scale)
            }
        }
    }

    fn fill(&mut self, rect: Rect, color: [u8; 4]) {
        self.canvas.fill_rect(rect, color);
    }

    fn stroke(&mut self, rect: Rect, color: [u8; 4]) {
        self.canvas.stroke_rect(rect, 1.0, color);
    }

    fn button(&mut self, rect: Rect, label: &str, fill: [u8; 4], text: [u8; 4], hovered: bool) {
        self.fill(rect, fill);
        self.stroke(rect, if hovered { BLUE_600 } else { SLATE_200 });
        self.text_centered(rect, label, 0.9, text);
    }
}

/// Draw the whole 2D layer. The scene region stays transparent apart from
/// its HUD so the 3D pass shows through.
pub fn draw_frame(painter: &mut Painter<'_>, layout: &ViewerLayout, view: &UiView<'_>) {
    painter.canvas.clear(TRANSPARENT);
    draw_header(painter, layout, view);
    draw_info_panel(painter, layout, view);
    draw_scene_hud(painter, layout, view);
    draw_dashboard(painter, layout.dashboard, layout.padding);
}

fn draw_header(painter: &mut Painter<'_>, layout: &ViewerLayout, view: &UiView<'_>) {
    let header = layout.header;
    painter.fill(header, WHITE);
    painter.fill(Rect::new(header.x, header.bottom() - 1.0, header.width, 1.0), SLATE_200);

    let badge = Rect::new(
        header.x + layout.padding,
        header.y + (header.height - 32.0).max(0.0) * 0.5,
        32.0,
        32.0,
    );
    painter.fill(badge, BLUE_600);
    painter.text_centered(badge, "\u{26A1}", 1.0, WHITE);
    let text_x = badge.right() + 12.0;
    let next = painter.text(text_x, badge.y - 2.0, BRAND_TITLE, 1.1, SLATE_900);
    painter.text(text_x, next - 4.0, BRAND_SUBTITLE, 0.6, SLATE_400);

    let [overview, technology] = layout.nav_buttons();
    let track = Rect::new(
        overview.x - 4.0,
        overview.y - 4.0,
        technology.right() - overview.x + 8.0,
        overview.height + 8.0,
    );
    painter.fill(track, SLATE_100);
    let overview_active = view.mode == ViewMode::Intro;
    for (rect, label, active) in [
        (overview, "Overview", overview_active),
        (technology, "Technology", !overview_active),
    ] {
        if active {
            painter.fill(rect, WHITE);
        }
        painter.text_centered(rect, label, 0.9, if active { BLUE_600 } else { SLATE_500 });
    }
}

fn draw_info_panel(painter: &mut Painter<'_>, layout: &ViewerLayout, view: &UiView<'_>) {
    let panel = layout.info_panel;
    painter.fill(panel, SLATE_50);
    let inner = panel.inset(layout.padding * 1.5);
    let x = inner.x;
    let width = inner.width;
    let mut y = inner.y;

    match view.info {
        InfoContent::Intro {
            badge,
            title,
            subtitle,
            body,
            ..
        } => {
            let badge_width = painter.measure(badge, 0.7) + 24.0;
            let badge_rect = Rect::new(x, y, badge_width, painter.line(0.7) + 8.0);
            painter.fill(badge_rect, BLUE_50);
            painter.stroke(badge_rect, BLUE_200);
            painter.text_centered(badge_rect, &badge.to_uppercase(), 0.7, BLUE_600);
            y = badge_rect.bottom() + 20.0;
            y = painter.wrapped(x, y, width, title, 2.4, SLATE_900);
            y = painter.wrapped(x, y, width, subtitle, 2.4, BLUE_600);
            y += 16.0;
            painter.wrapped(x, y, width, body, 1.1, SLATE_600);
        }
        InfoContent::LayerDetail {
            layer,
            specs_heading,
            ..
        } => {
            // The micro teaser is drawn on the "View R&D Detail" button.
            if let Some(layer) = layer {
                y = draw_layer_summary(painter, x, y, width, layer);
                let specs = Rect::new(x, y + 12.0, width, 0.0);
                let mut cursor = specs.y + 16.0;
                cursor = painter.text(x + 16.0, cursor, specs_heading, 1.0, SLATE_800) + 6.0;
                for detail in &layer.details {
                    painter.fill(Rect::new(x + 18.0, cursor + 8.0, 5.0, 5.0), SLATE_300);
                    cursor = painter.wrapped(x + 32.0, cursor, width - 48.0, detail, 0.85, SLATE_600) + 4.0;
                }
                let card = Rect::new(x, specs.y, width, cursor - specs.y + 10.0);
                painter.stroke(card, SLATE_200);
            }
        }
        InfoContent::MicroDetail { text, .. } => {
            if let Some(text) = text {
                draw_micro_text(painter, x, y, width, text);
            }
        }
    }

    draw_panel_buttons(painter, layout, view);
}

fn draw_layer_summary(painter: &mut Painter<'_>, x: f32, y: f32, width: f32, layer: &LayerSummary) -> f32 {
    let mut y = painter.wrapped(x, y, width, &layer.name, 1.9, SLATE_900) + 8.0;
    painter.fill(Rect::new(x, y, 48.0, 4.0), rgba(layer.color, 1.0));
    y += 20.0;
    painter.wrapped(x, y, width, &layer.description, 1.0, SLATE_600)
}

fn draw_micro_text(painter: &mut Painter<'_>, x: f32, y: f32, width: f32, text: &MicroText) -> f32 {
    let mut y = painter.wrapped(x, y, width, text.title, 1.9, SLATE_900) + 8.0;
    let accent = rgba(text.accent, 1.0);
    painter.fill(Rect::new(x, y, 48.0, 4.0), accent);
    y += 20.0;
    y = painter.wrapped(x, y, width, text.summary, 1.0, SLATE_600) + 16.0;

    let card_top = y;
    let tint = rgba(text.accent, 0.08);
    y = painter.text(x + 16.0, y + 14.0, text.section_title, 1.0, accent) + 4.0;
    y = painter.wrapped(x + 16.0, y, width - 32.0, text.section_text, 0.85, SLATE_600) + 8.0;
    for entry in &text.legend {
        painter.fill(Rect::new(x + 16.0, y + 6.0, 8.0, 8.0), rgba(entry.swatch, 1.0));
        y = painter.text(x + 32.0, y, entry.text, 0.85, SLATE_600) + 2.0;
    }
    let highlight = Rect::new(x + 16.0, y + 6.0, width - 32.0, painter.line(0.9) + 16.0);
    let card = Rect::new(x, card_top, width, highlight.bottom() + 14.0 - card_top);
    painter.fill(card, tint);
    painter.stroke(card, rgba(text.accent, 0.25));
    painter.fill(highlight, WHITE);
    painter.text(highlight.x + 12.0, highlight.y + 8.0, &format!("\u{2192} {}", text.highlight), 0.9, accent);
    card.bottom()
}

fn draw_panel_buttons(painter: &mut Painter<'_>, layout: &ViewerLayout, view: &UiView<'_>) {
    let actions = &view.controls.panel_actions;
    let rects = layout.panel_buttons(actions.len());
    let teaser = match view.info {
        InfoContent::LayerDetail { micro_teaser, .. } => *micro_teaser,
        _ => None,
    };
    for (action, rect) in actions.iter().zip(rects) {
        let hovered = view.hovered_control == Some(Control::Panel(*action));
        let (fill, text) = match action {
            PanelAction::AnalyzeStructure => (SLATE_900, WHITE),
            PanelAction::ViewMicroDetail => (WHITE, SLATE_800),
            PanelAction::BackToStack | PanelAction::CloseMicro => (SLATE_100, SLATE_600),
        };
        let label = match (action, teaser) {
            (PanelAction::ViewMicroDetail, Some(teaser)) => format!("{} \u{b7} {teaser}", action.label()),
            _ => action.label().to_string(),
        };
        painter.button(rect, &label, fill, text, hovered);
    }
}

fn draw_scene_hud(painter: &mut Painter<'_>, layout: &ViewerLayout, view: &UiView<'_>) {
    for label in &view.labels {
        let width = painter.measure(&label.text, 0.8);
        let line = painter.line(0.8);
        let x = match label.align {
            LabelAlign::Left => label.x + 6.0,
            LabelAlign::Right => label.x - width - 6.0,
        };
        let backdrop = Rect::new(x - 6.0, label.y - line * 0.5 - 3.0, width + 12.0, line + 6.0);
        painter.fill(backdrop, [0xFF, 0xFF, 0xFF, label.color[3] / 2]);
        painter.text(x, label.y - line * 0.5, &label.text, 0.8, label.color);
    }

    if view.controls.in_micro {
        let rect = layout.close_micro();
        let hovered = view.hovered_control == Some(Control::CloseMicro);
        painter.button(rect, "\u{2715} Close", HUD_BACKDROP, SLATE_600, hovered);
    } else {
        let rect = layout.exploded_toggle();
        let hovered = view.hovered_control == Some(Control::ToggleExploded);
        let (fill, text) = if view.mode == ViewMode::Exploded {
            (BLUE_50, BLUE_600)
        } else {
            (HUD_BACKDROP, SLATE_600)
        };
        painter.button(rect, EXPLODED_TOGGLE_LABEL, fill, text, hovered);
    }

    if let Some(infusion) = view.controls.infusion {
        draw_slider(painter, layout, infusion, view.cathode_status);
    }

    let caption = layout.caption();
    painter.fill(caption, HUD_BACKDROP);
    painter.text_centered(caption, &view.caption.to_uppercase(), 0.7, SLATE_600);
}

fn draw_slider(painter: &mut Painter<'_>, layout: &ViewerLayout, infusion: f32, status: Option<&str>) {
    let frame = layout.slider();
    painter.fill(frame, HUD_BACKDROP);
    painter.stroke(frame, BLUE_200);
    let title = Rect::new(frame.x, frame.y + 8.0, frame.width, painter.line(0.85));
    painter.text_centered(title, SLIDER_TITLE, 0.85, SLATE_800);

    let track = layout.slider_track();
    painter.fill(track, SLATE_200);
    let filled = Rect::new(track.x, track.y, track.width * infusion.clamp(0.0, 1.0), track.height);
    painter.fill(filled, BLUE_600);
    let knob_x = track.x + track.width * infusion.clamp(0.0, 1.0);
    painter.fill(Rect::new(knob_x - 6.0, track.y - 5.0, 12.0, track.height + 10.0), BLUE_600);

    let labels_y = track.bottom() + 8.0;
    painter.text(track.x, labels_y, SLIDER_MIN_LABEL, 0.7, SLATE_500);
    let max_width = painter.measure(SLIDER_MAX_LABEL, 0.7);
    let next = painter.text(track.right() - max_width, labels_y, SLIDER_MAX_LABEL, 0.7, SLATE_500);
    if let Some(status) = status {
        let line = Rect::new(frame.x, next + 2.0, frame.width, painter.line(0.75));
        painter.text_centered(line, status, 0.75, BLUE_600);
    }
}

/// Where each dashboard block sits inside the padded dashboard area.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DashboardRegions {
    metrics: Rect,
    features: [Rect; 2],
    charts: Rect,
    footer: Rect,
}

const METRICS_SHARE: f32 = 0.3;
const FEATURES_SHARE: f32 = 0.26;
/// The footer never takes more than this share of the dashboard height.
const FOOTER_MAX_SHARE: f32 = 0.3;

fn dashboard_regions(inner: Rect, padding: f32, footer_height: f32) -> DashboardRegions {
    let footer_height = footer_height.clamp(0.0, inner.height * FOOTER_MAX_SHARE);
    let footer = Rect::new(
        inner.x,
        inner.bottom() - footer_height,
        inner.width,
        footer_height,
    );
    let body_height = (inner.height - footer_height - padding).max(0.0);

    let metrics_width = inner.width * METRICS_SHARE;
    let features_width = inner.width * FEATURES_SHARE;
    let metrics = Rect::new(inner.x, inner.y, (metrics_width - padding).max(0.0), body_height);

    let features_x = inner.x + metrics_width;
    let card_height = ((body_height - padding) * 0.5).max(0.0);
    let features = [
        Rect::new(features_x, inner.y, (features_width - padding).max(0.0), card_height),
        Rect::new(
            features_x,
            inner.y + card_height + padding,
            (features_width - padding).max(0.0),
            card_height,
        ),
    ];

    let charts_x = features_x + features_width;
    let charts = Rect::new(charts_x, inner.y, (inner.right() - charts_x).max(0.0), body_height);

    DashboardRegions {
        metrics,
        features,
        charts,
        footer,
    }
}

/// Key metrics, the manufacturing and material cards, the two benchmark
/// charts and the source footer. Also used for the PNG export.
pub fn draw_dashboard(painter: &mut Painter<'_>, area: Rect, padding: f32) {
    painter.fill(area, SLATE_50);
    painter.fill(Rect::new(area.x, area.y, area.width, 1.0), SLATE_200);
    let inner = area.inset(padding);
    if inner.width <= 0.0 || inner.height <= 0.0 {
        return;
    }

    let footer_height = painter.line(0.8) + painter.line(0.6) + 12.0;
    let regions = dashboard_regions(inner, padding, footer_height);

    draw_key_metrics(painter, regions.metrics, padding);
    for (card, rect) in charts::FEATURE_CARDS.iter().zip(regions.features) {
        draw_feature_card(painter, card, rect);
    }

    let chart_w = (regions.charts.width - padding).max(0.0) * 0.5;
    for (index, chart) in charts::CHARTS.iter().enumerate() {
        let card = Rect::new(
            regions.charts.x + index as f32 * (chart_w + padding),
            regions.charts.y,
            chart_w,
            regions.charts.height,
        );
        draw_chart(painter, chart, card);
    }

    draw_footer(painter, regions.footer);
}

fn draw_key_metrics(painter: &mut Painter<'_>, area: Rect, padding: f32) {
    let mut y = painter.text(area.x, area.y, BENCHMARK_TITLE, 1.3, SLATE_900);
    y = painter.wrapped(area.x, y, area.width, BENCHMARK_SUBTITLE, 0.75, SLATE_500) + 8.0;

    let grid = Rect::new(area.x, y, area.width, (area.bottom() - y).max(0.0));
    let cell_w = ((grid.width - padding) * 0.5).max(0.0);
    let cell_h = ((grid.height - padding) * 0.5).max(0.0);
    for (index, metric) in KEY_METRICS.iter().enumerate() {
        let column = (index % 2) as f32;
        let row = (index / 2) as f32;
        let card = Rect::new(
            grid.x + column * (cell_w + padding),
            grid.y + row * (cell_h + padding),
            cell_w,
            cell_h,
        );
        painter.fill(card, WHITE);
        painter.stroke(card, SLATE_100);
        let mut cy = painter.text(card.x + 10.0, card.y + 6.0, metric.label, 0.75, SLATE_500);
        let value_end = card.x + 10.0 + painter.measure(metric.value, 1.4);
        let after = painter.text(card.x + 10.0, cy, metric.value, 1.4, SLATE_900);
        if let Some(unit) = metric.unit {
            painter.text(value_end + 4.0, cy + painter.line(1.4) - painter.line(0.7) - 2.0, unit, 0.7, SLATE_400);
        }
        cy = after;
        painter.text(card.x + 10.0, cy, metric.description, 0.65, SLATE_400);
    }
}

fn draw_feature_card(painter: &mut Painter<'_>, card: &FeatureCard, rect: Rect) {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return;
    }
    let (background, title_color) = if card.dark {
        (SLATE_900, WHITE)
    } else {
        (WHITE, SLATE_900)
    };
    painter.fill(rect, background);
    if !card.dark {
        painter.stroke(rect, SLATE_100);
    }
    let inner = rect.inset(10.0);
    let mut y = painter.text(inner.x, inner.y, card.title, 1.0, title_color);
    if let Some(subtitle) = card.subtitle {
        y = painter.text(inner.x, y, subtitle, 0.7, SLATE_500);
    }
    y += 4.0;

    let note_height = match card.note {
        Some(_) => painter.line(0.65) * 2.0 + 6.0,
        None => 0.0,
    };
    let items_bottom = (inner.bottom() - note_height).max(y);

    if card.dark {
        let count = card.items.len().max(1) as f32;
        let tile_w = ((inner.width - 8.0 * (count - 1.0)) / count).max(0.0);
        for (index, item) in card.items.iter().enumerate() {
            let tile = Rect::new(
                inner.x + index as f32 * (tile_w + 8.0),
                y,
                tile_w,
                (items_bottom - y - 4.0).max(0.0),
            );
            painter.fill(tile, CARD_TILE_DARK);
            let accent = item.accent.map_or(BLUE_200, |color| rgba(color, 1.0));
            let text_y = painter.text(tile.x + 6.0, tile.y + 4.0, item.heading, 0.9, accent);
            painter.wrapped(tile.x + 6.0, text_y, tile.width - 12.0, item.detail, 0.6, SLATE_400);
        }
    } else {
        for item in card.items {
            if y >= items_bottom {
                break;
            }
            painter.fill(Rect::new(inner.x, y + 2.0, 14.0, 14.0), GREEN_100);
            painter.text(inner.x + 3.0, y + 1.0, "\u{2713}", 0.6, GREEN_600);
            let text_x = inner.x + 22.0;
            let next = painter.text(text_x, y, item.heading, 0.8, SLATE_800);
            y = painter.wrapped(text_x, next, inner.right() - text_x, item.detail, 0.65, SLATE_500) + 4.0;
        }
    }

    if let Some(note) = card.note {
        let divider_y = inner.bottom() - note_height;
        painter.fill(Rect::new(inner.x, divider_y, inner.width, 1.0), CARD_DIVIDER_DARK);
        painter.wrapped(inner.x, divider_y + 4.0, inner.width, note, 0.65, SLATE_400);
    }
}

fn draw_footer(painter: &mut Painter<'_>, footer: Rect) {
    if footer.height <= 0.0 {
        return;
    }
    painter.fill(footer, SLATE_900);
    let title_height = painter.line(0.8);
    let title = Rect::new(footer.x, footer.y + 4.0, footer.width, title_height);
    painter.text_centered(title, charts::FOOTER_TITLE, 0.8, SLATE_300);
    let note = Rect::new(footer.x, title.bottom(), footer.width, painter.line(0.6));
    painter.text_centered(note, charts::FOOTER_NOTE, 0.6, SLATE_400);
}

fn draw_chart(painter: &mut Painter<'_>, chart: &ChartSpec, card: Rect) {
    painter.fill(card, WHITE);
    painter.stroke(card, SLATE_100);
    let inner = card.inset(12.0);
    let mut y = painter.text(inner.x, inner.y, chart.title, 1.0, SLATE_800);
    y = painter.text(inner.x, y, chart.subtitle, 0.7, SLATE_500) + 6.0;

    let legend_height = painter.line(0.75) + 6.0;
    let label_room = match chart.orientation {
        Orientation::Horizontal => 0.0,
        Orientation::Vertical => painter.line(0.7),
    };
    let value_room = match chart.orientation {
        Orientation::Horizontal => painter.measure("0000", 0.7) + 6.0,
        Orientation::Vertical => 0.0,
    };
    let plot = Rect::new(
        inner.x,
        y + label_room,
        (inner.width - value_room).max(0.0),
        (inner.bottom() - legend_height - y - label_room).max(0.0),
    );
    painter.fill(
        Rect::new(plot.x, plot.bottom(), plot.width, 1.0),
        SLATE_200,
    );

    for bar in charts::layout_bars(chart, plot) {
        painter.fill(bar.rect, rgba(bar.color, 1.0));
        let value = format!("{}", bar.value);
        match chart.orientation {
            Orientation::Horizontal => {
                let line = painter.line(0.7);
                painter.text(
                    bar.rect.right() + 6.0,
                    bar.rect.y + (bar.rect.height - line) * 0.5,
                    &value,
                    0.7,
                    SLATE_600,
                );
            }
            Orientation::Vertical => {
                let width = painter.measure(&value, 0.7);
                painter.text(
                    bar.rect.x + (bar.rect.width - width) * 0.5,
                    bar.rect.y - painter.line(0.7),
                    &value,
                    0.7,
                    SLATE_600,
                );
            }
        }
    }

    let legend_y = inner.bottom() - legend_height + 6.0;
    let improved = rgba(chart.improved_color, 1.0);
    let baseline = rgba(charts::BASELINE_COLOR, 1.0);
    painter.fill(Rect::new(inner.x, legend_y + 4.0, 10.0, 10.0), baseline);
    painter.text(inner.x + 16.0, legend_y, chart.baseline_legend, 0.75, SLATE_600);
    let half = inner.x + inner.width * 0.5;
    painter.fill(Rect::new(half, legend_y + 4.0, 10.0, 10.0), improved);
    painter.text(half + 16.0, legend_y, chart.improved_legend, 0.75, SLATE_900);
}

/// Colour of the scene viewport behind the 3D pass.
pub fn scene_background() -> Rgb {
    Rgb::from_u8(SLATE_100[0], SLATE_100[1], SLATE_100[2])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cell_model::{Action, LayerStack};
    use winit::dpi::PhysicalSize;

    use super::*;
    use crate::cli::LayoutPreset;

    fn layout() -> ViewerLayout {
        ViewerLayout::compute(PhysicalSize::new(1280, 800), &LayoutPreset::default())
    }

    #[test]
    fn exploded_labels_project_into_the_scene() {
        let mut session = Session::new(Arc::new(LayerStack::builtin()), 5);
        session.apply(&Action::ToggleExploded);
        session.wait(2.0);
        let layout = layout();
        session.set_aspect(layout.scene_aspect());
        let frame = session.scene();
        let labels = scene_labels(&session, &frame, &layout);
        assert_eq!(labels.len(), 5);
        for label in &labels {
            assert!(layout.scene.contains(label.x, label.y), "{label:?}");
        }
    }

    #[test]
    fn stacked_view_has_no_labels() {
        let session = Session::new(Arc::new(LayerStack::builtin()), 5);
        let frame = session.scene();
        assert!(scene_labels(&session, &frame, &layout()).is_empty());
    }

    #[test]
    fn frame_leaves_the_scene_transparent() {
        let session = Session::new(Arc::new(LayerStack::builtin()), 5);
        let layout = layout();
        let frame = session.scene();
        let info = session.info();
        let controls = VisibleControls::from_session(&session);
        let view = UiView::new(&session, &frame, &info, &controls, &layout, None);
        let mut canvas = Canvas::new(1280, 800);
        let mut painter = Painter::new(&mut canvas, None, layout.font_size);
        draw_frame(&mut painter, &layout, &view);

        let scene_center = (
            (layout.scene.x + layout.scene.width * 0.5) as u32,
            (layout.scene.y + layout.scene.height * 0.4) as u32,
        );
        assert_eq!(canvas.pixel(scene_center.0, scene_center.1), Some(TRANSPARENT));
        assert_eq!(canvas.pixel(2, 2), Some(WHITE));
        let dashboard = (layout.dashboard.x as u32 + 2, layout.dashboard.bottom() as u32 - 2);
        assert_eq!(canvas.pixel(dashboard.0, dashboard.1), Some(SLATE_50));
    }

    #[test]
    fn dashboard_draws_both_charts() {
        let area = Rect::new(0.0, 0.0, 1200.0, 300.0);
        let mut canvas = Canvas::new(1200, 300);
        let mut painter = Painter::new(&mut canvas, None, 16.0);
        draw_dashboard(&mut painter, area, 16.0);
        let improved_pixels = |color: Rgb| {
            let target = rgba(color, 1.0);
            canvas.pixels().chunks_exact(4).filter(|px| *px == target).count()
        };
        assert!(improved_pixels(charts::COST_CHART.improved_color) > 0);
        assert!(improved_pixels(charts::DENSITY_CHART.improved_color) > 0);
    }

    #[test]
    fn dashboard_regions_do_not_overlap() {
        let inner = Rect::new(16.0, 16.0, 1248.0, 248.0);
        let regions = dashboard_regions(inner, 16.0, 40.0);
        assert!(regions.metrics.right() < regions.features[0].x);
        assert!(regions.features[0].right() < regions.charts.x);
        assert!(regions.features[0].bottom() < regions.features[1].y);
        assert!((regions.charts.right() - inner.right()).abs() < 1e-3);
        for body in [regions.metrics, regions.charts, regions.features[1]] {
            assert!(body.bottom() < regions.footer.y);
        }
        assert!((regions.footer.bottom() - inner.bottom()).abs() < 1e-3);

        let squeezed = dashboard_regions(Rect::new(0.0, 0.0, 400.0, 60.0), 16.0, 40.0);
        assert!(squeezed.footer.height <= 60.0 * FOOTER_MAX_SHARE + 1e-4);
        assert!(squeezed.features.iter().all(|card| card.height >= 0.0));
    }

    #[test]
    fn dashboard_draws_feature_cards_and_footer() {
        let area = Rect::new(0.0, 0.0, 1280.0, 280.0);
        let mut canvas = Canvas::new(1280, 280);
        let mut painter = Painter::new(&mut canvas, None, 16.0);
        draw_dashboard(&mut painter, area, 16.0);
        let footer_height = painter.line(0.8) + painter.line(0.6) + 12.0;
        let regions = dashboard_regions(area.inset(16.0), 16.0, footer_height);

        let count = |color: [u8; 4]| canvas.pixels().chunks_exact(4).filter(|px| *px == color).count();
        assert!(count(GREEN_100) > 0, "manufacturing check marks missing");

        let material = regions.features[1];
        let corner = canvas.pixel(material.x as u32 + 1, material.y as u32 + 1);
        assert_eq!(corner, Some(SLATE_900));
        let footer = regions.footer;
        let footer_px = canvas.pixel(footer.x as u32 + 2, (footer.y + footer.height * 0.5) as u32);
        assert_eq!(footer_px, Some(SLATE_900));
        let manufacturing = regions.features[0];
        let inside = canvas.pixel(manufacturing.right() as u32 - 4, manufacturing.bottom() as u32 - 4);
        assert_eq!(inside, Some(WHITE));
    }
}
