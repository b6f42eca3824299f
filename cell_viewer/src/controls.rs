//! On-screen controls and pointer hit-testing. Every control resolves to a
//! session [`Action`] so windowed input and replay scripts share one path.

use cell_model::charts::Rect;
use cell_model::{Action, MicroScene, NavTarget, PanelAction, Session};

use crate::layout::ViewerLayout;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    Navigate(NavTarget),
    ToggleExploded,
    CloseMicro,
    Panel(PanelAction),
    InfusionSlider,
}

impl Control {
    /// The session action for a press at pointer x position `x`.
    pub fn action(self, layout: &ViewerLayout, x: f32) -> Action {
        match self {
            Control::Navigate(target) => Action::Navigate { target },
            Control::ToggleExploded => Action::ToggleExploded,
            Control::CloseMicro => Action::CloseMicro,
            Control::Panel(button) => Action::Panel { button },
            Control::InfusionSlider => Action::SetInfusion {
                value: layout.slider_value(x),
            },
        }
    }
}

/// Which controls are on screen for the current view state.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleControls {
    pub in_micro: bool,
    pub exploded: bool,
    pub infusion: Option<f32>,
    pub panel_actions: Vec<PanelAction>,
}

impl VisibleControls {
    pub fn from_session(session: &Session) -> Self {
        Self {
            in_micro: session.state().is_micro(),
            exploded: session.state().is_exploded(),
            infusion: session
                .micro()
                .and_then(MicroScene::cathode)
                .map(|cathode| cathode.infusion()),
            panel_actions: session.info().actions().to_vec(),
        }
    }

    /// Every enabled control with its screen rectangle.
    pub fn regions(&self, layout: &ViewerLayout) -> Vec<(Control, Rect)> {
        let [overview, technology] = layout.nav_buttons();
        let mut regions = vec![
            (Control::Navigate(NavTarget::Overview), overview),
            (Control::Navigate(NavTarget::Technology), technology),
        ];
        if self.in_micro {
            regions.push((Control::CloseMicro, layout.close_micro()));
        } else {
            regions.push((Control::ToggleExploded, layout.exploded_toggle()));
        }
        if self.infusion.is_some() {
            regions.push((Control::InfusionSlider, layout.slider()));
        }
        let buttons = layout.panel_buttons(self.panel_actions.len());
        regions.extend(
            self.panel_actions
                .iter()
                .zip(buttons)
                .map(|(button, rect)| (Control::Panel(*button), rect)),
        );
        regions
    }

    pub fn hit_test(&self, layout: &ViewerLayout, x: f32, y: f32) -> Option<Control> {
        self.regions(layout)
            .into_iter()
            .find(|(_, rect)| rect.contains(x, y))
            .map(|(control, _)| control)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cell_model::LayerStack;
    use winit::dpi::PhysicalSize;

    use super::*;
    use crate::cli::LayoutPreset;

    fn layout() -> ViewerLayout {
        ViewerLayout::compute(PhysicalSize::new(1280, 800), &LayoutPreset::default())
    }

    fn center(rect: Rect) -> (f32, f32) {
        (rect.x + rect.width * 0.5, rect.y + rect.height * 0.5)
    }

    #[test]
    fn intro_shows_toggle_and_analyze() {
        let session = Session::new(Arc::new(LayerStack::builtin()), 0);
        let controls = VisibleControls::from_session(&session);
        let layout = layout();
        let (x, y) = center(layout.exploded_toggle());
        assert_eq!(controls.hit_test(&layout, x, y), Some(Control::ToggleExploded));
        let (x, y) = center(layout.panel_buttons(1)[0]);
        assert_eq!(
            controls.hit_test(&layout, x, y),
            Some(Control::Panel(PanelAction::AnalyzeStructure))
        );
        let (x, y) = center(layout.close_micro());
        assert_eq!(controls.hit_test(&layout, x, y), None);
    }

    #[test]
    fn cathode_micro_swaps_toggle_for_close_and_slider() {
        let mut session = Session::new(Arc::new(LayerStack::builtin()), 0);
        session.apply(&Action::SelectLayer {
            id: Some("cathode".into()),
        });
        session.apply(&Action::ToggleMicro);
        let controls = VisibleControls::from_session(&session);
        let layout = layout();
        assert!(controls.in_micro);
        let (x, y) = center(layout.exploded_toggle());
        assert_eq!(controls.hit_test(&layout, x, y), None);
        let (x, y) = center(layout.close_micro());
        assert_eq!(controls.hit_test(&layout, x, y), Some(Control::CloseMicro));

        let track = layout.slider_track();
        let hit = controls
            .hit_test(&layout, track.right(), track.y)
            .expect("slider hit");
        assert_eq!(
            hit.action(&layout, track.right()),
            Action::SetInfusion { value: 1.0 }
        );
    }

    #[test]
    fn header_navigation_is_always_available() {
        let session = Session::new(Arc::new(LayerStack::builtin()), 0);
        let controls = VisibleControls::from_session(&session);
        let layout = layout();
        let (x, y) = center(layout.nav_buttons()[1]);
        let control = controls.hit_test(&layout, x, y).expect("nav hit");
        assert_eq!(
            control.action(&layout, x),
            Action::Navigate {
                target: NavTarget::Technology
            }
        );
    }
}
