//! The explorer's single piece of authoritative UI state and the controller
//! that guards every change to it. Illegal requests are absorbed as no-ops;
//! every operation reports whether the state actually changed.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::layers::LayerStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Intro,
    Exploded,
    Micro,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ViewMode::Intro => "intro",
            ViewMode::Exploded => "exploded",
            ViewMode::Micro => "micro",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub mode: ViewMode,
    pub selected_layer_id: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            mode: ViewMode::Intro,
            selected_layer_id: None,
        }
    }
}

impl ViewState {
    pub fn is_micro(&self) -> bool {
        self.mode == ViewMode::Micro
    }

    /// Layers are spread apart in exploded mode, and also whenever something
    /// is selected outside micro mode.
    pub fn is_exploded(&self) -> bool {
        self.mode == ViewMode::Exploded
            || (self.selected_layer_id.is_some() && self.mode != ViewMode::Micro)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected_layer_id.as_deref()
    }
}

/// What happens to the selection when moving to [`ViewMode::Exploded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    Keep,
    Clear,
}

/// Header navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavTarget {
    Overview,
    Technology,
}

#[derive(Debug, Clone)]
pub struct ViewStateController {
    stack: Arc<LayerStack>,
    state: ViewState,
}

impl ViewStateController {
    pub fn new(stack: Arc<LayerStack>) -> Self {
        Self {
            stack,
            state: ViewState::default(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn stack(&self) -> &Arc<LayerStack> {
        &self.stack
    }

    pub fn select_layer(&mut self, id: Option<&str>) -> bool {
        match (self.state.mode, id) {
            (ViewMode::Micro, None) => self.ignore("clear selection while in micro view"),
            (ViewMode::Micro, Some(id)) if !self.stack.supports_micro(id) => {
                self.ignore("select a layer without a micro view while in micro view")
            }
            (mode, id) => {
                let next = ViewState {
                    mode: if id.is_some() && mode == ViewMode::Intro {
                        ViewMode::Exploded
                    } else {
                        mode
                    },
                    selected_layer_id: id.map(str::to_string),
                };
                self.commit(next)
            }
        }
    }

    pub fn set_mode(&mut self, mode: ViewMode, policy: SelectionPolicy) -> bool {
        match mode {
            ViewMode::Intro => self.commit(ViewState::default()),
            ViewMode::Exploded => {
                let selected_layer_id = match policy {
                    SelectionPolicy::Keep => self.state.selected_layer_id.clone(),
                    SelectionPolicy::Clear => None,
                };
                self.commit(ViewState {
                    mode,
                    selected_layer_id,
                })
            }
            ViewMode::Micro if self.state.is_micro() => false,
            ViewMode::Micro => self.enter_micro(),
        }
    }

    pub fn toggle_micro(&mut self) -> bool {
        if self.state.is_micro() {
            self.set_mode(ViewMode::Exploded, SelectionPolicy::Keep)
        } else {
            self.enter_micro()
        }
    }

    /// Leave micro view, keeping the selection. No-op outside micro view.
    pub fn close_micro(&mut self) -> bool {
        if !self.state.is_micro() {
            return self.ignore("close micro view when not in micro view");
        }
        self.set_mode(ViewMode::Exploded, SelectionPolicy::Keep)
    }

    /// The scene's exploded-view button; disabled while in micro view.
    pub fn toggle_exploded(&mut self) -> bool {
        match self.state.mode {
            ViewMode::Micro => self.ignore("toggle exploded view while in micro view"),
            ViewMode::Exploded => self.set_mode(ViewMode::Intro, SelectionPolicy::Clear),
            ViewMode::Intro => self.set_mode(ViewMode::Exploded, SelectionPolicy::Keep),
        }
    }

    /// Header navigation. Always clears the selection, which also tears down
    /// an active micro view.
    pub fn navigate(&mut self, target: NavTarget) -> bool {
        match target {
            NavTarget::Overview => self.set_mode(ViewMode::Intro, SelectionPolicy::Clear),
            NavTarget::Technology => self.set_mode(ViewMode::Exploded, SelectionPolicy::Clear),
        }
    }

    /// Micro mode always names a micro-capable layer.
    pub fn invariant_holds(&self) -> bool {
        !self.state.is_micro()
            || self
                .state
                .selected()
                .is_some_and(|id| self.stack.supports_micro(id))
    }

    fn enter_micro(&mut self) -> bool {
        let supported = self
            .state
            .selected()
            .is_some_and(|id| self.stack.supports_micro(id));
        if !supported {
            return self.ignore("enter micro view without a micro-capable selection");
        }
        self.commit(ViewState {
            mode: ViewMode::Micro,
            selected_layer_id: self.state.selected_layer_id.clone(),
        })
    }

    fn commit(&mut self, next: ViewState) -> bool {
        if next == self.state {
            return false;
        }
        log::debug!(
            "view state {} {:?} -> {} {:?}",
            self.state.mode,
            self.state.selected_layer_id,
            next.mode,
            next.selected_layer_id
        );
        self.state = next;
        true
    }

    fn ignore(&self, request: &str) -> bool {
        log::debug!("ignored request to {request} (state {})", self.state.mode);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> ViewStateController {
        ViewStateController::new(Arc::new(LayerStack::builtin()))
    }

    fn state(mode: ViewMode, id: Option<&str>) -> ViewState {
        ViewState {
            mode,
            selected_layer_id: id.map(str::to_string),
        }
    }

    #[test]
    fn starts_in_intro_without_selection() {
        let ctrl = controller();
        assert_eq!(ctrl.state(), &ViewState::default());
        assert!(!ctrl.state().is_exploded());
    }

    #[test]
    fn selecting_in_intro_explodes_the_stack() {
        let mut ctrl = controller();
        assert!(ctrl.select_layer(Some("separator")));
        assert_eq!(ctrl.state(), &state(ViewMode::Exploded, Some("separator")));
        assert!(ctrl.select_layer(None));
        assert_eq!(ctrl.state(), &state(ViewMode::Exploded, None));
        assert!(ctrl.state().is_exploded());
    }

    #[test]
    fn clearing_selection_in_micro_is_a_no_op() {
        let mut ctrl = controller();
        ctrl.select_layer(Some("anode"));
        assert!(ctrl.toggle_micro());
        let before = ctrl.state().clone();
        assert!(!ctrl.select_layer(None));
        assert_eq!(ctrl.state(), &before);
    }

    #[test]
    fn micro_requires_micro_capable_selection() {
        let mut ctrl = controller();
        assert!(!ctrl.toggle_micro());
        assert!(!ctrl.set_mode(ViewMode::Micro, SelectionPolicy::Keep));
        ctrl.select_layer(Some("separator"));
        let before = ctrl.state().clone();
        assert!(!ctrl.toggle_micro());
        assert_eq!(ctrl.state(), &before);
        ctrl.select_layer(Some("ghost"));
        assert!(!ctrl.toggle_micro());
        assert_eq!(ctrl.state(), &state(ViewMode::Exploded, Some("ghost")));
    }

    #[test]
    fn double_toggle_restores_exploded_selection() {
        let mut ctrl = controller();
        ctrl.select_layer(Some("cathode"));
        assert!(ctrl.toggle_micro());
        assert_eq!(ctrl.state(), &state(ViewMode::Micro, Some("cathode")));
        assert!(ctrl.toggle_micro());
        assert_eq!(ctrl.state(), &state(ViewMode::Exploded, Some("cathode")));
    }

    #[test]
    fn switching_micro_layers_only_between_capable_ids() {
        let mut ctrl = controller();
        ctrl.select_layer(Some("anode"));
        ctrl.toggle_micro();
        assert!(!ctrl.select_layer(Some("copper")));
        assert!(ctrl.select_layer(Some("cathode")));
        assert_eq!(ctrl.state(), &state(ViewMode::Micro, Some("cathode")));
    }

    #[test]
    fn navigation_from_micro_is_a_forced_reset() {
        let mut ctrl = controller();
        ctrl.select_layer(Some("cathode"));
        ctrl.toggle_micro();
        assert!(ctrl.navigate(NavTarget::Technology));
        assert_eq!(ctrl.state(), &state(ViewMode::Exploded, None));

        ctrl.select_layer(Some("cathode"));
        ctrl.toggle_micro();
        assert!(ctrl.set_mode(ViewMode::Intro, SelectionPolicy::Keep));
        assert_eq!(ctrl.state(), &ViewState::default());
    }

    #[test]
    fn analyze_structure_keeps_selection() {
        let mut ctrl = controller();
        ctrl.select_layer(Some("copper"));
        assert!(!ctrl.set_mode(ViewMode::Exploded, SelectionPolicy::Keep));
        assert_eq!(ctrl.state().selected(), Some("copper"));
        assert!(ctrl.set_mode(ViewMode::Exploded, SelectionPolicy::Clear));
        assert_eq!(ctrl.state().selected(), None);
    }

    #[test]
    fn exploded_toggle_is_disabled_in_micro() {
        let mut ctrl = controller();
        assert!(ctrl.toggle_exploded());
        assert_eq!(ctrl.state().mode, ViewMode::Exploded);
        assert!(ctrl.toggle_exploded());
        assert_eq!(ctrl.state(), &ViewState::default());

        ctrl.select_layer(Some("anode"));
        ctrl.toggle_micro();
        assert!(!ctrl.toggle_exploded());
        assert!(ctrl.state().is_micro());
        assert!(ctrl.close_micro());
        assert!(!ctrl.close_micro());
    }

    #[test]
    fn invariant_holds_for_every_operation_sequence() {
        let ids = [None, Some("copper"), Some("anode"), Some("separator"), Some("cathode"), Some("ghost")];
        // Fixed LCG so the walk is reproducible.
        let mut seed: u64 = 0x5eed;
        for _ in 0..2000 {
            let mut ctrl = controller();
            for _ in 0..12 {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let pick = (seed >> 33) as usize;
                match pick % 8 {
                    0 | 1 => {
                        ctrl.select_layer(ids[(pick / 8) % ids.len()]);
                    }
                    2 => {
                        ctrl.toggle_micro();
                    }
                    3 => {
                        let mode = [ViewMode::Intro, ViewMode::Exploded, ViewMode::Micro][(pick / 8) % 3];
                        let policy = if pick % 16 < 8 { SelectionPolicy::Keep } else { SelectionPolicy::Clear };
                        ctrl.set_mode(mode, policy);
                    }
                    4 => {
                        ctrl.close_micro();
                    }
                    5 => {
                        ctrl.toggle_exploded();
                    }
                    6 => {
                        ctrl.navigate(NavTarget::Overview);
                    }
                    _ => {
                        ctrl.navigate(NavTarget::Technology);
                    }
                }
                assert!(ctrl.invariant_holds(), "invariant broken at {:?}", ctrl.state());
                if ctrl.state().mode == ViewMode::Intro {
                    assert!(ctrl.state().selected().is_none());
                }
            }
        }
    }
}
