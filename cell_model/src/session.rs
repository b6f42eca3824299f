//! One explorer session: the controller plus everything derived from it,
//! advanced once per frame. Both the windowed viewer and headless replay
//! drive the explorer through [`Session::apply`] and [`Session::advance`].

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::camera::{CameraPose, CameraRig, OrbitCamera, Ray};
use crate::info_panel::{InfoContent, PanelAction};
use crate::layers::LayerStack;
use crate::micro::{MicroKind, MicroScene};
use crate::scene::{SceneComposer, SceneFrame};
use crate::view_state::{NavTarget, SelectionPolicy, ViewMode, ViewState, ViewStateController};

/// Longest frame step the simulation accepts; longer gaps are clamped.
pub const MAX_FRAME_DT: f32 = 0.1;
pub const DEFAULT_FRAME_DT: f32 = 1.0 / 60.0;
/// Longest wait a single action may step through.
pub const MAX_WAIT_FRAMES: usize = 100_000;
const DEFAULT_ASPECT: f32 = 16.0 / 9.0;

/// Frames needed to cover `seconds` at no more than `step_dt` each.
fn wait_frames(seconds: f32, step_dt: f32) -> usize {
    if !seconds.is_finite() || seconds <= 0.0 || !step_dt.is_finite() || step_dt <= 0.0 {
        return 0;
    }
    // Absorbs the rounding in ratios like 0.5 / 0.05.
    let ratio = f64::from(seconds) / f64::from(step_dt) - 1e-4;
    (ratio.ceil().max(1.0) as usize).min(MAX_WAIT_FRAMES)
}

/// A user input, as recorded in replay scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    SelectLayer {
        #[serde(default)]
        id: Option<String>,
    },
    /// Pointer click at normalized device coordinates of the scene viewport.
    Click { x: f32, y: f32 },
    Hover { x: f32, y: f32 },
    PointerLeave,
    SetMode {
        mode: ViewMode,
        #[serde(default)]
        keep_selection: bool,
    },
    ToggleMicro,
    CloseMicro,
    ToggleExploded,
    Navigate { target: NavTarget },
    Panel { button: PanelAction },
    SetInfusion { value: f32 },
    Orbit { yaw: f32, pitch: f32 },
    Zoom { factor: f32 },
    Wait { seconds: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub frame: u64,
    pub elapsed: f32,
    pub state: ViewState,
    pub hovered: Option<String>,
    pub info: InfoContent,
    pub camera: CameraPose,
    pub scene: SceneFrame,
}

pub struct Session {
    controller: ViewStateController,
    composer: SceneComposer,
    rig: CameraRig,
    orbit: OrbitCamera,
    micro: Option<MicroScene>,
    rng: StdRng,
    aspect: f32,
    step_dt: f32,
    elapsed: f32,
    frame: u64,
}

impl Session {
    pub fn new(stack: Arc<LayerStack>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let composer = SceneComposer::new(Arc::clone(&stack), &mut rng);
        Self {
            controller: ViewStateController::new(stack),
            composer,
            rig: CameraRig::default(),
            orbit: OrbitCamera::default(),
            micro: None,
            rng,
            aspect: DEFAULT_ASPECT,
            step_dt: DEFAULT_FRAME_DT,
            elapsed: 0.0,
            frame: 0,
        }
    }

    pub fn state(&self) -> &ViewState {
        self.controller.state()
    }

    pub fn stack(&self) -> &LayerStack {
        self.controller.stack()
    }

    pub fn composer(&self) -> &SceneComposer {
        &self.composer
    }

    pub fn orbit(&self) -> &OrbitCamera {
        &self.orbit
    }

    pub fn micro(&self) -> Option<&MicroScene> {
        self.micro.as_ref()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Aspect ratio of the scene viewport, used to turn pointer positions
    /// into rays.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Step used when a script waits.
    pub fn set_step_dt(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.step_dt = dt.min(MAX_FRAME_DT);
        }
    }

    pub fn info(&self) -> InfoContent {
        InfoContent::derive(self.controller.state(), self.controller.stack())
    }

    pub fn scene(&self) -> SceneFrame {
        self.composer
            .compose(self.controller.state(), self.micro.as_ref())
    }

    /// Apply one input; returns whether the view state changed.
    pub fn apply(&mut self, action: &Action) -> bool {
        let changed = match action {
            Action::SelectLayer { id } => self.controller.select_layer(id.as_deref()),
            Action::Click { x, y } => self.click(self.ray([*x, *y])),
            Action::Hover { x, y } => {
                let ray = self.ray([*x, *y]);
                self.composer.hover(self.controller.state(), ray);
                false
            }
            Action::PointerLeave => {
                self.composer.hover(self.controller.state(), None);
                false
            }
            Action::SetMode {
                mode,
                keep_selection,
            } => {
                let policy = if *keep_selection {
                    SelectionPolicy::Keep
                } else {
                    SelectionPolicy::Clear
                };
                self.controller.set_mode(*mode, policy)
            }
            Action::ToggleMicro => self.controller.toggle_micro(),
            Action::CloseMicro => self.controller.close_micro(),
            Action::ToggleExploded => self.controller.toggle_exploded(),
            Action::Navigate { target } => self.controller.navigate(*target),
            Action::Panel { button } => self.press(*button),
            Action::SetInfusion { value } => {
                match self.micro.as_mut().and_then(MicroScene::cathode_mut) {
                    Some(cathode) => {
                        cathode.set_infusion(*value);
                    }
                    None => log::debug!("ignoring infusion change outside the cathode view"),
                }
                false
            }
            Action::Orbit { yaw, pitch } => {
                self.orbit.orbit(*yaw, *pitch);
                false
            }
            Action::Zoom { factor } => {
                self.orbit.zoom(*factor);
                false
            }
            Action::Wait { seconds } => {
                self.wait(*seconds);
                false
            }
        };
        self.reconcile_micro();
        changed
    }

    /// Press a panel button. Buttons the current panel does not show are
    /// ignored.
    pub fn press(&mut self, button: PanelAction) -> bool {
        if !self.info().actions().contains(&button) {
            log::debug!("panel button {button:?} is not on screen");
            return false;
        }
        let changed = match button {
            PanelAction::AnalyzeStructure => self
                .controller
                .set_mode(ViewMode::Exploded, SelectionPolicy::Keep),
            PanelAction::BackToStack => self.controller.select_layer(None),
            PanelAction::ViewMicroDetail => self.controller.toggle_micro(),
            PanelAction::CloseMicro => self.controller.close_micro(),
        };
        self.reconcile_micro();
        changed
    }

    /// Advance every animated part by one frame.
    pub fn advance(&mut self, dt: f32) {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        let state = self.controller.state();
        self.composer.advance(state, dt);
        let target = self.rig.advance(state, self.controller.stack(), dt);
        self.orbit.advance(target, dt);
        if let Some(micro) = self.micro.as_mut() {
            micro.advance(dt);
        }
        self.elapsed += dt;
        self.frame += 1;
    }

    /// Advance in equal frames no longer than `step_dt` until `seconds` have
    /// passed; returns the number of frames stepped. Non-finite or
    /// non-positive waits step nothing, and a wait is cut off after
    /// [`MAX_WAIT_FRAMES`] frames.
    pub fn wait(&mut self, seconds: f32) -> usize {
        let frames = wait_frames(seconds, self.step_dt);
        if frames == 0 {
            return 0;
        }
        let dt = if frames == MAX_WAIT_FRAMES {
            log::warn!(
                "wait of {seconds}s cut off after {MAX_WAIT_FRAMES} frames of {}s",
                self.step_dt
            );
            self.step_dt
        } else {
            seconds / frames as f32
        };
        for _ in 0..frames {
            self.advance(dt);
        }
        frames
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            frame: self.frame,
            elapsed: self.elapsed,
            state: self.controller.state().clone(),
            hovered: self.composer.hovered().map(str::to_string),
            info: self.info(),
            camera: self.orbit.pose(),
            scene: self.scene(),
        }
    }

    fn ray(&self, ndc: [f32; 2]) -> Option<Ray> {
        self.orbit.ray_through(ndc, self.aspect)
    }

    fn click(&mut self, ray: Option<Ray>) -> bool {
        if self.controller.state().is_micro() {
            return false;
        }
        let hit = ray
            .and_then(|ray| self.composer.pick(ray))
            .and_then(|index| self.controller.stack().layers().get(index))
            .map(|layer| layer.id.clone());
        self.controller.select_layer(hit.as_deref())
    }

    /// Build, swap or drop the micro scene so it matches the view state.
    fn reconcile_micro(&mut self) {
        let state = self.controller.state();
        let wanted: Option<MicroKind> = if state.is_micro() {
            state.selected().and_then(MicroKind::for_layer)
        } else {
            None
        };
        let current = self.micro.as_ref().map(MicroScene::kind);
        if wanted == current {
            return;
        }
        self.micro = None;
        if let Some(kind) = wanted {
            self.micro = Some(MicroScene::enter(kind, &mut self.rng));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::micro::cathode::DEFAULT_INFUSION;

    fn session() -> Session {
        Session::new(Arc::new(LayerStack::builtin()), 42)
    }

    #[test]
    fn micro_scene_follows_view_state() {
        let mut session = session();
        session.apply(&Action::SelectLayer {
            id: Some("anode".into()),
        });
        assert!(session.micro().is_none());
        assert!(session.apply(&Action::ToggleMicro));
        assert_eq!(session.micro().map(MicroScene::kind), Some(MicroKind::Anode));
        assert!(session.apply(&Action::SelectLayer {
            id: Some("cathode".into()),
        }));
        assert_eq!(session.micro().map(MicroScene::kind), Some(MicroKind::Cathode));
        assert!(session.apply(&Action::CloseMicro));
        assert!(session.micro().is_none());
    }

    #[test]
    fn reentering_resets_infusion() {
        let mut session = session();
        session.apply(&Action::SelectLayer {
            id: Some("cathode".into()),
        });
        session.apply(&Action::ToggleMicro);
        session.apply(&Action::SetInfusion { value: 0.1 });
        let infusion = session.micro().and_then(MicroScene::cathode).map(|c| c.infusion());
        assert_eq!(infusion, Some(0.1));
        session.apply(&Action::ToggleMicro);
        session.apply(&Action::ToggleMicro);
        let infusion = session.micro().and_then(MicroScene::cathode).map(|c| c.infusion());
        assert_eq!(infusion, Some(DEFAULT_INFUSION));
    }

    #[test]
    fn panel_buttons_respect_current_panel() {
        let mut session = session();
        assert!(!session.press(PanelAction::BackToStack));
        assert!(session.press(PanelAction::AnalyzeStructure));
        assert_eq!(session.state().mode, ViewMode::Exploded);
        session.apply(&Action::SelectLayer {
            id: Some("copper".into()),
        });
        assert!(!session.press(PanelAction::ViewMicroDetail));
        assert!(session.press(PanelAction::BackToStack));
        assert_eq!(session.state().selected(), None);
    }

    #[test]
    fn clicking_empty_space_clears_selection() {
        let mut session = session();
        session.apply(&Action::SelectLayer {
            id: Some("separator".into()),
        });
        // The top-right corner of the viewport misses the stack.
        assert!(session.apply(&Action::Click { x: 0.98, y: 0.98 }));
        assert_eq!(session.state().selected(), None);
    }

    #[test]
    fn clicking_the_centre_selects_a_layer() {
        let mut session = session();
        assert!(session.apply(&Action::Click { x: 0.0, y: 0.0 }));
        assert_eq!(session.state().mode, ViewMode::Exploded);
        assert!(session.state().selected().is_some());
    }

    #[test]
    fn frame_steps_are_clamped() {
        let mut session = session();
        session.advance(5.0);
        assert!((session.elapsed() - MAX_FRAME_DT).abs() < 1e-6);
        session.advance(f32::NAN);
        session.advance(-1.0);
        assert!((session.elapsed() - MAX_FRAME_DT).abs() < 1e-6);
        assert_eq!(session.frame_index(), 3);
    }

    #[test]
    fn wait_steps_whole_frames() {
        let mut session = session();
        session.set_step_dt(0.25);
        assert_eq!(session.wait(1.0), 10);
        assert!((session.elapsed() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn wait_rounds_partial_frames_up() {
        let mut session = session();
        session.set_step_dt(0.05);
        assert_eq!(session.wait(0.5), 10);
        assert_eq!(session.wait(0.12), 3);
        assert!((session.elapsed() - 0.62).abs() < 1e-4);
    }

    #[test]
    fn degenerate_waits_step_nothing() {
        let mut session = session();
        for seconds in [0.0, -3.0, f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert!(!session.apply(&Action::Wait { seconds }));
            assert_eq!(session.wait(seconds), 0);
        }
        assert_eq!(session.frame_index(), 0);
        assert_eq!(session.elapsed(), 0.0);
    }

    #[test]
    fn huge_waits_are_capped() {
        assert_eq!(wait_frames(1.0e6, DEFAULT_FRAME_DT), MAX_WAIT_FRAMES);
        assert_eq!(wait_frames(f32::MAX, DEFAULT_FRAME_DT), MAX_WAIT_FRAMES);

        let mut session = session();
        session.set_step_dt(MAX_FRAME_DT);
        assert!(!session.apply(&Action::Wait { seconds: 1.0e6 }));
        assert_eq!(session.frame_index(), MAX_WAIT_FRAMES as u64);
        let covered = MAX_WAIT_FRAMES as f32 * MAX_FRAME_DT;
        assert!((session.elapsed() - covered).abs() / covered < 1e-2);
    }
}
