//! Model side of the cell stack explorer: reference data, the view-state
//! machine, and everything derived from it each frame. No windowing or GPU
//! code lives here.

pub mod camera;
pub mod charts;
pub mod color;
pub mod info_panel;
pub mod layers;
pub mod micro;
pub mod scene;
pub mod session;
pub mod smoothing;
pub mod view_state;

pub use camera::{CameraRig, OrbitCamera, Ray};
pub use color::Rgb;
pub use info_panel::{InfoContent, PanelAction};
pub use layers::{Layer, LayerStack, StackError};
pub use micro::{MicroFrame, MicroKind, MicroScene};
pub use scene::{SceneComposer, SceneContent, SceneFrame};
pub use session::{Action, Session, Snapshot};
pub use view_state::{NavTarget, SelectionPolicy, ViewMode, ViewState, ViewStateController};
