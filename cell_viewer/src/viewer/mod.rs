mod batch;
mod mesh;
mod overlay;
mod shaders;
mod state;

pub use state::ViewerState;
