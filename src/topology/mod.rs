pub mod face;
pub mod shell;

pub use face::{FaceData, FaceSurface};
pub use shell::Shell;
