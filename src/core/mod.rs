// Core Engine
pub mod archive;
pub mod conflict;
pub mod extract;
pub mod mutation;
pub mod navigation;
pub mod sort;

pub use archive::Archive;
pub use conflict::{DecisionSource, OverwriteState};
pub use mutation::RenameSource;
pub use navigation::Navigator;
