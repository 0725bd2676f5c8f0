mod archive;
mod error;
mod explorer;
mod lifecycle;
pub mod types;

pub use error::{FsError, FsErrorKind, Result};
pub use explorer::Explorer;
pub use lifecycle::{LifecycleManager, TrashStream};
pub use types::*;
