pub mod init;
pub mod inspect;
pub mod preview;
pub mod validate;

pub use init::{init, InitArgs};
pub use inspect::{inspect, InspectArgs};
pub use preview::{preview, PreviewArgs};
pub use validate::{validate, ValidateArgs};

use std::path::{Path, PathBuf};

/// Resolve a user-supplied path against the working directory
pub(crate) fn resolve(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
