pub mod build;
pub mod compare;
pub mod fold;
pub mod predict;

use qknot::core::io::Format;
use std::path::Path;

/// The explicit format when given, otherwise the one implied by the extension.
pub(crate) fn resolve_format(path: &Path, explicit: Option<Format>) -> Format {
    explicit.unwrap_or_else(|| Format::from_path(path))
}

/// A record label derived from a file name.
pub(crate) fn label_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("qknot")
        .to_string()
}
