//! File name helpers.

use std::path::Path;

/// Returns the lowercase extension of a file name.
///
/// Hidden files whose only dot is the leading one (`.heic`) and names
/// ending in a dot have no extension.
pub fn extension_of(name: &str) -> Option<String> {
    let idx = name.rfind('.')?;
    if idx == 0 || idx + 1 == name.len() {
        return None;
    }
    Some(name[idx + 1..].to_ascii_lowercase())
}

/// Replaces the extension of a file name, keeping its base name.
///
/// Names without an extension get one appended.
pub fn replace_extension(name: &str, ext: &str) -> String {
    let base = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };
    format!("{}.{}", base, ext)
}

/// Final component of a path as an owned string.
pub fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
