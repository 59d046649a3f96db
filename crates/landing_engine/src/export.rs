use std::path::{Path, PathBuf};

use landing_logging::landing_info;

use crate::persist::{AtomicFileWriter, PersistError};

pub const HTML_MEDIA_TYPE: &str = "text/html";
pub const DEFAULT_EXPORT_NAME: &str = "index.html";

/// A saved copy of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlExport {
    pub path: PathBuf,
    pub media_type: &'static str,
    pub byte_len: usize,
}

/// Writes `contents` verbatim to `dir/<file_name>`.
pub fn export_document(
    dir: &Path,
    file_name: &str,
    contents: &str,
) -> Result<HtmlExport, PersistError> {
    let name = export_file_name(file_name);
    let writer = AtomicFileWriter::new(dir.to_path_buf());
    let path = writer.write(&name, contents.as_bytes())?;
    landing_info!("Exported {} bytes to {}", contents.len(), path.display());
    Ok(HtmlExport {
        path,
        media_type: HTML_MEDIA_TYPE,
        byte_len: contents.len(),
    })
}

/// File name safe to create on common filesystems.
///
/// Blank names become `index.html`. Separators and forbidden characters turn
/// into `_`; reserved device names get a trailing `_` on their stem.
pub fn export_file_name(requested: &str) -> String {
    let cleaned: String = requested
        .trim()
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&[' ', '.'][..]);
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        return DEFAULT_EXPORT_NAME.to_string();
    }

    let (stem, extension) = match cleaned.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (cleaned, None),
    };
    let mut name = stem.to_string();
    if is_reserved_windows_name(stem) {
        name.push('_');
    }
    if let Some(ext) = extension {
        name.push('.');
        name.push_str(ext);
    }
    name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
