//! File naming: sanitise uploaded names and derive the job's other paths.
//!
//! Sanitisation keeps only `[A-Za-z0-9_.-]` after folding the name to ASCII,
//! so whatever a browser sends (paths, spaces, accents, `..`) ends up as a
//! single flat file name inside scratch storage.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").unwrap());

const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3",
];

/// Name used when sanitisation leaves nothing behind.
pub const FALLBACK_STEM: &str = "document";

/// Suffix appended to the source stem for the OCR-enhanced copy.
pub const OCR_SUFFIX: &str = "_ocr";

/// Reduce an arbitrary client-supplied filename to a flat, ASCII-only name.
///
/// Path separators become word breaks, whitespace runs collapse to `_`, any
/// other character outside `[A-Za-z0-9_.-]` is dropped, and leading/trailing
/// `.`/`_` are trimmed. May return an empty string.
pub fn secure_filename(name: &str) -> String {
    let ascii: String = name.nfkd().filter(char::is_ascii).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_CHARS.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_').to_string();

    if cfg!(windows) && !trimmed.is_empty() {
        let head = trimmed.split('.').next().unwrap_or_default().to_ascii_uppercase();
        if WINDOWS_DEVICE_NAMES.contains(&head.as_str()) {
            return format!("_{trimmed}");
        }
    }
    trimmed
}

/// Extension after the last `.`, lowercased. `None` when there is no dot.
pub fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Name under which an accepted upload is stored.
///
/// `ext` is the (already validated) extension of the client's filename. If
/// sanitising stripped the extension, it is put back so the stored source
/// always ends in it; an empty result becomes `document.<ext>`.
pub fn storage_name(client_name: &str, ext: &str) -> String {
    let safe = secure_filename(client_name);
    if safe.is_empty() {
        return format!("{FALLBACK_STEM}.{ext}");
    }
    match extension_of(&safe) {
        Some(e) if e == ext => safe,
        _ => format!("{safe}.{ext}"),
    }
}

/// Output name for a source name: stem with `.docx` appended.
pub fn docx_name_for(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string());
    format!("{stem}.docx")
}

/// `<dir>/<stem>_ocr.pdf` for a source at `<dir>/<stem>.<ext>`.
pub fn ocr_intermediate_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| FALLBACK_STEM.to_string());
    source.with_file_name(format!("{stem}{OCR_SUFFIX}.pdf"))
}

/// True if `name` matches the OCR-intermediate naming pattern.
pub fn is_ocr_intermediate(name: &str) -> bool {
    name.ends_with(&format!("{OCR_SUFFIX}.pdf"))
}

/// True if `name` can be served as-is from scratch storage: non-empty and
/// already in sanitised form, so it cannot climb out of the directory.
pub fn is_servable_name(name: &str) -> bool {
    !name.is_empty() && secure_filename(name) == name
}
