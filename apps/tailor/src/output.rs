use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use crate::errors::AppError;
use crate::models::resume::ResumeRecord;

/// Reads and parses a resume content file, keeping the raw text for fallback.
pub fn load_content(path: &Path) -> Result<(String, ResumeRecord), AppError> {
    let text = std::fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Ok((text, ResumeRecord::default()));
    }
    let record = serde_yaml::from_str(&text)?;
    Ok((text, record))
}

pub fn read_text(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes through a temp file in the destination directory, then renames over `path`.
pub fn write_atomically(path: &Path, contents: &str) -> Result<(), AppError> {
    let write_error = |source| AppError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(contents.as_bytes()).map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;

    info!("Wrote {}", path.display());
    Ok(())
}
