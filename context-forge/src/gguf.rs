//! GGUF model file validation.
//!
//! A model file is accepted when its first four bytes are the ASCII magic
//! `GGUF`. Nothing else about the format is checked here.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Magic bytes at the start of every GGUF file.
pub const GGUF_MAGIC: &[u8; 4] = b"GGUF";

/// Whether `bytes` starts with the GGUF magic.
pub fn has_gguf_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(GGUF_MAGIC)
}

/// Whether the file at `path` looks like a GGUF model.
///
/// Missing, unreadable and short files are all reported as invalid.
pub fn validate_model_file(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match read_magic(path) {
        Ok(magic) => {
            let valid = has_gguf_magic(&magic);
            debug!(path = %path.display(), valid, "Checked model file magic");
            valid
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "Model file not readable");
            false
        }
    }
}

/// [`validate_model_file`] on a blocking worker.
pub async fn validate_model_file_async(path: impl Into<PathBuf>) -> bool {
    let path = path.into();
    tokio::task::spawn_blocking(move || validate_model_file(path))
        .await
        .unwrap_or(false)
}

fn read_magic(path: &Path) -> std::io::Result<[u8; 4]> {
    let mut magic = [0u8; 4];
    File::open(path)?.read_exact(&mut magic)?;
    Ok(magic)
}
