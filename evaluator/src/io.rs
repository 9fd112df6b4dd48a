//! Text input helpers

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::{EvalError, EvalResult};

/// Open a text file for buffered reading, transparently decompressing
/// gzip input (detected by a `.gz` extension).
pub fn open_text(path: &Path) -> EvalResult<Box<dyn BufRead>> {
    let file = File::open(path)
        .map_err(|e| EvalError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Whether the path names a gzip file
pub fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}
