//! Content classification by literal marker search
//!
//! Files are read in fixed-size chunks. Each chunk is searched together with
//! the tail of the previous one (longest marker length minus one byte), so a
//! marker split across two reads is still found.

use rayon::prelude::*;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Markers that make a header or source need a meta-object compile
pub const QT_MARKERS: [&str; 2] = ["Q_OBJECT", "Q_GADGET"];

/// Default read size
pub const DEFAULT_CHUNK_SIZE: usize = 0x1000;

/// Searches byte streams for any of a set of literal markers
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    markers: Vec<Vec<u8>>,
    chunk_size: usize,
}

impl MarkerScanner {
    /// Create a scanner for the given markers; empty markers are ignored
    pub fn new<S: AsRef<[u8]>>(markers: &[S]) -> Self {
        Self {
            markers: markers
                .iter()
                .map(|m| m.as_ref().to_vec())
                .filter(|m| !m.is_empty())
                .collect(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Scanner for the Qt meta-object markers
    pub fn qt() -> Self {
        Self::new(&QT_MARKERS)
    }

    /// Set the read size (at least one byte)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn carry_len(&self) -> usize {
        self.markers
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .saturating_sub(1)
    }

    fn contains_marker(&self, haystack: &[u8]) -> bool {
        self.markers.iter().any(|m| {
            haystack.len() >= m.len() && haystack.windows(m.len()).any(|w| w == m.as_slice())
        })
    }

    /// Scan a reader until a marker is found or the stream ends
    pub fn scan<R: Read>(&self, mut reader: R) -> io::Result<bool> {
        if self.markers.is_empty() {
            return Ok(false);
        }

        let carry = self.carry_len();
        let mut buffer = vec![0u8; self.chunk_size];
        let mut window: Vec<u8> = Vec::with_capacity(carry + self.chunk_size);

        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => return Ok(false),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            window.extend_from_slice(&buffer[..read]);
            if self.contains_marker(&window) {
                return Ok(true);
            }

            let keep = carry.min(window.len());
            window.drain(..window.len() - keep);
        }
    }

    /// Scan a file; an unreadable file is logged and does not qualify
    pub fn scan_file(&self, path: &Path) -> bool {
        match File::open(path).and_then(|f| self.scan(f)) {
            Ok(found) => found,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                false
            }
        }
    }

    /// Scan files in parallel and keep those containing a marker
    ///
    /// The result keeps the input order.
    pub fn filter_files(&self, files: &[PathBuf]) -> Vec<PathBuf> {
        files
            .par_iter()
            .filter(|f| self.scan_file(f))
            .cloned()
            .collect()
    }
}

impl Default for MarkerScanner {
    fn default() -> Self {
        Self::qt()
    }
}
