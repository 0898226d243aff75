//! Per-request scratch directory
//!
//! A [`WorkingArea`] owns a freshly created directory and everything staged in
//! it. The directory is removed when the area is released or dropped, which
//! covers early returns, panics and cancelled futures alike.

use crate::request::{ResultDocument, RESULT_FILENAME};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};

const DIR_PREFIX: &str = "pdf-swap-";
const FILE_PREFIX: &str = "upload-";
const RESULT_PREFIX: &str = "result-";
const RANDOM_LEN: usize = 12;

/// The filesystem footprint of one request
#[derive(Debug)]
pub struct WorkingArea {
    dir: TempDir,
}

impl WorkingArea {
    /// Create a working area under the system temporary directory.
    pub fn acquire() -> io::Result<Self> {
        Self::acquire_in(std::env::temp_dir())
    }

    /// Create a working area under `base`, creating `base` if needed.
    pub fn acquire_in<P: AsRef<Path>>(base: P) -> io::Result<Self> {
        let base = base.as_ref();
        fs::create_dir_all(base)?;
        let dir = Builder::new()
            .prefix(DIR_PREFIX)
            .rand_bytes(RANDOM_LEN)
            .tempdir_in(base)?;
        tracing::debug!(root = %dir.path().display(), "working area acquired");
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `bytes` under a generated name and return its path.
    ///
    /// `name_hint` only decides whether the `.pdf` suffix is kept.
    pub fn stage(&self, name_hint: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        self.write_file(FILE_PREFIX, suffix_for(name_hint), bytes)
    }

    /// Persist the assembled document next to the uploads.
    pub fn store_result(&self, result: &ResultDocument) -> io::Result<PathBuf> {
        self.write_file(RESULT_PREFIX, suffix_for(RESULT_FILENAME), &result.bytes)
    }

    /// Remove the directory and everything beneath it.
    pub fn release(self) -> io::Result<()> {
        let root = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!(root = %root.display(), "working area released");
        Ok(())
    }

    fn write_file(&self, prefix: &str, suffix: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let mut file = Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .rand_bytes(RANDOM_LEN)
            .tempfile_in(self.dir.path())?;
        file.write_all(bytes)?;
        file.flush()?;
        let (_, path) = file.keep()?;
        Ok(path)
    }
}

fn suffix_for(name_hint: &str) -> &'static str {
    let is_pdf = Path::new(name_hint)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        ".pdf"
    } else {
        ""
    }
}
