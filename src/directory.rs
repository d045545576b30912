//! Directory abstraction (§4.0): a generalization of the teacher's
//! `SegmentAddress` (`seg.rs`), which opened `{name}.{suffix}` files
//! directly against a `PathBuf`. Every segment file named in §6's suffix
//! table is opened through this trait, never through a raw
//! `File::create`/`File::open` call in the segment-format modules, so
//! `FsDirectory` (the commit directory) and `RamDirectory` (the per-writer
//! scratch directory of §4.10) share one code path.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

pub type Output = BufWriter<File>;
pub type Input = BufReader<File>;

pub trait Directory: Send + Sync {
    fn root(&self) -> &Path;

    fn create_output(&self, file_name: &str) -> Result<Output> {
        let path = self.root().join(file_name);
        Ok(BufWriter::new(File::create(path)?))
    }

    fn open_input(&self, file_name: &str) -> Result<Input> {
        let path = self.root().join(file_name);
        Ok(BufReader::new(File::open(path)?))
    }

    /// Opens a file for in-place rewrite (seek back to overwrite a
    /// placeholder header, as `.tis`/`.tii` do for their entry count).
    fn open_read_write(&self, file_name: &str) -> Result<File> {
        let path = self.root().join(file_name);
        Ok(OpenOptions::new().read(true).write(true).open(path)?)
    }

    fn file_exists(&self, file_name: &str) -> bool {
        self.root().join(file_name).exists()
    }

    fn file_len(&self, file_name: &str) -> Result<u64> {
        Ok(fs::metadata(self.root().join(file_name))?.len())
    }

    fn remove_file(&self, file_name: &str) -> Result<()> {
        Ok(fs::remove_file(self.root().join(file_name))?)
    }

    /// Commit protocol of §6: write `tmp_name` completely, close it
    /// (the caller is responsible for that), then rename it over
    /// `final_name`. The rename is the linearization point.
    fn rename(&self, tmp_name: &str, final_name: &str) -> Result<()> {
        let root = self.root();
        Ok(fs::rename(root.join(tmp_name), root.join(final_name))?)
    }

    fn list_segment_files(&self, segment_name: &str) -> Result<Vec<String>> {
        let prefix = format!("{}.", segment_name);
        let mut names = Vec::new();
        for entry in walkdir::WalkDir::new(self.root())
            .min_depth(1)
            .max_depth(1)
        {
            let entry = entry.map_err(|e| {
                crate::error::Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
            })?;
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(&prefix) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }
}

/// The on-disk commit directory (`dir` in §4.10).
pub struct FsDirectory {
    path: PathBuf,
}

impl FsDirectory {
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<FsDirectory> {
        let path = path.into();
        fs::create_dir_all(&path)?;
        Ok(FsDirectory { path })
    }
}

impl Directory for FsDirectory {
    fn root(&self) -> &Path {
        &self.path
    }
}

/// The per-writer scratch directory for one-document RAM segments
/// (`ramDir` in §4.10). Backed by a real temp directory rather than an
/// in-process byte store: §4.10 calls `ramDir` "a unique temp directory",
/// and keeping every `Directory` implementation path-based lets the
/// segment writer/reader/merger code stay oblivious to which directory
/// flavor they were handed.
pub struct RamDirectory {
    temp: TempDir,
}

impl RamDirectory {
    pub fn new() -> Result<RamDirectory> {
        Ok(RamDirectory {
            temp: tempfile::Builder::new().prefix("strata-ram-").tempdir()?,
        })
    }
}

impl Directory for RamDirectory {
    fn root(&self) -> &Path {
        self.temp.path()
    }
}
