//! The index-level commit files (§6): `segments` (the commit anchor) and
//! `deletable` (files the writer could not remove immediately). Grounded
//! on the teacher's `index.rs` `IndexMeta`/commit-file handling, which
//! writes a `*.new` file and renames it over the final name; generalized
//! here to the spec's exact `segments`/`deletable` binary layouts.

use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::io::{FixedWidthExt, FixedWidthReadExt, StrataReadExt, StrataWriteExt};

/// A format-version prefix ahead of `counter`, resolving §9's open
/// question in favor of a forward-compatible `segments` file; see
/// DESIGN.md.
const SEGMENTS_FORMAT: i32 = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentInfo {
    pub name: String,
    pub doc_count: u32,
}

#[derive(Clone, Debug, Default)]
pub struct SegmentInfos {
    pub counter: u32,
    pub segments: Vec<SegmentInfo>,
}

impl SegmentInfos {
    pub fn new() -> SegmentInfos {
        SegmentInfos {
            counter: 0,
            segments: Vec::new(),
        }
    }

    pub fn next_segment_name(&mut self) -> String {
        self.counter += 1;
        format!("_{}", self.counter)
    }

    /// Writes `segments.new` then renames it over `segments` — the
    /// commit protocol of §6, the sole linearization point of the index.
    pub fn commit<D: Directory>(&self, dir: &D) -> Result<()> {
        {
            let mut out = dir.create_output("segments.new")?;
            out.write_fixed_i32(SEGMENTS_FORMAT)?;
            out.write_fixed_i32(self.counter as i32)?;
            out.write_fixed_i32(self.segments.len() as i32)?;
            for info in &self.segments {
                out.write_string(&info.name)?;
                out.write_fixed_i32(info.doc_count as i32)?;
            }
            use std::io::Write;
            out.flush()?;
        }
        dir.rename("segments.new", "segments")
    }

    pub fn read<D: Directory>(dir: &D) -> Result<SegmentInfos> {
        let mut input = dir.open_input("segments")?;
        let format = input.read_fixed_i32()?;
        if format != SEGMENTS_FORMAT {
            return Err(Error::CorruptFormat(format!(
                "unsupported segments format {}",
                format
            )));
        }
        let counter = input.read_fixed_i32()?;
        if counter < 0 {
            return Err(Error::CorruptFormat("negative segments counter".into()));
        }
        let seg_count = input.read_fixed_i32()?;
        if seg_count < 0 {
            return Err(Error::CorruptFormat("negative segCount".into()));
        }
        let mut segments = Vec::with_capacity(seg_count as usize);
        for _ in 0..seg_count {
            let name = input.read_string()?;
            let doc_count = input.read_fixed_i32()?;
            if doc_count < 0 {
                return Err(Error::CorruptFormat("negative docCount".into()));
            }
            segments.push(SegmentInfo {
                name,
                doc_count: doc_count as u32,
            });
        }
        Ok(SegmentInfos {
            counter: counter as u32,
            segments,
        })
    }
}

/// Names the writer failed to delete immediately — typically because a
/// handle to the file was still open elsewhere. No retry is attempted
/// across restarts; see DESIGN.md.
#[derive(Clone, Debug, Default)]
pub struct DeletableFiles {
    pub names: Vec<String>,
}

impl DeletableFiles {
    pub fn new() -> DeletableFiles {
        DeletableFiles { names: Vec::new() }
    }

    pub fn push(&mut self, name: String) {
        self.names.push(name);
    }

    pub fn commit<D: Directory>(&self, dir: &D) -> Result<()> {
        {
            let mut out = dir.create_output("deletable.new")?;
            out.write_fixed_i32(self.names.len() as i32)?;
            for name in &self.names {
                out.write_string(name)?;
            }
            use std::io::Write;
            out.flush()?;
        }
        dir.rename("deletable.new", "deletable")
    }

    pub fn read<D: Directory>(dir: &D) -> Result<DeletableFiles> {
        let mut input = dir.open_input("deletable")?;
        let count = input.read_fixed_i32()?;
        if count < 0 {
            return Err(Error::CorruptFormat("negative deletable count".into()));
        }
        let mut names = Vec::with_capacity(count as usize);
        for _ in 0..count {
            names.push(input.read_string()?);
        }
        Ok(DeletableFiles { names })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::FsDirectory;
    use tempfile::TempDir;

    #[test]
    fn e1_empty_index_commits_zero_segments() {
        let tmp = TempDir::new().unwrap();
        let dir = FsDirectory::open(tmp.path()).unwrap();
        let infos = SegmentInfos::new();
        infos.commit(&dir).unwrap();

        let read_back = SegmentInfos::read(&dir).unwrap();
        assert_eq!(0, read_back.counter);
        assert_eq!(0, read_back.segments.len());
    }

    #[test]
    fn round_trips_populated_segments_file() {
        let tmp = TempDir::new().unwrap();
        let dir = FsDirectory::open(tmp.path()).unwrap();
        let mut infos = SegmentInfos::new();
        let name = infos.next_segment_name();
        infos.segments.push(SegmentInfo {
            name,
            doc_count: 1,
        });
        infos.commit(&dir).unwrap();

        let read_back = SegmentInfos::read(&dir).unwrap();
        assert_eq!(1, read_back.counter);
        assert_eq!(1, read_back.segments.len());
        assert_eq!("_1", read_back.segments[0].name);
    }

    #[test]
    fn rejects_unsupported_format() {
        let tmp = TempDir::new().unwrap();
        let dir = FsDirectory::open(tmp.path()).unwrap();
        {
            let mut out = dir.create_output("segments").unwrap();
            out.write_fixed_i32(99).unwrap();
            use std::io::Write;
            out.flush().unwrap();
        }
        match SegmentInfos::read(&dir) {
            Err(Error::CorruptFormat(_)) => {}
            other => panic!("expected CorruptFormat, got {:?}", other),
        }
    }

    #[test]
    fn deletable_round_trips() {
        let tmp = TempDir::new().unwrap();
        let dir = FsDirectory::open(tmp.path()).unwrap();
        let mut deletable = DeletableFiles::new();
        deletable.push("_1.frq".to_string());
        deletable.commit(&dir).unwrap();

        let read_back = DeletableFiles::read(&dir).unwrap();
        assert_eq!(vec!["_1.frq".to_string()], read_back.names);
    }
}
