//! Index writer (§4.10): drives per-document flush to a RAM directory,
//! tracks `SegmentInfos`, and runs the tiered merge policy that
//! periodically coalesces segments into the commit directory. Grounded
//! on the teacher's `Index`/`IndexBuilder` (`index.rs`), which owns the
//! analogous `dir`/analyzer/commit-on-close shape; generalized here to
//! the spec's exact `maybeMerge` tiering algorithm and single-document
//! RAM segment flush.

use log::{debug, info};

use crate::analyzer::Analyzer;
use crate::directory::{Directory, FsDirectory, RamDirectory};
use crate::document::Document;
use crate::error::Result;
use crate::merger::merge_segments;
use crate::options::Options;
use crate::segment::{write_document_segment, SegmentReader};
use crate::segments_file::{DeletableFiles, SegmentInfo, SegmentInfos};

pub struct IndexWriter {
    dir: FsDirectory,
    ram_dir: RamDirectory,
    seg_infos: SegmentInfos,
    deletable: DeletableFiles,
    analyzer: Box<dyn Analyzer>,
    options: Options,
}

impl IndexWriter {
    /// `open(path, analyzer, create)` of §4.10. If `create`, writes an
    /// empty `segments` immediately; otherwise loads the existing one.
    /// Allocates a fresh per-writer temp directory for one-document RAM
    /// segments.
    pub fn open<P: Into<std::path::PathBuf>>(
        path: P,
        analyzer: Box<dyn Analyzer>,
        create: bool,
    ) -> Result<IndexWriter> {
        Self::open_with_options(path, analyzer, create, Options::default())
    }

    pub fn open_with_options<P: Into<std::path::PathBuf>>(
        path: P,
        analyzer: Box<dyn Analyzer>,
        create: bool,
        options: Options,
    ) -> Result<IndexWriter> {
        let dir = FsDirectory::open(path)?;
        let seg_infos = if create {
            let infos = SegmentInfos::new();
            infos.commit(&dir)?;
            infos
        } else {
            SegmentInfos::read(&dir)?
        };
        let ram_dir = RamDirectory::new()?;
        info!(
            "opened index writer at {:?} (create={}, existing segments={})",
            dir.root(),
            create,
            seg_infos.segments.len()
        );
        Ok(IndexWriter {
            dir,
            ram_dir,
            seg_infos,
            deletable: DeletableFiles::new(),
            analyzer,
            options,
        })
    }

    /// `addDocument(doc)` of §4.10: flushes `doc` as a fresh one-document
    /// segment in the RAM directory, registers it, then runs the merge
    /// policy. Leaves `seg_infos` untouched if the flush fails.
    pub fn add_document(&mut self, doc: &Document) -> Result<()> {
        let name = self.seg_infos.next_segment_name();
        debug!("flushing document to RAM segment {}", name);
        let info =
            write_document_segment(&self.ram_dir, &name, doc, self.analyzer.as_ref(), &self.options)?;
        self.seg_infos.segments.push(info);
        self.maybe_merge()
    }

    /// The tiered merge policy of §4.10: repeatedly doubles (by
    /// `MergeFactor`) the target tier size and merges the tail of
    /// `seg_infos` whenever it accumulates at least `target` documents,
    /// stopping once `target` exceeds `MaxMergeDocs` or no tail qualifies.
    fn maybe_merge(&mut self) -> Result<()> {
        let mut target = self.options.merge_factor;
        while target <= self.options.max_merge_docs {
            let n = self.seg_infos.segments.len();
            if n == 0 {
                break;
            }
            let mut accum_docs: i64 = 0;
            let mut min_idx: Option<usize> = None;
            for i in (0..n).rev() {
                accum_docs += i64::from(self.seg_infos.segments[i].doc_count);
                if i64::from(self.seg_infos.segments[i].doc_count) >= target {
                    min_idx = Some(i);
                    break;
                }
            }
            let from = min_idx.map(|i| i + 1).unwrap_or(0);
            if accum_docs >= target {
                self.merge_range(from, n)?;
            } else {
                break;
            }
            target = target.saturating_mul(self.options.merge_factor);
        }
        Ok(())
    }

    /// `mergeRange(from, to)`: merges `seg_infos[from..to]` into one new
    /// segment under `dir`, replaces the merged range with the single
    /// result, and commits a new `segments` file.
    fn merge_range(&mut self, from: usize, to: usize) -> Result<()> {
        let merging: Vec<SegmentInfo> = self.seg_infos.segments[from..to].to_vec();
        info!(
            "merging {} segments ({}..{}) into the commit directory",
            merging.len(),
            from,
            to
        );

        // Each input segment may live in either the RAM directory (a
        // fresh one-document flush) or the commit directory (the result
        // of an earlier merge); open readers against whichever directory
        // actually holds the segment's files.
        let ram_readers: Vec<SegmentReader<'_, RamDirectory>> = merging
            .iter()
            .filter(|info| self.ram_dir.file_exists(&format!("{}.fnm", info.name)))
            .map(|info| SegmentReader::open(&self.ram_dir, &info.name))
            .collect::<Result<_>>()?;
        let dir_readers: Vec<SegmentReader<'_, FsDirectory>> = merging
            .iter()
            .filter(|info| self.dir.file_exists(&format!("{}.fnm", info.name)))
            .map(|info| SegmentReader::open(&self.dir, &info.name))
            .collect::<Result<_>>()?;

        let new_name = format!("{}_merged", merging[0].name);
        let merged_info = if !ram_readers.is_empty() && dir_readers.is_empty() {
            merge_segments(
                &self.dir,
                &ram_readers,
                &new_name,
                self.options.index_interval,
            )?
        } else if ram_readers.is_empty() && !dir_readers.is_empty() {
            merge_segments(
                &self.dir,
                &dir_readers,
                &new_name,
                self.options.index_interval,
            )?
        } else {
            // Mixed RAM/disk merge: copy RAM segments into the commit
            // directory first so every reader shares one `Directory`.
            for info in &merging {
                if self.ram_dir.file_exists(&format!("{}.fnm", info.name)) {
                    self.copy_segment_to_dir(&info.name)?;
                }
            }
            let readers: Vec<SegmentReader<'_, FsDirectory>> = merging
                .iter()
                .map(|info| SegmentReader::open(&self.dir, &info.name))
                .collect::<Result<_>>()?;
            merge_segments(
                &self.dir,
                &readers,
                &new_name,
                self.options.index_interval,
            )?
        };

        self.seg_infos.segments.splice(from..to, [merged_info]);
        self.seg_infos.commit(&self.dir)?;
        info!(
            "committed merged segment {} (now {} segments)",
            new_name,
            self.seg_infos.segments.len()
        );

        self.delete_merged_inputs(&merging)?;
        Ok(())
    }

    /// Best-effort cleanup of a just-merged segment's files, per §6:
    /// anything that cannot be removed immediately (still open elsewhere,
    /// permission denied, etc.) is recorded in `deletable` rather than
    /// treated as a merge failure.
    fn delete_merged_inputs(&mut self, merging: &[SegmentInfo]) -> Result<()> {
        let mut newly_undeletable = Vec::new();
        for info in merging {
            let ram_files = self.ram_dir.list_segment_files(&info.name)?;
            for file_name in &ram_files {
                if self.ram_dir.remove_file(file_name).is_err() {
                    newly_undeletable.push(file_name.clone());
                }
            }
            let dir_files = self.dir.list_segment_files(&info.name)?;
            for file_name in &dir_files {
                if self.dir.remove_file(file_name).is_err() {
                    newly_undeletable.push(file_name.clone());
                }
            }
        }
        if !newly_undeletable.is_empty() {
            for name in newly_undeletable {
                self.deletable.push(name);
            }
            self.deletable.commit(&self.dir)?;
        }
        Ok(())
    }

    fn copy_segment_to_dir(&self, segment_name: &str) -> Result<()> {
        for file_name in self.ram_dir.list_segment_files(segment_name)? {
            let mut input = self.ram_dir.open_input(&file_name)?;
            let mut output = self.dir.create_output(&file_name)?;
            std::io::copy(&mut input, &mut output)?;
            use std::io::Write;
            output.flush()?;
        }
        Ok(())
    }

    /// `close()`: force-merges every remaining segment into `dir`
    /// regardless of tier policy, then commits.
    pub fn close(mut self) -> Result<()> {
        let n = self.seg_infos.segments.len();
        if n > 0 {
            self.merge_range(0, n)?;
        } else {
            self.seg_infos.commit(&self.dir)?;
        }
        info!("index writer closed, {} segments committed", self.seg_infos.segments.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::KeywordAnalyzer;
    use crate::document::Field;
    use crate::segments_file::SegmentInfos;
    use tempfile::TempDir;

    #[test]
    fn e1_empty_index_commits_zero_segments() {
        let tmp = TempDir::new().unwrap();
        let writer = IndexWriter::open(tmp.path(), Box::new(KeywordAnalyzer), true).unwrap();
        writer.close().unwrap();

        let dir = FsDirectory::open(tmp.path()).unwrap();
        let infos = SegmentInfos::read(&dir).unwrap();
        assert_eq!(0, infos.counter);
        assert_eq!(0, infos.segments.len());
    }

    #[test]
    fn e2_single_document_round_trips_after_close() {
        let tmp = TempDir::new().unwrap();
        let mut writer = IndexWriter::open(tmp.path(), Box::new(KeywordAnalyzer), true).unwrap();
        writer
            .add_document(&Document::new().add(Field::keyword("path", "/etc/test.txt")))
            .unwrap();
        writer.close().unwrap();

        let dir = FsDirectory::open(tmp.path()).unwrap();
        let infos = SegmentInfos::read(&dir).unwrap();
        assert_eq!(1, infos.segments.len());
        assert_eq!(1, infos.segments[0].doc_count);

        let reader = SegmentReader::open(&dir, &infos.segments[0].name).unwrap();
        assert_eq!(1, reader.max_doc());
        assert_eq!("/etc/test.txt", reader.doc(0).unwrap().fields[0].value);
    }

    #[test]
    fn e4_merge_tier_trigger_collapses_ten_docs() {
        let tmp = TempDir::new().unwrap();
        let mut options = Options::default();
        options.merge_factor = 10;
        let mut writer =
            IndexWriter::open_with_options(tmp.path(), Box::new(KeywordAnalyzer), true, options)
                .unwrap();

        for i in 0..10 {
            writer
                .add_document(&Document::new().add(Field::keyword("id", format!("doc{}", i))))
                .unwrap();
        }
        writer.close().unwrap();

        let dir = FsDirectory::open(tmp.path()).unwrap();
        let infos = SegmentInfos::read(&dir).unwrap();
        assert_eq!(1, infos.segments.len());
        assert_eq!(10, infos.segments[0].doc_count);
    }
}
