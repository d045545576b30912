//! Segment reader and per-document writer pipeline (§4.8 + the flush half
//! of §4.10). Grounded on the teacher's `seg.rs` `SegWriter`/`SegReader`,
//! which compose exactly this set of sibling files under one segment
//! name; generalized here to the spec's file suffix table (`.fnm`,
//! `.fdt`/`.fdx`, `.tis`/`.tii`, `.frq`/`.prx`, `.fN`).

use crate::analyzer::Analyzer;
use crate::directory::Directory;
use crate::dict::{TermDictReader, TermDictWriter, TermInfo};
use crate::document::Document;
use crate::error::Result;
use crate::fieldinfos::FieldInfos;
use crate::freqpos::{FreqPosReader, FreqPosWriter};
use crate::norms::{NormsReader, NormsWriter};
use crate::options::Options;
use crate::postings::PostingAccumulator;
use crate::segments_file::SegmentInfo;
use crate::stored::{StoredFieldsReader, StoredFieldsWriter};

/// Runs the per-document flush pipeline of §4.10's `addDocument`: invert
/// `doc`, then emit every sibling file of a one-document segment. Returns
/// the `SegmentInfo` the caller appends to `segInfos`.
pub fn write_document_segment<D: Directory>(
    dir: &D,
    segment_name: &str,
    doc: &Document,
    analyzer: &dyn Analyzer,
    options: &Options,
) -> Result<SegmentInfo> {
    let mut field_infos = FieldInfos::new();
    let mut accumulator = PostingAccumulator::new();
    accumulator.invert(doc, &mut field_infos, analyzer, options);

    field_infos.write(dir, &format!("{}.fnm", segment_name))?;

    let mut stored = StoredFieldsWriter::new(dir, segment_name)?;
    stored.add_document(&field_infos, doc)?;
    stored.close()?;

    let mut freqpos = FreqPosWriter::new(dir, segment_name)?;
    let mut dict = TermDictWriter::new(dir, segment_name, options.index_interval)?;
    for posting in accumulator.into_sorted_postings() {
        let field_number = field_infos.get_number(&posting.term.field)?;
        let doc_freq = 1; // one document per segment at this stage
        let (frq_ptr, prx_ptr) = freqpos.write_posting(&posting)?;
        dict.add_term(
            &posting.term,
            field_number,
            TermInfo {
                doc_freq,
                frq_ptr,
                prx_ptr,
            },
        )?;
    }
    freqpos.close()?;
    dict.close()?;

    let mut norms = NormsWriter::new(dir, segment_name);
    for info in field_infos.iter() {
        if !info.indexed {
            continue;
        }
        let length = accumulator.field_length(info.number);
        if length > 0 {
            norms.add_norm(info.number, length)?;
        }
    }
    norms.close()?;

    Ok(SegmentInfo {
        name: segment_name.to_string(),
        doc_count: 1,
    })
}

/// A fully opened segment: every sibling file of §4.8, ready for either
/// point lookups (`doc`) or full-stream access (merging).
pub struct SegmentReader<'a, D: Directory> {
    pub field_infos: FieldInfos,
    stored: StoredFieldsReader<'a, D>,
    dict: TermDictReader,
    freqpos: FreqPosReader<'a, D>,
    norms: NormsReader<'a, D>,
    max_doc: u64,
}

impl<'a, D: Directory> SegmentReader<'a, D> {
    pub fn open(dir: &'a D, segment_name: &str) -> Result<Self> {
        let field_infos = FieldInfos::read(dir, &format!("{}.fnm", segment_name))?;
        let stored = StoredFieldsReader::open(dir, segment_name)?;
        let max_doc = stored.max_doc()?;
        let dict = TermDictReader::open(dir, segment_name, |n| {
            field_infos.by_number(n).map(|info| info.name.clone())
        })?;
        let freqpos = FreqPosReader::open(dir, segment_name)?;
        let norms = NormsReader::open(dir, segment_name);
        Ok(SegmentReader {
            field_infos,
            stored,
            dict,
            freqpos,
            norms,
            max_doc,
        })
    }

    pub fn max_doc(&self) -> u64 {
        self.max_doc
    }

    pub fn doc(&self, n: u64) -> Result<Document> {
        self.stored.doc(&self.field_infos, n)
    }

    pub fn terms(&self) -> &[crate::term::Term] {
        &self.dict.terms
    }

    pub fn term_infos(&self) -> &[TermInfo] {
        &self.dict.term_infos
    }

    pub fn field_numbers(&self) -> &[u32] {
        &self.dict.field_numbers
    }

    /// The `.tii` skip index's terms, materialized the same way
    /// `terms()`/`term_infos()` materialize `.tis` — used by merge-time
    /// code that needs the sparse index rather than the full term stream.
    pub fn tii_terms(&self) -> &[crate::term::Term] {
        &self.dict.tii_terms
    }

    pub fn tii_term_infos(&self) -> &[TermInfo] {
        &self.dict.tii_term_infos
    }

    /// `.tis` byte offset each `.tii` entry points at.
    pub fn tii_ptrs(&self) -> &[u64] {
        &self.dict.tii_ptrs
    }

    pub fn read_positions(&self, prx_ptr: u64, freq: u32) -> Result<Vec<u64>> {
        self.freqpos.read_positions(prx_ptr, freq)
    }

    /// Decodes the full multi-document run for one term — used by the
    /// merger to recover every document's local doc-id and positions so
    /// they can be re-based and rewritten under merged doc-deltas.
    pub fn read_term_postings(
        &self,
        frq_ptr: u64,
        prx_ptr: u64,
        doc_freq: u32,
    ) -> Result<Vec<(u64, Vec<u64>)>> {
        self.freqpos.read_term_postings(frq_ptr, prx_ptr, doc_freq)
    }

    pub fn norm_stream(&self, field_number: u32) -> Result<Option<Vec<u8>>> {
        self.norms.norm_stream(field_number)
    }
}
