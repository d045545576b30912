//! Term dictionary (§4.5): `.tis` holds every term, prefix-compressed
//! against its predecessor; `.tii` holds a sparse skip index, one entry
//! per `IndexInterval`-th term. Grounded on the teacher's `seg.rs`
//! `SegReader`/`SegWriter` term-stream handling (shared-prefix VInt
//! coding over a sorted term stream), re-architected per §9's recommended
//! "single writer, two streams" shape rather than the source's
//! cyclic `TermsWriter`/`FormatWriter` pair — there is exactly one
//! `TermDictWriter`, which itself decides (by entry count) when to also
//! write a `.tii` entry. The `.tii` stream keeps its own running
//! "last entry" (term, term info, `.tis` pointer) separate from `.tis`'s,
//! so its shared-prefix and delta-pointer fields compress against the
//! previously *mirrored* entry, not against `.tis`'s last entry — this
//! matches the original `TermsWriter`'s pair of independently-tracked
//! writers (`examples/original_source/core/termsWriter.go`), just
//! folded into one struct instead of two cyclically-linked ones.

use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::io::{FixedWidthExt, FixedWidthReadExt, StrataReadExt, StrataWriteExt};
use crate::term::{shared_prefix_len, Term};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TermInfo {
    pub doc_freq: u32,
    pub frq_ptr: u64,
    pub prx_ptr: u64,
}

/// Encodes a non-negative VLong, returning the byte count written —
/// `.tii`'s `deltaTisPointer` entries need an accurate running `.tis`
/// size, and a `BufWriter`'s backing file length lags behind what has
/// actually been handed to `write_vlong` (see freqpos.rs).
fn write_vlong_counted<W: std::io::Write>(w: &mut W, value: i64) -> Result<u64> {
    let mut v = value as u64;
    let mut count = 0u64;
    loop {
        if v & !0x7Fu64 == 0 {
            w.write_all(&[v as u8])?;
            return Ok(count + 1);
        }
        w.write_all(&[((v & 0x7F) | 0x80) as u8])?;
        v >>= 7;
        count += 1;
    }
}

fn write_vint_counted<W: std::io::Write>(w: &mut W, value: i32) -> Result<u64> {
    write_vlong_counted(w, i64::from(value))
}

struct PendingEntry {
    term: Term,
    field_number: u32,
    ti: TermInfo,
    tis_ptr: u64,
}

pub struct TermDictWriter<'a, D: Directory> {
    tis: crate::directory::Output,
    tii: crate::directory::Output,
    tis_name: String,
    tii_name: String,
    dir: &'a D,
    index_interval: u32,
    entry_count: u32,
    tii_entry_count: u32,
    tis_size: u64,
    last_tii_tis_ptr: u64,
    last: Option<PendingEntry>,
    last_tii: Option<PendingEntry>,
}

impl<'a, D: Directory> TermDictWriter<'a, D> {
    pub fn new(dir: &'a D, segment_name: &str, index_interval: u32) -> Result<Self> {
        let tis_name = format!("{}.tis", segment_name);
        let tii_name = format!("{}.tii", segment_name);
        let mut tis = dir.create_output(&tis_name)?;
        let mut tii = dir.create_output(&tii_name)?;
        // Placeholder entry counts, rewritten by close().
        tis.write_fixed_i32(0)?;
        tii.write_fixed_i32(0)?;
        Ok(TermDictWriter {
            tis,
            tii,
            tis_name,
            tii_name,
            dir,
            index_interval,
            entry_count: 0,
            tii_entry_count: 0,
            tis_size: 4,
            last_tii_tis_ptr: 0,
            last: None,
            last_tii: None,
        })
    }

    /// Appends one `(term, field_number, term_info)` entry. Enforces the
    /// three ordering invariants of §4.5 against the previous entry.
    pub fn add_term(&mut self, term: &Term, field_number: u32, ti: TermInfo) -> Result<()> {
        if let Some(ref last) = self.last {
            if *term <= last.term {
                return Err(Error::TermOutOfOrder);
            }
            if ti.frq_ptr < last.ti.frq_ptr {
                return Err(Error::FreqPtrOutOfOrder);
            }
            if ti.prx_ptr < last.ti.prx_ptr {
                return Err(Error::PrxPtrOutOfOrder);
            }
        }

        let tis_ptr = self.tis_size;
        let shared = match self.last {
            Some(ref last) if last.term.field == term.field => {
                shared_prefix_len(&last.term.text, &term.text)
            }
            _ => 0,
        };
        let suffix = term.text.as_bytes()[shared..].to_vec();
        let last_frq_ptr = self.last.as_ref().map(|l| l.ti.frq_ptr).unwrap_or(0);
        let last_prx_ptr = self.last.as_ref().map(|l| l.ti.prx_ptr).unwrap_or(0);

        let mut written = 0u64;
        written += write_vint_counted(&mut self.tis, shared as i32)?;
        written += write_vint_counted(&mut self.tis, suffix.len() as i32)?;
        self.tis.write_all(&suffix)?;
        written += suffix.len() as u64;
        written += write_vint_counted(&mut self.tis, field_number as i32)?;
        written += write_vint_counted(&mut self.tis, ti.doc_freq as i32)?;
        written += write_vlong_counted(&mut self.tis, (ti.frq_ptr - last_frq_ptr) as i64)?;
        written += write_vlong_counted(&mut self.tis, (ti.prx_ptr - last_prx_ptr) as i64)?;

        self.tis_size += written;

        // Mirror this entry into .tii whenever its 0-indexed position is a
        // multiple of the index interval — this is what guarantees .tii
        // ends up with exactly ceil(numTerms / IndexInterval) entries, each
        // one a real .tis term rather than a synthetic boundary marker.
        if self.entry_count % self.index_interval == 0 {
            self.write_tii_entry(term, field_number, &ti, tis_ptr)?;
        }

        self.entry_count += 1;
        self.last = Some(PendingEntry {
            term: term.clone(),
            field_number,
            ti,
            tis_ptr,
        });
        Ok(())
    }

    /// Appends one `.tii` entry, prefix- and delta-compressed against the
    /// previously *mirrored* `.tii` entry — not against `.tis`'s last
    /// entry. This mirrors the original `TermsWriter`'s symmetric design,
    /// where the index stream keeps its own running `lastTerm`/`lastTi`.
    fn write_tii_entry(
        &mut self,
        term: &Term,
        field_number: u32,
        ti: &TermInfo,
        tis_ptr: u64,
    ) -> Result<()> {
        let shared = match self.last_tii {
            Some(ref last) if last.term.field == term.field => {
                shared_prefix_len(&last.term.text, &term.text)
            }
            _ => 0,
        };
        let suffix = term.text.as_bytes()[shared..].to_vec();
        let last_frq_ptr = self.last_tii.as_ref().map(|l| l.ti.frq_ptr).unwrap_or(0);
        let last_prx_ptr = self.last_tii.as_ref().map(|l| l.ti.prx_ptr).unwrap_or(0);

        self.tii.write_vint(shared as i32)?;
        self.tii.write_vint(suffix.len() as i32)?;
        self.tii.write_all(&suffix)?;
        self.tii.write_vint(field_number as i32)?;
        self.tii.write_vint(ti.doc_freq as i32)?;
        self.tii.write_vlong((ti.frq_ptr - last_frq_ptr) as i64)?;
        self.tii.write_vlong((ti.prx_ptr - last_prx_ptr) as i64)?;
        self.tii
            .write_vlong((tis_ptr - self.last_tii_tis_ptr) as i64)?;
        self.last_tii_tis_ptr = tis_ptr;
        self.last_tii = Some(PendingEntry {
            term: term.clone(),
            field_number,
            ti: *ti,
            tis_ptr,
        });
        self.tii_entry_count += 1;
        Ok(())
    }

    pub fn close(mut self) -> Result<()> {
        use std::io::{Seek, SeekFrom, Write};
        self.tis.flush()?;
        self.tii.flush()?;
        drop(self.tis);
        drop(self.tii);

        let mut tis_rw = self.dir.open_read_write(&self.tis_name)?;
        tis_rw.seek(SeekFrom::Start(0))?;
        tis_rw.write_fixed_i32(self.entry_count as i32)?;

        let mut tii_rw = self.dir.open_read_write(&self.tii_name)?;
        tii_rw.seek(SeekFrom::Start(0))?;
        tii_rw.write_fixed_i32(self.tii_entry_count as i32)?;
        Ok(())
    }
}

/// The fully materialized in-memory view required by §4.8: merging reads
/// every term up front rather than streaming, so the reader simply loads
/// both `.tis` and `.tii` into parallel vectors on `open`.
pub struct TermDictReader {
    pub terms: Vec<Term>,
    pub term_infos: Vec<TermInfo>,
    pub field_numbers: Vec<u32>,
    /// Byte offset of each `.tis` entry, in the same file positions
    /// `TermDictWriter` recorded as `tis_ptr` while writing.
    pub tis_ptrs: Vec<u64>,
    pub tii_terms: Vec<Term>,
    pub tii_term_infos: Vec<TermInfo>,
    /// `.tis` offset each `.tii` entry points at.
    pub tii_ptrs: Vec<u64>,
}

impl TermDictReader {
    /// `field_name_of` resolves a `.tis`/`.tii` field number back to a
    /// name — ordinarily `FieldInfos::by_number`.
    pub fn open<D: Directory>(
        dir: &D,
        segment_name: &str,
        field_name_of: impl Fn(u32) -> Option<String>,
    ) -> Result<Self> {
        use std::io::{Read, Seek};

        let mut tis = dir.open_input(&format!("{}.tis", segment_name))?;
        let count = tis.read_fixed_i32()?;
        if count < 0 {
            return Err(Error::CorruptFormat("negative .tis entry count".into()));
        }
        let mut terms = Vec::with_capacity(count as usize);
        let mut term_infos = Vec::with_capacity(count as usize);
        let mut field_numbers = Vec::with_capacity(count as usize);
        let mut tis_ptrs = Vec::with_capacity(count as usize);
        let mut last_text = String::new();
        let mut last_frq_ptr = 0u64;
        let mut last_prx_ptr = 0u64;

        for _ in 0..count {
            let entry_ptr = tis.stream_position()?;
            let shared = tis.read_vint()? as usize;
            let suffix_len = tis.read_vint()? as usize;
            let mut suffix = vec![0u8; suffix_len];
            tis.read_exact(&mut suffix)?;
            let mut text_bytes = last_text.as_bytes()[..shared].to_vec();
            text_bytes.extend_from_slice(&suffix);
            let text = String::from_utf8(text_bytes).map_err(|e| Error::CorruptFormat(e.to_string()))?;

            let field_number = tis.read_vint()? as u32;
            let doc_freq = tis.read_vint()? as u32;
            let delta_frq = tis.read_vlong()? as u64;
            let delta_prx = tis.read_vlong()? as u64;
            let frq_ptr = last_frq_ptr + delta_frq;
            let prx_ptr = last_prx_ptr + delta_prx;

            let field = field_name_of(field_number)
                .ok_or_else(|| Error::CorruptFormat("unknown field number in .tis".into()))?;

            terms.push(Term::new(field, text.clone()));
            term_infos.push(TermInfo {
                doc_freq,
                frq_ptr,
                prx_ptr,
            });
            field_numbers.push(field_number);
            tis_ptrs.push(entry_ptr);

            last_text = text;
            last_frq_ptr = frq_ptr;
            last_prx_ptr = prx_ptr;
        }

        let mut tii = dir.open_input(&format!("{}.tii", segment_name))?;
        let tii_count = tii.read_fixed_i32()?;
        if tii_count < 0 {
            return Err(Error::CorruptFormat("negative .tii entry count".into()));
        }
        let mut tii_terms = Vec::with_capacity(tii_count as usize);
        let mut tii_term_infos = Vec::with_capacity(tii_count as usize);
        let mut tii_ptrs = Vec::with_capacity(tii_count as usize);
        let mut last_text = String::new();
        let mut last_frq_ptr = 0u64;
        let mut last_prx_ptr = 0u64;
        let mut last_tis_ptr = 0u64;

        for _ in 0..tii_count {
            let shared = tii.read_vint()? as usize;
            let suffix_len = tii.read_vint()? as usize;
            let mut suffix = vec![0u8; suffix_len];
            tii.read_exact(&mut suffix)?;
            let mut text_bytes = last_text.as_bytes()[..shared].to_vec();
            text_bytes.extend_from_slice(&suffix);
            let text = String::from_utf8(text_bytes).map_err(|e| Error::CorruptFormat(e.to_string()))?;

            let field_number = tii.read_vint()? as u32;
            let doc_freq = tii.read_vint()? as u32;
            let delta_frq = tii.read_vlong()? as u64;
            let delta_prx = tii.read_vlong()? as u64;
            let delta_tis_ptr = tii.read_vlong()? as u64;
            let frq_ptr = last_frq_ptr + delta_frq;
            let prx_ptr = last_prx_ptr + delta_prx;
            let tis_ptr = last_tis_ptr + delta_tis_ptr;

            let field = field_name_of(field_number)
                .ok_or_else(|| Error::CorruptFormat("unknown field number in .tii".into()))?;

            tii_terms.push(Term::new(field, text.clone()));
            tii_term_infos.push(TermInfo {
                doc_freq,
                frq_ptr,
                prx_ptr,
            });
            tii_ptrs.push(tis_ptr);

            last_text = text;
            last_frq_ptr = frq_ptr;
            last_prx_ptr = prx_ptr;
            last_tis_ptr = tis_ptr;
        }

        Ok(TermDictReader {
            terms,
            term_infos,
            field_numbers,
            tis_ptrs,
            tii_terms,
            tii_term_infos,
            tii_ptrs,
        })
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::FsDirectory;
    use tempfile::TempDir;

    #[test]
    fn round_trips_sorted_terms() {
        let tmp = TempDir::new().unwrap();
        let dir = FsDirectory::open(tmp.path()).unwrap();

        let mut writer = TermDictWriter::new(&dir, "_1", 128).unwrap();
        let entries = vec![
            (
                Term::new("body", "dog"),
                0u32,
                TermInfo {
                    doc_freq: 1,
                    frq_ptr: 0,
                    prx_ptr: 0,
                },
            ),
            (
                Term::new("body", "fox"),
                0u32,
                TermInfo {
                    doc_freq: 1,
                    frq_ptr: 1,
                    prx_ptr: 3,
                },
            ),
            (
                Term::new("body", "the"),
                0u32,
                TermInfo {
                    doc_freq: 1,
                    frq_ptr: 2,
                    prx_ptr: 6,
                },
            ),
        ];
        for (term, field_number, ti) in &entries {
            writer.add_term(term, *field_number, *ti).unwrap();
        }
        writer.close().unwrap();

        let reader = TermDictReader::open(&dir, "_1", |n| {
            if n == 0 {
                Some("body".to_string())
            } else {
                None
            }
        })
        .unwrap();
        assert_eq!(3, reader.len());
        assert_eq!(entries[0].0, reader.terms[0]);
        assert_eq!(entries[2].0, reader.terms[2]);
        assert_eq!(entries[1].2, reader.term_infos[1]);
    }

    #[test]
    fn out_of_order_term_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let dir = FsDirectory::open(tmp.path()).unwrap();
        let mut writer = TermDictWriter::new(&dir, "_1", 128).unwrap();
        writer
            .add_term(
                &Term::new("body", "the"),
                0,
                TermInfo {
                    doc_freq: 1,
                    frq_ptr: 0,
                    prx_ptr: 0,
                },
            )
            .unwrap();
        let err = writer
            .add_term(
                &Term::new("body", "aardvark"),
                0,
                TermInfo {
                    doc_freq: 1,
                    frq_ptr: 1,
                    prx_ptr: 1,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::TermOutOfOrder));
    }

    #[test]
    fn out_of_order_frq_pointer_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let dir = FsDirectory::open(tmp.path()).unwrap();
        let mut writer = TermDictWriter::new(&dir, "_1", 128).unwrap();
        writer
            .add_term(
                &Term::new("body", "dog"),
                0,
                TermInfo {
                    doc_freq: 1,
                    frq_ptr: 5,
                    prx_ptr: 5,
                },
            )
            .unwrap();
        let err = writer
            .add_term(
                &Term::new("body", "fox"),
                0,
                TermInfo {
                    doc_freq: 1,
                    frq_ptr: 1,
                    prx_ptr: 6,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::FreqPtrOutOfOrder));
    }

    #[test]
    fn skip_index_has_expected_entry_count() {
        let tmp = TempDir::new().unwrap();
        let dir = FsDirectory::open(tmp.path()).unwrap();
        let mut writer = TermDictWriter::new(&dir, "_1", 2).unwrap();
        for i in 0..5u32 {
            let term = Term::new("body", format!("term{:03}", i));
            writer
                .add_term(
                    &term,
                    0,
                    TermInfo {
                        doc_freq: 1,
                        frq_ptr: i as u64,
                        prx_ptr: i as u64,
                    },
                )
                .unwrap();
        }
        writer.close().unwrap();

        let mut tii = dir.open_input("_1.tii").unwrap();
        let count = tii.read_fixed_i32().unwrap();
        // 5 entries, interval 2 -> ceil(5/2) == 3
        assert_eq!(3, count);
    }

    #[test]
    fn tii_entries_resolve_to_the_same_term_and_info_as_tis() {
        let tmp = TempDir::new().unwrap();
        let dir = FsDirectory::open(tmp.path()).unwrap();
        let mut writer = TermDictWriter::new(&dir, "_1", 2).unwrap();
        let mut entries = Vec::new();
        for i in 0..5u32 {
            let term = Term::new("body", format!("term{:03}", i));
            let ti = TermInfo {
                doc_freq: 1,
                frq_ptr: i as u64,
                prx_ptr: i as u64,
            };
            writer.add_term(&term, 0, ti).unwrap();
            entries.push((term, ti));
        }
        writer.close().unwrap();

        let reader = TermDictReader::open(&dir, "_1", |n| {
            if n == 0 {
                Some("body".to_string())
            } else {
                None
            }
        })
        .unwrap();

        // index_interval 2 over 5 terms mirrors the 0-indexed positions
        // 0, 2, 4 into .tii.
        assert_eq!(3, reader.tii_terms.len());
        let expected_positions = [0usize, 2, 4];
        for (k, &pos) in expected_positions.iter().enumerate() {
            assert_eq!(entries[pos].0, reader.tii_terms[k]);
            assert_eq!(entries[pos].1, reader.tii_term_infos[k]);

            // Each .tii entry's .tis pointer must land exactly on the .tis
            // entry decoding to that same (term, termInfo) pair.
            let tis_offset = reader.tii_ptrs[k];
            let tis_index = reader
                .tis_ptrs
                .iter()
                .position(|&p| p == tis_offset)
                .expect(".tii pointer must match a real .tis entry offset");
            assert_eq!(pos, tis_index);
            assert_eq!(reader.terms[tis_index], reader.tii_terms[k]);
            assert_eq!(reader.term_infos[tis_index], reader.tii_term_infos[k]);
        }
    }
}
