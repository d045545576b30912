//! Frequency/position streams (§4.6): `.frq` holds a delta-coded
//! doc-freq pair list, `.prx` holds delta-coded positions. Grounded on
//! the teacher's `string_pos_index.rs`, which VInt-delta-codes doc ids
//! and position offsets in exactly this shape, generalized here to the
//! spec's documented single/multi-occurrence `.frq` bit layout.

use crate::directory::Directory;
use crate::error::Result;
use crate::io::{StrataReadExt, StrataWriteExt};
use crate::postings::Posting;

/// Encodes `value`, returning the number of bytes written — `write_vint`
/// itself only reports success, and the dictionary/postings writers need
/// a running byte count to hand out as pointers.
fn write_vint_counted<W: std::io::Write>(w: &mut W, value: i32) -> Result<u64> {
    write_vlong_counted(w, i64::from(value))
}

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

pub struct FreqPosWriter<'a, D: Directory> {
    frq: crate::directory::Output,
    prx: crate::directory::Output,
    frq_size: u64,
    prx_size: u64,
    _dir: &'a D,
}

impl<'a, D: Directory> FreqPosWriter<'a, D> {
    pub fn new(dir: &'a D, segment_name: &str) -> Result<Self> {
        Ok(FreqPosWriter {
            frq: dir.create_output(&format!("{}.frq", segment_name))?,
            prx: dir.create_output(&format!("{}.prx", segment_name))?,
            frq_size: 0,
            prx_size: 0,
            _dir: dir,
        })
    }

    pub fn frq_size(&self) -> u64 {
        self.frq_size
    }

    pub fn prx_size(&self) -> u64 {
        self.prx_size
    }

    /// Writes one term's posting in a single-document segment (doc-delta
    /// is always 0). Returns `(frq_ptr, prx_ptr)`, the byte offsets at
    /// which this posting started — these feed straight into the
    /// `TermInfo` handed to the dictionary writer.
    pub fn write_posting(&mut self, posting: &Posting) -> Result<(u64, u64)> {
        self.write_term_postings(&[(0, posting.positions.iter().copied().collect())])
    }

    /// Writes a full multi-document run for one term: one
    /// `(doc_delta, positions)` entry per document containing the term,
    /// in ascending doc-id order. `write_posting` is this function's
    /// single-entry, doc-delta-0 special case. The merger uses this
    /// directly to rewrite `.frq`/`.prx` with deltas recomputed against
    /// the merged segment's doc-ids. Sizes are tracked by hand rather
    /// than queried from the filesystem, since the underlying stream is
    /// a `BufWriter` and unflushed bytes do not yet show up in the
    /// file's on-disk length.
    pub fn write_term_postings(&mut self, entries: &[(u64, Vec<u64>)]) -> Result<(u64, u64)> {
        let frq_ptr = self.frq_size;
        let prx_ptr = self.prx_size;

        for (doc_delta, positions) in entries {
            let freq = positions.len() as u32;
            let code = ((*doc_delta as i64) << 1) | if freq == 1 { 1 } else { 0 };
            self.frq_size += write_vlong_counted(&mut self.frq, code)?;
            if freq != 1 {
                self.frq_size += write_vint_counted(&mut self.frq, freq as i32)?;
            }

            let mut last_position = 0u64;
            for &position in positions {
                self.prx_size +=
                    write_vlong_counted(&mut self.prx, (position - last_position) as i64)?;
                last_position = position;
            }
        }

        Ok((frq_ptr, prx_ptr))
    }

    pub fn close(mut self) -> Result<()> {
        use std::io::Write;
        self.frq.flush()?;
        self.prx.flush()?;
        Ok(())
    }
}

pub struct FreqPosReader<'a, D: Directory> {
    dir: &'a D,
    segment_name: String,
}

impl<'a, D: Directory> FreqPosReader<'a, D> {
    pub fn open(dir: &'a D, segment_name: &str) -> Result<Self> {
        Ok(FreqPosReader {
            dir,
            segment_name: segment_name.to_string(),
        })
    }

    /// Decodes one term's `(doc_delta, freq)` pair at `frq_ptr` in a
    /// single-document segment (`doc_delta` is always 0 there).
    pub fn read_freq(&self, frq_ptr: u64) -> Result<(u64, u32)> {
        use std::io::{Seek, SeekFrom};
        let mut frq = self.dir.open_input(&format!("{}.frq", self.segment_name))?;
        frq.seek(SeekFrom::Start(frq_ptr))?;
        let code = frq.read_vint()? as u32;
        let doc_delta = (code >> 1) as u64;
        if code & 1 != 0 {
            Ok((doc_delta, 1))
        } else {
            let freq = frq.read_vint()? as u32;
            Ok((doc_delta, freq))
        }
    }

    pub fn read_positions(&self, prx_ptr: u64, freq: u32) -> Result<Vec<u64>> {
        use std::io::{Seek, SeekFrom};
        let mut prx = self.dir.open_input(&format!("{}.prx", self.segment_name))?;
        prx.seek(SeekFrom::Start(prx_ptr))?;
        let mut positions = Vec::with_capacity(freq as usize);
        let mut last = 0u64;
        for _ in 0..freq {
            let delta = prx.read_vlong()? as u64;
            last += delta;
            positions.push(last);
        }
        Ok(positions)
    }

    /// Decodes a full multi-document run of `doc_freq` entries starting
    /// at `frq_ptr`/`prx_ptr`, returning each document's local (segment-
    /// relative) doc-id and its positions. Doc-ids are reconstructed by
    /// treating the run as starting from an implicit predecessor of -1,
    /// matching the single-document convention where `doc_delta == 0`
    /// means doc-id 0 — the merger uses this to recover absolute doc-ids
    /// by adding each reader's `base`.
    pub fn read_term_postings(
        &self,
        frq_ptr: u64,
        prx_ptr: u64,
        doc_freq: u32,
    ) -> Result<Vec<(u64, Vec<u64>)>> {
        use std::io::{Seek, SeekFrom};
        let mut frq = self.dir.open_input(&format!("{}.frq", self.segment_name))?;
        frq.seek(SeekFrom::Start(frq_ptr))?;
        let mut prx = self.dir.open_input(&format!("{}.prx", self.segment_name))?;
        prx.seek(SeekFrom::Start(prx_ptr))?;

        let mut prev_doc_id: i64 = -1;
        let mut result = Vec::with_capacity(doc_freq as usize);
        for _ in 0..doc_freq {
            let code = frq.read_vlong()?;
            let doc_delta = (code >> 1) as i64;
            let freq = if code & 1 != 0 {
                1
            } else {
                frq.read_vint()? as u32
            };
            let doc_id = prev_doc_id + 1 + doc_delta;
            prev_doc_id = doc_id;

            let mut positions = Vec::with_capacity(freq as usize);
            let mut last = 0u64;
            for _ in 0..freq {
                let delta = prx.read_vlong()? as u64;
                last += delta;
                positions.push(last);
            }
            result.push((doc_id as u64, positions));
        }
        Ok(result)
    }
}
