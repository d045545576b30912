//! Norms (§4.7): one length-normalization byte per document per indexed
//! field, stored one file per field (`.fN`, `N` = the field's number).
//! Grounded on the teacher's per-field byte-array norm handling in
//! `seg.rs` (`SegReader::norm`), generalized here to a dedicated writer
//! that guards the zero-field-length edge case the spec calls out.

use crate::directory::Directory;
use crate::error::Result;

/// `ceil(255 / sqrt(length))`, clamped so a field that never appeared in
/// a document (`length == 0`) does not divide by zero — per §4.7's
/// explicit guard, such documents simply get no norm entry written for
/// that field by the caller, never a call into `encode_norm(0)`.
pub fn encode_norm(length: u64) -> u8 {
    debug_assert!(length > 0, "norms must not be computed for an empty field");
    let norm = (255.0f64 / (length as f64).sqrt()).ceil();
    norm.min(255.0).max(1.0) as u8
}

pub struct NormsWriter<'a, D: Directory> {
    dir: &'a D,
    segment_name: String,
    streams: std::collections::HashMap<u32, crate::directory::Output>,
}

impl<'a, D: Directory> NormsWriter<'a, D> {
    pub fn new(dir: &'a D, segment_name: &str) -> NormsWriter<'a, D> {
        NormsWriter {
            dir,
            segment_name: segment_name.to_string(),
            streams: std::collections::HashMap::new(),
        }
    }

    /// Appends one document's norm byte for `field_number`, opening that
    /// field's `.fN` stream lazily on first use.
    pub fn add_norm(&mut self, field_number: u32, field_length: u64) -> Result<()> {
        use std::io::Write;
        if !self.streams.contains_key(&field_number) {
            let out = self
                .dir
                .create_output(&format!("{}.f{}", self.segment_name, field_number))?;
            self.streams.insert(field_number, out);
        }
        let out = self.streams.get_mut(&field_number).expect("just inserted");
        out.write_all(&[encode_norm(field_length)])?;
        Ok(())
    }

    /// Appends a whole raw byte run to `field_number`'s stream —
    /// merging concatenates one reader's entire norm stream at a time
    /// (§4.9 step 4) rather than one document at a time.
    pub fn append_raw(&mut self, field_number: u32, bytes: &[u8]) -> Result<()> {
        use std::io::Write;
        if !self.streams.contains_key(&field_number) {
            let out = self
                .dir
                .create_output(&format!("{}.f{}", self.segment_name, field_number))?;
            self.streams.insert(field_number, out);
        }
        let out = self.streams.get_mut(&field_number).expect("just inserted");
        out.write_all(bytes)?;
        Ok(())
    }

    pub fn close(mut self) -> Result<()> {
        use std::io::Write;
        for (_, out) in self.streams.iter_mut() {
            out.flush()?;
        }
        Ok(())
    }
}

pub struct NormsReader<'a, D: Directory> {
    dir: &'a D,
    segment_name: String,
}

impl<'a, D: Directory> NormsReader<'a, D> {
    pub fn open(dir: &'a D, segment_name: &str) -> NormsReader<'a, D> {
        NormsReader {
            dir,
            segment_name: segment_name.to_string(),
        }
    }

    /// Reads the full norm byte stream for `field_number`. Absence of the
    /// `.fN` file (the field was never indexed in this segment) is not an
    /// error — callers treat a missing stream as "no norms for this
    /// field", per §4.8's per-indexed-field norm stream table.
    pub fn norm_stream(&self, field_number: u32) -> Result<Option<Vec<u8>>> {
        let file_name = format!("{}.f{}", self.segment_name, field_number);
        if !self.dir.file_exists(&file_name) {
            return Ok(None);
        }
        use std::io::Read;
        let mut input = self.dir.open_input(&file_name)?;
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::FsDirectory;
    use tempfile::TempDir;

    #[test]
    fn encode_norm_matches_formula() {
        assert_eq!(255, encode_norm(1));
        assert_eq!(128, encode_norm(4));
        assert_eq!(1, encode_norm(255 * 255));
    }

    #[test]
    fn writes_and_reads_one_field_stream() {
        let tmp = TempDir::new().unwrap();
        let dir = FsDirectory::open(tmp.path()).unwrap();

        let mut writer = NormsWriter::new(&dir, "_1");
        writer.add_norm(0, 4).unwrap();
        writer.add_norm(0, 16).unwrap();
        writer.close().unwrap();

        let reader = NormsReader::open(&dir, "_1");
        let stream = reader.norm_stream(0).unwrap().unwrap();
        assert_eq!(vec![encode_norm(4), encode_norm(16)], stream);
    }

    #[test]
    fn missing_field_stream_is_none() {
        let tmp = TempDir::new().unwrap();
        let dir = FsDirectory::open(tmp.path()).unwrap();
        let reader = NormsReader::open(&dir, "_1");
        assert!(reader.norm_stream(3).unwrap().is_none());
    }
}
