//! Stored fields (§4.3): `.fdt` holds the stored values, `.fdx` a
//! fixed-stride array of `Int64` offsets into `.fdt`. Grounded on the
//! teacher's `full_doc.rs` (`FullDoc`/`FullDocReader`), which keeps the
//! same two-file offset/value shape but serialized documents with
//! `rmp-serde`; here the value stream follows the spec's explicit
//! `VLong fieldNumber / flags byte / String value` layout instead.

use crate::directory::Directory;
use crate::document::{Document, Field};
use crate::error::{Error, Result};
use crate::fieldinfos::FieldInfos;
use crate::io::{FixedWidthExt, FixedWidthReadExt, StrataReadExt, StrataWriteExt};

pub struct StoredFieldsWriter<'a, D: Directory> {
    dir: &'a D,
    fdx_name: String,
    fdt_name: String,
    fdx: crate::directory::Output,
    fdt: crate::directory::Output,
    fdx_size: u64,
}

impl<'a, D: Directory> StoredFieldsWriter<'a, D> {
    pub fn new(dir: &'a D, segment_name: &str) -> Result<Self> {
        let fdx_name = format!("{}.fdx", segment_name);
        let fdt_name = format!("{}.fdt", segment_name);
        let fdx = dir.create_output(&fdx_name)?;
        let fdt = dir.create_output(&fdt_name)?;
        Ok(StoredFieldsWriter {
            dir,
            fdx_name,
            fdt_name,
            fdx,
            fdt,
            fdx_size: 0,
        })
    }

    /// Appends one document's stored fields. Invariant 4 of §3: the
    /// number of `.fdx` entries equals the segment's doc-count.
    pub fn add_document(&mut self, field_infos: &FieldInfos, doc: &Document) -> Result<()> {
        self.fdx.write_fixed_i64(self.fdx_size as i64)?;
        self.fdx_size += 8;

        let stored_fields: Vec<&Field> = doc.fields.iter().filter(|f| f.stored).collect();
        self.fdt.write_vlong(stored_fields.len() as i64)?;
        for field in stored_fields {
            let number = field_infos.get_number(&field.name)?;
            self.fdt.write_vlong(i64::from(number))?;
            let flags: u8 = if field.tokenized { 1 } else { 0 };
            self.fdt.write_byte_flag(flags)?;
            self.fdt.write_string(&field.value)?;
        }
        Ok(())
    }

    pub fn close(mut self) -> Result<()> {
        use std::io::Write;
        self.fdx.flush()?;
        self.fdt.flush()?;
        let _ = (&self.fdx_name, &self.fdt_name, self.dir);
        Ok(())
    }
}

pub struct StoredFieldsReader<'a, D: Directory> {
    dir: &'a D,
    segment_name: String,
}

impl<'a, D: Directory> StoredFieldsReader<'a, D> {
    pub fn open(dir: &'a D, segment_name: &str) -> Result<Self> {
        Ok(StoredFieldsReader {
            dir,
            segment_name: segment_name.to_string(),
        })
    }

    pub fn max_doc(&self) -> Result<u64> {
        let len = self.dir.file_len(&format!("{}.fdx", self.segment_name))?;
        Ok(len / 8)
    }

    /// Reconstructs document `n`. The returned fields are always marked
    /// `stored`; `indexed`/`tokenized` are recovered from `field_infos`
    /// and the on-disk tokenized flag respectively.
    pub fn doc(&self, field_infos: &FieldInfos, n: u64) -> Result<Document> {
        let mut fdx = self.dir.open_input(&format!("{}.fdx", self.segment_name))?;
        use std::io::{Seek, SeekFrom};
        fdx.seek(SeekFrom::Start(n * 8))?;
        let offset = fdx.read_fixed_i64()?;

        let mut fdt = self.dir.open_input(&format!("{}.fdt", self.segment_name))?;
        fdt.seek(SeekFrom::Start(offset as u64))?;

        let count = fdt.read_vlong()?;
        if count < 0 {
            return Err(Error::CorruptFormat("negative stored field count".into()));
        }
        let mut doc = Document::new();
        for _ in 0..count {
            let field_number = fdt.read_vlong()?;
            let flags = fdt.read_byte_flag()?;
            let value = fdt.read_string()?;
            let info = field_infos
                .by_number(field_number as u32)
                .ok_or_else(|| Error::CorruptFormat("stored field number out of range".into()))?;
            doc = doc.add(
                Field::new(info.name.clone(), value)
                    .stored(true)
                    .indexed(info.indexed)
                    .tokenized(flags & 1 != 0),
            );
        }
        Ok(doc)
    }
}

trait ByteFlag {
    fn write_byte_flag(&mut self, b: u8) -> Result<()>;
}
impl<W: std::io::Write + ?Sized> ByteFlag for W {
    fn write_byte_flag(&mut self, b: u8) -> Result<()> {
        self.write_all(&[b])?;
        Ok(())
    }
}
trait ByteFlagRead {
    fn read_byte_flag(&mut self) -> Result<u8>;
}
impl<R: std::io::Read + ?Sized> ByteFlagRead for R {
    fn read_byte_flag(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b)?;
        Ok(b[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::FsDirectory;
    use tempfile::TempDir;

    #[test]
    fn round_trips_a_document() {
        let tmp = TempDir::new().unwrap();
        let dir = FsDirectory::open(tmp.path()).unwrap();

        let mut field_infos = FieldInfos::new();
        field_infos.add_field("path", true);
        field_infos.add_field("filename", true);

        let doc = Document::new()
            .add(Field::keyword("path", "/etc/test.txt"))
            .add(Field::keyword("filename", "test.txt"));

        let mut writer = StoredFieldsWriter::new(&dir, "_1").unwrap();
        writer.add_document(&field_infos, &doc).unwrap();
        writer.close().unwrap();

        let reader = StoredFieldsReader::open(&dir, "_1").unwrap();
        assert_eq!(1, reader.max_doc().unwrap());
        let read_back = reader.doc(&field_infos, 0).unwrap();
        assert_eq!(2, read_back.fields.len());
        assert_eq!("path", read_back.fields[0].name);
        assert_eq!("/etc/test.txt", read_back.fields[0].value);
        assert!(read_back.fields[0].stored);
        assert!(read_back.fields[0].indexed);
        assert!(!read_back.fields[0].tokenized);
    }

    #[test]
    fn fdx_stride_matches_doc_count() {
        let tmp = TempDir::new().unwrap();
        let dir = FsDirectory::open(tmp.path()).unwrap();
        let mut field_infos = FieldInfos::new();
        field_infos.add_field("a", true);

        let mut writer = StoredFieldsWriter::new(&dir, "_1").unwrap();
        for i in 0..5 {
            let doc = Document::new().add(Field::keyword("a", format!("v{}", i)));
            writer.add_document(&field_infos, &doc).unwrap();
        }
        writer.close().unwrap();

        let reader = StoredFieldsReader::open(&dir, "_1").unwrap();
        assert_eq!(5, reader.max_doc().unwrap());
        for i in 0..5 {
            let doc = reader.doc(&field_infos, i).unwrap();
            assert_eq!(format!("v{}", i), doc.fields[0].value);
        }
    }
}
