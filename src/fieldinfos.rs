//! FieldInfos (§4.2): an ordered, deduplicated registry of field
//! descriptors, serialized as `.fnm`. Grounded on the teacher's
//! `SegmentSchema`/field-number bookkeeping in `seg.rs`, backed here by
//! `indexmap::IndexMap` so that insertion order and `name -> number`
//! lookup come from one structure instead of a parallel `Vec` + `HashMap`
//! pair — `number` is simply the entry's index in the map.

use indexmap::IndexMap;

use crate::directory::Directory;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::io::{StrataReadExt, StrataWriteExt};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub number: u32,
    pub indexed: bool,
}

#[derive(Clone, Debug, Default)]
pub struct FieldInfos {
    by_name: IndexMap<String, FieldInfo>,
}

impl FieldInfos {
    pub fn new() -> FieldInfos {
        FieldInfos {
            by_name: IndexMap::new(),
        }
    }

    /// Inserts `name` iff not already present, assigning
    /// `number = size()` (invariant 1 of §3).
    pub fn add_field(&mut self, name: &str, indexed: bool) -> u32 {
        if let Some(info) = self.by_name.get(name) {
            return info.number;
        }
        let number = self.by_name.len() as u32;
        self.by_name.insert(
            name.to_string(),
            FieldInfo {
                name: name.to_string(),
                number,
                indexed,
            },
        );
        number
    }

    pub fn add_from_document(&mut self, doc: &Document) {
        for field in &doc.fields {
            self.add_field(&field.name, field.indexed);
        }
    }

    pub fn get_number(&self, name: &str) -> Result<u32> {
        self.by_name
            .get(name)
            .map(|info| info.number)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&FieldInfo> {
        self.by_name.get(name)
    }

    pub fn by_number(&self, number: u32) -> Option<&FieldInfo> {
        self.by_name.get_index(number as usize).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldInfo> {
        self.by_name.values()
    }

    /// Merges in every `FieldInfo` from `other`, in encounter order,
    /// preserving each name's original `indexed` flag (§4.9 step 1).
    pub fn merge_from(&mut self, other: &FieldInfos) {
        for info in other.iter() {
            self.add_field(&info.name, info.indexed);
        }
    }

    /// Writes `.fnm` in insertion order (the recommended, documented
    /// choice of §9 — "so that a reader of its own output recovers the
    /// same field numbers" — rather than the source's reverse-of-insertion
    /// order, which this crate does not replicate).
    pub fn write<D: Directory>(&self, dir: &D, file_name: &str) -> Result<()> {
        let mut out = dir.create_output(file_name)?;
        out.write_vint(self.by_name.len() as i32)?;
        for info in self.by_name.values() {
            out.write_string(&info.name)?;
            let flags: u8 = if info.indexed { 1 } else { 0 };
            out.write_u8_flag(flags)?;
        }
        Ok(())
    }

    /// Rebuilds `FieldInfos` from a `.fnm` stream, in the order the
    /// entries were written — i.e. it recovers whatever order the writer
    /// used, without assuming anything about it.
    pub fn read<D: Directory>(dir: &D, file_name: &str) -> Result<FieldInfos> {
        let mut input = dir.open_input(file_name)?;
        let count = input.read_vint()?;
        if count < 0 {
            return Err(Error::CorruptFormat("negative FieldInfos count".into()));
        }
        let mut infos = FieldInfos::new();
        for _ in 0..count {
            let name = input.read_string()?;
            let flags = input.read_u8_flag()?;
            infos.add_field(&name, flags & 1 != 0);
        }
        Ok(infos)
    }
}

/// Tiny helper so `.fnm`'s one-byte flag field reads the same way the
/// rest of the binary layer does (`write_byte`/`read_byte` in spec
/// terms), without adding a third extension trait for a single byte.
trait FlagByte {
    fn write_u8_flag(&mut self, b: u8) -> Result<()>;
}
impl<W: std::io::Write + ?Sized> FlagByte for W {
    fn write_u8_flag(&mut self, b: u8) -> Result<()> {
        use std::io::Write;
        self.write_all(&[b])?;
        Ok(())
    }
}
trait FlagByteRead {
    fn read_u8_flag(&mut self) -> Result<u8>;
}
impl<R: std::io::Read + ?Sized> FlagByteRead for R {
    fn read_u8_flag(&mut self) -> Result<u8> {
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
    fn round_trips_through_fnm() {
        let tmp = TempDir::new().unwrap();
        let dir = FsDirectory::open(tmp.path()).unwrap();

        let mut infos = FieldInfos::new();
        infos.add_field("path", true);
        infos.add_field("filename", true);
        infos.write(&dir, "_1.fnm").unwrap();

        let read_back = FieldInfos::read(&dir, "_1.fnm").unwrap();
        assert_eq!(2, read_back.len());
        assert_eq!(0, read_back.get_number("path").unwrap());
        assert_eq!(1, read_back.get_number("filename").unwrap());
        assert!(read_back.get("path").unwrap().indexed);
    }

    #[test]
    fn unknown_field_errors() {
        let infos = FieldInfos::new();
        match infos.get_number("missing") {
            Err(Error::UnknownField(name)) => assert_eq!("missing", name),
            other => panic!("expected UnknownField, got {:?}", other),
        }
    }

    #[test]
    fn numbers_equal_insertion_index() {
        let mut infos = FieldInfos::new();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            assert_eq!(i as u32, infos.add_field(name, false));
        }
        // Re-adding an existing name does not reassign a number.
        assert_eq!(0, infos.add_field("a", true));
    }
}
