//! The binary I/O layer (§4.1): fixed-width big-endian integers,
//! variable-length integers, and length-prefixed UTF-8 strings, expressed
//! as extension traits over `Read`/`Write` so any file handle, buffered
//! stream, or in-memory cursor can serve as the underlying byte stream —
//! the same way the teacher threads `byteorder`'s `ReadBytesExt`/
//! `WriteBytesExt` directly over `File`/`BufWriter`/`BufReader` everywhere.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::{Error, Result};

/// Maximum byte length of an encoded VLong; guards against a corrupt
/// stream hanging the decoder on a never-terminating continuation bit.
const MAX_VLONG_BYTES: u32 = 10;

pub trait StrataWriteExt: Write {
    fn write_vint(&mut self, value: i32) -> Result<()> {
        self.write_vlong(i64::from(value))
    }

    /// 7-bit groups, little-endian order of groups, continuation bit 0x80
    /// set on all but the last byte.
    fn write_vlong(&mut self, value: i64) -> Result<()> {
        debug_assert!(value >= 0, "VInt/VLong values must be non-negative");
        let mut v = value as u64;
        loop {
            if v & !0x7Fu64 == 0 {
                self.write_u8(v as u8)?;
                return Ok(());
            }
            self.write_u8(((v & 0x7F) | 0x80) as u8)?;
            v >>= 7;
        }
    }

    fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_vint(s.len() as i32)?;
        self.write_all(s.as_bytes())?;
        Ok(())
    }
}

impl<W: Write + ?Sized> StrataWriteExt for W {}

pub trait StrataReadExt: Read {
    fn read_vint(&mut self) -> Result<i32> {
        Ok(self.read_vlong()? as i32)
    }

    fn read_vlong(&mut self) -> Result<i64> {
        let mut result: u64 = 0;
        let mut shift = 0u32;
        loop {
            if shift >= MAX_VLONG_BYTES * 7 {
                return Err(Error::CorruptFormat("VLong too long".to_string()));
            }
            let b = self.read_u8()?;
            result |= u64::from(b & 0x7F) << shift;
            if b & 0x80 == 0 {
                return Ok(result as i64);
            }
            shift += 7;
        }
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_vint()? as usize;
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        String::from_utf8(buf).map_err(|e| Error::CorruptFormat(e.to_string()))
    }
}

impl<R: Read + ?Sized> StrataReadExt for R {}

pub use byteorder::BigEndian as Endianness;

/// Convenience re-exports so callers only need `crate::io::*` for the
/// fixed-width halves of the layer (`writeInt`/`writeLong` in §4.1).
pub trait FixedWidthExt: Write {
    fn write_fixed_i32(&mut self, v: i32) -> Result<()> {
        WriteBytesExt::write_i32::<BigEndian>(self, v)?;
        Ok(())
    }
    fn write_fixed_i64(&mut self, v: i64) -> Result<()> {
        WriteBytesExt::write_i64::<BigEndian>(self, v)?;
        Ok(())
    }
}
impl<W: Write + ?Sized> FixedWidthExt for W {}

pub trait FixedWidthReadExt: Read {
    fn read_fixed_i32(&mut self) -> Result<i32> {
        Ok(ReadBytesExt::read_i32::<BigEndian>(self)?)
    }
    fn read_fixed_i64(&mut self) -> Result<i64> {
        Ok(ReadBytesExt::read_i64::<BigEndian>(self)?)
    }
}
impl<R: Read + ?Sized> FixedWidthReadExt for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    proptest! {
        #[test]
        fn vlong_round_trips(value in 0i64..=i64::MAX) {
            let mut buf = Cursor::new(Vec::new());
            buf.write_vlong(value).unwrap();
            buf.set_position(0);
            prop_assert_eq!(value, buf.read_vlong().unwrap());
        }

        #[test]
        fn vint_round_trips(value in 0i32..=i32::MAX) {
            let mut buf = Cursor::new(Vec::new());
            buf.write_vint(value).unwrap();
            buf.set_position(0);
            prop_assert_eq!(value, buf.read_vint().unwrap());
        }

        #[test]
        fn string_round_trips(s in "\\PC*") {
            let mut buf = Cursor::new(Vec::new());
            buf.write_string(&s).unwrap();
            buf.set_position(0);
            prop_assert_eq!(s, buf.read_string().unwrap());
        }
    }

    #[test]
    fn vint_boundaries() {
        let mut buf = Cursor::new(Vec::new());
        buf.write_vint(127).unwrap();
        assert_eq!(buf.get_ref().as_slice(), &[0x7F]);

        let mut buf = Cursor::new(Vec::new());
        buf.write_vint(128).unwrap();
        assert_eq!(buf.get_ref().as_slice(), &[0x80, 0x01]);

        let mut buf = Cursor::new(Vec::new());
        buf.write_vint(16384).unwrap();
        assert_eq!(buf.get_ref().as_slice(), &[0x80, 0x80, 0x01]);
    }

    #[test]
    fn fixed_width_round_trips() {
        let mut buf = Cursor::new(Vec::new());
        buf.write_fixed_i32(-7).unwrap();
        buf.write_fixed_i64(i64::MIN).unwrap();
        buf.set_position(0);
        assert_eq!(-7, buf.read_fixed_i32().unwrap());
        assert_eq!(i64::MIN, buf.read_fixed_i64().unwrap());
    }
}
