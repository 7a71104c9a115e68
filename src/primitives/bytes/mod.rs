#![forbid(unsafe_code)]
//! Encoding and buffer utilities behind the persisted path summary.
//!
//! All integers in the summary format use a tagged variable-length encoding
//! occupying 1, 2, 4, or 5 bytes depending on magnitude. The two top bits of
//! the first byte select the width, so small values (the common case for name
//! ids, kinds, and child counts) cost a single byte.

pub mod buf {
    //! A fallible slice-backed cursor for decoding untrusted bytes.

    use core::fmt;

    use crate::types::{Result, XylemError};

    /// A cursor for reading bytes from a slice with offset tracking.
    ///
    /// Overreads surface as corruption errors carrying the failing offset;
    /// the decoded bytes come from disk and must never panic the process.
    pub struct Cursor<'a> {
        buf: &'a [u8],
        off: usize,
    }

    impl<'a> Cursor<'a> {
        /// Creates a new cursor starting at offset 0.
        pub fn new(buf: &'a [u8]) -> Self {
            Self { buf, off: 0 }
        }

        /// Takes the next `n` bytes, advancing the offset.
        pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
            let end = self.off.checked_add(n).ok_or(XylemError::CorruptionAt {
                offset: self.off,
                reason: "length overflows cursor offset",
            })?;
            if end > self.buf.len() {
                return Err(XylemError::CorruptionAt {
                    offset: self.off,
                    reason: "truncated input",
                });
            }
            let slice = &self.buf[self.off..end];
            self.off = end;
            Ok(slice)
        }

        /// Takes a single byte.
        pub fn byte(&mut self) -> Result<u8> {
            Ok(self.take(1)?[0])
        }

        /// Returns the current read offset.
        pub fn offset(&self) -> usize {
            self.off
        }

        /// Returns the number of bytes remaining in the buffer.
        pub fn remaining(&self) -> usize {
            self.buf.len().saturating_sub(self.off)
        }
    }

    impl<'a> fmt::Debug for Cursor<'a> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Cursor")
                .field("off", &self.off)
                .field("remaining", &self.remaining())
                .finish()
        }
    }
}

pub mod vnum {
    //! Tagged variable-length unsigned integers (1/2/4/5 bytes).

    use super::buf::Cursor;
    use crate::types::Result;

    /// Encodes a u32 into 1, 2, 4, or 5 bytes depending on magnitude.
    pub fn encode(v: u32, out: &mut Vec<u8>) {
        if v < 0x40 {
            out.push(v as u8);
        } else if v < 0x4000 {
            out.push(0x40 | (v >> 8) as u8);
            out.push(v as u8);
        } else if v < 0x4000_0000 {
            out.push(0x80 | (v >> 24) as u8);
            out.push((v >> 16) as u8);
            out.push((v >> 8) as u8);
            out.push(v as u8);
        } else {
            out.push(0xC0);
            out.extend_from_slice(&v.to_be_bytes());
        }
    }

    /// Decodes a value written by [`encode`].
    pub fn decode(cur: &mut Cursor<'_>) -> Result<u32> {
        let first = cur.byte()?;
        Ok(match first >> 6 {
            0 => u32::from(first),
            1 => (u32::from(first & 0x3F) << 8) | u32::from(cur.byte()?),
            2 => {
                let rest = cur.take(3)?;
                (u32::from(first & 0x3F) << 24)
                    | (u32::from(rest[0]) << 16)
                    | (u32::from(rest[1]) << 8)
                    | u32::from(rest[2])
            }
            _ => {
                let rest = cur.take(4)?;
                u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]])
            }
        })
    }

    /// Returns the encoded width of `v` in bytes.
    pub fn len(v: u32) -> usize {
        if v < 0x40 {
            1
        } else if v < 0x4000 {
            2
        } else if v < 0x4000_0000 {
            4
        } else {
            5
        }
    }
}

pub mod token {
    //! Length-prefixed byte strings.

    use super::{buf::Cursor, vnum};
    use crate::types::{Result, XylemError};

    /// Appends a length-prefixed token to a byte vector.
    pub fn put(bytes: &[u8], out: &mut Vec<u8>) {
        assert!(
            bytes.len() <= u32::MAX as usize,
            "token too long (>{} bytes)",
            u32::MAX
        );
        vnum::encode(bytes.len() as u32, out);
        out.extend_from_slice(bytes);
    }

    /// Takes a length-prefixed token from the cursor.
    pub fn take<'a>(cur: &mut Cursor<'a>) -> Result<&'a [u8]> {
        let len = vnum::decode(cur)? as usize;
        cur.take(len)
    }

    /// Takes a length-prefixed token and checks it for valid UTF-8.
    pub fn take_str<'a>(cur: &mut Cursor<'a>) -> Result<&'a str> {
        let offset = cur.offset();
        core::str::from_utf8(take(cur)?).map_err(|_| XylemError::CorruptionAt {
            offset,
            reason: "token not valid UTF-8",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{buf::Cursor, token, vnum};
    use crate::types::XylemError;
    use proptest::prelude::*;

    #[test]
    fn vnum_widths() {
        for (value, width) in [
            (0u32, 1usize),
            (0x3F, 1),
            (0x40, 2),
            (0x3FFF, 2),
            (0x4000, 4),
            (0x3FFF_FFFF, 4),
            (0x4000_0000, 5),
            (u32::MAX, 5),
        ] {
            let mut buf = Vec::new();
            vnum::encode(value, &mut buf);
            assert_eq!(buf.len(), width, "width of {value:#x}");
            assert_eq!(vnum::len(value), width);
        }
    }

    #[test]
    fn vnum_roundtrip_edges() {
        for value in [0u32, 1, 0x3F, 0x40, 0x3FFF, 0x4000, 0x3FFF_FFFF, 0x4000_0000, u32::MAX] {
            let mut buf = Vec::new();
            vnum::encode(value, &mut buf);
            let mut cur = Cursor::new(&buf);
            assert_eq!(vnum::decode(&mut cur).unwrap(), value);
            assert_eq!(cur.remaining(), 0);
        }
    }

    #[test]
    fn truncated_vnum_is_corruption() {
        let mut buf = Vec::new();
        vnum::encode(0x4000_0000, &mut buf);
        buf.truncate(3);
        let mut cur = Cursor::new(&buf);
        assert!(matches!(
            vnum::decode(&mut cur),
            Err(XylemError::CorruptionAt { .. })
        ));
    }

    #[test]
    fn token_roundtrip() {
        let mut buf = Vec::new();
        token::put("héllo".as_bytes(), &mut buf);
        token::put(b"", &mut buf);
        let mut cur = Cursor::new(&buf);
        assert_eq!(token::take_str(&mut cur).unwrap(), "héllo");
        assert_eq!(token::take(&mut cur).unwrap(), b"");
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn token_with_bad_utf8_is_corruption() {
        let mut buf = Vec::new();
        token::put(&[0xFF, 0xFE], &mut buf);
        let mut cur = Cursor::new(&buf);
        assert!(matches!(
            token::take_str(&mut cur),
            Err(XylemError::CorruptionAt { .. })
        ));
    }

    #[test]
    fn cursor_reports_failing_offset() {
        let mut cur = Cursor::new(&[1, 2, 3]);
        let _ = cur.take(2).unwrap();
        match cur.take(2) {
            Err(XylemError::CorruptionAt { offset, .. }) => assert_eq!(offset, 2),
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn vnum_roundtrip_prop(v in any::<u32>()) {
            let mut buf = Vec::new();
            vnum::encode(v, &mut buf);
            prop_assert_eq!(buf.len(), vnum::len(v));
            let mut cur = Cursor::new(&buf);
            prop_assert_eq!(vnum::decode(&mut cur).unwrap(), v);
            prop_assert_eq!(cur.remaining(), 0);
        }

        #[test]
        fn vnum_sequences_roundtrip_prop(xs in proptest::collection::vec(any::<u32>(), 0..64)) {
            let mut buf = Vec::new();
            for &v in &xs {
                vnum::encode(v, &mut buf);
            }
            let mut cur = Cursor::new(&buf);
            for &v in &xs {
                prop_assert_eq!(vnum::decode(&mut cur).unwrap(), v);
            }
            prop_assert_eq!(cur.remaining(), 0);
        }

        #[test]
        fn token_roundtrip_prop(s in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut buf = Vec::new();
            token::put(&s, &mut buf);
            let mut cur = Cursor::new(&buf);
            prop_assert_eq!(token::take(&mut cur).unwrap(), &s[..]);
            prop_assert_eq!(cur.remaining(), 0);
        }
    }
}
