//! Single-level collation families: the 8-bit ones, `_general_ci`, `_bin`
//! over Unicode charsets, and the multibyte Asian charsets.

use crate::charset::Charset;
use crate::error::Result;
use crate::key::KeyWriter;
use crate::unicase;

pub type SortTable = [u8; 256];

/// One weight byte per input byte
pub fn eight_bit(sort: &SortTable, src: &[u8], key: &mut KeyWriter) {
    for &b in src {
        if !key.push_u8(sort[usize::from(b)]) {
            return;
        }
    }
}

pub fn bytes(src: &[u8], key: &mut KeyWriter) {
    key.push(src);
}

pub fn unicode_general(codepoints: &[u32], key: &mut KeyWriter) {
    for &cp in codepoints {
        if !key.push_u16(unicase::weight(cp)) {
            return;
        }
    }
}

/// The codepoint itself, in as many bytes as the charset's widest codepoint needs
#[allow(clippy::cast_possible_truncation)]
pub fn unicode_bin(charset: &Charset, codepoints: &[u32], key: &mut KeyWriter) {
    let wide = charset.max_codepoint() > 0xFFFF;

    for &cp in codepoints {
        let more = if wide {
            key.push(&cp.to_be_bytes()[1..])
        } else {
            key.push_u16(cp as u16)
        };
        if !more {
            return;
        }
    }
}

/// Single-byte characters go through `sort` (identity without one), wider
/// characters are copied as they are.
pub fn multibyte(
    charset: &Charset,
    sort: Option<&SortTable>,
    src: &[u8],
    key: &mut KeyWriter,
) -> Result<()> {
    // Well-shaped but unassigned characters fail here too
    charset.decode(src)?;

    let mut offset = 0;

    while offset < src.len() {
        let width = charset.char_len(src, offset)?;
        let more = if width == 1 {
            let b = src[offset];
            key.push_u8(sort.map_or(b, |sort| sort[usize::from(b)]))
        } else {
            key.push(&src[offset..offset + width])
        };
        if !more {
            break;
        }
        offset += width;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollationError;

    fn run(f: impl FnOnce(&mut KeyWriter)) -> Vec<u8> {
        let mut key = KeyWriter::new(None, 0);
        f(&mut key);
        key.finish()
    }

    fn upper_fold() -> SortTable {
        let mut sort = [0; 256];
        for (i, w) in sort.iter_mut().enumerate() {
            *w = (i as u8).to_ascii_uppercase();
        }
        sort
    }

    #[test]
    fn eight_bit_uses_the_sort_table() {
        let sort = upper_fold();
        assert_eq!(run(|k| eight_bit(&sort, b"aB\xE9", k)), b"AB\xE9");
    }

    #[test]
    fn unicode_bin_width_follows_the_charset() {
        let mb3 = Charset::lookup("utf8mb3").unwrap();
        let mb4 = Charset::lookup("utf8mb4").unwrap();
        assert_eq!(run(|k| unicode_bin(mb3, &[0x61], k)), vec![0x00, 0x61]);
        assert_eq!(run(|k| unicode_bin(mb4, &[0x61], k)), vec![0x00, 0x00, 0x61]);
        assert_eq!(
            run(|k| unicode_bin(mb4, &[0x1F600], k)),
            vec![0x01, 0xF6, 0x00]
        );
    }

    #[test]
    fn unicode_general_folds_case() {
        assert_eq!(run(|k| unicode_general(&[0x61, 0x41], k)), vec![0, 0x41, 0, 0x41]);
    }

    #[test]
    fn multibyte_keeps_wide_characters() {
        let sjis = Charset::lookup("sjis").unwrap();
        let sort = upper_fold();
        // "a" followed by HIRAGANA LETTER A (82 A0)
        let src = [b'a', 0x82, 0xA0];

        let mut key = KeyWriter::new(None, 0);
        multibyte(sjis, Some(&sort), &src, &mut key).unwrap();
        assert_eq!(key.finish(), vec![b'A', 0x82, 0xA0]);

        let mut key = KeyWriter::new(None, 0);
        multibyte(sjis, None, &src, &mut key).unwrap();
        assert_eq!(key.finish(), src);
    }

    #[test]
    fn multibyte_rejects_truncated_characters() {
        let gbk = Charset::lookup("gbk").unwrap();
        let mut key = KeyWriter::new(None, 0);
        assert_eq!(
            multibyte(gbk, None, &[b'a', 0xB0], &mut key),
            Err(CollationError::InvalidEncoding {
                charset: "gbk",
                offset: 1
            })
        );
    }

    #[test]
    fn multibyte_follows_each_charset_layout() {
        let big5 = Charset::lookup("big5").unwrap();
        let mut key = KeyWriter::new(None, 0);
        assert_eq!(
            multibyte(big5, None, b"a\x81\x40", &mut key),
            Err(CollationError::InvalidEncoding {
                charset: "big5",
                offset: 1
            })
        );

        // a GBK-only character is not gb2312
        let gb2312 = Charset::lookup("gb2312").unwrap();
        let mut key = KeyWriter::new(None, 0);
        assert!(multibyte(gb2312, None, b"\x81\x40", &mut key).is_err());

        let mut key = KeyWriter::new(None, 0);
        multibyte(gb2312, None, b"\xD6\xD0a", &mut key).unwrap();
        assert_eq!(key.finish(), b"\xD6\xD0a");
    }
}
