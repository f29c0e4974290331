use encoding_rs::{DecoderResult, Encoding, EncoderResult};

use crate::data::CharsetDump;
use crate::error::{CollationError, Result};

//
// Structs etc.
//

/// A named byte encoding. Every collation is tied to exactly one of these.
#[derive(Debug)]
pub struct Charset {
    name: &'static str,
    codec: Codec,
    max_codepoint: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Codec {
    Binary,
    Ascii,
    Latin1,
    Utf8 { max_width: usize },
    Utf16Be,
    Utf16Le,
    Utf32,
    Ucs2,
    SingleByte(Legacy),
    /// Single-byte charset defined by its byte-to-Unicode table; 0 marks an
    /// unassigned byte
    Table(&'static [u16; 256]),
    Multibyte(Legacy, Layout),
}

/// Legacy encodings backed by the WHATWG tables in `encoding_rs`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Legacy {
    Iso8859_2,
    Iso8859_7,
    Iso8859_8,
    Iso8859_13,
    Windows1250,
    Windows1251,
    Windows1256,
    Windows1257,
    Ibm866,
    Koi8R,
    Koi8U,
    MacRoman,
    ShiftJis,
    EucJp,
    Gbk,
    Big5,
    EucKr,
    Gb18030,
}

/// Byte structure of a multibyte encoding, used to find character boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Sjis,
    Euc,
    Gbk,
    Gb2312,
    Big5,
    EucKr,
    Gb18030,
}

impl Legacy {
    fn encoding(self) -> &'static Encoding {
        match self {
            Legacy::Iso8859_2 => encoding_rs::ISO_8859_2,
            Legacy::Iso8859_7 => encoding_rs::ISO_8859_7,
            Legacy::Iso8859_8 => encoding_rs::ISO_8859_8,
            Legacy::Iso8859_13 => encoding_rs::ISO_8859_13,
            Legacy::Windows1250 => encoding_rs::WINDOWS_1250,
            Legacy::Windows1251 => encoding_rs::WINDOWS_1251,
            Legacy::Windows1256 => encoding_rs::WINDOWS_1256,
            Legacy::Windows1257 => encoding_rs::WINDOWS_1257,
            Legacy::Ibm866 => encoding_rs::IBM866,
            Legacy::Koi8R => encoding_rs::KOI8_R,
            Legacy::Koi8U => encoding_rs::KOI8_U,
            Legacy::MacRoman => encoding_rs::MACINTOSH,
            Legacy::ShiftJis => encoding_rs::SHIFT_JIS,
            Legacy::EucJp => encoding_rs::EUC_JP,
            Legacy::Gbk => encoding_rs::GBK,
            Legacy::Big5 => encoding_rs::BIG5,
            Legacy::EucKr => encoding_rs::EUC_KR,
            Legacy::Gb18030 => encoding_rs::GB18030,
        }
    }
}

//
// Static/const
//

const fn charset(name: &'static str, codec: Codec, max_codepoint: u32) -> Charset {
    Charset {
        name,
        codec,
        max_codepoint,
    }
}

static CHARSETS: &[Charset] = &[
    charset("binary", Codec::Binary, 0xFF),
    charset("ascii", Codec::Ascii, 0x7F),
    charset("latin1", Codec::Latin1, 0xFFFF),
    charset("latin2", Codec::SingleByte(Legacy::Iso8859_2), 0xFFFF),
    charset("greek", Codec::SingleByte(Legacy::Iso8859_7), 0xFFFF),
    charset("hebrew", Codec::SingleByte(Legacy::Iso8859_8), 0xFFFF),
    charset("latin7", Codec::SingleByte(Legacy::Iso8859_13), 0xFFFF),
    charset("cp1250", Codec::SingleByte(Legacy::Windows1250), 0xFFFF),
    charset("cp1251", Codec::SingleByte(Legacy::Windows1251), 0xFFFF),
    charset("cp1256", Codec::SingleByte(Legacy::Windows1256), 0xFFFF),
    charset("cp1257", Codec::SingleByte(Legacy::Windows1257), 0xFFFF),
    charset("cp866", Codec::SingleByte(Legacy::Ibm866), 0xFFFF),
    charset("koi8r", Codec::SingleByte(Legacy::Koi8R), 0xFFFF),
    charset("koi8u", Codec::SingleByte(Legacy::Koi8U), 0xFFFF),
    charset("macroman", Codec::SingleByte(Legacy::MacRoman), 0xFFFF),
    charset("utf8mb3", Codec::Utf8 { max_width: 3 }, 0xFFFF),
    charset("utf8mb4", Codec::Utf8 { max_width: 4 }, 0x10FFFF),
    charset("utf16", Codec::Utf16Be, 0x10FFFF),
    charset("utf16le", Codec::Utf16Le, 0x10FFFF),
    charset("utf32", Codec::Utf32, 0x10FFFF),
    charset("ucs2", Codec::Ucs2, 0xFFFF),
    charset("sjis", Codec::Multibyte(Legacy::ShiftJis, Layout::Sjis), 0xFFFF),
    charset("cp932", Codec::Multibyte(Legacy::ShiftJis, Layout::Sjis), 0xFFFF),
    charset("ujis", Codec::Multibyte(Legacy::EucJp, Layout::Euc), 0xFFFF),
    charset("eucjpms", Codec::Multibyte(Legacy::EucJp, Layout::Euc), 0xFFFF),
    charset("gbk", Codec::Multibyte(Legacy::Gbk, Layout::Gbk), 0xFFFF),
    // GBK is a superset; the layout keeps decoding inside the GB2312 rows
    charset("gb2312", Codec::Multibyte(Legacy::Gbk, Layout::Gb2312), 0xFFFF),
    charset("big5", Codec::Multibyte(Legacy::Big5, Layout::Big5), 0xFFFF),
    charset("euckr", Codec::Multibyte(Legacy::EucKr, Layout::EucKr), 0xFFFF),
    charset("gb18030", Codec::Multibyte(Legacy::Gb18030, Layout::Gb18030), 0x10FFFF),
];

/// MySQL's latin1 is cp1252, except that the five bytes cp1252 leaves
/// undefined map to the C1 controls of the same value.
const LATIN1_HIGH: [u16; 32] = [
    0x20AC, 0x0081, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160,
    0x2039, 0x0152, 0x008D, 0x017D, 0x008F, 0x0090, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022,
    0x2013, 0x2014, 0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0x009D, 0x017E, 0x0178,
];

//
// Functions, public
//

impl Charset {
    /// Find a built-in charset by its MySQL name; `utf8` is accepted for `utf8mb3`.
    pub fn lookup(name: &str) -> Option<&'static Charset> {
        let name = Self::canonical_name(name);
        CHARSETS.iter().find(|cs| cs.name == name)
    }

    pub fn canonical_name(name: &str) -> &str {
        if name == "utf8" {
            "utf8mb3"
        } else {
            name
        }
    }

    /// Build a single-byte charset from the server's byte-to-Unicode table.
    /// Charsets live as long as the registry that loads them, which is the
    /// whole process, so they are leaked.
    pub fn from_dump(dump: CharsetDump) -> &'static Charset {
        let len = dump.to_unicode.len();
        let table: Box<[u16; 256]> = dump
            .to_unicode
            .into_boxed_slice()
            .try_into()
            .unwrap_or_else(|_| panic!("charset {} has a {len}-entry table", dump.name));

        Box::leak(Box::new(Charset {
            name: Box::leak(dump.name.into_boxed_str()),
            codec: Codec::Table(Box::leak(table)),
            max_codepoint: 0xFFFF,
        }))
    }

    pub fn all() -> &'static [Charset] {
        CHARSETS
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn max_codepoint(&self) -> u32 {
        self.max_codepoint
    }

    pub fn is_unicode(&self) -> bool {
        matches!(
            self.codec,
            Codec::Utf8 { .. } | Codec::Utf16Be | Codec::Utf16Le | Codec::Utf32 | Codec::Ucs2
        )
    }

    pub fn is_multibyte(&self) -> bool {
        matches!(self.codec, Codec::Multibyte(..))
    }

    /// Decode `src` into Unicode codepoints. Ill-formed input fails the whole call.
    pub fn decode(&self, src: &[u8]) -> Result<Vec<u32>> {
        match self.codec {
            Codec::Binary => Ok(src.iter().map(|&b| u32::from(b)).collect()),
            Codec::Ascii => src
                .iter()
                .enumerate()
                .map(|(offset, &b)| {
                    if b < 0x80 {
                        Ok(u32::from(b))
                    } else {
                        Err(CollationError::invalid(self.name, offset))
                    }
                })
                .collect(),
            Codec::Latin1 => Ok(src.iter().map(|&b| latin1_to_unicode(b)).collect()),
            Codec::Utf8 { max_width } => self.decode_utf8(src, max_width),
            Codec::Utf16Be => self.decode_utf16(src, u16::from_be_bytes),
            Codec::Utf16Le => self.decode_utf16(src, u16::from_le_bytes),
            Codec::Utf32 => self.decode_fixed::<4>(src, |b| u32::from_be_bytes(b)),
            Codec::Ucs2 => self.decode_fixed::<2>(src, |b| u32::from(u16::from_be_bytes(b))),
            Codec::Table(table) => src
                .iter()
                .enumerate()
                .map(|(offset, &b)| match table[usize::from(b)] {
                    0 if b != 0 => Err(CollationError::invalid(self.name, offset)),
                    cp => Ok(u32::from(cp)),
                })
                .collect(),
            Codec::SingleByte(legacy) => self.decode_legacy(src, legacy.encoding()),
            Codec::Multibyte(legacy, _) => {
                let mut offset = 0;
                while offset < src.len() {
                    offset += self.char_len(src, offset)?;
                }
                self.decode_legacy(src, legacy.encoding())
            }
        }
    }

    /// Encode codepoints into this charset.
    pub fn encode(&self, codepoints: &[u32]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(codepoints.len());

        match self.codec {
            Codec::Binary | Codec::Ascii => {
                for &cp in codepoints {
                    if cp > self.max_codepoint {
                        return Err(CollationError::unrepresentable(self.name, cp));
                    }
                    out.push(cp as u8);
                }
            }
            Codec::Latin1 => {
                for &cp in codepoints {
                    let byte = unicode_to_latin1(cp)
                        .ok_or_else(|| CollationError::unrepresentable(self.name, cp))?;
                    out.push(byte);
                }
            }
            Codec::Utf8 { .. } => {
                let mut buf = [0; 4];
                for &cp in codepoints {
                    let c = self.to_char(cp)?;
                    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
            Codec::Utf16Be | Codec::Utf16Le => {
                let mut buf = [0; 2];
                for &cp in codepoints {
                    let c = self.to_char(cp)?;
                    for unit in c.encode_utf16(&mut buf) {
                        let bytes = match self.codec {
                            Codec::Utf16Be => unit.to_be_bytes(),
                            _ => unit.to_le_bytes(),
                        };
                        out.extend_from_slice(&bytes);
                    }
                }
            }
            Codec::Utf32 => {
                for &cp in codepoints {
                    out.extend_from_slice(&(self.to_char(cp)? as u32).to_be_bytes());
                }
            }
            Codec::Ucs2 => {
                for &cp in codepoints {
                    out.extend_from_slice(&(self.to_char(cp)? as u16).to_be_bytes());
                }
            }
            Codec::Table(table) => {
                for &cp in codepoints {
                    let byte = table
                        .iter()
                        .position(|&to| u32::from(to) == cp)
                        .ok_or_else(|| CollationError::unrepresentable(self.name, cp))?;
                    out.push(byte as u8);
                }
            }
            Codec::SingleByte(_) | Codec::Multibyte(..) => {
                let text = codepoints
                    .iter()
                    .map(|&cp| self.to_char(cp))
                    .collect::<Result<String>>()?;
                return self.encode_str(&text);
            }
        }

        Ok(out)
    }

    /// Convert UTF-8 text into this charset.
    pub fn encode_str(&self, text: &str) -> Result<Vec<u8>> {
        match self.codec {
            Codec::Utf8 { max_width: 4 } => Ok(text.as_bytes().to_vec()),
            Codec::SingleByte(legacy) => self.encode_legacy(text, legacy.encoding()),
            Codec::Multibyte(legacy, _) => self.encode_multibyte(text, legacy.encoding()),
            _ => {
                let codepoints: Vec<u32> = text.chars().map(u32::from).collect();
                self.encode(&codepoints)
            }
        }
    }

    /// Width in bytes of the character starting at `src[offset]`.
    pub fn char_len(&self, src: &[u8], offset: usize) -> Result<usize> {
        let rest = &src[offset..];
        let invalid = || CollationError::invalid(self.name, offset);
        let lead = *rest.first().ok_or_else(invalid)?;
        let trail = |i: usize, range: &[std::ops::RangeInclusive<u8>]| {
            rest.get(i)
                .map_or(false, |b| range.iter().any(|r| r.contains(b)))
        };

        let width = match self.codec {
            Codec::Binary | Codec::Ascii | Codec::Latin1 | Codec::SingleByte(_) | Codec::Table(_) => 1,
            Codec::Utf8 { .. } => match lead {
                0x00..=0x7F => 1,
                0xC2..=0xDF => 2,
                0xE0..=0xEF => 3,
                0xF0..=0xF4 => 4,
                _ => return Err(invalid()),
            },
            Codec::Utf16Be | Codec::Utf16Le => {
                let unit = match self.codec {
                    Codec::Utf16Be => u16::from_be_bytes([lead, *rest.get(1).ok_or_else(invalid)?]),
                    _ => u16::from_le_bytes([lead, *rest.get(1).ok_or_else(invalid)?]),
                };
                if (0xD800..0xDC00).contains(&unit) {
                    4
                } else {
                    2
                }
            }
            Codec::Utf32 => 4,
            Codec::Ucs2 => 2,
            Codec::Multibyte(_, layout) => match (layout, lead) {
                (_, 0x00..=0x7F) => 1,
                (Layout::Sjis, 0xA1..=0xDF) => 1,
                (Layout::Sjis, 0x81..=0x9F | 0xE0..=0xFC)
                    if trail(1, &[0x40..=0x7E, 0x80..=0xFC]) =>
                {
                    2
                }
                (Layout::Euc, 0x8E) if trail(1, &[0xA1..=0xDF]) => 2,
                (Layout::Euc, 0x8F) if trail(1, &[0xA1..=0xFE]) && trail(2, &[0xA1..=0xFE]) => {
                    3
                }
                (Layout::Euc, 0xA1..=0xFE) if trail(1, &[0xA1..=0xFE]) => 2,
                (Layout::Gbk, 0x81..=0xFE) if trail(1, &[0x40..=0x7E, 0x80..=0xFE]) => 2,
                (Layout::Gb2312, 0xA1..=0xF7) if trail(1, &[0xA1..=0xFE]) => 2,
                (Layout::Big5, 0xA1..=0xF9) if trail(1, &[0x40..=0x7E, 0xA1..=0xFE]) => 2,
                (Layout::EucKr, 0x81..=0xFE)
                    if trail(1, &[0x41..=0x5A, 0x61..=0x7A, 0x81..=0xFE]) =>
                {
                    2
                }
                (Layout::Gb18030, 0x81..=0xFE)
                    if trail(1, &[0x30..=0x39])
                        && trail(2, &[0x81..=0xFE])
                        && trail(3, &[0x30..=0x39]) =>
                {
                    4
                }
                (Layout::Gb18030, 0x81..=0xFE) if trail(1, &[0x40..=0x7E, 0x80..=0xFE]) => 2,
                _ => return Err(invalid()),
            },
        };

        if width > rest.len() {
            return Err(invalid());
        }
        Ok(width)
    }
}

//
// Functions, private
//

impl Charset {
    fn to_char(&self, cp: u32) -> Result<char> {
        if cp > self.max_codepoint {
            return Err(CollationError::unrepresentable(self.name, cp));
        }
        char::from_u32(cp).ok_or_else(|| CollationError::unrepresentable(self.name, cp))
    }

    fn decode_utf8(&self, src: &[u8], max_width: usize) -> Result<Vec<u32>> {
        let text = std::str::from_utf8(src)
            .map_err(|err| CollationError::invalid(self.name, err.valid_up_to()))?;

        let mut codepoints = Vec::with_capacity(text.len());
        for (offset, c) in text.char_indices() {
            if c.len_utf8() > max_width {
                return Err(CollationError::invalid(self.name, offset));
            }
            codepoints.push(u32::from(c));
        }
        Ok(codepoints)
    }

    fn decode_utf16(&self, src: &[u8], unit: fn([u8; 2]) -> u16) -> Result<Vec<u32>> {
        if src.len() % 2 != 0 {
            return Err(CollationError::invalid(self.name, src.len() - 1));
        }

        let units = src.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
        let mut codepoints = Vec::with_capacity(src.len() / 2);
        let mut offset = 0;

        for decoded in char::decode_utf16(units) {
            let c = decoded.map_err(|_| CollationError::invalid(self.name, offset))?;
            offset += c.len_utf16() * 2;
            codepoints.push(u32::from(c));
        }
        Ok(codepoints)
    }

    fn decode_fixed<const N: usize>(&self, src: &[u8], read: fn([u8; N]) -> u32) -> Result<Vec<u32>> {
        if src.len() % N != 0 {
            return Err(CollationError::invalid(self.name, src.len() - src.len() % N));
        }

        src.chunks_exact(N)
            .enumerate()
            .map(|(i, chunk)| {
                let mut bytes = [0; N];
                bytes.copy_from_slice(chunk);
                let cp = read(bytes);
                match char::from_u32(cp) {
                    Some(_) if cp <= self.max_codepoint => Ok(cp),
                    _ => Err(CollationError::invalid(self.name, i * N)),
                }
            })
            .collect()
    }

    fn decode_legacy(&self, src: &[u8], encoding: &'static Encoding) -> Result<Vec<u32>> {
        let mut decoder = encoding.new_decoder_without_bom_handling();
        let mut text = String::with_capacity(
            decoder
                .max_utf8_buffer_length_without_replacement(src.len())
                .unwrap_or(src.len() * 3),
        );
        let mut consumed = 0;

        loop {
            let (result, read) =
                decoder.decode_to_string_without_replacement(&src[consumed..], &mut text, true);
            consumed += read;

            match result {
                DecoderResult::InputEmpty => break,
                DecoderResult::OutputFull => text.reserve(src.len() - consumed + 4),
                DecoderResult::Malformed(bad, extra) => {
                    let offset = consumed - usize::from(extra) - usize::from(bad);
                    return Err(CollationError::invalid(self.name, offset));
                }
            }
        }

        Ok(text.chars().map(u32::from).collect())
    }

    // Encoders may produce sequences outside this charset's layout (GBK-only
    // characters for gb2312), so every character is checked on its own
    fn encode_multibyte(&self, text: &str, encoding: &'static Encoding) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(text.len() * 2);
        let mut buf = [0; 4];

        for c in text.chars() {
            let bytes = self.encode_legacy(c.encode_utf8(&mut buf), encoding)?;
            if self.char_len(&bytes, 0) != Ok(bytes.len()) {
                return Err(CollationError::unrepresentable(self.name, u32::from(c)));
            }
            out.extend_from_slice(&bytes);
        }
        Ok(out)
    }

    fn encode_legacy(&self, text: &str, encoding: &'static Encoding) -> Result<Vec<u8>> {
        let mut encoder = encoding.new_encoder();
        let mut out = Vec::with_capacity(
            encoder
                .max_buffer_length_from_utf8_without_replacement(text.len())
                .unwrap_or(text.len() * 4),
        );
        let mut consumed = 0;

        loop {
            let (result, read) =
                encoder.encode_from_utf8_to_vec_without_replacement(&text[consumed..], &mut out, true);
            consumed += read;

            match result {
                EncoderResult::InputEmpty => return Ok(out),
                EncoderResult::OutputFull => out.reserve(text.len() - consumed + 8),
                EncoderResult::Unmappable(c) => {
                    return Err(CollationError::unrepresentable(self.name, u32::from(c)))
                }
            }
        }
    }
}

fn latin1_to_unicode(byte: u8) -> u32 {
    match byte {
        0x80..=0x9F => u32::from(LATIN1_HIGH[usize::from(byte - 0x80)]),
        _ => u32::from(byte),
    }
}

fn unicode_to_latin1(cp: u32) -> Option<u8> {
    match cp {
        0x00..=0x7F | 0xA0..=0xFF => Some(cp as u8),
        _ => LATIN1_HIGH
            .iter()
            .position(|&high| u32::from(high) == cp)
            .map(|i| 0x80 + i as u8),
    }
}
