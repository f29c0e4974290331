// Implicit weights for codepoints with no table entry: [.AAAA.0020.0002][.BBBB.0000.0000]

use super::{UcaVersion, Weights};

/// The twelve unified ideographs in the CJK compatibility block
const HAN_COMPATIBILITY: [u32; 12] = [
    0xFA0E, 0xFA0F, 0xFA11, 0xFA13, 0xFA14, 0xFA1F, 0xFA21, 0xFA23, 0xFA24, 0xFA27, 0xFA28, 0xFA29,
];

pub fn weights(version: UcaVersion, codepoint: u32) -> [Weights; 2] {
    match version {
        UcaVersion::Uca400 | UcaVersion::Uca520 => legacy(codepoint),
        UcaVersion::Uca900 => uca900(codepoint),
    }
}

// Legacy collations compare on the primary level only
fn legacy(codepoint: u32) -> [Weights; 2] {
    #[allow(clippy::manual_range_contains)]
    let base = match codepoint {
        x if x >= 0x3400 && x <= 0x4DB5 => 0xFB80, //   CJK ext. A
        x if x >= 0x4E00 && x <= 0x9FA5 => 0xFB40, //   CJK
        _ => 0xFBC0,                               //   unass.
    };

    #[allow(clippy::cast_possible_truncation)]
    [
        Weights::primary((base + (codepoint >> 15)) as u16),
        Weights::primary(((codepoint & 0x7FFF) | 0x8000) as u16),
    ]
}

fn uca900(codepoint: u32) -> [Weights; 2] {
    #[allow(clippy::manual_range_contains)]
    let (aaaa, bbbb) = match codepoint {
        x if x >= 0x17000 && x <= 0x18AFF => (0xFB00, codepoint - 0x17000), //  Tangut
        x if x >= 0x4E00 && x <= 0x9FD5 => (0xFB40 + (x >> 15), x & 0x7FFF), // CJK
        x if HAN_COMPATIBILITY.contains(&x) => (0xFB40 + (x >> 15), x & 0x7FFF), // CJK
        x if is_han_extension(x) => (0xFB80 + (x >> 15), x & 0x7FFF),         //  CJK ext.
        x => (0xFBC0 + (x >> 15), x & 0x7FFF),                                //  unass.
    };

    #[allow(clippy::cast_possible_truncation)]
    [
        Weights::new(aaaa as u16, 0x0020, 0x0002),
        Weights::new((bbbb | 0x8000) as u16, 0, 0),
    ]
}

fn is_han_extension(codepoint: u32) -> bool {
    [
        (0x3400..=0x4DB5),
        (0x20000..=0x2A6D6),
        (0x2A700..=0x2B734),
        (0x2B740..=0x2B81D),
        (0x2B820..=0x2CEA1),
    ]
    .iter()
    .any(|range| range.contains(&codepoint))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_ranges() {
        assert_eq!(
            weights(UcaVersion::Uca400, 0x3400),
            [Weights::primary(0xFB80), Weights::primary(0xB400)]
        );
        assert_eq!(
            weights(UcaVersion::Uca520, 0x9FA5),
            [Weights::primary(0xFB41), Weights::primary(0x9FA5)]
        );
        // the high bits of the codepoint carry into the base
        assert_eq!(
            weights(UcaVersion::Uca400, 0x7FFF),
            [Weights::primary(0xFB40), Weights::primary(0xFFFF)]
        );
        assert_eq!(
            weights(UcaVersion::Uca400, 0x8000),
            [Weights::primary(0xFB41), Weights::primary(0x8000)]
        );
        assert_eq!(
            weights(UcaVersion::Uca520, 0x1F600),
            [Weights::primary(0xFBC3), Weights::primary(0xF600)]
        );
    }

    #[test]
    fn uca900_ranges() {
        assert_eq!(
            weights(UcaVersion::Uca900, 0x4E2D),
            [Weights::new(0xFB40, 0x20, 0x2), Weights::new(0xCE2D, 0, 0)]
        );
        assert_eq!(
            weights(UcaVersion::Uca900, 0xFA0E)[0].primary,
            0xFB41
        );
        // FA10 is a compatibility ideograph with a canonical decomposition, not a unified one
        assert_eq!(weights(UcaVersion::Uca900, 0xFA10)[0].primary, 0xFBC1);
        assert_eq!(
            weights(UcaVersion::Uca900, 0x20000),
            [Weights::new(0xFB84, 0x20, 0x2), Weights::new(0x8000, 0, 0)]
        );
        assert_eq!(
            weights(UcaVersion::Uca900, 0x17001),
            [Weights::new(0xFB00, 0x20, 0x2), Weights::new(0x8001, 0, 0)]
        );
        assert_eq!(weights(UcaVersion::Uca900, 0xE000)[0].primary, 0xFBC1);
    }
}
