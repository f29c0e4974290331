//! Sort weights of the `_general_ci` collations: accents stripped, case folded
//! to upper. Only the BMP is covered; everything above weighs as U+FFFD.

use once_cell::sync::Lazy;
use unicode_normalization::UnicodeNormalization;

static GENERAL_CI: Lazy<Box<[u16]>> = Lazy::new(|| (0..=0xFFFF).map(fold).collect());

pub fn weight(codepoint: u32) -> u16 {
    let idx = if codepoint > 0xFFFF { 0xFFFD } else { codepoint };
    GENERAL_CI[idx as usize]
}

#[allow(clippy::cast_possible_truncation)]
fn fold(codepoint: u32) -> u16 {
    let Some(c) = char::from_u32(codepoint) else {
        // surrogates
        return codepoint as u16;
    };

    if c == 'ß' {
        return u16::from(b'S');
    }

    let base = c.nfd().next().unwrap_or(c);
    let mut upper = base.to_uppercase();
    let folded = match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => base,
    };

    if u32::from(folded) > 0xFFFF {
        codepoint as u16
    } else {
        u32::from(folded) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(c: char) -> u16 {
        weight(u32::from(c))
    }

    #[test]
    fn folds_case() {
        assert_eq!(w('a'), 0x41);
        assert_eq!(w('A'), 0x41);
        assert_eq!(w('z'), w('Z'));
        assert_eq!(w('д'), w('Д'));
        assert_eq!(w('1'), 0x31);
    }

    #[test]
    fn strips_accents() {
        assert_eq!(w('é'), 0x45);
        assert_eq!(w('Ñ'), 0x4E);
        assert_eq!(w('ß'), 0x53);
    }

    #[test]
    fn above_bmp() {
        assert_eq!(weight(0x1F600), weight(0xFFFD));
        assert_eq!(weight(0xFFFD), 0xFFFD);
    }

    #[test]
    fn multi_char_uppercase_keeps_the_base() {
        // U+0149 'ŉ' uppercases to two characters
        assert_eq!(weight(0x149), 0x149);
    }
}
