use crate::key::KeyWriter;

use super::{Reorders, Uca, Weights};

/// Tertiary weights of upper-case variants in the 9.0.0 table
const UPPER_TERTIARY: [u16; 9] = [0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0E, 0x11, 0x12, 0x1D];

/// UCA 9.0.0 collations. Up to three levels of weights, plus a fourth
/// (kana) level for the `_ks` variants.
#[derive(Debug)]
pub struct Uca900 {
    uca: Uca,
    levels: u8,
    reorder: Reorders,
    upper_case_first: bool,
}

impl Uca900 {
    pub fn new(uca: Uca, levels: u8, reorder: Reorders, upper_case_first: bool) -> Self {
        assert!(
            (1..=4).contains(&levels),
            "UCA 9.0.0 collations compare on 1 to 4 levels, got {levels}"
        );
        Self {
            uca,
            levels,
            reorder,
            upper_case_first,
        }
    }

    pub fn uca(&self) -> &Uca {
        &self.uca
    }

    pub fn levels(&self) -> u8 {
        self.levels
    }

    pub fn weight_string(&self, codepoints: &[u32], key: &mut KeyWriter) {
        // Primary-only collations can write while scanning
        if self.levels == 1 {
            self.uca.for_each_element(codepoints, |_, w| {
                let primary = self.reorder.apply(w.primary);
                primary == 0 || key.push_u16(primary)
            });
            return;
        }

        let mut elements: Vec<(u32, Weights)> = Vec::with_capacity(codepoints.len() * 2);
        self.uca.for_each_element(codepoints, |cp, w| {
            elements.push((cp, self.adjust(w)));
            true
        });

        for level in 1..=self.levels {
            if level > 1 && !key.push_u16(0) {
                return;
            }

            for &(cp, w) in &elements {
                let weight = match level {
                    1 => w.primary,
                    2 => w.secondary,
                    3 => w.tertiary,
                    _ => quaternary(cp, w),
                };
                if weight != 0 && !key.push_u16(weight) {
                    return;
                }
            }
        }
    }
}

impl Uca900 {
    fn adjust(&self, mut w: Weights) -> Weights {
        w.primary = self.reorder.apply(w.primary);

        if self.upper_case_first && w.tertiary != 0 && w.tertiary < 0x20 {
            w.tertiary |= if UPPER_TERTIARY.contains(&w.tertiary) {
                0x0100
            } else {
                0x0200
            };
        }

        w
    }
}

fn quaternary(codepoint: u32, w: Weights) -> u16 {
    if w.primary == 0 {
        return 0;
    }

    match codepoint {
        0x3040..=0x309F => 0x0020,
        0x30A0..=0x30FF | 0x31F0..=0x31FF | 0xFF66..=0xFF9D => 0x0021,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::{TableDump, WeightEntry};
    use crate::uca::{Contractions, Reorder, UcaVersion, WeightTable};

    fn uca() -> Uca {
        let entries = vec![
            (0x20, vec![Weights::new(0x0209, 0x20, 0x02)]),
            ('a' as u32, vec![Weights::new(0x1C47, 0x20, 0x02)]),
            ('A' as u32, vec![Weights::new(0x1C47, 0x20, 0x08)]),
            ('b' as u32, vec![Weights::new(0x1C60, 0x20, 0x02)]),
            (
                'á' as u32,
                vec![Weights::new(0x1C47, 0x20, 0x02), Weights::new(0, 0x24, 0x02)],
            ),
            ('д' as u32, vec![Weights::new(0x1F63, 0x20, 0x02)]),
            ('あ' as u32, vec![Weights::new(0x3D5A, 0x20, 0x0E)]),
            ('ア' as u32, vec![Weights::new(0x3D5A, 0x20, 0x11)]),
        ]
        .into_iter()
        .map(|(codepoint, weights)| WeightEntry { codepoint, weights })
        .collect();

        let table = Arc::new(WeightTable::from_dump(TableDump {
            name: "uca900".to_string(),
            version: UcaVersion::Uca900,
            entries,
        }));
        Uca::new(table, vec![], Contractions::default(), 0x10FFFF)
    }

    fn weigh(uca: &Uca900, text: &str) -> Vec<u8> {
        let codepoints: Vec<u32> = text.chars().map(u32::from).collect();
        let mut key = KeyWriter::new(None, 0);
        uca.weight_string(&codepoints, &mut key);
        key.finish()
    }

    fn plain(levels: u8) -> Uca900 {
        Uca900::new(uca(), levels, Reorders::default(), false)
    }

    #[test]
    fn accent_insensitive() {
        let ai = plain(1);
        assert_eq!(weigh(&ai, "ab"), vec![0x1C, 0x47, 0x1C, 0x60]);
        assert_eq!(weigh(&ai, "á"), weigh(&ai, "A"));
    }

    #[test]
    fn level_separators() {
        let as_ci = plain(2);
        assert_eq!(weigh(&as_ci, "a"), vec![0x1C, 0x47, 0x00, 0x00, 0x00, 0x20]);
        assert_eq!(
            weigh(&as_ci, "á"),
            vec![0x1C, 0x47, 0x00, 0x00, 0x00, 0x20, 0x00, 0x24]
        );

        let as_cs = plain(3);
        assert_eq!(
            weigh(&as_cs, "A"),
            vec![0x1C, 0x47, 0x00, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x08]
        );
        assert!(weigh(&as_cs, "a") < weigh(&as_cs, "A"));
    }

    #[test]
    fn trailing_space_counts() {
        let ai = plain(1);
        assert_eq!(weigh(&ai, "a "), vec![0x1C, 0x47, 0x02, 0x09]);
    }

    #[test]
    fn upper_case_first() {
        let da = Uca900::new(uca(), 3, Reorders::default(), true);
        let lower = weigh(&da, "a");
        let upper = weigh(&da, "A");
        assert_eq!(&lower[8..], &[0x02, 0x02]);
        assert_eq!(&upper[8..], &[0x01, 0x08]);
        assert!(upper < lower);
    }

    #[test]
    fn reorder_moves_cyrillic_before_latin() {
        let ru = Uca900::new(
            uca(),
            1,
            Reorders::new(vec![
                Reorder {
                    from_min: 0x1F57,
                    from_max: 0x1FD7,
                    to_min: 0x1C47,
                    to_max: 0x1CC7,
                },
                Reorder {
                    from_min: 0x1C47,
                    from_max: 0x1F21,
                    to_min: 0x1CC8,
                    to_max: 0x1FA2,
                },
            ]),
            false,
        );
        assert_eq!(weigh(&ru, "д"), vec![0x1C, 0x53]);
        assert_eq!(weigh(&ru, "a"), vec![0x1C, 0xC8]);
        assert!(weigh(&ru, "д") < weigh(&ru, "a"));
        // punctuation is outside every range
        assert_eq!(weigh(&ru, " "), vec![0x02, 0x09]);
    }

    #[test]
    fn kana_sensitive() {
        let ks = plain(4);
        let hiragana = weigh(&ks, "あ");
        let katakana = weigh(&ks, "ア");
        assert_eq!(&hiragana[hiragana.len() - 4..], &[0x00, 0x00, 0x00, 0x20]);
        assert_eq!(&katakana[katakana.len() - 4..], &[0x00, 0x00, 0x00, 0x21]);

        // latin contributes nothing on the fourth level
        let latin = weigh(&ks, "a");
        assert_eq!(&latin[latin.len() - 4..], &[0x00, 0x02, 0x00, 0x00]);
    }

    #[test]
    fn truncation_is_a_prefix() {
        let as_cs = plain(3);
        let full = weigh(&as_cs, "Aáb");
        for n in 0..=full.len() {
            let codepoints: Vec<u32> = "Aáb".chars().map(u32::from).collect();
            let mut key = KeyWriter::new(Some(n), 0);
            as_cs.weight_string(&codepoints, &mut key);
            assert_eq!(key.finish(), full[..n]);
        }
    }
}
