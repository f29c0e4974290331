use serde::{Deserialize, Serialize};

/// Moves the primary weights in `from_min..=from_max` so they start at `to_min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Reorder {
    pub from_min: u16,
    pub from_max: u16,
    pub to_min: u16,
    pub to_max: u16,
}

/// Script reordering for one collation, sorted by `from_min`.
#[derive(Debug, Default)]
pub struct Reorders(Box<[Reorder]>);

impl Reorders {
    pub fn new(mut ranges: Vec<Reorder>) -> Self {
        ranges.sort_by_key(|r| r.from_min);

        for r in &ranges {
            assert!(
                r.from_min <= r.from_max && r.to_min <= r.to_max,
                "inverted reorder range {r:?}"
            );
        }
        for pair in ranges.windows(2) {
            assert!(
                pair[0].from_max < pair[1].from_min,
                "overlapping reorder ranges {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }

        Self(ranges.into_boxed_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn apply(&self, primary: u16) -> u16 {
        if primary == 0 || self.0.is_empty() {
            return primary;
        }

        let idx = self.0.partition_point(|r| r.from_min <= primary);
        match idx.checked_sub(1).map(|i| &self.0[i]) {
            Some(r) if primary <= r.from_max => r.to_min.saturating_add(primary - r.from_min),
            _ => primary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(from_min: u16, from_max: u16, to_min: u16, to_max: u16) -> Reorder {
        Reorder {
            from_min,
            from_max,
            to_min,
            to_max,
        }
    }

    #[test]
    fn swaps_two_scripts() {
        let reorders = Reorders::new(vec![
            r(0x1F57, 0x1FD7, 0x1C47, 0x1CC7),
            r(0x1C47, 0x1F21, 0x1CC8, 0x1FA2),
        ]);

        assert_eq!(reorders.apply(0x1F57), 0x1C47);
        assert_eq!(reorders.apply(0x1FD7), 0x1CC7);
        assert_eq!(reorders.apply(0x1C47), 0x1CC8);
        assert_eq!(reorders.apply(0x1F21), 0x1FA2);
        // outside of every range, or ignorable
        assert_eq!(reorders.apply(0x0209), 0x0209);
        assert_eq!(reorders.apply(0x1F22), 0x1F22);
        assert_eq!(reorders.apply(0), 0);
    }

    #[test]
    #[should_panic(expected = "overlapping")]
    fn overlapping_sources_are_fatal() {
        Reorders::new(vec![r(10, 20, 100, 110), r(15, 30, 200, 215)]);
    }
}
