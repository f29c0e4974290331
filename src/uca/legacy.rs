use crate::key::KeyWriter;

use super::Uca;

/// UCA 4.0.0 and 5.2.0 collations. They sort on primary weights only.
#[derive(Debug)]
pub struct UcaLegacy {
    uca: Uca,
}

impl UcaLegacy {
    pub fn new(uca: Uca) -> Self {
        Self { uca }
    }

    pub fn uca(&self) -> &Uca {
        &self.uca
    }

    pub fn weight_string(&self, codepoints: &[u32], key: &mut KeyWriter) {
        self.uca.for_each_element(codepoints, |_, w| {
            // ignorables
            if w.primary == 0 {
                return true;
            }
            key.push_u16(w.primary)
        });
    }
}
