/// Output buffer for a weight string, optionally capped at a byte length.
/// Every push reports whether there is room left, so producers can stop
/// as soon as the cap is hit.
#[derive(Debug)]
pub struct KeyWriter {
    buf: Vec<u8>,
    cap: usize,
}

impl KeyWriter {
    pub fn new(max_len: Option<usize>, size_hint: usize) -> Self {
        let cap = max_len.unwrap_or(usize::MAX);
        Self {
            buf: Vec::with_capacity(size_hint.min(cap)),
            cap,
        }
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() >= self.cap
    }

    /// Append as much of `bytes` as fits. Returns false once the cap is reached.
    pub fn push(&mut self, bytes: &[u8]) -> bool {
        let room = self.cap - self.buf.len();
        if bytes.len() >= room {
            self.buf.extend_from_slice(&bytes[..room]);
            return false;
        }
        self.buf.extend_from_slice(bytes);
        true
    }

    pub fn push_u8(&mut self, byte: u8) -> bool {
        self.push(&[byte])
    }

    /// Big-endian, like every multi-byte weight MySQL emits
    pub fn push_u16(&mut self, weight: u16) -> bool {
        self.push(&weight.to_be_bytes())
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}
