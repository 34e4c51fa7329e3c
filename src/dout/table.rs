/// One chain bitmap plus the flag that propagates it forward.
///
/// Bit `i` of byte `b` holds logical chain port `b * 8 + i`. Only the first
/// `len` bytes are in use; the rest of the backing array is capacity.
pub(crate) struct ChainTable<const CB: usize> {
    bytes: [u8; CB],
    len: usize,
    changed: bool,
}

impl<const CB: usize> ChainTable<CB> {
    pub(crate) fn new(len: usize) -> Self {
        debug_assert!(len <= CB, "chain length must fit the table capacity");

        Self {
            bytes: [0; CB],
            len,
            changed: false,
        }
    }

    #[inline]
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    #[inline]
    pub(crate) fn bit(&self, byte: usize, bit: u8) -> bool {
        self.bytes[byte] & (1 << bit) != 0
    }

    /// Sets or clears one bit. Returns false when it already held `level`.
    pub(crate) fn set_bit(&mut self, byte: usize, bit: u8, level: bool) -> bool {
        if self.bit(byte, bit) == level {
            return false;
        }

        if level {
            self.bytes[byte] |= 1 << bit;
        } else {
            self.bytes[byte] &= !(1 << bit);
        }
        true
    }

    /// Drives every active byte to `0xFF` or `0x00`.
    pub(crate) fn fill(&mut self, level: bool) {
        let value = if level { 0xFF } else { 0x00 };
        for byte in self.bytes[..self.len].iter_mut() {
            if *byte != value {
                *byte = value;
            }
        }
    }

    pub(crate) fn copy_from(&mut self, other: &ChainTable<CB>) {
        self.bytes[..self.len].copy_from_slice(&other.bytes[..self.len]);
    }

    #[inline]
    pub(crate) fn is_changed(&self) -> bool {
        self.changed
    }

    #[inline]
    pub(crate) fn mark_changed(&mut self) {
        self.changed = true;
    }

    #[inline]
    pub(crate) fn clear_changed(&mut self) {
        self.changed = false;
    }
}
