//! RAM and ROM backing stores.

use crate::BusDevice;

/// Largest useful backing size: the full 16-bit address space.
const MAX_SIZE: usize = 0x1_0000;

/// Zero-initialised read/write memory.
///
/// Accesses wrap modulo the backing size, so mapping a small RAM over a
/// larger window mirrors it across the window.
pub struct Ram {
    bytes: Vec<u8>,
}

impl Ram {
    /// Create `size` bytes of zeroed RAM, capped at 64 KiB.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size.min(MAX_SIZE)],
        }
    }

    /// Copy `data` into the buffer starting at `offset`.
    ///
    /// A convenience for test harnesses and loaders; wraps like any other
    /// access.
    pub fn load(&mut self, offset: u16, data: &[u8]) {
        for (i, &b) in data.iter().enumerate() {
            let off = (offset as usize + i) % self.bytes.len().max(1);
            if let Some(slot) = self.bytes.get_mut(off) {
                *slot = b;
            }
        }
    }
}

impl BusDevice for Ram {
    fn read(&mut self, offset: u16) -> u8 {
        match self.bytes.is_empty() {
            true => 0,
            false => self.bytes[offset as usize % self.bytes.len()],
        }
    }

    fn write(&mut self, offset: u16, value: u8) {
        if !self.bytes.is_empty() {
            let len = self.bytes.len();
            self.bytes[offset as usize % len] = value;
        }
    }
}

/// Read-only memory over a caller-supplied image. Writes are dropped.
pub struct Rom {
    bytes: Vec<u8>,
}

impl Rom {
    /// Wrap `bytes` as ROM. Reads mirror modulo the image length.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl BusDevice for Rom {
    fn read(&mut self, offset: u16) -> u8 {
        match self.bytes.is_empty() {
            true => 0,
            false => self.bytes[offset as usize % self.bytes.len()],
        }
    }

    fn write(&mut self, _offset: u16, _value: u8) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_round_trips() {
        let mut ram = Ram::new(0x100);
        ram.write(0x42, 0x99);
        assert_eq!(ram.read(0x42), 0x99);
    }

    #[test]
    fn ram_starts_zeroed() {
        let mut ram = Ram::new(0x100);
        assert_eq!(ram.read(0x00), 0);
        assert_eq!(ram.read(0xff), 0);
    }

    #[test]
    fn ram_mirrors_modulo_size() {
        let mut ram = Ram::new(0x100);
        ram.write(0x0010, 0x7f);
        assert_eq!(ram.read(0x0110), 0x7f);
        assert_eq!(ram.read(0xff10), 0x7f);
    }

    #[test]
    fn ram_size_capped_at_64k() {
        let mut ram = Ram::new(0x2_0000);
        ram.write(0x0000, 0x01);
        // A 64K backing wraps at 0x10000, so offset 0 is the only alias.
        assert_eq!(ram.read(0x0000), 0x01);
        assert_eq!(ram.read(0xffff), 0x00);
    }

    #[test]
    fn rom_ignores_writes() {
        let mut rom = Rom::new(vec![0xde, 0xad]);
        rom.write(0, 0x00);
        assert_eq!(rom.read(0), 0xde);
        assert_eq!(rom.read(1), 0xad);
        // Mirrored read.
        assert_eq!(rom.read(2), 0xde);
    }

    #[test]
    fn empty_backing_reads_zero() {
        let mut ram = Ram::new(0);
        ram.write(0, 0x55);
        assert_eq!(ram.read(0), 0);
    }
}
