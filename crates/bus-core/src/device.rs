//! Memory-mapped device contract.

/// A byte-addressable device that can be mapped into a bus address range.
///
/// Offsets are relative to the device's mapped base address, not absolute
/// bus addresses. A device that also needs clock ticks implements
/// [`Tickable`](crate::Tickable) separately.
///
/// There is no error path: the 6502-era hardware this models has no bus
/// error mechanism. Reads always produce a byte; writes a device cannot
/// accept are dropped.
pub trait BusDevice {
    /// Read the byte at `offset`.
    fn read(&mut self, offset: u16) -> u8;

    /// Write `value` at `offset`.
    fn write(&mut self, offset: u16, value: u8);
}
