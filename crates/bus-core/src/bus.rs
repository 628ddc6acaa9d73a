//! Address decoding and clock fanout.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::{BusDevice, TickError, Tickable};

/// A device mapped over an inclusive absolute address range.
struct MappedDevice {
    start: u16,
    end: u16,
    device: Rc<RefCell<dyn BusDevice>>,
}

/// The system bus: a 16-bit address space multiplexed across installed
/// devices, plus the master clock fanout.
///
/// Address decoding is a linear scan in installation order with first-match
/// semantics. Device counts are small (single digits), and first-match lets
/// a host stack a more specific overlay in front of a default range.
///
/// All methods take `&self`: the registries live behind interior
/// mutability so a subscriber may access the bus from inside its own tick.
pub struct Bus {
    tick_count: Cell<u64>,
    tickers: RefCell<Vec<Rc<RefCell<dyn Tickable>>>>,
    devices: RefCell<Vec<MappedDevice>>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    /// Create an empty bus: no devices, no subscribers, tick count zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick_count: Cell::new(0),
            tickers: RefCell::new(Vec::new()),
            devices: RefCell::new(Vec::new()),
        }
    }

    /// Map `device` over the inclusive range `[start, end]`.
    ///
    /// Later installations never shadow earlier ones on overlap.
    pub fn install_device(&self, start: u16, end: u16, device: Rc<RefCell<dyn BusDevice>>) {
        debug_assert!(start <= end);
        self.devices
            .borrow_mut()
            .push(MappedDevice { start, end, device });
    }

    /// Append a subscriber to the tick fanout.
    pub fn install_ticker(&self, ticker: Rc<RefCell<dyn Tickable>>) {
        self.tickers.borrow_mut().push(ticker);
    }

    /// Advance the clock by one tick.
    ///
    /// The tick counter is incremented before fanout; subscribers run in
    /// registration order.
    ///
    /// # Errors
    ///
    /// The first subscriber failure aborts the tick and is propagated
    /// unchanged.
    pub fn tick(&self) -> Result<(), TickError> {
        self.tick_count.set(self.tick_count.get() + 1);

        // Snapshot so a subscriber may install tickers mid-tick; the new
        // subscriber first runs on the following tick.
        let tickers: Vec<_> = self.tickers.borrow().clone();
        for ticker in tickers {
            ticker.borrow_mut().tick()?;
        }
        Ok(())
    }

    /// Total ticks since construction.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count.get()
    }

    /// Read the byte at absolute address `addr`.
    ///
    /// Unmapped addresses read as 0.
    #[must_use]
    pub fn read(&self, addr: u16) -> u8 {
        match self.find_device(addr) {
            Some((start, device)) => device.borrow_mut().read(addr - start),
            None => {
                log::trace!("bus: read from unmapped ${addr:04x}");
                0
            }
        }
    }

    /// Write the byte at absolute address `addr`.
    ///
    /// Writes to unmapped addresses are dropped.
    pub fn write(&self, addr: u16, value: u8) {
        match self.find_device(addr) {
            Some((start, device)) => device.borrow_mut().write(addr - start, value),
            None => log::trace!("bus: write to unmapped ${addr:04x}"),
        }
    }

    /// First installed device whose range contains `addr`, with its base.
    fn find_device(&self, addr: u16) -> Option<(u16, Rc<RefCell<dyn BusDevice>>)> {
        self.devices
            .borrow()
            .iter()
            .find(|m| addr >= m.start && addr <= m.end)
            .map(|m| (m.start, Rc::clone(&m.device)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ram;

    struct CountingTicker {
        ticks: u32,
        fail_on: Option<u32>,
    }

    impl Tickable for CountingTicker {
        fn tick(&mut self) -> Result<(), TickError> {
            self.ticks += 1;
            if self.fail_on == Some(self.ticks) {
                return Err(TickError::Device("counting ticker gave out".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn unmapped_reads_zero_writes_dropped() {
        let bus = Bus::new();
        assert_eq!(bus.read(0x1234), 0);
        bus.write(0x1234, 0xff);
        assert_eq!(bus.read(0x1234), 0);
    }

    #[test]
    fn decode_is_relative_to_device_base() {
        let bus = Bus::new();
        bus.install_device(0x8000, 0x8fff, Rc::new(RefCell::new(Ram::new(0x1000))));
        bus.write(0x8004, 0x42);
        assert_eq!(bus.read(0x8004), 0x42);
        // Same offset in a different window is unmapped.
        assert_eq!(bus.read(0x0004), 0);
    }

    #[test]
    fn first_match_wins_on_overlap() {
        let bus = Bus::new();
        let overlay = Rc::new(RefCell::new(Ram::new(0x100)));
        bus.install_device(0x0000, 0x00ff, overlay.clone());
        bus.install_device(0x0000, 0xffff, Rc::new(RefCell::new(Ram::new(0x10000))));

        bus.write(0x0010, 0xaa);
        assert_eq!(overlay.borrow_mut().read(0x0010), 0xaa);
    }

    #[test]
    fn tick_counts_and_fans_out_in_order() {
        let bus = Bus::new();
        let a = Rc::new(RefCell::new(CountingTicker { ticks: 0, fail_on: None }));
        let b = Rc::new(RefCell::new(CountingTicker { ticks: 0, fail_on: None }));
        bus.install_ticker(a.clone());
        bus.install_ticker(b.clone());

        for _ in 0..5 {
            bus.tick().unwrap();
        }
        assert_eq!(bus.tick_count(), 5);
        assert_eq!(a.borrow().ticks, 5);
        assert_eq!(b.borrow().ticks, 5);
    }

    #[test]
    fn ticker_error_aborts_fanout() {
        let bus = Bus::new();
        let failing = Rc::new(RefCell::new(CountingTicker { ticks: 0, fail_on: Some(1) }));
        let after = Rc::new(RefCell::new(CountingTicker { ticks: 0, fail_on: None }));
        bus.install_ticker(failing);
        bus.install_ticker(after.clone());

        assert!(bus.tick().is_err());
        // The counter still advanced; the subscriber after the failure did not run.
        assert_eq!(bus.tick_count(), 1);
        assert_eq!(after.borrow().ticks, 0);
    }
}
