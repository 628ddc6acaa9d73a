//! Shared plumbing for 8-bit machine emulation.
//!
//! A machine is a [`Bus`] with memory-mapped devices installed on it and a
//! set of [`Tickable`] subscribers driven from a single master clock. The
//! host calls [`Bus::tick`] at the target clock rate; everything else is
//! fanout.

mod bus;
mod device;
mod error;
mod memory;
mod tickable;

pub use bus::Bus;
pub use device::BusDevice;
pub use error::TickError;
pub use memory::{Ram, Rom};
pub use tickable::Tickable;
