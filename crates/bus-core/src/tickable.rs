//! Trait for components driven by the master clock.

use crate::TickError;

/// A component that is advanced by clock ticks.
///
/// The bus invokes subscribers in registration order, once per
/// [`Bus::tick`](crate::Bus::tick). A tick must complete in bounded time;
/// components that need to interleave other work do so between ticks.
pub trait Tickable {
    /// Advance the component by one master clock tick.
    ///
    /// # Errors
    ///
    /// A component fault aborts the current bus tick and is surfaced to the
    /// host unchanged.
    fn tick(&mut self) -> Result<(), TickError>;
}
