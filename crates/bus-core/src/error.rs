//! Errors crossing the tick boundary.

use thiserror::Error;

/// Failure reported by a tick subscriber.
///
/// The bus aborts the current tick on the first failing subscriber and
/// propagates the error to the host; whether to keep ticking is the host's
/// call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickError {
    /// The CPU fetched an opcode byte with no dispatch entry.
    ///
    /// The dispatch table covers all 256 bytes, so this is unreachable in
    /// practice; it exists so a decode hole is a reported error rather than
    /// a panic.
    #[error("illegal opcode ${opcode:02x} at ${pc:04x}")]
    IllegalOpcode { opcode: u8, pc: u16 },

    /// A device-specific fault.
    #[error("device fault: {0}")]
    Device(String),
}
