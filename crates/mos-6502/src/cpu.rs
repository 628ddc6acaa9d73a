//! The MOS 6502 CPU core.
//!
//! Instruction-centric, cycle-budgeted execution: an instruction's memory
//! effects all happen in the tick that fetches it, and the instruction's
//! cycle cost is banked as wait ticks before the next fetch. Peripherals
//! ticked from the same bus clock therefore stay in phase with the CPU
//! without the core being bus-transaction accurate.

use std::cell::RefCell;
use std::rc::Rc;

use bus_core::{Bus, TickError, Tickable};

use crate::flags;
use crate::opcodes::{Exec, OPCODES};
use crate::registers::Registers;

/// NMI vector address.
pub const NMI_VECTOR: u16 = 0xfffa;
/// Reset vector address.
pub const RESET_VECTOR: u16 = 0xfffc;
/// IRQ/BRK vector address.
pub const IRQ_VECTOR: u16 = 0xfffe;

/// The stack lives in page $01xx; SP is an index into it.
const STACK_BASE: u16 = 0x0100;

/// Cycles consumed by an interrupt sequence.
const INTERRUPT_CYCLES: u32 = 7;

/// The MOS 6502.
///
/// Constructed against a [`Bus`], on which it registers itself as a tick
/// subscriber. Supports the 151 documented opcodes plus the stable
/// undocumented set, binary-coded-decimal arithmetic, and the
/// reset/IRQ/NMI/BRK interrupt model.
pub struct Mos6502 {
    /// Register file. Public so harnesses and loaders can set up state.
    pub regs: Registers,
    /// When set, every executed instruction prints a trace line to stdout:
    /// PC, disassembly, then the post-execution status string.
    pub debug: bool,
    /// Force binary arithmetic regardless of the D flag (6510-in-a-NES
    /// style hosts).
    pub disable_decimal: bool,

    wait_cycles: u32,
    pending_irq: bool,
    pending_nmi: bool,
    bus: Rc<Bus>,
}

impl Mos6502 {
    /// Create a CPU on `bus`, register it as a tick subscriber and reset
    /// it.
    ///
    /// The returned handle is shared with the bus's ticker list; the CPU
    /// lives as long as the bus does.
    pub fn new(bus: &Rc<Bus>) -> Rc<RefCell<Self>> {
        let cpu = Rc::new(RefCell::new(Self {
            regs: Registers::new(),
            debug: false,
            disable_decimal: false,
            wait_cycles: 0,
            pending_irq: false,
            pending_nmi: false,
            bus: Rc::clone(bus),
        }));
        let ticker: Rc<RefCell<dyn Tickable>> = cpu.clone();
        bus.install_ticker(ticker);
        cpu.borrow_mut().reset();
        cpu
    }

    /// Reset the CPU: registers to their reset state, PC from the reset
    /// vector, wait count cleared. May be invoked at any time.
    pub fn reset(&mut self) {
        self.regs = Registers::new();
        self.regs.pc = self.read_word(RESET_VECTOR);
        self.wait_cycles = 0;
        log::trace!("cpu: reset, pc=${:04x}", self.regs.pc);
    }

    /// Request a maskable interrupt. Latched only while I is clear; sampled
    /// at the next instruction boundary.
    pub fn irq(&mut self) {
        if !self.regs.p.is_set(flags::I) {
            self.pending_irq = true;
        }
    }

    /// Request a non-maskable interrupt. Always latched.
    pub fn nmi(&mut self) {
        self.pending_nmi = true;
    }

    /// True while the CPU is burning down an instruction's cycle budget.
    #[must_use]
    pub fn waiting(&self) -> bool {
        self.wait_cycles > 0
    }

    /// Fetch, decode and execute one instruction.
    fn step(&mut self) -> Result<(), TickError> {
        let pc = self.regs.pc;
        let trace_prefix = if self.debug {
            let (asm, _) = self.disassemble(pc);
            Some(format!("{pc:04x}    {asm:<26}"))
        } else {
            None
        };

        let opcode = self.read(pc);
        self.regs.pc = pc.wrapping_add(1);

        let Some(op) = OPCODES[usize::from(opcode)] else {
            return Err(TickError::IllegalOpcode { opcode, pc });
        };

        let arg_addr = self.regs.pc;
        let arg = match op.mode.operands {
            0 => 0,
            1 => u16::from(self.read(arg_addr)),
            _ => self.read_word(arg_addr),
        };
        self.regs.pc = self.regs.pc.wrapping_add(u16::from(op.mode.operands));

        match op.exec {
            Exec::Implied(behavior) => behavior(self),
            Exec::Address(behavior) => {
                let addr = (op.mode.resolve)(self, arg_addr, arg);
                behavior(self, addr);
            }
        }
        self.wait_cycles += u32::from(op.cycles);

        if let Some(prefix) = trace_prefix {
            println!("{prefix}{}", self.status_string());
        }
        Ok(())
    }

    /// Push PC and P, mask IRQs, and vector. NMI wins when both are
    /// pending; only the serviced latch is cleared.
    fn service_interrupt(&mut self) {
        self.push_word(self.regs.pc);
        self.push(self.regs.p.to_pushed_byte(false));
        self.regs.p.set(flags::I);

        let vector = if self.pending_nmi {
            self.pending_nmi = false;
            NMI_VECTOR
        } else {
            self.pending_irq = false;
            IRQ_VECTOR
        };
        self.regs.pc = self.read_word(vector);
        self.wait_cycles = INTERRUPT_CYCLES;
        log::trace!("cpu: interrupt via ${vector:04x}, pc=${:04x}", self.regs.pc);
    }

    /// Disassemble the instruction at `addr` into canonical text, returning
    /// it with the instruction length in bytes. Does not change CPU state.
    #[must_use]
    pub fn disassemble(&self, addr: u16) -> (String, u16) {
        let opcode = self.read(addr);
        let Some(op) = OPCODES[usize::from(opcode)] else {
            return (format!(".byte ${opcode:02x}"), 1);
        };

        let arg_addr = addr.wrapping_add(1);
        let arg = match op.mode.operands {
            0 => 0,
            1 => u16::from(self.read(arg_addr)),
            _ => self.read_word(arg_addr),
        };

        let args = (op.mode.format)(arg_addr, arg);
        let text = if args.is_empty() {
            op.mnemonic.to_string()
        } else {
            format!("{} {args}", op.mnemonic)
        };
        (text, 1 + u16::from(op.mode.operands))
    }

    /// Register/flag dump: `PC:hhhh A:hh X:hh Y:hh SP:hh nv-bdizc`, flag
    /// letters uppercase iff set.
    #[must_use]
    pub fn status_string(&self) -> String {
        const TEMPLATE: &[u8; 8] = b"nv-bdizc";
        let mut flags_text = String::with_capacity(8);
        for (i, &letter) in TEMPLATE.iter().enumerate() {
            let bit = 1u8 << (7 - i);
            if self.regs.p.0 & bit != 0 {
                flags_text.push(letter.to_ascii_uppercase() as char);
            } else {
                flags_text.push(letter as char);
            }
        }
        format!(
            "PC:{:04x} A:{:02x} X:{:02x} Y:{:02x} SP:{:02x} {}",
            self.regs.pc, self.regs.a, self.regs.x, self.regs.y, self.regs.sp, flags_text
        )
    }

    // -- bus and stack plumbing shared with the behavior functions --------

    pub(crate) fn read(&self, addr: u16) -> u8 {
        self.bus.read(addr)
    }

    pub(crate) fn write(&self, addr: u16, value: u8) {
        self.bus.write(addr, value);
    }

    /// Read a little-endian word.
    pub(crate) fn read_word(&self, addr: u16) -> u16 {
        let lo = self.read(addr);
        let hi = self.read(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn push(&mut self, value: u8) {
        self.write(STACK_BASE | u16::from(self.regs.sp), value);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
    }

    pub(crate) fn pop(&mut self) -> u8 {
        self.regs.sp = self.regs.sp.wrapping_add(1);
        self.read(STACK_BASE | u16::from(self.regs.sp))
    }

    /// Push a word, high byte first.
    pub(crate) fn push_word(&mut self, value: u16) {
        self.push((value >> 8) as u8);
        self.push(value as u8);
    }

    /// Pop a word pushed by [`push_word`](Self::push_word).
    pub(crate) fn pop_word(&mut self) -> u16 {
        let lo = self.pop();
        let hi = self.pop();
        u16::from_le_bytes([lo, hi])
    }

    /// Charge extra cycles (page crossings, taken branches).
    pub(crate) fn add_wait(&mut self, cycles: u32) {
        self.wait_cycles += cycles;
    }

    /// BCD arithmetic applies when D is set and the host hasn't suppressed
    /// it.
    pub(crate) fn decimal_enabled(&self) -> bool {
        self.regs.p.is_set(flags::D) && !self.disable_decimal
    }
}

impl Tickable for Mos6502 {
    /// One clock tick: burn a wait cycle if any are owed, otherwise service
    /// a pending interrupt, otherwise execute the next instruction.
    fn tick(&mut self) -> Result<(), TickError> {
        if self.wait_cycles > 0 {
            self.wait_cycles -= 1;
            return Ok(());
        }

        if self.pending_nmi || self.pending_irq {
            self.service_interrupt();
            return Ok(());
        }

        self.step()
    }
}
