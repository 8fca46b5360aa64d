//! Low-level building blocks used by the `pcint-hal` crate.
//!
//! This module defines the platform-facing API that the dispatch core relies
//! on. A chip crate provides two things:
//!
//! - a register block type implementing [`register::PcIntRegisters`], which
//!   knows how to read a port's input levels and how to drive the per-group
//!   mask and enable registers;
//! - a chip type implementing [`Chip`], which is the pin map: it turns a
//!   logical pin number into a port group and a bit position.
//!
//! Safety notes:
//! - The `Chip::addr()` pointer must be valid and point to the correct
//!   register block for the lifetime of the program.
//! - Implementations should use volatile reads/writes (or generated accessors)
//!   so accesses reach the hardware in program order.
//! - The core only touches the mask and enable registers inside a critical
//!   section, so implementations do not need their own locking.

use crate::PinId;

/// Number of pins sharing one port group.
pub const PINS_PER_GROUP: u8 = 8;

/// Position of a pin inside the pin change interrupt hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinLocation {
    /// Index of the port group (interrupt vector) the pin belongs to.
    pub group: u8,
    /// Bit position of the pin inside its group, `0..8`.
    pub bit: u8,
}

impl PinLocation {
    /// Create a new location.
    ///
    /// `bit` is not checked here. Locations with a bit outside `0..8` are
    /// treated as unmapped by [`PcInt`](crate::PcInt), and their
    /// [`mask`](Self::mask) is empty.
    pub const fn new(group: u8, bit: u8) -> Self {
        Self { group, bit }
    }

    /// Single-bit mask selecting this pin inside its group.
    ///
    /// A bit outside `0..8` selects nothing and gives `0`.
    #[inline]
    pub const fn mask(&self) -> u8 {
        match 1u8.checked_shl(self.bit as u32) {
            Some(mask) => mask,
            None => 0,
        }
    }
}

/// Description of a chip's pin change interrupt hardware.
///
/// A concrete chip type (provided by a platform-specific crate) implements
/// `Chip<R>` for its register block `R`. The trait is the pin map: `resolve`
/// must return `None` for every pin that has no pin change interrupt, and
/// for every pin whose group is not present on this particular chip.
pub trait Chip<R: register::PcIntRegisters> {
    /// Return a new handle pointing at the chip's register block.
    fn get_handle() -> io::PcIntPort<R> {
        io::PcIntPort::new(Self::addr())
    }

    /// Return the base pointer to the register block.
    fn addr() -> *mut R;

    /// Map a logical pin number to its group and bit position.
    fn resolve(pin: PinId) -> Option<PinLocation>;
}

// Example: an ATmega328P style pin map.
//
// ```no_run
// pub struct Atmega328p;
//
// impl Chip<Atmega328pRegs> for Atmega328p {
//     fn addr() -> *mut Atmega328pRegs {
//         0x20 as *mut Atmega328pRegs
//     }
//
//     fn resolve(pin: PinId) -> Option<PinLocation> {
//         match pin {
//             0..=7 => Some(PinLocation::new(2, pin)),
//             8..=13 => Some(PinLocation::new(0, pin - 8)),
//             14..=19 => Some(PinLocation::new(1, pin - 14)),
//             _ => None,
//         }
//     }
// }
// ```

/// Register-level trait describing what the pin change hardware must
/// provide.
///
/// Every method receives the group index so a single register block can
/// describe all of a chip's groups, the way AVR parts expose one `PCICR`
/// and one `PCMSKn`/`PINx` pair per group.
pub mod register {
    /// Represents the hardware register interface for pin change interrupts.
    ///
    /// # Safety
    ///
    /// Implementers must ensure that these functions perform the expected
    /// side effects on the hardware registers for the given group, and only
    /// for that group.
    pub unsafe trait PcIntRegisters {
        /// Read the instantaneous input levels of the port behind `group`.
        fn read_port(ptr: *mut Self, group: u8) -> u8;

        /// Read the pin change mask register of `group`.
        fn read_mask(ptr: *mut Self, group: u8) -> u8;

        /// Write the pin change mask register of `group`.
        fn write_mask(ptr: *mut Self, group: u8, mask: u8);

        /// Enable or disable the interrupt source of `group`.
        fn set_group_enable(ptr: *mut Self, group: u8, enable: bool);
    }
}

/// Thin wrapper around a raw pointer to the register block.
///
/// `io::PcIntPort<R>` keeps unsafe pointer handling in one place and adds the
/// read-modify-write helpers the registration code needs. Those helpers are
/// not atomic on their own; callers hold a critical section.
pub mod io {
    use super::{PinLocation, register::PcIntRegisters};

    /// Opaque handle to a pin change register block.
    pub struct PcIntPort<R: PcIntRegisters> {
        registers: *mut R,
    }

    impl<R> PcIntPort<R>
    where
        R: PcIntRegisters,
    {
        /// Create a new handle from a raw register pointer.
        ///
        /// Only the crate constructs handles; chip crates provide a `Chip`
        /// implementation instead.
        pub(super) fn new(registers: *mut R) -> Self {
            Self { registers }
        }

        /// Read the live input levels of `group`.
        #[inline]
        pub fn read_port(&self, group: u8) -> u8 {
            <R as PcIntRegisters>::read_port(self.registers, group)
        }

        /// Read the mask register of `group`.
        #[inline]
        pub fn mask(&self, group: u8) -> u8 {
            <R as PcIntRegisters>::read_mask(self.registers, group)
        }

        /// Let the pin at `loc` raise its group's interrupt.
        pub fn unmask(&mut self, loc: PinLocation) {
            let mask = self.mask(loc.group) | loc.mask();
            <R as PcIntRegisters>::write_mask(self.registers, loc.group, mask);
        }

        /// Stop the pin at `loc` from raising its group's interrupt.
        ///
        /// Returns the mask left behind for the group.
        pub fn mask_out(&mut self, loc: PinLocation) -> u8 {
            let mask = self.mask(loc.group) & !loc.mask();
            <R as PcIntRegisters>::write_mask(self.registers, loc.group, mask);
            mask
        }

        /// Enable the interrupt source of `group`.
        #[inline]
        pub fn enable_group(&mut self, group: u8) {
            <R as PcIntRegisters>::set_group_enable(self.registers, group, true);
        }

        /// Disable the interrupt source of `group`.
        #[inline]
        pub fn disable_group(&mut self, group: u8) {
            <R as PcIntRegisters>::set_group_enable(self.registers, group, false);
        }
    }
}
