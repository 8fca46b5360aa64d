//! Pin change interrupts for no_std environments.
//!
//! Many microcontrollers only have a handful of dedicated external interrupt
//! lines, but can raise a shared "pin change" interrupt for whole ports of
//! eight pins. This crate turns those shared vectors into per-pin callbacks
//! with rising, falling or change semantics.
//!
//! The pieces:
//! - [`Chip`] and [`PcIntRegisters`] describe the hardware. They are
//!   implemented by a platform crate.
//! - [`PortGroup`] holds the callbacks and last observed levels of one
//!   interrupt vector.
//! - [`PcInt`] owns the groups of a chip and exposes the registration API
//!   (`attach`, `detach`, `enable`, `disable`) plus the handler entry point
//!   ([`PcInt::on_interrupt`]) that each vector must call.
//!
//! Registration happens inside a critical section (see the
//! `critical-section` crate), so the handler never sees a half-written slot.
//! The final binary must provide a critical-section implementation.
//!
//! Edges are detected by comparing the port against the last snapshot. A
//! pulse that starts and ends between two handler runs is not observable,
//! and a pin that flips several times before the handler runs is reported
//! once, with its final level.
//!
//! Detailed example (mocked)
//! The example below is included from an external markdown file and shows a
//! mocked register block, `PcIntRegisters` implementation and `Chip` type.
#![doc = include_str!("../doc/mock_example.md")]
//!
//! ## Feature Flags
#![doc = document_features::document_features!()]
#![no_std]

// MUST be the first module
mod fmt;

mod error;
mod group;
mod low;
mod registry;

use core::ptr;

pub use error::Error;
pub use group::PortGroup;
pub use low::{Chip, PINS_PER_GROUP, PinLocation, io::PcIntPort, register::PcIntRegisters};
pub use registry::PcInt;

/// Logical pin number, as used by the board's pin map.
pub type PinId = u8;

/// Function called when a watched pin changes.
///
/// The second argument is the pin's level after the change.
pub type Callback = fn(UserArg, bool);

/// Which transitions of a pin are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Low to high only.
    Rising,
    /// High to low only.
    Falling,
    /// Both directions.
    Change,
}

impl Mode {
    /// Whether low to high transitions are reported.
    #[inline]
    pub const fn rising(self) -> bool {
        matches!(self, Mode::Rising | Mode::Change)
    }

    /// Whether high to low transitions are reported.
    #[inline]
    pub const fn falling(self) -> bool {
        matches!(self, Mode::Falling | Mode::Change)
    }

    pub(crate) const fn from_bits(rising: bool, falling: bool) -> Option<Self> {
        match (rising, falling) {
            (true, true) => Some(Mode::Change),
            (true, false) => Some(Mode::Rising),
            (false, true) => Some(Mode::Falling),
            (false, false) => None,
        }
    }
}

/// Opaque argument handed back to a [`Callback`].
///
/// The handle does not own what it points to. Keeping the target alive and
/// safe to share with interrupt context for as long as the callback stays
/// attached is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserArg(*const ());

// SAFETY: the handle is never dereferenced by this crate. Reading through it
// requires `unsafe` on the caller's side.
unsafe impl Send for UserArg {}

impl UserArg {
    /// A handle that points nowhere.
    pub const NONE: Self = Self(ptr::null());

    /// Wrap a reference that outlives every attachment.
    pub const fn new<T: Sync>(value: &'static T) -> Self {
        Self(ptr::from_ref(value).cast())
    }

    /// Wrap a raw pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must stay valid for as long as any callback receiving this
    /// handle can run.
    pub const unsafe fn from_ptr<T>(ptr: *const T) -> Self {
        Self(ptr.cast())
    }

    /// The wrapped pointer.
    #[inline]
    pub const fn as_ptr(self) -> *const () {
        self.0
    }

    /// Whether this is [`UserArg::NONE`].
    #[inline]
    pub fn is_none(self) -> bool {
        self.0.is_null()
    }

    /// Reborrow the handle as a `T`.
    ///
    /// Returns `None` for a null handle.
    ///
    /// # Safety
    ///
    /// The handle must have been created from a `T` that is still alive.
    #[inline]
    pub unsafe fn as_ref<'a, T>(self) -> Option<&'a T> {
        // SAFETY: guaranteed by the caller.
        unsafe { self.0.cast::<T>().as_ref() }
    }
}

impl Default for UserArg {
    fn default() -> Self {
        Self::NONE
    }
}
