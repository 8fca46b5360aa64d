//! Per-vector dispatch state.
//!
//! A [`PortGroup`] is shared between the registration code, running in the
//! foreground, and the pin change handler of its vector. All of it sits
//! behind a [`critical_section::Mutex`], so every multi-field update made
//! by the registration API becomes visible to the handler all at once.

use core::cell::RefCell;

use critical_section::{CriticalSection, Mutex};

use crate::{Callback, Mode, PINS_PER_GROUP, UserArg};

/// One bit position of a group.
#[derive(Clone, Copy)]
pub(crate) struct Slot {
    pub(crate) callback: Option<Callback>,
    pub(crate) arg: UserArg,
}

impl Slot {
    const EMPTY: Self = Self {
        callback: None,
        arg: UserArg::NONE,
    };
}

/// The bits of a group that must be reported after the port moved from
/// `last` to `new`.
///
/// A bit qualifies when it differs from the snapshot and its new level
/// matches one of the directions it asked for.
#[inline]
pub(crate) const fn triggered(last: u8, new: u8, rising: u8, falling: u8) -> u8 {
    let changed = last ^ new;
    let qualifies = (rising & new) | (falling & !new);
    changed & qualifies
}

pub(crate) struct GroupState {
    slots: [Slot; PINS_PER_GROUP as usize],
    rising: u8,
    falling: u8,
    last: u8,
}

impl GroupState {
    const fn new() -> Self {
        Self {
            slots: [Slot::EMPTY; PINS_PER_GROUP as usize],
            rising: 0,
            falling: 0,
            last: 0,
        }
    }

    pub(crate) fn slot(&self, bit: u8) -> Slot {
        self.slots[bit as usize]
    }

    pub(crate) fn set(&mut self, bit: u8, callback: Callback, arg: UserArg, mode: Mode) {
        let mask = 1 << bit;
        self.slots[bit as usize] = Slot {
            callback: Some(callback),
            arg,
        };
        self.rising = if mode.rising() {
            self.rising | mask
        } else {
            self.rising & !mask
        };
        self.falling = if mode.falling() {
            self.falling | mask
        } else {
            self.falling & !mask
        };
    }

    pub(crate) fn clear(&mut self, bit: u8) {
        let mask = 1 << bit;
        self.slots[bit as usize] = Slot::EMPTY;
        self.rising &= !mask;
        self.falling &= !mask;
    }

    /// Take over the live level of `bit` only. The other bits keep tracking
    /// what the handler last saw for their own pins.
    pub(crate) fn refresh(&mut self, bit: u8, port: u8) {
        let mask = 1 << bit;
        self.last = (self.last & !mask) | (port & mask);
    }

    pub(crate) fn mode(&self, bit: u8) -> Option<Mode> {
        let mask = 1 << bit;
        Mode::from_bits(self.rising & mask != 0, self.falling & mask != 0)
    }

    /// Compute the trigger set for `new` and make `new` the snapshot.
    fn latch(&mut self, new: u8) -> u8 {
        let trigger = triggered(self.last, new, self.rising, self.falling);
        self.last = new;
        trigger
    }
}

/// State of one pin change interrupt vector: eight callback slots, their
/// edge modes and the last observed port levels.
///
/// A group starts with every slot empty and a snapshot of `0`, and lives for
/// the whole program. Create one per vector present on the chip, usually
/// through [`PcInt`](crate::PcInt).
pub struct PortGroup {
    state: Mutex<RefCell<GroupState>>,
}

impl PortGroup {
    /// Create an empty group.
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(GroupState::new())),
        }
    }

    /// Run `f` on the group state. `cs` proves interrupts are held off.
    pub(crate) fn with<T>(
        &self,
        cs: CriticalSection<'_>,
        f: impl FnOnce(&mut GroupState) -> T,
    ) -> T {
        f(&mut self.state.borrow_ref_mut(cs))
    }

    /// Last observed levels of the group's eight pins.
    pub fn snapshot(&self) -> u8 {
        critical_section::with(|cs| self.state.borrow_ref(cs).last)
    }

    /// Edge mode configured at `bit`, if a callback is attached there.
    pub fn mode(&self, bit: u8) -> Option<Mode> {
        if bit >= PINS_PER_GROUP {
            return None;
        }
        critical_section::with(|cs| self.state.borrow_ref(cs).mode(bit))
    }

    /// Whether a callback is attached at `bit`.
    pub fn is_attached(&self, bit: u8) -> bool {
        if bit >= PINS_PER_GROUP {
            return false;
        }
        critical_section::with(|cs| self.state.borrow_ref(cs).slot(bit).callback.is_some())
    }

    /// Handler body for this group's vector.
    ///
    /// `new_value` is the port level read at the start of the interrupt.
    /// Every pin whose level differs from the snapshot in a direction it
    /// asked for gets its callback invoked, in ascending bit order, with its
    /// new level. The snapshot becomes `new_value` for the whole port.
    ///
    /// The whole pass runs in one critical section, so registration from
    /// other contexts lands either before or after it. Callbacks may
    /// themselves attach or detach pins, including ones later in the same
    /// pass. Callbacks must not block and must not wait for another
    /// interrupt.
    ///
    /// `new_value` must be read with interrupts held off. Otherwise an
    /// `attach` or `enable` slipping in between the read and this call gets
    /// its snapshot bit overwritten by the older level.
    /// [`PcInt::on_interrupt`](crate::PcInt::on_interrupt) does this.
    pub fn dispatch(&self, new_value: u8) {
        critical_section::with(|cs| self.dispatch_in(cs, new_value));
    }

    pub(crate) fn dispatch_in(&self, cs: CriticalSection<'_>, new_value: u8) {
        let trigger = self.with(cs, |state| state.latch(new_value));

        for bit in 0..PINS_PER_GROUP {
            let mask = 1 << bit;
            if trigger & mask == 0 {
                continue;
            }
            // Copied out, the borrow must not be held while the callback runs.
            let slot = self.state.borrow_ref(cs).slot(bit);
            if let Some(callback) = slot.callback {
                callback(slot.arg, new_value & mask != 0);
            }
        }
    }
}

impl Default for PortGroup {
    fn default() -> Self {
        Self::new()
    }
}
