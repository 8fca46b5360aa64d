#![allow(dead_code)]

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicU8, Ordering},
};

use pcint_hal::{PcIntRegisters, PinId, PinLocation, UserArg};

/// Groups the mock register block has. The mock chip only instantiates
/// three of them, group 3 stands for a vector missing on the part.
pub const MOCK_GROUPS: usize = 4;

/// Fake pin change registers, one input/mask/enable triple per group.
pub struct MockRegs {
    port: [AtomicU8; MOCK_GROUPS],
    mask: [AtomicU8; MOCK_GROUPS],
    enabled: [AtomicBool; MOCK_GROUPS],
    on_read: Mutex<Option<fn()>>,
}

impl MockRegs {
    pub const fn new() -> Self {
        Self {
            port: [const { AtomicU8::new(0) }; MOCK_GROUPS],
            mask: [const { AtomicU8::new(0) }; MOCK_GROUPS],
            enabled: [const { AtomicBool::new(false) }; MOCK_GROUPS],
            on_read: Mutex::new(None),
        }
    }

    pub fn set_port(&self, group: u8, value: u8) {
        self.port[group as usize].store(value, Ordering::SeqCst);
    }

    pub fn mask(&self, group: u8) -> u8 {
        self.mask[group as usize].load(Ordering::SeqCst)
    }

    pub fn enabled(&self, group: u8) -> bool {
        self.enabled[group as usize].load(Ordering::SeqCst)
    }

    /// Run `hook` once, right after the next port read took its value.
    pub fn after_next_read(&self, hook: fn()) {
        *self.on_read.lock().unwrap() = Some(hook);
    }
}

fn regs<'a>(ptr: *mut MockRegs) -> &'a MockRegs {
    unsafe { &*ptr }
}

unsafe impl PcIntRegisters for MockRegs {
    fn read_port(ptr: *mut Self, group: u8) -> u8 {
        let regs = regs(ptr);
        let value = regs.port[group as usize].load(Ordering::SeqCst);
        let hook = regs.on_read.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        value
    }

    fn read_mask(ptr: *mut Self, group: u8) -> u8 {
        regs(ptr).mask[group as usize].load(Ordering::SeqCst)
    }

    fn write_mask(ptr: *mut Self, group: u8, mask: u8) {
        regs(ptr).mask[group as usize].store(mask, Ordering::SeqCst);
    }

    fn set_group_enable(ptr: *mut Self, group: u8, enable: bool) {
        regs(ptr).enabled[group as usize].store(enable, Ordering::SeqCst);
    }
}

/// Pin map of the mock chip.
///
/// - `0..32`: eight pins per group, groups 0 to 3
/// - `40`: a broken table entry pointing at bit 9
/// - anything else: no pin change interrupt
pub fn resolve(pin: PinId) -> Option<PinLocation> {
    match pin {
        0..=31 => Some(PinLocation::new(pin / 8, pin % 8)),
        40 => Some(PinLocation::new(0, 9)),
        _ => None,
    }
}

/// Declare a chip type backed by its own register block, so tests running
/// in parallel never share hardware state.
macro_rules! mock_chip {
    ($name:ident) => {
        struct $name;

        impl $name {
            fn regs() -> &'static common::MockRegs {
                static REGS: common::MockRegs = common::MockRegs::new();
                &REGS
            }
        }

        impl pcint_hal::Chip<common::MockRegs> for $name {
            fn addr() -> *mut common::MockRegs {
                std::ptr::from_ref(Self::regs()).cast_mut()
            }

            fn resolve(pin: pcint_hal::PinId) -> Option<pcint_hal::PinLocation> {
                common::resolve(pin)
            }
        }
    };
}

pub(crate) use mock_chip;

/// Callback invocations seen by a test, as `(tag, level)`.
pub struct Log(Mutex<Vec<(u8, bool)>>);

impl Log {
    pub fn new() -> &'static Self {
        Box::leak(Box::new(Self(Mutex::new(Vec::new()))))
    }

    pub fn take(&self) -> Vec<(u8, bool)> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn push(&self, tag: u8, level: bool) {
        self.0.lock().unwrap().push((tag, level));
    }
}

/// User argument of [`record`]: which log to write to and under which tag.
pub struct Tagged {
    pub tag: u8,
    pub log: &'static Log,
}

/// Build the argument for [`record`].
pub fn tagged(log: &'static Log, tag: u8) -> UserArg {
    UserArg::new(Box::leak(Box::new(Tagged { tag, log })))
}

/// Callback appending `(tag, level)` to the record's log.
pub fn record(arg: UserArg, level: bool) {
    let entry = unsafe { arg.as_ref::<Tagged>() }.unwrap();
    entry.log.push(entry.tag, level);
}
