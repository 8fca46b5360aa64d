//! Registration API.

use core::marker::PhantomData;

use crate::{
    Callback, Chip, Error, Mode, PINS_PER_GROUP, PcIntPort, PcIntRegisters, PinId, PinLocation,
    PortGroup, UserArg,
};

/// Pin change interrupt controller for one chip.
///
/// Generic parameters:
/// - `C`: chip type implementing `Chip<R>`, the pin map.
/// - `R`: register block implementing `PcIntRegisters`.
/// - `N`: number of port groups present on the chip. Group ids `0..N` are
///   served; pins resolving to any other group are treated as unmapped.
///
/// `PcInt` is meant to live in a `static` so both the application and the
/// interrupt handlers can reach it:
///
/// ```ignore
/// static PCINT: PcInt<Atmega328p, Atmega328pRegs, 3> = PcInt::new();
///
/// #[avr_device::interrupt(atmega328p)]
/// fn PCINT0() {
///     PCINT.on_interrupt(0);
/// }
/// ```
pub struct PcInt<C, R, const N: usize>
where
    C: Chip<R>,
    R: PcIntRegisters,
{
    groups: [PortGroup; N],
    chip: PhantomData<fn() -> C>,
    register: PhantomData<fn() -> R>,
}

impl<C, R, const N: usize> PcInt<C, R, N>
where
    C: Chip<R>,
    R: PcIntRegisters,
{
    /// Create a controller with every slot of every group empty.
    pub const fn new() -> Self {
        Self {
            groups: [const { PortGroup::new() }; N],
            chip: PhantomData,
            register: PhantomData,
        }
    }

    /// The state of group `id`, if the chip has it.
    pub fn group(&self, id: u8) -> Option<&PortGroup> {
        self.groups.get(id as usize)
    }

    fn locate(&self, pin: PinId) -> Result<(PinLocation, &PortGroup), Error> {
        let loc = <C as Chip<R>>::resolve(pin).ok_or(Error::UnmappedPin)?;
        if loc.bit >= PINS_PER_GROUP {
            warn!("pin {} resolves to bit {}, outside of its group", pin, loc.bit);
            return Err(Error::UnmappedPin);
        }
        let group = self.group(loc.group).ok_or(Error::UnmappedPin)?;
        Ok((loc, group))
    }

    /// Call `callback` with `arg` whenever `pin` moves in a direction
    /// selected by `mode`.
    ///
    /// Replaces any earlier attachment of the pin. Does nothing if the pin
    /// is unmapped or `callback` is `None`.
    pub fn attach(&self, pin: PinId, callback: Option<Callback>, arg: UserArg, mode: Mode) {
        if let Err(err) = self.try_attach(pin, callback, arg, mode) {
            debug!("attach on pin {} ignored: {}", pin, err);
        }
    }

    /// Like [`attach`](Self::attach), reporting why nothing happened.
    pub fn try_attach(
        &self,
        pin: PinId,
        callback: Option<Callback>,
        arg: UserArg,
        mode: Mode,
    ) -> Result<(), Error> {
        let (loc, group) = self.locate(pin)?;
        let callback = callback.ok_or(Error::NoCallback)?;

        critical_section::with(|cs| {
            let mut port = <C as Chip<R>>::get_handle();
            group.with(cs, |state| {
                state.set(loc.bit, callback, arg, mode);
                port.unmask(loc);
                port.enable_group(loc.group);
                state.refresh(loc.bit, port.read_port(loc.group));
            });
        });

        trace!("pin {} attached ({}:{})", pin, loc.group, loc.bit);
        Ok(())
    }

    /// Forget the callback of `pin` and stop watching it.
    ///
    /// The group's interrupt source is switched off once no pin of the
    /// group is watched any more. Does nothing if the pin is unmapped.
    pub fn detach(&self, pin: PinId) {
        if let Err(err) = self.try_detach(pin) {
            debug!("detach on pin {} ignored: {}", pin, err);
        }
    }

    /// Like [`detach`](Self::detach), reporting why nothing happened.
    pub fn try_detach(&self, pin: PinId) -> Result<(), Error> {
        let (loc, group) = self.locate(pin)?;

        critical_section::with(|cs| {
            let mut port = <C as Chip<R>>::get_handle();
            group.with(cs, |state| {
                state.clear(loc.bit);
                Self::mask_out(&mut port, loc);
            });
        });

        trace!("pin {} detached", pin);
        Ok(())
    }

    /// Resume watching `pin` after [`disable`](Self::disable), with the
    /// callback, argument and mode it had.
    ///
    /// Does nothing if the pin is unmapped or has no callback attached.
    pub fn enable(&self, pin: PinId) {
        if let Err(err) = self.try_enable(pin) {
            debug!("enable on pin {} ignored: {}", pin, err);
        }
    }

    /// Like [`enable`](Self::enable), reporting why nothing happened.
    pub fn try_enable(&self, pin: PinId) -> Result<(), Error> {
        let (loc, group) = self.locate(pin)?;

        critical_section::with(|cs| {
            let mut port = <C as Chip<R>>::get_handle();
            group.with(cs, |state| {
                if state.slot(loc.bit).callback.is_none() {
                    return Err(Error::NotAttached);
                }
                port.unmask(loc);
                port.enable_group(loc.group);
                state.refresh(loc.bit, port.read_port(loc.group));
                Ok(())
            })
        })?;

        trace!("pin {} enabled", pin);
        Ok(())
    }

    /// Stop watching `pin` without forgetting its callback.
    ///
    /// Does nothing if the pin is unmapped.
    pub fn disable(&self, pin: PinId) {
        if let Err(err) = self.try_disable(pin) {
            debug!("disable on pin {} ignored: {}", pin, err);
        }
    }

    /// Like [`disable`](Self::disable), reporting why nothing happened.
    pub fn try_disable(&self, pin: PinId) -> Result<(), Error> {
        let (loc, _) = self.locate(pin)?;

        critical_section::with(|_| {
            let mut port = <C as Chip<R>>::get_handle();
            Self::mask_out(&mut port, loc);
        });

        trace!("pin {} disabled", pin);
        Ok(())
    }

    fn mask_out(port: &mut PcIntPort<R>, loc: PinLocation) {
        if port.mask_out(loc) == 0 {
            port.disable_group(loc.group);
        }
    }

    /// Edge mode of `pin`, if a callback is attached to it.
    pub fn mode(&self, pin: PinId) -> Option<Mode> {
        let (loc, group) = self.locate(pin).ok()?;
        group.mode(loc.bit)
    }

    /// Whether a callback is attached to `pin`.
    pub fn is_attached(&self, pin: PinId) -> bool {
        self.locate(pin).is_ok_and(|(loc, group)| group.is_attached(loc.bit))
    }

    /// Whether `pin` is currently allowed to raise its group's interrupt.
    pub fn is_enabled(&self, pin: PinId) -> bool {
        match self.locate(pin) {
            Ok((loc, _)) => <C as Chip<R>>::get_handle().mask(loc.group) & loc.mask() != 0,
            Err(_) => false,
        }
    }

    /// Handler entry point for group `id`.
    ///
    /// Bind every vector present on the chip to a function calling this
    /// with the vector's group id. Reads the port and runs
    /// [`PortGroup::dispatch`], both in the same critical section so no
    /// registration can land between the read and the snapshot update.
    /// Unknown ids are ignored.
    #[inline]
    pub fn on_interrupt(&self, id: u8) {
        if let Some(group) = self.group(id) {
            critical_section::with(|cs| {
                let new_value = <C as Chip<R>>::get_handle().read_port(id);
                group.dispatch_in(cs, new_value);
            });
        }
    }
}

impl<C, R, const N: usize> Default for PcInt<C, R, N>
where
    C: Chip<R>,
    R: PcIntRegisters,
{
    fn default() -> Self {
        Self::new()
    }
}
