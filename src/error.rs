use core::fmt;

/// Reasons a registration call had no effect.
///
/// These are programming errors, not runtime conditions. The plain
/// registration methods swallow them; the `try_` variants report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The pin has no pin change interrupt on this chip, or its group is
    /// not present.
    UnmappedPin,
    /// `attach` was called without a callback.
    NoCallback,
    /// `enable` was called on a pin with no callback attached.
    NotAttached,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnmappedPin => f.write_str("pin is not mapped to a pin change group"),
            Error::NoCallback => f.write_str("no callback given"),
            Error::NotAttached => f.write_str("no callback attached to pin"),
        }
    }
}

impl core::error::Error for Error {}
