//! Setting codec
//!
//! Bidirectional mapping between the module's reply tokens and typed
//! setting values. Each family keeps one static token table; both lookup
//! directions are derived from it, so the two mappings cannot diverge.
//! Tokens are case-sensitive and must match the firmware exactly.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ProtocolError;

/// A configurable setting family of the module.
///
/// Implementors are closed sets of values, each bound to a unique
/// protocol token. The module's firmware defines the tables; nothing here
/// is negotiated at runtime.
pub trait Setting: Copy + Eq + fmt::Display + Sized + 'static {
    /// Family name used in error reports
    const FAMILY: &'static str;

    /// Query command for this family, e.g. `AT+BAUD?`
    const QUERY: &'static str;

    /// Token table, one entry per value the firmware accepts
    const TOKENS: &'static [(&'static str, Self)];

    /// Look up a reply token.
    ///
    /// Fails with [`ProtocolError::UnknownToken`] for anything outside
    /// the table; a token this codec does not know indicates firmware or
    /// protocol drift and must not be silently coerced.
    fn parse(token: &str) -> Result<Self, ProtocolError> {
        Self::TOKENS
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, v)| *v)
            .ok_or_else(|| ProtocolError::UnknownToken {
                family: Self::FAMILY,
                token: token.to_string(),
            })
    }

    /// Reverse lookup: the token for a value.
    ///
    /// Fails with [`ProtocolError::UnsupportedValue`] when no token maps
    /// to the value; reported to the caller, never fatal.
    fn token(self) -> Result<&'static str, ProtocolError> {
        Self::TOKENS
            .iter()
            .find(|(_, v)| *v == self)
            .map(|(t, _)| *t)
            .ok_or_else(|| ProtocolError::UnsupportedValue {
                family: Self::FAMILY,
                value: self.to_string(),
            })
    }
}

/// Data baud rate of the module's serial side, in bits per second.
///
/// A newtype over plain bps so callers can hand values straight to a
/// presentation layer; only rates in the token table are representable on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaudRate(u32);

impl BaudRate {
    /// Validate a caller-supplied rate against the firmware's table
    pub fn from_bps(bps: u32) -> Result<Self, ProtocolError> {
        let rate = Self(bps);
        rate.token()?;
        Ok(rate)
    }

    /// The rate in bits per second
    pub const fn bps(self) -> u32 {
        self.0
    }
}

impl Default for BaudRate {
    /// Factory default of the module
    fn default() -> Self {
        Self(19_200)
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Setting for BaudRate {
    const FAMILY: &'static str = "baud rate";
    const QUERY: &'static str = "AT+BAUD?";
    const TOKENS: &'static [(&'static str, Self)] = &[
        ("BAUD10", BaudRate(1_200)),
        ("BAUD11", BaudRate(2_400)),
        ("BAUD12", BaudRate(4_800)),
        ("BAUD13", BaudRate(9_600)),
        ("BAUD14", BaudRate(19_200)), // factory default
        ("BAUD15", BaudRate(38_400)),
        ("BAUD16", BaudRate(57_600)),
        ("BAUD17", BaudRate(115_200)),
        ("BAUD18", BaudRate(230_400)),
        ("BAUD19", BaudRate(460_800)),
        ("BAUD20", BaudRate(921_600)),
    ];
}

/// Parity of the module's serial side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Parity::None => "None",
            Parity::Odd => "Odd",
            Parity::Even => "Even",
        };
        f.write_str(s)
    }
}

impl Setting for Parity {
    const FAMILY: &'static str = "parity";
    const QUERY: &'static str = "AT+PAR?";
    const TOKENS: &'static [(&'static str, Self)] = &[
        ("PAR0", Parity::None),
        ("PAR1", Parity::Odd),
        ("PAR2", Parity::Even),
    ];
}

/// Stop bits of the module's serial side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopBits {
    One,
    Two,
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopBits::One => "One",
            StopBits::Two => "Two",
        };
        f.write_str(s)
    }
}

impl Setting for StopBits {
    const FAMILY: &'static str = "stop bits";
    const QUERY: &'static str = "AT+STOP?";
    const TOKENS: &'static [(&'static str, Self)] =
        &[("STOP1", StopBits::One), ("STOP2", StopBits::Two)];
}

/// Hardware flow control of the module's serial side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowControl {
    Disabled,
    Enabled,
}

impl fmt::Display for FlowControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowControl::Disabled => "Disabled",
            FlowControl::Enabled => "Enabled",
        };
        f.write_str(s)
    }
}

impl Setting for FlowControl {
    const FAMILY: &'static str = "flow control";
    const QUERY: &'static str = "AT+FLOW?";
    const TOKENS: &'static [(&'static str, Self)] = &[
        ("FLOW-", FlowControl::Disabled),
        ("FLOW+", FlowControl::Enabled),
    ];
}
