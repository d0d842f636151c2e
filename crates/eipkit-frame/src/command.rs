//! Encapsulation command codes.

use std::fmt;

/// An encapsulation command code.
///
/// Decoding keeps whatever value the peer sent; only the recognized set below
/// can be encoded (see [`Command::is_supported`]).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Command(pub u16);

impl Command {
    pub const NOP: Command = Command(0x0000);
    pub const LIST_SERVICES: Command = Command(0x0004);
    pub const LIST_IDENTITY: Command = Command(0x0063);
    pub const LIST_INTERFACES: Command = Command(0x0064);
    pub const REGISTER_SESSION: Command = Command(0x0065);
    pub const UNREGISTER_SESSION: Command = Command(0x0066);
    pub const SEND_RR_DATA: Command = Command(0x006F);
    pub const SEND_UNIT_DATA: Command = Command(0x0070);
    pub const INDICATE_STATUS: Command = Command(0x0072);
    pub const CANCEL: Command = Command(0x0073);

    /// Returns the command name, or `None` for unrecognized codes.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Command::NOP => "NOP",
            Command::LIST_SERVICES => "ListServices",
            Command::LIST_IDENTITY => "ListIdentity",
            Command::LIST_INTERFACES => "ListInterfaces",
            Command::REGISTER_SESSION => "RegisterSession",
            Command::UNREGISTER_SESSION => "UnRegisterSession",
            Command::SEND_RR_DATA => "SendRRData",
            Command::SEND_UNIT_DATA => "SendUnitData",
            Command::INDICATE_STATUS => "IndicateStatus",
            Command::CANCEL => "Cancel",
            _ => return None,
        };
        Some(name)
    }

    /// Returns true if this command may be encoded.
    pub fn is_supported(self) -> bool {
        self.name().is_some()
    }
}

impl From<u16> for Command {
    fn from(code: u16) -> Self {
        Command(code)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}({:#04x})", self.0),
            None => write!(f, "Unknown({:#06x})", self.0),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#06x}", self.0),
        }
    }
}
