use std::convert::TryFrom;

use crate::DecodeError;

/// Represents an opcode as defined by the WebSocket protocol.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// Continues a fragmented message started by an earlier `Text` or `Binary` frame.
    Continuation,
    /// UTF-8 text.
    Text,
    /// Arbitrary binary data.
    Binary,
    /// Close control frame.
    Close,
    /// Ping control frame.
    Ping,
    /// Pong control frame.
    Pong,
}

impl Opcode {
    /// Returns `true` if `self` is `Text`.
    #[must_use]
    pub fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }

    /// Returns `true` if `self` is `Close`, `Ping` or `Pong`.
    ///
    /// On the wire these are the opcodes with bit 0x08 set.
    #[must_use]
    pub fn is_control(self) -> bool {
        u8::from(self) & 0x08 != 0
    }

    /// Returns `true` if `self` is `Continuation`, `Text` or `Binary`.
    #[must_use]
    pub fn is_data(self) -> bool {
        !self.is_control()
    }
}

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(data: u8) -> Result<Self, DecodeError> {
        let opcode = match data {
            0 => Self::Continuation,
            1 => Self::Text,
            2 => Self::Binary,
            8 => Self::Close,
            9 => Self::Ping,
            10 => Self::Pong,
            n => {
                return Err(DecodeError::InvalidOpcode(n));
            }
        };

        Ok(opcode)
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> Self {
        match opcode {
            Opcode::Continuation => 0,
            Opcode::Text => 1,
            Opcode::Binary => 2,
            Opcode::Close => 8,
            Opcode::Ping => 9,
            Opcode::Pong => 10,
        }
    }
}
