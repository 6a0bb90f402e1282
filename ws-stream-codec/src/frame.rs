use byteorder::{BigEndian, ByteOrder};
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::mask::Mask;
use crate::{Error, Result};

/// Describes the length of the payload data within an individual WebSocket frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DataLength {
    /// Holds the length of a payload of 125 bytes or shorter.
    Small(u8),
    /// Holds the length of a payload between 126 and 65535 bytes.
    Medium(u16),
    /// Holds the length of a longer payload.
    ///
    /// The extended length field that follows the 127 marker is 4 bytes wide here, not the 8 bytes that RFC 6455
    /// asks for. Lengths that do not fit in 32 bits are truncated to their low 32 bits.
    Large(u32),
}

impl DataLength {
    /// Returns the number of payload bytes.
    pub fn len(self) -> u32 {
        match self {
            Self::Small(n) => n as u32,
            Self::Medium(n) => n as u32,
            Self::Large(n) => n,
        }
    }

    /// Returns `true` for a zero-length payload.
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    fn ext_len(self) -> usize {
        match self {
            Self::Small(_) => 0,
            Self::Medium(_) => 2,
            Self::Large(_) => 4,
        }
    }
}

impl From<u32> for DataLength {
    fn from(n: u32) -> Self {
        if n <= 125 {
            Self::Small(n as u8)
        } else if n <= 65535 {
            Self::Medium(n as u16)
        } else {
            Self::Large(n)
        }
    }
}

impl From<usize> for DataLength {
    fn from(n: usize) -> Self {
        if n > u32::MAX as usize {
            Self::Large(n as u32)
        } else {
            Self::from(n as u32)
        }
    }
}

/// Describes an individual frame within a WebSocket message at a low level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub(crate) fin: bool,
    pub(crate) rsv: u8,
    pub(crate) opcode: u8,
    pub(crate) mask: Option<Mask>,
    pub(crate) data_len: DataLength,
}

impl FrameHeader {
    /// Returns a `FrameHeader` struct.
    pub fn new(fin: bool, rsv: u8, opcode: u8, mask: Option<Mask>, data_len: DataLength) -> Self {
        Self {
            fin,
            rsv,
            opcode,
            mask,
            data_len,
        }
    }

    /// Returns the WebSocket FIN bit, which indicates that this is the last frame in the message.
    pub fn fin(&self) -> bool {
        self.fin
    }

    /// Returns the WebSocket RSV1, RSV2 and RSV3 bits, in their wire positions.
    pub fn rsv(&self) -> u8 {
        self.rsv
    }

    /// Returns the raw 4-bit WebSocket opcode. It has not been checked against the set of known opcodes.
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Returns the frame's mask.
    pub fn mask(&self) -> Option<Mask> {
        self.mask
    }

    /// Returns the length of the payload data that follows this header.
    pub fn data_len(&self) -> DataLength {
        self.data_len
    }

    /// Returns the total length of the frame header.
    ///
    /// The frame header is between 2 bytes and 10 bytes in length, depending on the presence of a mask
    /// and the length of the payload data.
    pub fn header_len(&self) -> usize {
        let mut len = 1 /* fin|opcode */ + 1 /* mask|len1 */;
        len += self.data_len.ext_len();
        if self.mask.is_some() {
            len += 4;
        }

        len
    }

    /// Returns the total header length implied by the second byte of a header, which holds the mask bit and the
    /// 7-bit length indicator.
    pub fn header_len_from_prefix(mask_data_len: u8) -> usize {
        let mut len = 2;
        len += match mask_data_len & 0x7f {
            127 => 4,
            126 => 2,
            _ => 0,
        };

        if mask_data_len & 0x80 != 0 {
            len += 4;
        }

        len
    }
}

/// Tokio codec for the header portion of WebSocket frames.
///
/// Decoding returns `Ok(None)` until `src` holds a whole header.
#[derive(Copy, Clone, Debug, Default)]
pub struct FrameHeaderCodec;

impl Decoder for FrameHeaderCodec {
    type Item = FrameHeader;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<FrameHeader>> {
        if src.len() < 2 {
            return Ok(None);
        }

        let header_len = FrameHeader::header_len_from_prefix(src[1]);
        if src.len() < header_len {
            return Ok(None);
        }

        let fin_opcode = src.get_u8();
        let mask_data_len = src.get_u8();
        let fin = (fin_opcode & 0x80) != 0;
        let rsv = fin_opcode & 0x70;
        let opcode = fin_opcode & 0x0f;

        let data_len = match mask_data_len & 0x7f {
            127 => {
                let n = BigEndian::read_u32(&src[..4]);
                src.advance(4);
                DataLength::Large(n)
            }
            126 => {
                let n = BigEndian::read_u16(&src[..2]);
                src.advance(2);
                DataLength::Medium(n)
            }
            n => DataLength::Small(n),
        };

        let mask = if mask_data_len & 0x80 == 0 {
            None
        } else {
            let mut key = [0; 4];
            src.copy_to_slice(&mut key);
            Some(Mask::from(key))
        };

        let header = FrameHeader {
            fin,
            rsv,
            opcode,
            mask,
            data_len,
        };

        debug_assert_eq!(header.header_len(), header_len);
        Ok(Some(header))
    }
}

impl<'a> Encoder<&'a FrameHeader> for FrameHeaderCodec {
    type Error = Error;

    fn encode(&mut self, item: &'a FrameHeader, dst: &mut BytesMut) -> Result<()> {
        let FrameHeader {
            fin,
            rsv,
            opcode,
            mask,
            data_len,
        } = *item;

        dst.reserve(item.header_len());

        let fin_bit = if fin { 0x80 } else { 0x00 };
        let mask_bit = if mask.is_some() { 0x80 } else { 0x00 };
        dst.put_u8(fin_bit | (rsv & 0x70) | (opcode & 0x0f));

        match data_len {
            DataLength::Small(n) => {
                dst.put_u8(mask_bit | n);
            }
            DataLength::Medium(n) => {
                dst.put_u8(mask_bit | 126);
                dst.put_u16(n);
            }
            DataLength::Large(n) => {
                dst.put_u8(mask_bit | 127);
                dst.put_u32(n);
            }
        };

        if let Some(mask) = mask {
            dst.put_slice(&mask.key());
        }

        Ok(())
    }
}
