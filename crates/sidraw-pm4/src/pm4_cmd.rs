//! PM4 type-3 packet layout.
//!
//! Every command is a header dword followed by `count + 1` body dwords:
//!
//! | bits  | field                               |
//! |-------|-------------------------------------|
//! | 31:30 | packet type (always 3)              |
//! | 29:16 | body dword count minus one          |
//! | 15:8  | opcode                              |
//! | 0     | predicate (honour render condition) |

use crate::sid;

pub const PKT_TYPE3: u32 = 3;
/// Largest body a single packet can describe (14-bit count field, plus one).
pub const PKT3_MAX_BODY_DWORDS: usize = 0x4000;

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pm4Opcode {
    Nop = 0x10,
    DrawIndex2 = 0x27,
    IndexType = 0x2A,
    DrawIndexAuto = 0x2D,
    NumInstances = 0x2F,
    CopyData = 0x40,
    SurfaceSync = 0x43,
    EventWrite = 0x46,
    AcquireMem = 0x58,
    SetConfigReg = 0x68,
    SetContextReg = 0x69,
    SetShReg = 0x76,
    SetUconfigReg = 0x79,
}

impl Pm4Opcode {
    pub const fn from_u32(v: u32) -> Option<Self> {
        match v {
            0x10 => Some(Self::Nop),
            0x27 => Some(Self::DrawIndex2),
            0x2A => Some(Self::IndexType),
            0x2D => Some(Self::DrawIndexAuto),
            0x2F => Some(Self::NumInstances),
            0x40 => Some(Self::CopyData),
            0x43 => Some(Self::SurfaceSync),
            0x46 => Some(Self::EventWrite),
            0x58 => Some(Self::AcquireMem),
            0x68 => Some(Self::SetConfigReg),
            0x69 => Some(Self::SetContextReg),
            0x76 => Some(Self::SetShReg),
            0x79 => Some(Self::SetUconfigReg),
            _ => None,
        }
    }

    pub const fn is_set_reg(self) -> bool {
        matches!(
            self,
            Self::SetConfigReg | Self::SetContextReg | Self::SetShReg | Self::SetUconfigReg
        )
    }
}

/// Encode a type-3 packet header for a body of `body_dwords` dwords.
pub const fn pkt3(opcode: Pm4Opcode, body_dwords: usize, predicate: bool) -> u32 {
    (PKT_TYPE3 << 30)
        | ((((body_dwords as u32).wrapping_sub(1)) & 0x3FFF) << 16)
        | ((opcode as u32 & 0xFF) << 8)
        | (predicate as u32)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pm4Header {
    pub opcode: u32,
    pub body_dwords: usize,
    pub predicate: bool,
}

impl Pm4Header {
    pub fn opcode(&self) -> Option<Pm4Opcode> {
        Pm4Opcode::from_u32(self.opcode)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pm4HeaderError {
    UnsupportedPacketType(u32),
}

impl core::fmt::Display for Pm4HeaderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Pm4HeaderError::UnsupportedPacketType(ty) => {
                write!(f, "unsupported PM4 packet type {ty}")
            }
        }
    }
}

impl std::error::Error for Pm4HeaderError {}

pub fn decode_pkt3_header(header: u32) -> Result<Pm4Header, Pm4HeaderError> {
    let ty = header >> 30;
    if ty != PKT_TYPE3 {
        return Err(Pm4HeaderError::UnsupportedPacketType(ty));
    }
    Ok(Pm4Header {
        opcode: (header >> 8) & 0xFF,
        body_dwords: (((header >> 16) & 0x3FFF) + 1) as usize,
        predicate: header & 1 != 0,
    })
}

/// Register space a byte address falls into, and therefore which SET_*_REG packet writes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegisterSpace {
    Config,
    Sh,
    Context,
    Uconfig,
}

impl RegisterSpace {
    pub const fn classify(reg: u32) -> Option<Self> {
        if reg >= sid::CONFIG_REG_OFFSET && reg < sid::CONFIG_REG_END {
            Some(Self::Config)
        } else if reg >= sid::SH_REG_OFFSET && reg < sid::SH_REG_END {
            Some(Self::Sh)
        } else if reg >= sid::CONTEXT_REG_OFFSET && reg < sid::CONTEXT_REG_END {
            Some(Self::Context)
        } else if reg >= sid::UCONFIG_REG_OFFSET && reg < sid::UCONFIG_REG_END {
            Some(Self::Uconfig)
        } else {
            None
        }
    }

    pub const fn base(self) -> u32 {
        match self {
            Self::Config => sid::CONFIG_REG_OFFSET,
            Self::Sh => sid::SH_REG_OFFSET,
            Self::Context => sid::CONTEXT_REG_OFFSET,
            Self::Uconfig => sid::UCONFIG_REG_OFFSET,
        }
    }

    pub const fn opcode(self) -> Pm4Opcode {
        match self {
            Self::Config => Pm4Opcode::SetConfigReg,
            Self::Sh => Pm4Opcode::SetShReg,
            Self::Context => Pm4Opcode::SetContextReg,
            Self::Uconfig => Pm4Opcode::SetUconfigReg,
        }
    }

    pub const fn from_opcode(opcode: Pm4Opcode) -> Option<Self> {
        match opcode {
            Pm4Opcode::SetConfigReg => Some(Self::Config),
            Pm4Opcode::SetShReg => Some(Self::Sh),
            Pm4Opcode::SetContextReg => Some(Self::Context),
            Pm4Opcode::SetUconfigReg => Some(Self::Uconfig),
            _ => None,
        }
    }

    /// Dword offset of `reg` relative to this space, as carried in the packet body.
    pub const fn dword_offset(self, reg: u32) -> u32 {
        (reg - self.base()) >> 2
    }
}

/// Index element width. Combined orthogonally with [`IndexSwap`] in the INDEX_TYPE packet.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexType {
    Uint16 = sid::vgt_index_type::VGT_INDEX_16,
    Uint32 = sid::vgt_index_type::VGT_INDEX_32,
}

impl IndexType {
    pub const fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Uint16),
            1 => Some(Self::Uint32),
            _ => None,
        }
    }

    pub const fn size_bytes(self) -> u32 {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }

    /// Byte-swap mode that matches this element width on an opposite-endian host.
    pub const fn swap(self) -> IndexSwap {
        match self {
            Self::Uint16 => IndexSwap::Swap16,
            Self::Uint32 => IndexSwap::Swap32,
        }
    }
}

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexSwap {
    None = sid::vgt_index_type::VGT_DMA_SWAP_NONE,
    Swap16 = sid::vgt_index_type::VGT_DMA_SWAP_16_BIT,
    Swap32 = sid::vgt_index_type::VGT_DMA_SWAP_32_BIT,
}

pub const fn encode_index_type(index_type: IndexType, swap: IndexSwap) -> u32 {
    sid::vgt_index_type::index_type(index_type as u32) | sid::vgt_index_type::swap_mode(swap as u32)
}

/// Where a draw sources its indices from.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawSource {
    Dma = sid::vgt_draw_initiator::DI_SRC_SEL_DMA,
    Immediate = sid::vgt_draw_initiator::DI_SRC_SEL_IMMEDIATE,
    AutoIndex = sid::vgt_draw_initiator::DI_SRC_SEL_AUTO_INDEX,
}

pub const fn encode_draw_initiator(source: DrawSource, use_opaque: bool) -> u32 {
    sid::vgt_draw_initiator::source_select(source as u32)
        | sid::vgt_draw_initiator::use_opaque(use_opaque)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_count_opcode_and_predicate() {
        let hdr = pkt3(Pm4Opcode::DrawIndex2, 5, true);
        assert_eq!(hdr, 0xC004_2701);
        let decoded = decode_pkt3_header(hdr).unwrap();
        assert_eq!(decoded.opcode(), Some(Pm4Opcode::DrawIndex2));
        assert_eq!(decoded.body_dwords, 5);
        assert!(decoded.predicate);
    }

    #[test]
    fn non_type3_headers_are_rejected() {
        assert_eq!(
            decode_pkt3_header(0x8000_0000),
            Err(Pm4HeaderError::UnsupportedPacketType(2))
        );
    }

    #[test]
    fn register_spaces_classify_boundaries() {
        assert_eq!(RegisterSpace::classify(0x8958), Some(RegisterSpace::Config));
        assert_eq!(RegisterSpace::classify(0xB000), Some(RegisterSpace::Sh));
        assert_eq!(RegisterSpace::classify(0x28FFC), Some(RegisterSpace::Context));
        assert_eq!(RegisterSpace::classify(0x30908), Some(RegisterSpace::Uconfig));
        assert_eq!(RegisterSpace::classify(0x1000), None);
        assert_eq!(RegisterSpace::classify(0x29000), None);
    }

    #[test]
    fn index_type_and_swap_are_orthogonal() {
        assert_eq!(encode_index_type(IndexType::Uint16, IndexSwap::None), 0);
        assert_eq!(encode_index_type(IndexType::Uint32, IndexSwap::None), 1);
        assert_eq!(encode_index_type(IndexType::Uint16, IndexSwap::Swap16), 1 << 2);
        assert_eq!(encode_index_type(IndexType::Uint32, IndexSwap::Swap32), 1 | (2 << 2));
    }
}
