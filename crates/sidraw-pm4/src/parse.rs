//! Packet walker over a serialized PM4 stream.
//!
//! Used by tests and tooling to check what the encoder produced; the encoder
//! itself never parses its own output.

use crate::pm4_cmd::{decode_pkt3_header, Pm4Header, Pm4HeaderError, Pm4Opcode, RegisterSpace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pm4Packet<'a> {
    pub header: Pm4Header,
    /// Offset of the header dword within the stream.
    pub offset: usize,
    pub body: &'a [u32],
}

impl<'a> Pm4Packet<'a> {
    pub fn opcode(&self) -> Option<Pm4Opcode> {
        self.header.opcode()
    }

    /// Register writes carried by a SET_*_REG packet, as `(byte address, value)` pairs.
    pub fn register_writes(&self) -> Option<impl Iterator<Item = (u32, u32)> + 'a> {
        let space = RegisterSpace::from_opcode(self.opcode()?)?;
        let body: &'a [u32] = self.body;
        let (&start, values) = body.split_first()?;
        let base = space.base() + start * 4;
        Some(
            values
                .iter()
                .enumerate()
                .map(move |(i, &v)| (base + i as u32 * 4, v)),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pm4ParseError {
    Header { offset: usize, err: Pm4HeaderError },
    Truncated { offset: usize, needed: usize, available: usize },
}

impl core::fmt::Display for Pm4ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Pm4ParseError::Header { offset, err } => write!(f, "dword {offset}: {err}"),
            Pm4ParseError::Truncated {
                offset,
                needed,
                available,
            } => write!(
                f,
                "dword {offset}: packet needs {needed} body dwords but only {available} remain"
            ),
        }
    }
}

impl std::error::Error for Pm4ParseError {}

/// Iterator over the packets of a stream. Stops after the first error.
#[derive(Clone, Debug)]
pub struct Pm4PacketIter<'a> {
    dwords: &'a [u32],
    cursor: usize,
    failed: bool,
}

impl<'a> Pm4PacketIter<'a> {
    pub fn new(dwords: &'a [u32]) -> Self {
        Self {
            dwords,
            cursor: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for Pm4PacketIter<'a> {
    type Item = Result<Pm4Packet<'a>, Pm4ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor >= self.dwords.len() {
            return None;
        }
        let offset = self.cursor;
        let header = match decode_pkt3_header(self.dwords[offset]) {
            Ok(h) => h,
            Err(err) => {
                self.failed = true;
                return Some(Err(Pm4ParseError::Header { offset, err }));
            }
        };
        let available = self.dwords.len() - offset - 1;
        if header.body_dwords > available {
            self.failed = true;
            return Some(Err(Pm4ParseError::Truncated {
                offset,
                needed: header.body_dwords,
                available,
            }));
        }
        let body = &self.dwords[offset + 1..offset + 1 + header.body_dwords];
        self.cursor = offset + 1 + header.body_dwords;
        Some(Ok(Pm4Packet {
            header,
            offset,
            body,
        }))
    }
}

/// Parse a whole stream into packets.
pub fn parse_pm4_stream(dwords: &[u32]) -> Result<Vec<Pm4Packet<'_>>, Pm4ParseError> {
    Pm4PacketIter::new(dwords).collect()
}

/// Last value written to `reg` anywhere in the stream.
pub fn find_register_write(dwords: &[u32], reg: u32) -> Option<u32> {
    Pm4PacketIter::new(dwords)
        .map_while(Result::ok)
        .filter_map(|pkt| pkt.register_writes().map(|w| w.collect::<Vec<_>>()))
        .flatten()
        .filter(|&(addr, _)| addr == reg)
        .map(|(_, v)| v)
        .last()
}
