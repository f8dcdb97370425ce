//! `sidraw-pm4` describes the PM4 command stream consumed by SI/CIK-class GPUs.
//!
//! - [`sid`]: register addresses and field encoders.
//! - [`pm4_cmd`]: packet opcodes, header layout and small value enums.
//! - [`cmd_writer`]: a packet builder that keeps headers consistent.
//! - [`parse`]: a packet walker for inspecting serialized streams.

pub mod cmd_writer;
pub mod parse;
pub mod pm4_cmd;
pub mod sid;

pub use cmd_writer::Pm4Writer;
pub use parse::{find_register_write, parse_pm4_stream, Pm4Packet, Pm4PacketIter, Pm4ParseError};
pub use pm4_cmd::{IndexSwap, IndexType, Pm4Opcode, RegisterSpace};
