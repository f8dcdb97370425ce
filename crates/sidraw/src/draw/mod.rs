//! Translation of a draw request into the fixed-function block and the draw command.

pub mod index;
pub mod packets;
pub mod state;
pub mod topology;

use sidraw_pm4::IndexType;

use crate::winsys::Buffer;

pub use index::{upload_user_indices, UserIndices};
pub use packets::build_draw_block;
pub use state::build_draw_info_block;
pub use topology::PrimitiveMode;

/// A bound index buffer. Indices already live in GPU memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexBuffer {
    pub buffer: Buffer,
    pub index_type: IndexType,
    /// Byte offset of index 0.
    pub offset: u64,
}

/// A stream-output target whose captured byte count can drive a later draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamOutTarget {
    /// Buffer holding the filled-size counter.
    pub filled_size: Buffer,
    pub filled_size_offset: u64,
    /// Vertex stride of the captured data, in dwords.
    pub stride_in_dw: u32,
}

/// One draw call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawInfo {
    pub mode: PrimitiveMode,
    pub indexed: bool,
    /// First vertex, or first index for indexed draws.
    pub start: u32,
    pub count: u32,
    /// Added to every index of an indexed draw.
    pub index_bias: i32,
    pub start_instance: u32,
    pub instance_count: u32,
    pub primitive_restart: bool,
    pub restart_index: u32,
    /// Take the vertex count from this target's captured byte count instead of `count`.
    pub count_from_stream_output: Option<StreamOutTarget>,
}

impl DrawInfo {
    pub fn arrays(mode: PrimitiveMode, start: u32, count: u32) -> Self {
        Self {
            mode,
            indexed: false,
            start,
            count,
            index_bias: 0,
            start_instance: 0,
            instance_count: 1,
            primitive_restart: false,
            restart_index: 0,
            count_from_stream_output: None,
        }
    }

    pub fn elements(mode: PrimitiveMode, start: u32, count: u32, index_bias: i32) -> Self {
        Self {
            indexed: true,
            index_bias,
            ..Self::arrays(mode, start, count)
        }
    }

    pub fn from_stream_output(mode: PrimitiveMode, target: StreamOutTarget) -> Self {
        Self {
            count_from_stream_output: Some(target),
            ..Self::arrays(mode, 0, 0)
        }
    }

    pub fn with_instances(mut self, start_instance: u32, instance_count: u32) -> Self {
        self.start_instance = start_instance;
        self.instance_count = instance_count;
        self
    }

    pub fn with_primitive_restart(mut self, restart_index: u32) -> Self {
        self.primitive_restart = true;
        self.restart_index = restart_index;
        self
    }

    /// A draw with nothing to do: zero count and no stream-out source to take it from.
    pub fn is_empty(&self) -> bool {
        self.count == 0 && (self.indexed || self.count_from_stream_output.is_none())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    EmptyDraw,
    NoShaders,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    Drawn,
    Skipped(SkipReason),
}
