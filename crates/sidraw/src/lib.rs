//! Draw-call encoder for SI/CIK-class GPUs.
//!
//! A [`DrawContext`] turns "draw these primitives with this pipeline" into PM4
//! packets. Register state is pre-serialized into immutable [`StateBlock`]s
//! bound to fixed-order atoms; a draw only re-emits the atoms whose block
//! changed since they last reached the command stream.
//!
//! Everything outside the encoder (addressing, uploads, shader compilation,
//! submission, surface bookkeeping) is reached through the [`Winsys`] traits.

pub mod atoms;
pub mod context;
pub mod cs;
pub mod draw;
pub mod error;
pub mod hazards;
pub mod shader;
pub mod state;
pub mod state_block;
pub mod stats;
pub mod vertex;
pub mod winsys;

pub use atoms::{AtomId, AtomTable};
pub use context::DrawContext;
pub use draw::{
    DrawInfo, DrawOutcome, IndexBuffer, PrimitiveMode, SkipReason, StreamOutTarget, UserIndices,
};
pub use error::DrawError;
pub use hazards::{CacheFlushCoordinator, CacheHazards};
pub use shader::{
    CompileError, CompiledShader, Interpolation, PsKey, SelectorId, Semantic, ShaderIo,
    ShaderSelectorDesc, ShaderStage, StreamOutputInfo, VariantKey, VsKey,
};
pub use sidraw_pm4::IndexType;
pub use state::{
    AlphaTestState, ChipClass, CompareFunc, ContextDescriptor, FramebufferState, RasterizerState,
    SurfaceBinding,
};
pub use state_block::{StateBlock, StateBlockBuilder, StateBlockCache, StateBlockId};
pub use stats::{DrawStats, DrawStatsSnapshot};
pub use vertex::{VertexBufferBinding, VertexElement, VertexFormat};
pub use winsys::{
    Buffer, BufferHandle, BufferReloc, BufferUsage, CommandBuffer, CommandSubmitter,
    ResourceAddressing, ShaderCompiler, SurfaceTracker, TextureHandle, UploadAllocator, Winsys,
};
