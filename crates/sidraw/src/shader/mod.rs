//! Shader selectors, their compiled variants and the state blocks derived from them.
//!
//! A selector is what the API binds. The variant actually used by a draw is
//! chosen from the fixed-function state ([`VariantKey`]) and compiled on first
//! use through the [`crate::winsys::ShaderCompiler`] collaborator.

pub mod interface;
pub mod program;
pub mod selector;

use std::rc::Rc;

use thiserror::Error;

use crate::state::CompareFunc;
use crate::state_block::StateBlock;
use crate::winsys::BufferHandle;

pub use interface::build_spi_map;
pub use program::{build_ps_block, build_vs_block};
pub use selector::ShaderSelector;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Semantic name of a stage input or output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Semantic {
    Position,
    Color,
    BackColor,
    Fog,
    PointSize,
    Generic,
    Face,
    EdgeFlag,
    Stencil,
    ClipDist,
    ClipVertex,
    Layer,
    ViewportIndex,
    PrimId,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    Constant,
    Linear,
    #[default]
    Perspective,
    /// Perspective unless flat shading is on.
    Color,
}

/// One entry of a stage's input or output signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderIo {
    pub semantic: Semantic,
    pub index: u32,
    pub interpolate: Interpolation,
    pub centroid: bool,
    /// Parameter slot this entry occupies in the stage interface.
    pub param_offset: u32,
}

impl ShaderIo {
    pub fn new(semantic: Semantic, index: u32, param_offset: u32) -> Self {
        Self {
            semantic,
            index,
            interpolate: Interpolation::default(),
            centroid: false,
            param_offset,
        }
    }

    pub fn with_interpolation(mut self, interpolate: Interpolation) -> Self {
        self.interpolate = interpolate;
        self
    }

    pub fn with_centroid(mut self, centroid: bool) -> Self {
        self.centroid = centroid;
        self
    }
}

/// What the compiler reports about one variant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledShader {
    /// Buffer holding the machine code.
    pub bo: BufferHandle,
    pub num_sgprs: u32,
    pub num_vgprs: u32,
    pub lds_size: u32,
    pub inputs: Vec<ShaderIo>,
    pub outputs: Vec<ShaderIo>,
    /// Interpolated inputs (fragment stage).
    pub ninterp: u32,
    pub uses_kill: bool,
    pub uses_instanceid: bool,
    pub nr_pos_exports: u32,
    pub spi_ps_input_ena: u32,
    pub spi_shader_col_format: u32,
    pub cb_shader_mask: u32,
    /// Clip distances 0..7 written by the vertex stage.
    pub clip_dist_write: u8,
    pub vs_out_point_size: bool,
    pub vs_out_edgeflag: bool,
    pub vs_out_layer: bool,
    pub vs_out_viewport: bool,
    pub vs_out_misc_write: bool,
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("malformed shader tokens: {0}")]
    InvalidTokens(String),
    #[error("register allocation failed ({0} registers needed)")]
    OutOfRegisters(u32),
    #[error("shader backend error: {0}")]
    Backend(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VsKey {
    /// User clip planes folded into the shader.
    pub ucps_enabled: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PsKey {
    pub color_two_side: bool,
    pub alpha_func: CompareFunc,
    pub flatshade: bool,
    pub sprite_coord_enable: u32,
    pub export_16bpc: u32,
    /// Highest colour buffer written when the shader broadcasts colour 0.
    pub last_cbuf: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariantKey {
    Vertex(VsKey),
    Fragment(PsKey),
}

/// Stream-output layout declared by a vertex selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamOutputInfo {
    /// Per-buffer stride in dwords; zero means the buffer is unused.
    pub stride: [u32; 4],
    pub num_outputs: u32,
}

/// Everything the compiler needs to produce any variant of a selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSelectorDesc {
    pub stage: ShaderStage,
    pub tokens: Vec<u32>,
    pub stream_output: StreamOutputInfo,
    /// The shader writes colour 0 to every bound colour buffer.
    pub writes_all_color_buffers: bool,
}

impl ShaderSelectorDesc {
    pub fn new(stage: ShaderStage, tokens: Vec<u32>) -> Self {
        Self {
            stage,
            tokens,
            stream_output: StreamOutputInfo::default(),
            writes_all_color_buffers: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectorId(pub u32);

/// One compiled variant of a selector, identified by its key.
///
/// The compiled description never changes. The register block is built lazily
/// and rebuilt when state it bakes in (integer colour buffer 0) changes.
#[derive(Debug)]
pub struct ShaderObject {
    pub key: VariantKey,
    pub shader: Rc<CompiledShader>,
    pub(crate) block: Option<Rc<StateBlock>>,
    pub(crate) cb0_is_integer: bool,
}

impl ShaderObject {
    pub fn new(key: VariantKey, shader: CompiledShader) -> Self {
        Self {
            key,
            shader: Rc::new(shader),
            block: None,
            cb0_is_integer: false,
        }
    }

    pub fn block(&self) -> Option<&Rc<StateBlock>> {
        self.block.as_ref()
    }
}
