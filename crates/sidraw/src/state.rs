//! Context configuration and the bound fixed-function state the draw path reads.

use crate::winsys::TextureHandle;

/// GPU generation; selects register placement and the cache synchronization packet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChipClass {
    /// Southern Islands.
    #[default]
    Si,
    /// Sea Islands.
    Cik,
}

/// Parameters fixed at [`crate::DrawContext`] creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextDescriptor {
    pub chip_class: ChipClass,
    /// Target byte order. When set, index fetches are byte-swapped to match the element width.
    pub big_endian: bool,
    /// Number of state blocks that may be alive at once.
    pub max_state_blocks: usize,
    /// Size of each command buffer handed to submission.
    pub cs_capacity_dwords: usize,
}

impl Default for ContextDescriptor {
    fn default() -> Self {
        Self {
            chip_class: ChipClass::Si,
            big_endian: cfg!(target_endian = "big"),
            max_state_blocks: 1024,
            cs_capacity_dwords: 16 * 1024,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    /// The test always passes; as an alpha function this means alpha testing is off.
    #[default]
    Always,
}

/// Rasterizer state as far as the draw path is concerned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RasterizerState {
    pub flatshade: bool,
    pub two_side: bool,
    /// Bit `n` replaces generic input `n` with the point sprite coordinate.
    pub sprite_coord_enable: u32,
    /// User clip planes 0..5.
    pub clip_plane_enable: u8,
    pub line_stipple_enable: bool,
    /// `PA_SC_LINE_STIPPLE` pattern and repeat; the draw adds the reset control.
    pub pa_sc_line_stipple: u32,
    /// `PA_SU_SC_MODE_CNTL` culling and polygon mode; the draw adds the provoking vertex.
    pub pa_su_sc_mode_cntl: u32,
    /// `PA_CL_CLIP_CNTL` without the user clip plane enables.
    pub pa_cl_clip_cntl: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlphaTestState {
    pub func: CompareFunc,
}

/// One framebuffer attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceBinding {
    pub texture: TextureHandle,
    pub level: u32,
    /// Colour compression is enabled, so drawing leaves the level needing a resolve.
    pub compressed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FramebufferState {
    pub cbufs: Vec<Option<SurfaceBinding>>,
    pub zsbuf: Option<SurfaceBinding>,
    pub log_samples: u32,
    /// Colour buffer 0 has an integer format; alpha-to-mask must be disabled.
    pub cb0_is_integer: bool,
    /// Bit `n` marks colour buffer `n` as exported with 16 bits per channel.
    pub export_16bpc: u32,
}

impl FramebufferState {
    pub fn nr_cbufs(&self) -> usize {
        self.cbufs.len()
    }

    /// Colour attachments whose levels need a resolve after being drawn to.
    pub fn compressed_cbufs(&self) -> impl Iterator<Item = &SurfaceBinding> {
        self.cbufs.iter().flatten().filter(|s| s.compressed)
    }
}
