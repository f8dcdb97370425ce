//! Vertex buffer resource descriptors.
//!
//! Every bound vertex element becomes one four-dword buffer resource. The
//! descriptors are uploaded as a table and the vertex stage finds them through
//! a user-data pointer.

use std::rc::Rc;

use sidraw_pm4::sid::{spi_shader_user_data_vs_0, sq_buf_rsrc};

use crate::error::DrawError;
use crate::hazards::CacheHazards;
use crate::state_block::{StateBlock, StateBlockCache};
use crate::winsys::{Buffer, BufferUsage, ResourceAddressing, UploadAllocator};

/// User SGPR holding the low half of the vertex descriptor table address.
pub const SI_SGPR_VERTEX_BUFFER: u32 = 6;
/// The descriptor table occupies at most 256 dwords.
pub const MAX_VERTEX_ELEMENTS: usize = 256 / sq_buf_rsrc::DWORDS;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    R32Float,
    R32G32Float,
    R32G32B32Float,
    R32G32B32A32Float,
    R32Uint,
    R32G32Uint,
    R32G32B32A32Uint,
    R32Sint,
    R16G16Float,
    R16G16B16A16Float,
    R16G16Unorm,
    R16G16Snorm,
    R16G16B16A16Unorm,
    R16G16B16A16Snorm,
    R8G8B8A8Unorm,
    R8G8B8A8Snorm,
    R8G8B8A8Uint,
    B8G8R8A8Unorm,
    R10G10B10A2Unorm,
}

impl VertexFormat {
    /// Bytes per element.
    pub const fn block_size(self) -> u32 {
        match self {
            Self::R32Float | Self::R32Uint | Self::R32Sint => 4,
            Self::R32G32Float | Self::R32G32Uint => 8,
            Self::R32G32B32Float => 12,
            Self::R32G32B32A32Float | Self::R32G32B32A32Uint => 16,
            Self::R16G16Float | Self::R16G16Unorm | Self::R16G16Snorm => 4,
            Self::R16G16B16A16Float | Self::R16G16B16A16Unorm | Self::R16G16B16A16Snorm => 8,
            Self::R8G8B8A8Unorm
            | Self::R8G8B8A8Snorm
            | Self::R8G8B8A8Uint
            | Self::B8G8R8A8Unorm
            | Self::R10G10B10A2Unorm => 4,
        }
    }

    /// Descriptor word 3: destination swizzle, numeric and data format.
    pub fn rsrc_word3(self) -> u32 {
        use sq_buf_rsrc::*;

        let (num, data, components) = match self {
            Self::R32Float => (NUM_FORMAT_FLOAT, DATA_FORMAT_32, 1),
            Self::R32G32Float => (NUM_FORMAT_FLOAT, DATA_FORMAT_32_32, 2),
            Self::R32G32B32Float => (NUM_FORMAT_FLOAT, DATA_FORMAT_32_32_32, 3),
            Self::R32G32B32A32Float => (NUM_FORMAT_FLOAT, DATA_FORMAT_32_32_32_32, 4),
            Self::R32Uint => (NUM_FORMAT_UINT, DATA_FORMAT_32, 1),
            Self::R32G32Uint => (NUM_FORMAT_UINT, DATA_FORMAT_32_32, 2),
            Self::R32G32B32A32Uint => (NUM_FORMAT_UINT, DATA_FORMAT_32_32_32_32, 4),
            Self::R32Sint => (NUM_FORMAT_SINT, DATA_FORMAT_32, 1),
            Self::R16G16Float => (NUM_FORMAT_FLOAT, DATA_FORMAT_16_16, 2),
            Self::R16G16B16A16Float => (NUM_FORMAT_FLOAT, DATA_FORMAT_16_16_16_16, 4),
            Self::R16G16Unorm => (NUM_FORMAT_UNORM, DATA_FORMAT_16_16, 2),
            Self::R16G16Snorm => (NUM_FORMAT_SNORM, DATA_FORMAT_16_16, 2),
            Self::R16G16B16A16Unorm => (NUM_FORMAT_UNORM, DATA_FORMAT_16_16_16_16, 4),
            Self::R16G16B16A16Snorm => (NUM_FORMAT_SNORM, DATA_FORMAT_16_16_16_16, 4),
            Self::R8G8B8A8Unorm | Self::B8G8R8A8Unorm => (NUM_FORMAT_UNORM, DATA_FORMAT_8_8_8_8, 4),
            Self::R8G8B8A8Snorm => (NUM_FORMAT_SNORM, DATA_FORMAT_8_8_8_8, 4),
            Self::R8G8B8A8Uint => (NUM_FORMAT_UINT, DATA_FORMAT_8_8_8_8, 4),
            Self::R10G10B10A2Unorm => (NUM_FORMAT_UNORM, DATA_FORMAT_2_10_10_10, 4),
        };

        // Missing components read as 0, missing alpha as 1.
        let pick = |c: u32, sel: u32| if c < components { sel } else { SEL_0 };
        let (x, y, z, w) = match self {
            Self::B8G8R8A8Unorm => (SEL_Z, SEL_Y, SEL_X, SEL_W),
            _ => (
                SEL_X,
                pick(1, SEL_Y),
                pick(2, SEL_Z),
                if components == 4 { SEL_W } else { SEL_1 },
            ),
        };
        word3_dst_sel(x, y, z, w) | word3_num_format(num) | word3_data_format(data)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexElement {
    pub src_offset: u32,
    pub vertex_buffer_index: usize,
    pub format: VertexFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexBufferBinding {
    pub buffer: Buffer,
    pub buffer_offset: u32,
    pub stride: u32,
}

/// Number of records the hardware may fetch for one element.
///
/// With a stride this rounds up by rounding down and adding one, which is what
/// the fetch bounds check expects. Without a stride the count is in bytes. An
/// element that does not fit in the buffer at all gets no records.
pub fn num_records(buffer_size: u64, offset: u64, element_size: u32, stride: u32) -> u32 {
    let Some(usable) = buffer_size
        .checked_sub(offset)
        .and_then(|rest| rest.checked_sub(u64::from(element_size)))
    else {
        return 0;
    };
    let records = if stride != 0 {
        usable / u64::from(stride) + 1
    } else {
        buffer_size - offset
    };
    u32::try_from(records).unwrap_or(u32::MAX)
}

/// Build the vertex buffer block for `elements` reading from `buffers`.
///
/// Returns the block together with the hazards it raises; the caller commits both.
pub fn build_vertex_buffers<W>(
    cache: &mut StateBlockCache,
    winsys: &mut W,
    elements: &[VertexElement],
    buffers: &[Option<VertexBufferBinding>],
) -> Result<(Rc<StateBlock>, CacheHazards), DrawError>
where
    W: ResourceAddressing + UploadAllocator + ?Sized,
{
    assert!(
        elements.len() <= MAX_VERTEX_ELEMENTS,
        "{} vertex elements exceed the descriptor table limit of {MAX_VERTEX_ELEMENTS}",
        elements.len()
    );

    let mut block = cache.allocate()?;
    for ve in elements {
        let Some(Some(vb)) = buffers.get(ve.vertex_buffer_index) else {
            continue;
        };

        let offset = u64::from(vb.buffer_offset) + u64::from(ve.src_offset);
        let va = winsys.resource_va(vb.buffer.handle, offset);

        block.sh_data_add(va as u32);
        block.sh_data_add(
            sq_buf_rsrc::word1_base_address_hi((va >> 32) as u32)
                | sq_buf_rsrc::word1_stride(vb.stride),
        );
        block.sh_data_add(num_records(
            vb.buffer.size,
            offset,
            ve.format.block_size(),
            vb.stride,
        ));
        block.sh_data_add(ve.format.rsrc_word3());

        block.add_buffer(vb.buffer.handle, BufferUsage::Read);
    }
    block.sh_data_end(
        winsys,
        spi_shader_user_data_vs_0::ADDR + SI_SGPR_VERTEX_BUFFER * 4,
    )?;

    Ok((block.finish(), CacheHazards::INV_TEX_CACHE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strided_count_rounds_down_plus_one() {
        assert_eq!(num_records(100, 4, 8, 12), 8);
    }

    #[test]
    fn unstrided_count_is_remaining_bytes() {
        assert_eq!(num_records(100, 4, 8, 0), 96);
    }

    #[test]
    fn element_past_the_end_gets_no_records() {
        // Buffer shorter than offset + element.
        assert_eq!(num_records(8, 4, 16, 16), 0);
        assert_eq!(num_records(8, 4, 16, 0), 0);
        // Offset beyond the end of the buffer.
        assert_eq!(num_records(64, 80, 4, 16), 0);
        assert_eq!(num_records(64, 80, 4, 0), 0);
        // Exactly one element fits.
        assert_eq!(num_records(20, 4, 16, 16), 1);
    }

    #[test]
    fn huge_unstrided_buffer_clamps_to_u32() {
        assert_eq!(num_records(1 << 40, 0, 4, 0), u32::MAX);
    }

    #[test]
    fn word3_fills_missing_components() {
        use sq_buf_rsrc::*;
        assert_eq!(
            VertexFormat::R32G32Float.rsrc_word3(),
            word3_dst_sel(SEL_X, SEL_Y, SEL_0, SEL_1)
                | word3_num_format(NUM_FORMAT_FLOAT)
                | word3_data_format(DATA_FORMAT_32_32)
        );
        assert_eq!(
            VertexFormat::B8G8R8A8Unorm.rsrc_word3() & 0xFFF,
            word3_dst_sel(SEL_Z, SEL_Y, SEL_X, SEL_W)
        );
    }

    #[test]
    fn block_sizes_match_formats() {
        assert_eq!(VertexFormat::R32G32B32Float.block_size(), 12);
        assert_eq!(VertexFormat::R16G16B16A16Unorm.block_size(), 8);
        assert_eq!(VertexFormat::R10G10B10A2Unorm.block_size(), 4);
    }
}
