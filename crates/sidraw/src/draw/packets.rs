//! The draw command block: query counters, stream-out replay, index type,
//! instance count and the draw packet itself.

use std::rc::Rc;

use sidraw_pm4::sid::{
    db_count_control, vgt_strmout_draw_opaque_buffer_filled_size,
    vgt_strmout_draw_opaque_vertex_stride,
};
use sidraw_pm4::{IndexSwap, IndexType};

use super::{DrawInfo, IndexBuffer};
use crate::error::DrawError;
use crate::state::ChipClass;
use crate::state_block::{StateBlock, StateBlockCache};
use crate::winsys::{BufferUsage, ResourceAddressing};

/// Draw-time state that is not part of the draw request itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawEnv {
    pub chip_class: ChipClass,
    pub big_endian: bool,
    /// Honour the render condition on every draw packet.
    pub predicate: bool,
    pub occlusion_queries_active: bool,
    pub fb_log_samples: u32,
}

/// Largest index count that stays inside the buffer starting at `offset`.
pub fn max_index_count(buffer_size: u64, offset: u64, index_type: IndexType) -> u32 {
    let count = buffer_size.saturating_sub(offset) / u64::from(index_type.size_bytes());
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Byte offset of the first index the draw reads.
pub fn first_index_offset(ib: &IndexBuffer, start: u32) -> u64 {
    ib.offset + u64::from(start) * u64::from(ib.index_type.size_bytes())
}

fn db_count_control_for(env: &DrawEnv) -> u32 {
    let base = db_count_control::perfect_zpass_counts(true)
        | db_count_control::sample_rate(env.fb_log_samples);
    match env.chip_class {
        ChipClass::Cik => {
            base | db_count_control::zpass_enable(1)
                | db_count_control::slice_even_enable(1)
                | db_count_control::slice_odd_enable(1)
        }
        ChipClass::Si => base,
    }
}

/// Build the draw command block.
///
/// `index_buffer` must be present for indexed draws; the caller checks this
/// before any state is touched.
pub fn build_draw_block<A>(
    cache: &mut StateBlockCache,
    addressing: &A,
    env: &DrawEnv,
    info: &DrawInfo,
    index_buffer: Option<&IndexBuffer>,
) -> Result<Rc<StateBlock>, DrawError>
where
    A: ResourceAddressing + ?Sized,
{
    let ib = match (info.indexed, index_buffer) {
        (true, None) => return Err(DrawError::MissingIndexBuffer),
        (true, Some(ib)) => Some(ib),
        (false, _) => None,
    };

    let mut block = cache.allocate()?;

    if env.occlusion_queries_active {
        block.set_reg(db_count_control::ADDR, db_count_control_for(env));
    }

    if let Some(target) = &info.count_from_stream_output {
        let va = addressing.resource_va(target.filled_size.handle, target.filled_size_offset);
        block.set_reg(vgt_strmout_draw_opaque_vertex_stride::ADDR, target.stride_in_dw);
        block
            .packets()
            .copy_data_mem_to_reg(va, vgt_strmout_draw_opaque_buffer_filled_size::ADDR);
        block.add_buffer(target.filled_size.handle, BufferUsage::Read);
    }

    let index_type = ib.map_or(IndexType::Uint16, |ib| ib.index_type);
    let swap = if env.big_endian {
        index_type.swap()
    } else {
        IndexSwap::None
    };
    block.packets().index_type(index_type, swap, env.predicate);
    block
        .packets()
        .num_instances(info.instance_count, env.predicate);

    match ib {
        Some(ib) => {
            let offset = first_index_offset(ib, info.start);
            let max_size = max_index_count(ib.buffer.size, offset, ib.index_type);
            let va = addressing.resource_va(ib.buffer.handle, offset);
            block.add_buffer(ib.buffer.handle, BufferUsage::Read);
            block
                .packets()
                .draw_index_2(max_size, va, info.count, env.predicate);
        }
        None => {
            block.packets().draw_index_auto(
                info.count,
                info.count_from_stream_output.is_some(),
                env.predicate,
            );
        }
    }

    Ok(block.finish())
}
