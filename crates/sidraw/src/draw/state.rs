//! The per-draw fixed-function block: topology, index offsets, restart,
//! instancing base, stipple reset, provoking vertex and clip export enables.

use std::rc::Rc;

use sidraw_pm4::sid::{
    ia_multi_vgt_param, pa_cl_clip_cntl, pa_cl_vs_out_cntl, pa_sc_line_stipple,
    pa_su_sc_mode_cntl, spi_shader_user_data_vs_0, vgt_dispatch_draw_index, vgt_gs_out_prim_type,
    vgt_indx_offset, vgt_multi_prim_ib_reset_en, vgt_multi_prim_ib_reset_indx,
    vgt_primitive_type as pt,
};
use sidraw_pm4::IndexType;

use super::DrawInfo;
use crate::error::DrawError;
use crate::shader::CompiledShader;
use crate::state::{ChipClass, RasterizerState};
use crate::state_block::{StateBlock, StateBlockCache};

/// User SGPR holding the first instance id.
pub const SI_SGPR_START_INSTANCE: u32 = 8;
const PRIMGROUP_SIZE: u32 = 63;

/// Topologies and states that must end a vertex batch at each packet.
pub fn switch_on_eop(hw_prim: u32, info: &DrawInfo, rs: &RasterizerState) -> bool {
    matches!(
        hw_prim,
        pt::DI_PT_POLYGON | pt::DI_PT_LINELOOP | pt::DI_PT_TRIFAN | pt::DI_PT_TRISTRIP_ADJ
    ) || info.primitive_restart
        || rs.line_stipple_enable
}

/// `PA_CL_VS_OUT_CNTL`: what the vertex shader exports besides position, and
/// which of its clip distances are live.
pub fn vs_out_cntl(vs: &CompiledShader, rs: &RasterizerState) -> u32 {
    pa_cl_vs_out_cntl::use_vtx_point_size(vs.vs_out_point_size)
        | pa_cl_vs_out_cntl::use_vtx_edge_flag(vs.vs_out_edgeflag)
        | pa_cl_vs_out_cntl::use_vtx_render_target_indx(vs.vs_out_layer)
        | pa_cl_vs_out_cntl::use_vtx_viewport_indx(vs.vs_out_viewport)
        | pa_cl_vs_out_cntl::vs_out_ccdist0_vec_ena(vs.clip_dist_write & 0x0F != 0)
        | pa_cl_vs_out_cntl::vs_out_ccdist1_vec_ena(vs.clip_dist_write & 0xF0 != 0)
        | pa_cl_vs_out_cntl::vs_out_misc_vec_ena(vs.vs_out_misc_write)
        | u32::from(rs.clip_plane_enable & vs.clip_dist_write)
}

/// `PA_CL_CLIP_CNTL`. Fixed-function user clip planes only apply when the
/// shader writes no clip distances.
pub fn clip_cntl(vs: &CompiledShader, rs: &RasterizerState) -> u32 {
    let ucp = if vs.clip_dist_write != 0 {
        0
    } else {
        u32::from(rs.clip_plane_enable) & pa_cl_clip_cntl::UCP_ENA_MASK
    };
    rs.pa_cl_clip_cntl | ucp
}

pub fn build_draw_info_block(
    cache: &mut StateBlockCache,
    chip_class: ChipClass,
    info: &DrawInfo,
    hw_prim: u32,
    index_type: Option<IndexType>,
    rs: &RasterizerState,
    vs: &CompiledShader,
) -> Result<Rc<StateBlock>, DrawError> {
    let mut block = cache.allocate()?;

    match chip_class {
        ChipClass::Cik => {
            let wd_switch_on_eop = switch_on_eop(hw_prim, info, rs);
            // IA switching is only honoured together with WD switching.
            let ia_switch_on_eop = wd_switch_on_eop;
            block.set_reg(
                ia_multi_vgt_param::ADDR,
                ia_multi_vgt_param::switch_on_eop(ia_switch_on_eop)
                    | ia_multi_vgt_param::partial_vs_wave_on(true)
                    | ia_multi_vgt_param::primgroup_size(PRIMGROUP_SIZE)
                    | ia_multi_vgt_param::wd_switch_on_eop(wd_switch_on_eop),
            );
            block.set_reg(
                vgt_dispatch_draw_index::ADDR,
                match index_type {
                    Some(IndexType::Uint32) => vgt_dispatch_draw_index::INDEX_32,
                    _ => vgt_dispatch_draw_index::INDEX_16,
                },
            );
            block.set_reg(pt::ADDR_CIK, hw_prim);
        }
        ChipClass::Si => block.set_reg(pt::ADDR_SI, hw_prim),
    }

    block.set_reg(vgt_gs_out_prim_type::ADDR, info.mode.gs_out_primitive());
    block.set_reg(
        vgt_indx_offset::ADDR,
        if info.indexed {
            info.index_bias as u32
        } else {
            info.start
        },
    );
    block.set_reg(vgt_multi_prim_ib_reset_indx::ADDR, info.restart_index);
    block.set_reg(
        vgt_multi_prim_ib_reset_en::ADDR,
        u32::from(info.primitive_restart),
    );
    block.set_reg(
        spi_shader_user_data_vs_0::ADDR + SI_SGPR_START_INSTANCE * 4,
        info.start_instance,
    );

    let ls_mask = match hw_prim {
        pt::DI_PT_LINELIST => 1,
        pt::DI_PT_LINESTRIP => 2,
        _ => 0,
    };
    block.set_reg(
        pa_sc_line_stipple::ADDR,
        pa_sc_line_stipple::auto_reset_cntl(ls_mask) | rs.pa_sc_line_stipple,
    );
    block.set_reg(
        pa_su_sc_mode_cntl::ADDR,
        pa_su_sc_mode_cntl::provoking_vtx_last(info.mode.provoking_vertex_last())
            | rs.pa_su_sc_mode_cntl,
    );
    block.set_reg(pa_cl_vs_out_cntl::ADDR, vs_out_cntl(vs, rs));
    block.set_reg(pa_cl_clip_cntl::ADDR, clip_cntl(vs, rs));

    Ok(block.finish())
}
