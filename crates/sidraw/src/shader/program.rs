//! Hardware stage blocks for compiled vertex and fragment shaders.

use std::rc::Rc;

use sidraw_pm4::sid::{
    cb_shader_mask, db_shader_control, spi_baryc_cntl, spi_ps_in_control, spi_ps_input_addr,
    spi_ps_input_ena, spi_shader_col_format, spi_shader_pgm_hi_ps, spi_shader_pgm_hi_vs,
    spi_shader_pgm_lo_ps, spi_shader_pgm_lo_vs, spi_shader_pgm_rsrc1_ps, spi_shader_pgm_rsrc1_vs,
    spi_shader_pgm_rsrc2_ps, spi_shader_pgm_rsrc2_vs, spi_shader_pos_format, spi_shader_z_format,
    spi_vs_out_config,
};

use super::{CompiledShader, PsKey, Semantic, StreamOutputInfo};
use crate::error::DrawError;
use crate::state::CompareFunc;
use crate::state_block::{StateBlock, StateBlockCache};
use crate::winsys::{BufferUsage, ResourceAddressing};

pub const SI_VS_NUM_USER_SGPR: u32 = 9;
pub const SI_PS_NUM_USER_SGPR: u32 = 7;
/// Per-wave SGPR budget of the shader core.
pub const MAX_SGPRS: u32 = 104;
/// Two SGPRs past the allocation hold VCC.
const VCC_SGPRS: u32 = 2;

/// Parameter exports of a vertex shader. Position, point size and clip vertex
/// travel on their own paths; at least one parameter is always exported since
/// the hardware hangs on zero.
pub fn vs_param_exports(shader: &CompiledShader) -> u32 {
    let nparams = shader
        .outputs
        .iter()
        .filter(|o| {
            !matches!(
                o.semantic,
                Semantic::Position | Semantic::PointSize | Semantic::ClipVertex
            )
        })
        .count() as u32;
    nparams.max(1)
}

fn vgpr_blocks(num_vgprs: u32) -> u32 {
    num_vgprs.saturating_sub(1) / 4
}

fn sgpr_blocks(num_sgprs: u32) -> u32 {
    assert!(
        num_sgprs <= MAX_SGPRS,
        "shader needs {num_sgprs} SGPRs, more than the {MAX_SGPRS} available"
    );
    (num_sgprs - 1) / 8
}

pub fn build_vs_block<A>(
    cache: &mut StateBlockCache,
    addressing: &A,
    shader: &CompiledShader,
    so: &StreamOutputInfo,
) -> Result<Rc<StateBlock>, DrawError>
where
    A: ResourceAddressing + ?Sized,
{
    let mut block = cache.allocate()?;

    block.set_reg(
        spi_vs_out_config::ADDR,
        spi_vs_out_config::vs_export_count(vs_param_exports(shader) - 1),
    );

    let pos_format = (0..4).fold(0, |acc, slot| {
        let format = if slot == 0 || shader.nr_pos_exports > slot {
            spi_shader_pos_format::SPI_SHADER_4COMP
        } else {
            spi_shader_pos_format::SPI_SHADER_NONE
        };
        acc | spi_shader_pos_format::pos_export_format(slot, format)
    });
    block.set_reg(spi_shader_pos_format::ADDR, pos_format);

    let va = addressing.resource_va(shader.bo, 0);
    block.add_buffer(shader.bo, BufferUsage::Read);
    block.set_reg(spi_shader_pgm_lo_vs::ADDR, (va >> 8) as u32);
    block.set_reg(spi_shader_pgm_hi_vs::ADDR, (va >> 40) as u32);

    let num_user_sgprs = SI_VS_NUM_USER_SGPR;
    let mut num_sgprs = shader.num_sgprs;
    if num_user_sgprs > num_sgprs {
        num_sgprs = num_user_sgprs + VCC_SGPRS;
    }
    let vgpr_comp_cnt = if shader.uses_instanceid { 3 } else { 0 };

    block.set_reg(
        spi_shader_pgm_rsrc1_vs::ADDR,
        spi_shader_pgm_rsrc1_vs::vgprs(vgpr_blocks(shader.num_vgprs))
            | spi_shader_pgm_rsrc1_vs::sgprs(sgpr_blocks(num_sgprs))
            | spi_shader_pgm_rsrc1_vs::vgpr_comp_cnt(vgpr_comp_cnt),
    );

    let so_base = so
        .stride
        .iter()
        .enumerate()
        .fold(0, |acc, (i, &stride)| {
            acc | spi_shader_pgm_rsrc2_vs::so_base_en(i as u32, stride != 0)
        });
    block.set_reg(
        spi_shader_pgm_rsrc2_vs::ADDR,
        spi_shader_pgm_rsrc2_vs::user_sgpr(num_user_sgprs)
            | so_base
            | spi_shader_pgm_rsrc2_vs::so_en(so.num_outputs != 0),
    );

    Ok(block.finish())
}

/// `DB_SHADER_CONTROL` for a fragment shader.
pub fn db_shader_control_for(shader: &CompiledShader, key: &PsKey, cb0_is_integer: bool) -> u32 {
    let mut v = db_shader_control::z_order(db_shader_control::EARLY_Z_THEN_LATE_Z)
        | db_shader_control::alpha_to_mask_disable(cb0_is_integer);
    for out in &shader.outputs {
        match out.semantic {
            Semantic::Position => v |= db_shader_control::z_export_enable(true),
            Semantic::Stencil => v |= db_shader_control::stencil_test_val_export_enable(true),
            _ => {}
        }
    }
    if shader.uses_kill || key.alpha_func != CompareFunc::Always {
        v |= db_shader_control::kill_enable(true);
    }
    v
}

pub fn build_ps_block<A>(
    cache: &mut StateBlockCache,
    addressing: &A,
    shader: &CompiledShader,
    key: &PsKey,
    cb0_is_integer: bool,
) -> Result<Rc<StateBlock>, DrawError>
where
    A: ResourceAddressing + ?Sized,
{
    let spi_ps_input_ena = shader.spi_ps_input_ena;
    assert!(
        spi_ps_input_ena & spi_ps_input_ena::INTERP_MASK != 0,
        "fragment shader enables no interpolation mode (SPI_PS_INPUT_ENA = {spi_ps_input_ena:#x})"
    );

    let mut block = cache.allocate()?;
    let db_shader_control = db_shader_control_for(shader, key, cb0_is_integer);

    let centroid_pos = shader
        .inputs
        .iter()
        .any(|i| i.semantic == Semantic::Position && i.centroid);
    let spi_baryc_cntl = if centroid_pos {
        spi_baryc_cntl::pos_float_location(spi_baryc_cntl::POS_FLOAT_CENTROID)
    } else {
        0
    };

    block.set_reg(spi_baryc_cntl::ADDR, spi_baryc_cntl);
    block.set_reg(spi_ps_input_ena::ADDR, spi_ps_input_ena);
    block.set_reg(spi_ps_input_addr::ADDR, spi_ps_input_ena);
    block.set_reg(
        spi_ps_in_control::ADDR,
        spi_ps_in_control::num_interp(shader.ninterp)
            | spi_ps_in_control::bc_optimize_disable(true),
    );

    let z_format = if db_shader_control::get_stencil_test_val_export_enable(db_shader_control) {
        spi_shader_z_format::SPI_SHADER_32_GR
    } else if db_shader_control::get_z_export_enable(db_shader_control) {
        spi_shader_z_format::SPI_SHADER_32_R
    } else {
        spi_shader_z_format::SPI_SHADER_ZERO
    };
    block.set_reg(spi_shader_z_format::ADDR, z_format);
    block.set_reg(spi_shader_col_format::ADDR, shader.spi_shader_col_format);
    block.set_reg(cb_shader_mask::ADDR, shader.cb_shader_mask);

    let va = addressing.resource_va(shader.bo, 0);
    block.add_buffer(shader.bo, BufferUsage::Read);
    block.set_reg(spi_shader_pgm_lo_ps::ADDR, (va >> 8) as u32);
    block.set_reg(spi_shader_pgm_hi_ps::ADDR, (va >> 40) as u32);

    let num_user_sgprs = SI_PS_NUM_USER_SGPR;
    let mut num_sgprs = shader.num_sgprs;
    // One SGPR after the user SGPRs is preloaded with {prim_mask, lds_offset}.
    if num_user_sgprs + 1 > num_sgprs {
        num_sgprs = num_user_sgprs + 1 + VCC_SGPRS;
    }

    block.set_reg(
        spi_shader_pgm_rsrc1_ps::ADDR,
        spi_shader_pgm_rsrc1_ps::vgprs(vgpr_blocks(shader.num_vgprs))
            | spi_shader_pgm_rsrc1_ps::sgprs(sgpr_blocks(num_sgprs)),
    );
    block.set_reg(
        spi_shader_pgm_rsrc2_ps::ADDR,
        spi_shader_pgm_rsrc2_ps::extra_lds_size(shader.lds_size)
            | spi_shader_pgm_rsrc2_ps::user_sgpr(num_user_sgprs),
    );
    block.set_reg(db_shader_control::ADDR, db_shader_control);

    Ok(block.finish())
}
