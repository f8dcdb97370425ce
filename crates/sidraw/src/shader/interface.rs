//! Routing of vertex outputs to fragment inputs (`SPI_PS_INPUT_CNTL_n`).

use std::rc::Rc;

use sidraw_pm4::sid::spi_ps_input_cntl;

use super::{CompiledShader, Interpolation, PsKey, Semantic, ShaderIo};
use crate::error::DrawError;
use crate::state_block::{StateBlock, StateBlockCache};

/// Control word for one fragment input reading `semantic`/`index`.
///
/// An exact (semantic, index) match with a vertex output supplies the parameter
/// offset; otherwise the input reads the hardware default value.
pub fn input_cntl(
    input: &ShaderIo,
    semantic: Semantic,
    vs_outputs: &[ShaderIo],
    key: &PsKey,
) -> u32 {
    let mut v = 0;

    let flat = input.interpolate == Interpolation::Constant
        || (input.interpolate == Interpolation::Color && key.flatshade);
    v |= spi_ps_input_cntl::flat_shade(flat);

    let sprite = semantic == Semantic::Generic
        && 1u32
            .checked_shl(input.index)
            .is_some_and(|bit| key.sprite_coord_enable & bit != 0);
    v |= spi_ps_input_cntl::pt_sprite_tex(sprite);

    let offset = vs_outputs
        .iter()
        .find(|o| o.semantic == semantic && o.index == input.index)
        .map_or(spi_ps_input_cntl::DEFAULT_VAL_OFFSET, |o| o.param_offset);
    v | spi_ps_input_cntl::offset(offset)
}

/// `(register, value)` writes matching `ps` inputs to `vs` outputs.
pub fn spi_map(vs: &CompiledShader, ps: &CompiledShader, key: &PsKey) -> Vec<(u32, u32)> {
    let mut writes = Vec::with_capacity(ps.inputs.len());
    for input in &ps.inputs {
        // Position comes from preloaded VGPRs, not from a parameter.
        if input.semantic == Semantic::Position {
            continue;
        }

        writes.push((
            spi_ps_input_cntl::ADDR + input.param_offset * 4,
            input_cntl(input, input.semantic, &vs.outputs, key),
        ));

        // Two-sided colour also reads the back colour into the next slot.
        if input.semantic == Semantic::Color && key.color_two_side {
            writes.push((
                spi_ps_input_cntl::ADDR + (input.param_offset + 1) * 4,
                input_cntl(input, Semantic::BackColor, &vs.outputs, key),
            ));
        }
    }
    writes
}

pub fn build_spi_map(
    cache: &mut StateBlockCache,
    vs: &CompiledShader,
    ps: &CompiledShader,
    key: &PsKey,
) -> Result<Rc<StateBlock>, DrawError> {
    let mut block = cache.allocate()?;
    for (reg, value) in spi_map(vs, ps, key) {
        block.set_reg(reg, value);
    }
    Ok(block.finish())
}
