//! Register addresses and field encoders for the SI/CIK graphics block.
//!
//! One module per register. Each module carries the byte address (`ADDR`), field
//! encoders (`const fn` taking the raw field value) and, where the hardware defines
//! them, named field values. Encoders mask their input to the field width.

/// Register space bounds, as seen by the SET_*_REG packets.
pub const CONFIG_REG_OFFSET: u32 = 0x0000_8000;
pub const CONFIG_REG_END: u32 = 0x0000_B000;
pub const SH_REG_OFFSET: u32 = 0x0000_B000;
pub const SH_REG_END: u32 = 0x0000_C000;
pub const CONTEXT_REG_OFFSET: u32 = 0x0002_8000;
pub const CONTEXT_REG_END: u32 = 0x0002_9000;
pub const UCONFIG_REG_OFFSET: u32 = 0x0003_0000;
pub const UCONFIG_REG_END: u32 = 0x0003_1000;

/* ------------------------------- Vertex stage ------------------------------ */

pub mod spi_shader_pgm_lo_vs {
    pub const ADDR: u32 = 0x00B120;
}

pub mod spi_shader_pgm_hi_vs {
    pub const ADDR: u32 = 0x00B124;
}

pub mod spi_shader_pgm_rsrc1_vs {
    pub const ADDR: u32 = 0x00B128;
    pub const fn vgprs(x: u32) -> u32 {
        x & 0x3F
    }
    pub const fn sgprs(x: u32) -> u32 {
        (x & 0x0F) << 6
    }
    pub const fn vgpr_comp_cnt(x: u32) -> u32 {
        (x & 0x03) << 24
    }
}

pub mod spi_shader_pgm_rsrc2_vs {
    pub const ADDR: u32 = 0x00B12C;
    pub const fn user_sgpr(x: u32) -> u32 {
        (x & 0x1F) << 1
    }
    pub const fn so_base_en(buffer: u32, enable: bool) -> u32 {
        (enable as u32) << (8 + (buffer & 0x3))
    }
    pub const fn so_en(enable: bool) -> u32 {
        (enable as u32) << 12
    }
}

/// First vertex-stage user data register; user SGPR `n` lives at `ADDR + n * 4`.
pub mod spi_shader_user_data_vs_0 {
    pub const ADDR: u32 = 0x00B130;
}

pub mod spi_vs_out_config {
    pub const ADDR: u32 = 0x0286C4;
    pub const fn vs_export_count(x: u32) -> u32 {
        (x & 0x1F) << 1
    }
}

pub mod spi_shader_pos_format {
    pub const ADDR: u32 = 0x02870C;
    pub const SPI_SHADER_NONE: u32 = 0;
    pub const SPI_SHADER_4COMP: u32 = 4;
    pub const fn pos_export_format(slot: u32, format: u32) -> u32 {
        (format & 0x0F) << ((slot & 0x3) * 4)
    }
}

/* ------------------------------ Fragment stage ----------------------------- */

pub mod spi_shader_pgm_lo_ps {
    pub const ADDR: u32 = 0x00B020;
}

pub mod spi_shader_pgm_hi_ps {
    pub const ADDR: u32 = 0x00B024;
}

pub mod spi_shader_pgm_rsrc1_ps {
    pub const ADDR: u32 = 0x00B028;
    pub const fn vgprs(x: u32) -> u32 {
        x & 0x3F
    }
    pub const fn sgprs(x: u32) -> u32 {
        (x & 0x0F) << 6
    }
}

pub mod spi_shader_pgm_rsrc2_ps {
    pub const ADDR: u32 = 0x00B02C;
    pub const fn user_sgpr(x: u32) -> u32 {
        (x & 0x1F) << 1
    }
    pub const fn extra_lds_size(x: u32) -> u32 {
        (x & 0xFF) << 8
    }
}

pub mod spi_ps_input_cntl {
    /// Address of `SPI_PS_INPUT_CNTL_0`; input `n` lives at `ADDR + n * 4`.
    pub const ADDR: u32 = 0x028644;
    /// Parameter offset that reads the hardware default value instead of a VS export.
    pub const DEFAULT_VAL_OFFSET: u32 = 0x20;
    pub const fn offset(x: u32) -> u32 {
        x & 0x3F
    }
    pub const fn flat_shade(enable: bool) -> u32 {
        (enable as u32) << 10
    }
    pub const fn pt_sprite_tex(enable: bool) -> u32 {
        (enable as u32) << 17
    }
    pub const fn get_offset(v: u32) -> u32 {
        v & 0x3F
    }
}

pub mod spi_ps_input_ena {
    pub const ADDR: u32 = 0x0286CC;
    pub const PERSP_SAMPLE_ENA: u32 = 1 << 0;
    pub const PERSP_CENTER_ENA: u32 = 1 << 1;
    pub const PERSP_CENTROID_ENA: u32 = 1 << 2;
    pub const PERSP_PULL_MODEL_ENA: u32 = 1 << 3;
    pub const LINEAR_SAMPLE_ENA: u32 = 1 << 4;
    pub const LINEAR_CENTER_ENA: u32 = 1 << 5;
    pub const LINEAR_CENTROID_ENA: u32 = 1 << 6;
    pub const LINE_STIPPLE_TEX_ENA: u32 = 1 << 7;
    /// Every interpolation-mode enable; at least one must be set or the SPI hangs.
    pub const INTERP_MASK: u32 = PERSP_SAMPLE_ENA
        | PERSP_CENTER_ENA
        | PERSP_CENTROID_ENA
        | PERSP_PULL_MODEL_ENA
        | LINEAR_SAMPLE_ENA
        | LINEAR_CENTER_ENA
        | LINEAR_CENTROID_ENA
        | LINE_STIPPLE_TEX_ENA;
}

pub mod spi_ps_input_addr {
    pub const ADDR: u32 = 0x0286D0;
}

pub mod spi_ps_in_control {
    pub const ADDR: u32 = 0x0286D8;
    pub const fn num_interp(x: u32) -> u32 {
        x & 0x3F
    }
    pub const fn bc_optimize_disable(enable: bool) -> u32 {
        (enable as u32) << 15
    }
}

pub mod spi_baryc_cntl {
    pub const ADDR: u32 = 0x0286E0;
    pub const POS_FLOAT_PIXEL_CENTER: u32 = 0;
    pub const POS_FLOAT_CENTROID: u32 = 1;
    pub const fn pos_float_location(x: u32) -> u32 {
        (x & 0x3) << 16
    }
}

pub mod spi_shader_z_format {
    pub const ADDR: u32 = 0x028710;
    pub const SPI_SHADER_ZERO: u32 = 0;
    pub const SPI_SHADER_32_R: u32 = 1;
    pub const SPI_SHADER_32_GR: u32 = 2;
}

pub mod spi_shader_col_format {
    pub const ADDR: u32 = 0x028714;
}

pub mod cb_shader_mask {
    pub const ADDR: u32 = 0x02823C;
}

pub mod db_shader_control {
    pub const ADDR: u32 = 0x02880C;
    pub const LATE_Z: u32 = 0;
    pub const EARLY_Z_THEN_LATE_Z: u32 = 1;
    pub const fn z_export_enable(enable: bool) -> u32 {
        enable as u32
    }
    pub const fn stencil_test_val_export_enable(enable: bool) -> u32 {
        (enable as u32) << 1
    }
    pub const fn z_order(x: u32) -> u32 {
        (x & 0x3) << 4
    }
    pub const fn kill_enable(enable: bool) -> u32 {
        (enable as u32) << 6
    }
    pub const fn alpha_to_mask_disable(enable: bool) -> u32 {
        (enable as u32) << 11
    }
    pub const fn get_z_export_enable(v: u32) -> bool {
        v & 1 != 0
    }
    pub const fn get_stencil_test_val_export_enable(v: u32) -> bool {
        (v >> 1) & 1 != 0
    }
    pub const fn get_kill_enable(v: u32) -> bool {
        (v >> 6) & 1 != 0
    }
}

pub mod db_count_control {
    pub const ADDR: u32 = 0x028004;
    pub const fn perfect_zpass_counts(enable: bool) -> u32 {
        (enable as u32) << 1
    }
    pub const fn sample_rate(x: u32) -> u32 {
        (x & 0x7) << 4
    }
    pub const fn zpass_enable(x: u32) -> u32 {
        (x & 0xF) << 8
    }
    pub const fn slice_even_enable(x: u32) -> u32 {
        (x & 0xF) << 24
    }
    pub const fn slice_odd_enable(x: u32) -> u32 {
        (x & 0xF) << 28
    }
}

/* --------------------------- Vertex grouper/tessellator -------------------- */

pub mod vgt_primitive_type {
    /// SI places the primitive type in config space.
    pub const ADDR_SI: u32 = 0x008958;
    /// CIK moved it to uconfig space.
    pub const ADDR_CIK: u32 = 0x030908;

    pub const DI_PT_POINTLIST: u32 = 0x01;
    pub const DI_PT_LINELIST: u32 = 0x02;
    pub const DI_PT_LINESTRIP: u32 = 0x03;
    pub const DI_PT_TRILIST: u32 = 0x04;
    pub const DI_PT_TRIFAN: u32 = 0x05;
    pub const DI_PT_TRISTRIP: u32 = 0x06;
    pub const DI_PT_LINELIST_ADJ: u32 = 0x0A;
    pub const DI_PT_LINESTRIP_ADJ: u32 = 0x0B;
    pub const DI_PT_TRILIST_ADJ: u32 = 0x0C;
    pub const DI_PT_TRISTRIP_ADJ: u32 = 0x0D;
    pub const DI_PT_LINELOOP: u32 = 0x12;
    pub const DI_PT_QUADLIST: u32 = 0x13;
    pub const DI_PT_QUADSTRIP: u32 = 0x14;
    pub const DI_PT_POLYGON: u32 = 0x15;
}

pub mod vgt_gs_out_prim_type {
    pub const ADDR: u32 = 0x028A6C;
    pub const OUTPRIM_TYPE_POINTLIST: u32 = 0;
    pub const OUTPRIM_TYPE_LINESTRIP: u32 = 1;
    pub const OUTPRIM_TYPE_TRISTRIP: u32 = 2;
}

pub mod ia_multi_vgt_param {
    pub const ADDR: u32 = 0x028AA8;
    pub const fn primgroup_size(x: u32) -> u32 {
        x & 0xFFFF
    }
    pub const fn partial_vs_wave_on(enable: bool) -> u32 {
        (enable as u32) << 16
    }
    pub const fn switch_on_eop(enable: bool) -> u32 {
        (enable as u32) << 17
    }
    pub const fn wd_switch_on_eop(enable: bool) -> u32 {
        (enable as u32) << 20
    }
}

pub mod vgt_dispatch_draw_index {
    pub const ADDR: u32 = 0x028B74;
    pub const INDEX_32: u32 = 0xFC00_0000;
    pub const INDEX_16: u32 = 0x0000_FC00;
}

pub mod vgt_indx_offset {
    pub const ADDR: u32 = 0x028408;
}

pub mod vgt_multi_prim_ib_reset_indx {
    pub const ADDR: u32 = 0x02840C;
}

pub mod vgt_multi_prim_ib_reset_en {
    pub const ADDR: u32 = 0x028A94;
}

pub mod vgt_strmout_draw_opaque_buffer_filled_size {
    pub const ADDR: u32 = 0x028B2C;
}

pub mod vgt_strmout_draw_opaque_vertex_stride {
    pub const ADDR: u32 = 0x028B30;
}

/// `VGT_INDEX_TYPE`, carried by the INDEX_TYPE packet rather than a register write.
pub mod vgt_index_type {
    pub const VGT_INDEX_16: u32 = 0;
    pub const VGT_INDEX_32: u32 = 1;
    pub const VGT_DMA_SWAP_NONE: u32 = 0;
    pub const VGT_DMA_SWAP_16_BIT: u32 = 1;
    pub const VGT_DMA_SWAP_32_BIT: u32 = 2;
    pub const fn index_type(x: u32) -> u32 {
        x & 0x3
    }
    pub const fn swap_mode(x: u32) -> u32 {
        (x & 0x3) << 2
    }
}

/// `VGT_DRAW_INITIATOR`, carried by the draw packets.
pub mod vgt_draw_initiator {
    pub const DI_SRC_SEL_DMA: u32 = 0;
    pub const DI_SRC_SEL_IMMEDIATE: u32 = 1;
    pub const DI_SRC_SEL_AUTO_INDEX: u32 = 2;
    pub const fn source_select(x: u32) -> u32 {
        x & 0x3
    }
    pub const fn use_opaque(enable: bool) -> u32 {
        (enable as u32) << 6
    }
}

/* ------------------------------- Primitive assembly ------------------------ */

pub mod pa_sc_line_stipple {
    pub const ADDR: u32 = 0x028A0C;
    pub const fn auto_reset_cntl(x: u32) -> u32 {
        (x & 0x3) << 29
    }
}

pub mod pa_su_sc_mode_cntl {
    pub const ADDR: u32 = 0x028814;
    pub const fn provoking_vtx_last(enable: bool) -> u32 {
        (enable as u32) << 19
    }
}

pub mod pa_cl_clip_cntl {
    pub const ADDR: u32 = 0x028810;
    pub const UCP_ENA_MASK: u32 = 0x3F;
}

pub mod pa_cl_vs_out_cntl {
    pub const ADDR: u32 = 0x02881C;
    pub const fn use_vtx_point_size(enable: bool) -> u32 {
        (enable as u32) << 16
    }
    pub const fn use_vtx_edge_flag(enable: bool) -> u32 {
        (enable as u32) << 17
    }
    pub const fn use_vtx_render_target_indx(enable: bool) -> u32 {
        (enable as u32) << 18
    }
    pub const fn use_vtx_viewport_indx(enable: bool) -> u32 {
        (enable as u32) << 19
    }
    pub const fn vs_out_misc_vec_ena(enable: bool) -> u32 {
        (enable as u32) << 21
    }
    pub const fn vs_out_ccdist0_vec_ena(enable: bool) -> u32 {
        (enable as u32) << 22
    }
    pub const fn vs_out_ccdist1_vec_ena(enable: bool) -> u32 {
        (enable as u32) << 23
    }
}

/* ------------------------------ Buffer resources --------------------------- */

/// Buffer resource descriptor (`SQ_BUF_RSRC_WORD*`), four dwords per vertex element.
pub mod sq_buf_rsrc {
    pub const DWORDS: usize = 4;

    pub const fn word1_base_address_hi(x: u32) -> u32 {
        x & 0xFFFF
    }
    pub const fn word1_stride(x: u32) -> u32 {
        (x & 0x3FFF) << 16
    }

    pub const SEL_0: u32 = 0;
    pub const SEL_1: u32 = 1;
    pub const SEL_X: u32 = 4;
    pub const SEL_Y: u32 = 5;
    pub const SEL_Z: u32 = 6;
    pub const SEL_W: u32 = 7;

    pub const NUM_FORMAT_UNORM: u32 = 0;
    pub const NUM_FORMAT_SNORM: u32 = 1;
    pub const NUM_FORMAT_UINT: u32 = 4;
    pub const NUM_FORMAT_SINT: u32 = 5;
    pub const NUM_FORMAT_FLOAT: u32 = 7;

    pub const DATA_FORMAT_8: u32 = 1;
    pub const DATA_FORMAT_16: u32 = 2;
    pub const DATA_FORMAT_8_8: u32 = 3;
    pub const DATA_FORMAT_32: u32 = 4;
    pub const DATA_FORMAT_16_16: u32 = 5;
    pub const DATA_FORMAT_2_10_10_10: u32 = 9;
    pub const DATA_FORMAT_8_8_8_8: u32 = 10;
    pub const DATA_FORMAT_32_32: u32 = 11;
    pub const DATA_FORMAT_16_16_16_16: u32 = 12;
    pub const DATA_FORMAT_32_32_32: u32 = 13;
    pub const DATA_FORMAT_32_32_32_32: u32 = 14;

    pub const fn word3_dst_sel(x: u32, y: u32, z: u32, w: u32) -> u32 {
        (x & 0x7) | ((y & 0x7) << 3) | ((z & 0x7) << 6) | ((w & 0x7) << 9)
    }
    pub const fn word3_num_format(x: u32) -> u32 {
        (x & 0x7) << 12
    }
    pub const fn word3_data_format(x: u32) -> u32 {
        (x & 0xF) << 15
    }
}

/* ------------------------------- Cache control ----------------------------- */

/// `CP_COHER_CNTL`, carried by SURFACE_SYNC / ACQUIRE_MEM.
pub mod cp_coher_cntl {
    pub const fn cb_dest_base_ena(rt: u32) -> u32 {
        1 << (6 + (rt & 0x7))
    }
    pub const DB_DEST_BASE_ENA: u32 = 1 << 14;
    pub const TCL1_ACTION_ENA: u32 = 1 << 22;
    pub const TC_ACTION_ENA: u32 = 1 << 23;
    pub const CB_ACTION_ENA: u32 = 1 << 25;
    pub const DB_ACTION_ENA: u32 = 1 << 26;
    pub const SH_KCACHE_ACTION_ENA: u32 = 1 << 27;
    pub const SH_ICACHE_ACTION_ENA: u32 = 1 << 29;
}

/// `VGT_EVENT_INITIATOR` event types used with EVENT_WRITE.
pub mod vgt_event_type {
    pub const VS_PARTIAL_FLUSH: u32 = 0x0F;
    pub const PS_PARTIAL_FLUSH: u32 = 0x10;
    pub const FLUSH_AND_INV_DB_META: u32 = 0x2C;
    pub const FLUSH_AND_INV_CB_META: u32 = 0x2E;
    pub const fn event_type(x: u32) -> u32 {
        x & 0x3F
    }
    pub const fn event_index(x: u32) -> u32 {
        (x & 0xF) << 8
    }
}

/// `COPY_DATA` control word.
pub mod copy_data {
    pub const SRC_REG: u32 = 0;
    pub const SRC_MEM: u32 = 1;
    pub const DST_REG: u32 = 0;
    pub const DST_MEM: u32 = 1;
    pub const fn src_sel(x: u32) -> u32 {
        x & 0xF
    }
    pub const fn dst_sel(x: u32) -> u32 {
        (x & 0xF) << 8
    }
    pub const WR_CONFIRM: u32 = 1 << 20;
}
