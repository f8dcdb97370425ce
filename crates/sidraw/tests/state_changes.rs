mod common;

use common::{count_opcode, packets, ready_context, ready_context_with, writes_register, MockWinsys};
use pretty_assertions::assert_eq;
use sidraw::{
    AtomId, ChipClass, ContextDescriptor, DrawInfo, DrawOutcome, FramebufferState,
    PrimitiveMode, PsKey, RasterizerState, SelectorId, Semantic, ShaderIo, ShaderStage, SkipReason,
    SurfaceBinding, TextureHandle, VariantKey,
};
use sidraw_pm4::sid::{
    db_shader_control, spi_ps_input_cntl, spi_shader_pgm_lo_ps, spi_shader_pgm_lo_vs,
    vgt_primitive_type,
};
use sidraw_pm4::Pm4Opcode;

fn triangle() -> DrawInfo {
    DrawInfo::arrays(PrimitiveMode::Triangles, 0, 3)
}

#[test]
fn vertex_shader_change_reemits_fragment_block_and_interface() {
    let mut ctx = ready_context(ContextDescriptor::default());
    ctx.draw_vbo(&triangle()).unwrap();
    let first_len = ctx.command_stream().len();

    // Clip planes only key the vertex shader.
    ctx.set_rasterizer_state(RasterizerState {
        clip_plane_enable: 0x3,
        ..Default::default()
    });
    ctx.draw_vbo(&triangle()).unwrap();

    let second = &ctx.command_stream().as_dwords()[first_len..];
    assert!(writes_register(second, spi_shader_pgm_lo_vs::ADDR));
    assert!(writes_register(second, spi_shader_pgm_lo_ps::ADDR));
    assert!(writes_register(second, spi_ps_input_cntl::ADDR));
    // Only the vertex shader was recompiled.
    assert_eq!(ctx.winsys().compiled.len(), 3);
    assert_eq!(ctx.stats().snapshot().atoms_emitted, 12);
}

#[test]
fn full_command_buffer_is_handed_off_and_state_replayed() {
    let mut probe = ready_context(ContextDescriptor::default());
    probe.draw_vbo(&triangle()).unwrap();
    let first_len = probe.command_stream().len();

    let desc = ContextDescriptor {
        cs_capacity_dwords: first_len + 10,
        ..Default::default()
    };
    let mut ctx = ready_context(desc);
    ctx.draw_vbo(&triangle()).unwrap();
    assert!(ctx.winsys().submitted.is_empty());
    assert_eq!(ctx.command_stream().len(), first_len);

    ctx.draw_vbo(&triangle()).unwrap();
    let submitted = &ctx.winsys().submitted;
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].dwords.len(), first_len);

    // The fresh buffer carries every atom again.
    assert_eq!(ctx.command_stream().len(), first_len);
    let snap = ctx.stats().snapshot();
    assert_eq!(snap.atoms_emitted, 12);
    assert_eq!(snap.command_buffers_submitted, 1);
    assert_eq!(snap.draws_issued, 2);
}

#[test]
fn flush_submits_nothing_when_empty() {
    let mut ctx = ready_context(ContextDescriptor::default());
    ctx.flush();
    assert!(ctx.winsys().submitted.is_empty());

    ctx.draw_vbo(&triangle()).unwrap();
    ctx.flush();
    ctx.flush();
    assert_eq!(ctx.winsys().submitted.len(), 1);
    assert!(ctx.command_stream().is_empty());
}

#[test]
fn draw_marks_depth_and_compressed_colour_levels_dirty() {
    let mut ctx = ready_context(ContextDescriptor::default());
    ctx.set_framebuffer_state(FramebufferState {
        cbufs: vec![
            Some(SurfaceBinding {
                texture: TextureHandle(1),
                level: 0,
                compressed: true,
            }),
            None,
            Some(SurfaceBinding {
                texture: TextureHandle(2),
                level: 1,
                compressed: false,
            }),
        ],
        zsbuf: Some(SurfaceBinding {
            texture: TextureHandle(3),
            level: 2,
            compressed: false,
        }),
        ..Default::default()
    });
    ctx.draw_vbo(&triangle()).unwrap();

    assert_eq!(
        ctx.winsys().dirty_levels,
        vec![(TextureHandle(3), 2), (TextureHandle(1), 0)]
    );
    // The target switch flushed colour and depth metadata.
    assert_eq!(count_opcode(ctx.command_stream().as_dwords(), Pm4Opcode::EventWrite), 2);
}

#[test]
fn deleting_the_bound_vertex_selector_skips_draws() {
    let mut ctx = ready_context(ContextDescriptor::default());
    ctx.draw_vbo(&triangle()).unwrap();
    // The vertex selector is created first.
    let vs = SelectorId(1);
    assert_eq!(ctx.selector(vs).unwrap().stage(), ShaderStage::Vertex);
    assert!(ctx.atoms().block(AtomId::Vs).is_some());

    let live_before = ctx.live_state_blocks();
    ctx.delete_shader_selector(vs);
    assert!(ctx.atoms().block(AtomId::Vs).is_none());
    assert!(ctx.atoms().block(AtomId::Spi).is_none());
    assert!(ctx.atoms().block(AtomId::Ps).is_some());
    // The vertex block and the interface map are both released.
    assert_eq!(ctx.live_state_blocks(), live_before - 2);
    assert!(ctx.selector(vs).is_none());
    assert_eq!(
        ctx.draw_vbo(&triangle()).unwrap(),
        DrawOutcome::Skipped(SkipReason::NoShaders)
    );
}

#[test]
fn integer_colour_buffer_rebuilds_fragment_block_without_recompiling() {
    let mut ctx = ready_context(ContextDescriptor::default());
    ctx.draw_vbo(&triangle()).unwrap();
    let before = ctx.atoms().block(AtomId::Ps).unwrap().clone();
    assert_eq!(
        before.register(db_shader_control::ADDR).unwrap()
            & db_shader_control::alpha_to_mask_disable(true),
        0
    );

    ctx.set_framebuffer_state(FramebufferState {
        cb0_is_integer: true,
        ..Default::default()
    });
    ctx.draw_vbo(&triangle()).unwrap();

    let after = ctx.atoms().block(AtomId::Ps).unwrap();
    assert_ne!(before.id(), after.id());
    assert_ne!(
        after.register(db_shader_control::ADDR).unwrap()
            & db_shader_control::alpha_to_mask_disable(true),
        0
    );
    assert_eq!(ctx.winsys().compiled.len(), 2);
}

#[test]
fn two_sided_colour_compiles_a_variant_reading_back_colour() {
    let mut winsys = MockWinsys::new();
    winsys.vs_template.outputs = vec![
        ShaderIo::new(Semantic::Position, 0, 0),
        ShaderIo::new(Semantic::Color, 0, 0),
        ShaderIo::new(Semantic::BackColor, 0, 1),
    ];
    winsys.ps_template.inputs = vec![ShaderIo::new(Semantic::Color, 0, 0)];
    let mut ctx = ready_context_with(ContextDescriptor::default(), winsys);
    ctx.draw_vbo(&triangle()).unwrap();
    assert_eq!(ctx.atoms().block(AtomId::Spi).unwrap().registers().len(), 1);

    ctx.set_rasterizer_state(RasterizerState {
        two_side: true,
        ..Default::default()
    });
    ctx.draw_vbo(&triangle()).unwrap();

    let (_, key) = ctx.winsys().compiled.last().copied().unwrap();
    assert!(matches!(
        key,
        VariantKey::Fragment(PsKey {
            color_two_side: true,
            ..
        })
    ));
    let spi = ctx.atoms().block(AtomId::Spi).unwrap();
    assert_eq!(
        spi.registers(),
        &[
            (spi_ps_input_cntl::ADDR, spi_ps_input_cntl::offset(0)),
            (spi_ps_input_cntl::ADDR + 4, spi_ps_input_cntl::offset(1)),
        ]
    );
}

#[test]
#[should_panic(expected = "no interpolation mode")]
fn fragment_shader_without_interpolation_mode_panics() {
    let mut winsys = MockWinsys::new();
    winsys.ps_template.spi_ps_input_ena = 0;
    let mut ctx = ready_context_with(ContextDescriptor::default(), winsys);
    let _ = ctx.draw_vbo(&triangle());
}

#[test]
fn cik_uses_acquire_mem_and_uconfig_primitive_type() {
    let desc = ContextDescriptor {
        chip_class: ChipClass::Cik,
        ..Default::default()
    };
    let mut ctx = ready_context(desc);
    ctx.draw_vbo(&triangle()).unwrap();

    let dw = ctx.command_stream().as_dwords();
    assert_eq!(count_opcode(dw, Pm4Opcode::AcquireMem), 1);
    assert_eq!(count_opcode(dw, Pm4Opcode::SurfaceSync), 0);
    assert!(writes_register(dw, vgt_primitive_type::ADDR_CIK));
    assert!(!writes_register(dw, vgt_primitive_type::ADDR_SI));
    assert!(packets(dw)
        .iter()
        .any(|p| p.opcode() == Some(Pm4Opcode::SetUconfigReg)));
}
