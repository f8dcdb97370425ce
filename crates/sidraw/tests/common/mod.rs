//! Shared helpers for `sidraw` integration tests.
#![allow(dead_code)]

use sidraw::shader::{CompileError, CompiledShader, ShaderSelectorDesc, VariantKey};
use sidraw::{
    Buffer, BufferHandle, CommandBuffer, CommandSubmitter, ContextDescriptor, DrawContext,
    Interpolation, ResourceAddressing, Semantic, ShaderCompiler, ShaderIo, ShaderStage,
    SurfaceTracker, TextureHandle, UploadAllocator, VertexBufferBinding, VertexElement,
    VertexFormat,
};
use sidraw_pm4::sid::spi_ps_input_ena;
use sidraw_pm4::{parse_pm4_stream, Pm4Opcode, Pm4Packet};

pub const VA_BASE: u64 = 0x1_0000_0000;

/// Stand-in for every collaborator of the draw path.
pub struct MockWinsys {
    pub vs_template: CompiledShader,
    pub ps_template: CompiledShader,
    pub fail_compiles: bool,
    /// Number of further uploads that succeed; `None` is unlimited.
    pub upload_budget: Option<usize>,
    pub compiled: Vec<(ShaderStage, VariantKey)>,
    pub uploads: Vec<Vec<u32>>,
    pub submitted: Vec<CommandBuffer>,
    pub dirty_levels: Vec<(TextureHandle, u32)>,
    next_handle: u32,
}

impl MockWinsys {
    pub fn new() -> Self {
        Self {
            vs_template: simple_vs(),
            ps_template: simple_ps(),
            fail_compiles: false,
            upload_budget: None,
            compiled: Vec::new(),
            uploads: Vec::new(),
            submitted: Vec::new(),
            dirty_levels: Vec::new(),
            next_handle: 1000,
        }
    }

    fn alloc_handle(&mut self) -> BufferHandle {
        self.next_handle += 1;
        BufferHandle(self.next_handle)
    }
}

impl Default for MockWinsys {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceAddressing for MockWinsys {
    fn resource_va(&self, buffer: BufferHandle, offset: u64) -> u64 {
        VA_BASE + u64::from(buffer.0) * 0x10_0000 + offset
    }
}

impl UploadAllocator for MockWinsys {
    fn upload(&mut self, data: &[u32]) -> Option<Buffer> {
        if let Some(budget) = &mut self.upload_budget {
            if *budget == 0 {
                return None;
            }
            *budget -= 1;
        }
        self.uploads.push(data.to_vec());
        Some(Buffer {
            handle: self.alloc_handle(),
            size: (data.len() * 4) as u64,
        })
    }
}

impl ShaderCompiler for MockWinsys {
    fn compile(
        &mut self,
        selector: &ShaderSelectorDesc,
        key: &VariantKey,
    ) -> Result<CompiledShader, CompileError> {
        if self.fail_compiles {
            return Err(CompileError::Backend("mock compiler refused".into()));
        }
        self.compiled.push((selector.stage, *key));
        let mut shader = match selector.stage {
            ShaderStage::Vertex => self.vs_template.clone(),
            ShaderStage::Fragment => self.ps_template.clone(),
        };
        shader.bo = self.alloc_handle();
        Ok(shader)
    }
}

impl CommandSubmitter for MockWinsys {
    fn submit(&mut self, cb: CommandBuffer) {
        self.submitted.push(cb);
    }
}

impl SurfaceTracker for MockWinsys {
    fn mark_level_dirty(&mut self, texture: TextureHandle, level: u32) {
        self.dirty_levels.push((texture, level));
    }
}

/// Position plus one generic varying.
pub fn simple_vs() -> CompiledShader {
    CompiledShader {
        num_sgprs: 16,
        num_vgprs: 8,
        outputs: vec![
            ShaderIo::new(Semantic::Position, 0, 0),
            ShaderIo::new(Semantic::Generic, 0, 0),
        ],
        nr_pos_exports: 1,
        ..Default::default()
    }
}

/// Reads generic 0 and writes one colour.
pub fn simple_ps() -> CompiledShader {
    CompiledShader {
        num_sgprs: 8,
        num_vgprs: 4,
        inputs: vec![
            ShaderIo::new(Semantic::Generic, 0, 0).with_interpolation(Interpolation::Perspective)
        ],
        outputs: vec![ShaderIo::new(Semantic::Color, 0, 0)],
        ninterp: 1,
        spi_ps_input_ena: spi_ps_input_ena::PERSP_CENTER_ENA,
        spi_shader_col_format: 0x4,
        cb_shader_mask: 0xF,
        ..Default::default()
    }
}

pub fn vertex_buffer() -> VertexBufferBinding {
    VertexBufferBinding {
        buffer: Buffer {
            handle: BufferHandle(7),
            size: 100,
        },
        buffer_offset: 0,
        stride: 12,
    }
}

/// A context with a vertex and fragment selector bound and one vertex stream.
pub fn ready_context(desc: ContextDescriptor) -> DrawContext<MockWinsys> {
    ready_context_with(desc, MockWinsys::new())
}

pub fn ready_context_with(desc: ContextDescriptor, winsys: MockWinsys) -> DrawContext<MockWinsys> {
    let mut ctx = DrawContext::new(desc, winsys);
    let vs = ctx.create_shader_selector(ShaderSelectorDesc::new(ShaderStage::Vertex, vec![0xA]));
    let ps = ctx.create_shader_selector(ShaderSelectorDesc::new(ShaderStage::Fragment, vec![0xB]));
    ctx.bind_vs_selector(Some(vs));
    ctx.bind_ps_selector(Some(ps));
    ctx.set_vertex_elements(vec![VertexElement {
        src_offset: 4,
        vertex_buffer_index: 0,
        format: VertexFormat::R32G32Float,
    }]);
    ctx.set_vertex_buffers(vec![Some(vertex_buffer())]);
    ctx
}

pub fn packets(dwords: &[u32]) -> Vec<Pm4Packet<'_>> {
    parse_pm4_stream(dwords).expect("well-formed PM4 stream")
}

pub fn opcodes(dwords: &[u32]) -> Vec<Pm4Opcode> {
    packets(dwords)
        .iter()
        .map(|p| p.opcode().expect("known opcode"))
        .collect()
}

pub fn count_opcode(dwords: &[u32], opcode: Pm4Opcode) -> usize {
    opcodes(dwords).into_iter().filter(|&op| op == opcode).count()
}

/// Whether any SET_*_REG packet in `dwords` writes `reg`.
pub fn writes_register(dwords: &[u32], reg: u32) -> bool {
    sidraw_pm4::find_register_write(dwords, reg).is_some()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}
