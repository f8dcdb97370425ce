//! The per-context draw encoder.

use std::rc::Rc;

use hashbrown::HashMap;

use crate::atoms::{AtomId, AtomTable};
use crate::cs::CommandStream;
use crate::draw::packets::DrawEnv;
use crate::draw::{
    build_draw_block, build_draw_info_block, upload_user_indices, DrawInfo, DrawOutcome,
    IndexBuffer, SkipReason, UserIndices,
};
use crate::error::DrawError;
use crate::hazards::{CacheFlushCoordinator, CacheHazards, CACHE_FLUSH_WORST_CASE_DWORDS};
use crate::shader::{
    build_ps_block, build_spi_map, build_vs_block, CompiledShader, PsKey, SelectorId,
    ShaderSelector, ShaderSelectorDesc, ShaderStage, VariantKey, VsKey,
};
use crate::state::{AlphaTestState, ContextDescriptor, FramebufferState, RasterizerState};
use crate::state_block::{StateBlock, StateBlockCache};
use crate::stats::DrawStats;
use crate::vertex::{
    build_vertex_buffers, VertexBufferBinding, VertexElement, MAX_VERTEX_ELEMENTS,
};
use crate::winsys::{CommandBuffer, Winsys};

/// A shader variant chosen for the next draw, with its register block.
struct StagedShader {
    shader: Rc<CompiledShader>,
    block: Rc<StateBlock>,
}

/// Encodes draw calls for one rendering context.
///
/// Owns every cache the draw path touches. Nothing here is shared with
/// another context.
pub struct DrawContext<W: Winsys> {
    desc: ContextDescriptor,
    winsys: W,
    blocks: StateBlockCache,
    atoms: AtomTable,
    flush: CacheFlushCoordinator,
    cs: CommandStream,
    stats: DrawStats,

    selectors: HashMap<SelectorId, ShaderSelector>,
    next_selector: u32,
    vs: Option<SelectorId>,
    ps: Option<SelectorId>,

    rasterizer: RasterizerState,
    alpha_test: AlphaTestState,
    framebuffer: FramebufferState,
    vertex_elements: Vec<VertexElement>,
    vertex_buffers: Vec<Option<VertexBufferBinding>>,
    index_buffer: Option<IndexBuffer>,
    render_condition: bool,
    active_occlusion_queries: u32,
}

impl<W: Winsys> DrawContext<W> {
    pub fn new(desc: ContextDescriptor, winsys: W) -> Self {
        Self {
            desc,
            winsys,
            blocks: StateBlockCache::new(desc.max_state_blocks),
            atoms: AtomTable::new(),
            flush: CacheFlushCoordinator::new(desc.chip_class),
            cs: CommandStream::new(desc.cs_capacity_dwords),
            stats: DrawStats::new(),
            selectors: HashMap::new(),
            next_selector: 1,
            vs: None,
            ps: None,
            rasterizer: RasterizerState::default(),
            alpha_test: AlphaTestState::default(),
            framebuffer: FramebufferState::default(),
            vertex_elements: Vec::new(),
            vertex_buffers: Vec::new(),
            index_buffer: None,
            render_condition: false,
            active_occlusion_queries: 0,
        }
    }

    pub fn descriptor(&self) -> &ContextDescriptor {
        &self.desc
    }

    pub fn winsys(&self) -> &W {
        &self.winsys
    }

    pub fn winsys_mut(&mut self) -> &mut W {
        &mut self.winsys
    }

    pub fn stats(&self) -> &DrawStats {
        &self.stats
    }

    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    pub fn pending_hazards(&self) -> CacheHazards {
        self.flush.pending()
    }

    /// The command buffer being filled.
    pub fn command_stream(&self) -> &CommandStream {
        &self.cs
    }

    pub fn live_state_blocks(&self) -> usize {
        self.blocks.live_blocks()
    }

    /* ------------------------------ Shader selectors ----------------------- */

    pub fn create_shader_selector(&mut self, desc: ShaderSelectorDesc) -> SelectorId {
        let id = SelectorId(self.next_selector);
        self.next_selector += 1;
        self.selectors.insert(id, ShaderSelector::new(id, desc));
        id
    }

    pub fn selector(&self, id: SelectorId) -> Option<&ShaderSelector> {
        self.selectors.get(&id)
    }

    pub fn bind_vs_selector(&mut self, id: Option<SelectorId>) {
        self.assert_stage(id, ShaderStage::Vertex);
        self.vs = id;
    }

    pub fn bind_ps_selector(&mut self, id: Option<SelectorId>) {
        self.assert_stage(id, ShaderStage::Fragment);
        self.ps = id;
    }

    fn assert_stage(&self, id: Option<SelectorId>, stage: ShaderStage) {
        if let Some(id) = id {
            let sel = self
                .selectors
                .get(&id)
                .unwrap_or_else(|| panic!("binding unknown shader selector {id:?}"));
            assert_eq!(sel.stage(), stage, "selector {id:?} bound to the wrong stage");
        }
    }

    /// Destroy a selector together with all of its variants.
    pub fn delete_shader_selector(&mut self, id: SelectorId) {
        let Some(sel) = self.selectors.remove(&id) else {
            return;
        };
        if self.vs == Some(id) {
            self.vs = None;
        }
        if self.ps == Some(id) {
            self.ps = None;
        }
        let atom = match sel.stage() {
            ShaderStage::Vertex => AtomId::Vs,
            ShaderStage::Fragment => AtomId::Ps,
        };
        let bound_here = self.atoms.block(atom).is_some_and(|bound| {
            sel.variants()
                .iter()
                .filter_map(|v| v.block())
                .any(|b| Rc::ptr_eq(b, bound))
        });
        if bound_here {
            self.atoms.unbind(atom);
            // The interface map was derived from the deleted shader too.
            self.atoms.unbind(AtomId::Spi);
        }
    }

    /* ------------------------------ Fixed-function state ------------------- */

    pub fn set_rasterizer_state(&mut self, rs: RasterizerState) {
        self.rasterizer = rs;
    }

    pub fn set_alpha_test(&mut self, alpha_test: AlphaTestState) {
        self.alpha_test = alpha_test;
    }

    /// Bind new render targets. Whatever the old targets still hold in the
    /// colour and depth caches is flushed before the next draw.
    pub fn set_framebuffer_state(&mut self, fb: FramebufferState) {
        self.flush.raise(
            CacheHazards::FLUSH_AND_INV_CB
                | CacheHazards::FLUSH_AND_INV_CB_META
                | CacheHazards::FLUSH_AND_INV_DB
                | CacheHazards::FLUSH_AND_INV_DB_META,
        );
        self.framebuffer = fb;
    }

    pub fn set_vertex_elements(&mut self, elements: Vec<VertexElement>) {
        assert!(
            elements.len() <= MAX_VERTEX_ELEMENTS,
            "{} vertex elements exceed the descriptor table limit of {MAX_VERTEX_ELEMENTS}",
            elements.len()
        );
        self.vertex_elements = elements;
    }

    pub fn set_vertex_buffers(&mut self, buffers: Vec<Option<VertexBufferBinding>>) {
        self.vertex_buffers = buffers;
    }

    /// Bind indices that already live in a GPU buffer with 16- or 32-bit
    /// elements. Indices in application memory, including 8-bit ones, go
    /// through [`Self::set_user_index_buffer`].
    pub fn set_index_buffer(&mut self, ib: Option<IndexBuffer>) {
        self.index_buffer = ib;
    }

    /// Copy application-memory indices into an upload buffer and bind it.
    ///
    /// On failure the previous index buffer stays bound.
    pub fn set_user_index_buffer(&mut self, indices: UserIndices<'_>) -> Result<(), DrawError> {
        let ib = upload_user_indices(&mut self.winsys, indices)?;
        tracing::debug!(
            indices = indices.len(),
            index_type = ?ib.index_type,
            buffer = ?ib.buffer.handle,
            "uploaded user index buffer"
        );
        self.index_buffer = Some(ib);
        Ok(())
    }

    /// Predicate subsequent draws on the current render condition.
    pub fn set_render_condition(&mut self, enabled: bool) {
        self.render_condition = enabled;
    }

    pub fn set_active_occlusion_queries(&mut self, count: u32) {
        self.active_occlusion_queries = count;
    }

    /// Record a write that later GPU reads will not see without a cache action.
    pub fn raise_hazards(&mut self, hazards: CacheHazards) {
        self.flush.raise(hazards);
    }

    /* ------------------------------ Drawing -------------------------------- */

    pub fn draw_vbo(&mut self, info: &DrawInfo) -> Result<DrawOutcome, DrawError> {
        if info.is_empty() {
            self.stats.inc_draws_skipped();
            return Ok(DrawOutcome::Skipped(SkipReason::EmptyDraw));
        }
        let (Some(vs), Some(ps)) = (self.vs, self.ps) else {
            self.stats.inc_draws_skipped();
            return Ok(DrawOutcome::Skipped(SkipReason::NoShaders));
        };

        let Some(hw_prim) = info.mode.hw_primitive() else {
            tracing::error!(mode = ?info.mode, "unsupported primitive type");
            self.stats.inc_draws_aborted();
            return Err(DrawError::UnsupportedPrimitive(info.mode));
        };
        if info.indexed && self.index_buffer.is_none() {
            self.stats.inc_draws_aborted();
            return Err(DrawError::MissingIndexBuffer);
        }

        match self.encode(info, hw_prim, vs, ps) {
            Ok(()) => {
                self.stats.inc_draws_issued();
                Ok(DrawOutcome::Drawn)
            }
            Err(err) => {
                self.stats.inc_draws_aborted();
                Err(err)
            }
        }
    }

    /// Hand the filled command buffer to submission now.
    pub fn flush(&mut self) {
        self.hand_off();
    }

    fn encode(
        &mut self,
        info: &DrawInfo,
        hw_prim: u32,
        vs_id: SelectorId,
        ps_id: SelectorId,
    ) -> Result<(), DrawError> {
        // Build every block first. Nothing bound so far is touched until all of
        // them exist, so a failure leaves the previous draw's state intact. The
        // vertex descriptor upload is the only step with an outside effect and
        // runs last.
        let vs = self.stage_vs(vs_id)?;
        let ps_key = self.ps_key(ps_id);
        let ps = self.stage_ps(ps_id, ps_key)?;

        let index_type = if info.indexed {
            self.index_buffer.map(|ib| ib.index_type)
        } else {
            None
        };
        let info_block = build_draw_info_block(
            &mut self.blocks,
            self.desc.chip_class,
            info,
            hw_prim,
            index_type,
            &self.rasterizer,
            &vs.shader,
        )?;

        let env = DrawEnv {
            chip_class: self.desc.chip_class,
            big_endian: self.desc.big_endian,
            predicate: self.render_condition,
            occlusion_queries_active: self.active_occlusion_queries > 0,
            fb_log_samples: self.framebuffer.log_samples,
        };
        let draw_block = build_draw_block(
            &mut self.blocks,
            &self.winsys,
            &env,
            info,
            self.index_buffer.as_ref(),
        )?;

        let vs_changed = !self.is_bound(AtomId::Vs, &vs.block);
        let ps_changed = !self.is_bound(AtomId::Ps, &ps.block);
        let spi_block = if vs_changed || ps_changed {
            Some(build_spi_map(&mut self.blocks, &vs.shader, &ps.shader, &ps_key)?)
        } else {
            None
        };

        let (vb_block, vb_hazards) = build_vertex_buffers(
            &mut self.blocks,
            &mut self.winsys,
            &self.vertex_elements,
            &self.vertex_buffers,
        )?;

        // Commit.
        let mut hazards = vb_hazards;
        if self.atoms.bind(AtomId::Vs, vs.block) {
            hazards |= CacheHazards::INV_SHADER_CACHE;
        }
        if self.atoms.bind(AtomId::Ps, ps.block) {
            hazards |= CacheHazards::INV_SHADER_CACHE;
        }
        if let Some(spi) = spi_block {
            self.atoms.bind(AtomId::Spi, spi);
            // The fragment block goes out whenever the interface is re-derived,
            // even if only the vertex shader changed; some hardware drops
            // varyings otherwise.
            self.atoms.force_dirty(AtomId::Ps);
        }
        self.atoms.bind(AtomId::VertexBuffers, vb_block);
        self.atoms.bind(AtomId::DrawInfo, info_block);
        self.atoms.bind(AtomId::Draw, draw_block);
        self.flush.raise(hazards);

        self.reserve_space();
        self.emit_dirty();
        self.mark_framebuffer_dirty();
        self.atoms.clear_changed();
        Ok(())
    }

    fn is_bound(&self, atom: AtomId, block: &Rc<StateBlock>) -> bool {
        self.atoms
            .block(atom)
            .is_some_and(|bound| Rc::ptr_eq(bound, block))
    }

    fn vs_key(&self) -> VsKey {
        VsKey {
            ucps_enabled: self.rasterizer.clip_plane_enable & 0x3F,
        }
    }

    fn ps_key(&self, ps_id: SelectorId) -> PsKey {
        let writes_all = self
            .selectors
            .get(&ps_id)
            .is_some_and(|sel| sel.desc().writes_all_color_buffers);
        let last_cbuf = if writes_all {
            self.framebuffer.nr_cbufs().saturating_sub(1) as u8
        } else {
            0
        };
        PsKey {
            color_two_side: self.rasterizer.two_side,
            alpha_func: self.alpha_test.func,
            flatshade: self.rasterizer.flatshade,
            sprite_coord_enable: self.rasterizer.sprite_coord_enable,
            export_16bpc: self.framebuffer.export_16bpc,
            last_cbuf,
        }
    }

    /// Find or compile the variant of `id` for `key`.
    fn resolve_variant(&mut self, id: SelectorId, key: VariantKey) -> Result<usize, DrawError> {
        let Some(sel) = self.selectors.get_mut(&id) else {
            panic!("bound shader selector {id:?} no longer exists");
        };
        if let Some(index) = sel.find(&key) {
            self.stats.inc_shader_variant_hits();
            return Ok(index);
        }

        let stage = sel.stage();
        let shader = self.winsys.compile(sel.desc(), &key).map_err(|source| {
            tracing::warn!(
                selector = ?id,
                ?stage,
                error = %source,
                "shader variant compilation failed"
            );
            DrawError::ShaderCompile {
                selector: id,
                stage,
                source,
            }
        })?;
        tracing::debug!(
            selector = ?id,
            ?key,
            sgprs = shader.num_sgprs,
            vgprs = shader.num_vgprs,
            "compiled shader variant"
        );
        self.stats.inc_shader_variants_compiled();
        Ok(sel.insert(key, shader))
    }

    fn stage_vs(&mut self, id: SelectorId) -> Result<StagedShader, DrawError> {
        let key = VariantKey::Vertex(self.vs_key());
        let index = self.resolve_variant(id, key)?;
        let Some(sel) = self.selectors.get_mut(&id) else {
            panic!("bound shader selector {id:?} no longer exists");
        };
        let so = sel.desc().stream_output;
        let variant = sel.variant_mut(index);
        let block = match variant.block.clone() {
            Some(block) => block,
            None => {
                let block = build_vs_block(&mut self.blocks, &self.winsys, &variant.shader, &so)?;
                variant.block = Some(Rc::clone(&block));
                block
            }
        };
        Ok(StagedShader {
            shader: Rc::clone(&variant.shader),
            block,
        })
    }

    fn stage_ps(&mut self, id: SelectorId, key: PsKey) -> Result<StagedShader, DrawError> {
        let index = self.resolve_variant(id, VariantKey::Fragment(key))?;
        let cb0_is_integer = self.framebuffer.cb0_is_integer;
        let Some(sel) = self.selectors.get_mut(&id) else {
            panic!("bound shader selector {id:?} no longer exists");
        };
        let variant = sel.variant_mut(index);
        let cached = variant
            .block
            .clone()
            .filter(|_| variant.cb0_is_integer == cb0_is_integer);
        let block = match cached {
            Some(block) => block,
            None => {
                let block = build_ps_block(
                    &mut self.blocks,
                    &self.winsys,
                    &variant.shader,
                    &key,
                    cb0_is_integer,
                )?;
                variant.block = Some(Rc::clone(&block));
                variant.cb0_is_integer = cb0_is_integer;
                block
            }
        };
        Ok(StagedShader {
            shader: Rc::clone(&variant.shader),
            block,
        })
    }

    /// Make room for everything about to be emitted, handing the current
    /// buffer off if it cannot hold it.
    fn reserve_space(&mut self) {
        let flush_dwords = if self.flush.is_pending() {
            CACHE_FLUSH_WORST_CASE_DWORDS
        } else {
            0
        };
        let needed = self.atoms.dirty_dwords() + flush_dwords;
        if self.cs.has_space(needed) {
            return;
        }
        self.hand_off();
        let needed = self.atoms.dirty_dwords() + flush_dwords;
        if !self.cs.has_space(needed) {
            tracing::warn!(
                needed,
                capacity = self.cs.capacity(),
                "draw does not fit in an empty command buffer"
            );
        }
    }

    fn hand_off(&mut self) {
        if self.cs.is_empty() {
            return;
        }
        let cb: CommandBuffer = self.cs.take();
        tracing::debug!(
            dwords = cb.dwords.len(),
            relocs = cb.relocs.len(),
            "handing off command buffer"
        );
        self.winsys.submit(cb);
        self.stats.inc_command_buffers_submitted();
        // A fresh buffer carries no state.
        self.atoms.force_all_dirty();
    }

    fn emit_dirty(&mut self) {
        if self.flush.is_pending() {
            let before = self.cs.len();
            self.flush.emit(self.cs.writer());
            self.stats.add_dwords_emitted(self.cs.len() - before);
        }
        for (id, block) in self.atoms.take_dirty() {
            tracing::trace!(atom = ?id, dwords = block.len_dwords(), "emit atom");
            self.cs.emit_block(&block);
            self.stats.add_atom_emitted(block.len_dwords());
        }
    }

    /// Report every attachment this draw wrote so it is resolved before sampling.
    fn mark_framebuffer_dirty(&mut self) {
        if let Some(zs) = self.framebuffer.zsbuf {
            self.winsys.mark_level_dirty(zs.texture, zs.level);
        }
        for cb in self.framebuffer.compressed_cbufs() {
            self.winsys.mark_level_dirty(cb.texture, cb.level);
        }
    }
}
