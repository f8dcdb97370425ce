use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the draw path counters, suitable for profiling/telemetry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawStatsSnapshot {
    pub draws_issued: u64,
    pub draws_skipped: u64,
    pub draws_aborted: u64,
    pub shader_variants_compiled: u64,
    pub shader_variant_hits: u64,
    pub atoms_emitted: u64,
    pub dwords_emitted: u64,
    pub command_buffers_submitted: u64,
}

/// Counters updated on the encoding path.
///
/// Kept atomic so a telemetry reader can hold a shared reference while the
/// owning context keeps drawing.
#[derive(Debug, Default)]
pub struct DrawStats {
    draws_issued: AtomicU64,
    draws_skipped: AtomicU64,
    draws_aborted: AtomicU64,
    shader_variants_compiled: AtomicU64,
    shader_variant_hits: AtomicU64,
    atoms_emitted: AtomicU64,
    dwords_emitted: AtomicU64,
    command_buffers_submitted: AtomicU64,
}

impl DrawStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_draws_issued(&self) {
        self.draws_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_draws_skipped(&self) {
        self.draws_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_draws_aborted(&self) {
        self.draws_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_shader_variants_compiled(&self) {
        self.shader_variants_compiled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_shader_variant_hits(&self) {
        self.shader_variant_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_atom_emitted(&self, dwords: usize) {
        self.atoms_emitted.fetch_add(1, Ordering::Relaxed);
        self.dwords_emitted
            .fetch_add(dwords as u64, Ordering::Relaxed);
    }

    pub fn add_dwords_emitted(&self, dwords: usize) {
        self.dwords_emitted
            .fetch_add(dwords as u64, Ordering::Relaxed);
    }

    pub fn inc_command_buffers_submitted(&self) {
        self.command_buffers_submitted
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DrawStatsSnapshot {
        DrawStatsSnapshot {
            draws_issued: self.draws_issued.load(Ordering::Relaxed),
            draws_skipped: self.draws_skipped.load(Ordering::Relaxed),
            draws_aborted: self.draws_aborted.load(Ordering::Relaxed),
            shader_variants_compiled: self.shader_variants_compiled.load(Ordering::Relaxed),
            shader_variant_hits: self.shader_variant_hits.load(Ordering::Relaxed),
            atoms_emitted: self.atoms_emitted.load(Ordering::Relaxed),
            dwords_emitted: self.dwords_emitted.load(Ordering::Relaxed),
            command_buffers_submitted: self.command_buffers_submitted.load(Ordering::Relaxed),
        }
    }
}
