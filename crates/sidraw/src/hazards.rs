//! Pending cache coherency work and its translation into synchronization packets.

use bitflags::bitflags;
use sidraw_pm4::cmd_writer::{ACQUIRE_MEM_DWORDS, EVENT_WRITE_DWORDS};
use sidraw_pm4::sid::{cp_coher_cntl, vgt_event_type};
use sidraw_pm4::Pm4Writer;

use crate::state::ChipClass;

bitflags! {
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct CacheHazards: u32 {
        const INV_SHADER_CACHE = 1 << 0;
        const INV_CONST_CACHE = 1 << 1;
        const INV_TEX_CACHE = 1 << 2;
        const STREAMOUT_FLUSH = 1 << 3;
        const FLUSH_AND_INV_CB = 1 << 4;
        const FLUSH_AND_INV_DB = 1 << 5;
        const FLUSH_AND_INV_CB_META = 1 << 6;
        const FLUSH_AND_INV_DB_META = 1 << 7;
        const WAIT_3D_IDLE = 1 << 8;
    }
}

/// Largest sequence [`CacheFlushCoordinator::emit`] can produce.
pub const CACHE_FLUSH_WORST_CASE_DWORDS: usize = ACQUIRE_MEM_DWORDS + 3 * EVENT_WRITE_DWORDS;

/// `CP_COHER_CNTL` actions for a hazard set.
///
/// The instruction and constant caches cannot be invalidated separately on SI,
/// so either hazard invalidates both.
pub fn coher_cntl_for(hazards: CacheHazards) -> u32 {
    let mut cntl = 0;
    if hazards.intersects(CacheHazards::INV_SHADER_CACHE | CacheHazards::INV_CONST_CACHE) {
        cntl |= cp_coher_cntl::SH_ICACHE_ACTION_ENA | cp_coher_cntl::SH_KCACHE_ACTION_ENA;
    }
    if hazards.intersects(CacheHazards::INV_TEX_CACHE | CacheHazards::STREAMOUT_FLUSH) {
        cntl |= cp_coher_cntl::TC_ACTION_ENA | cp_coher_cntl::TCL1_ACTION_ENA;
    }
    if hazards.contains(CacheHazards::FLUSH_AND_INV_CB) {
        cntl |= cp_coher_cntl::CB_ACTION_ENA;
        for rt in 0..8 {
            cntl |= cp_coher_cntl::cb_dest_base_ena(rt);
        }
    }
    if hazards.contains(CacheHazards::FLUSH_AND_INV_DB) {
        cntl |= cp_coher_cntl::DB_ACTION_ENA | cp_coher_cntl::DB_DEST_BASE_ENA;
    }
    cntl
}

#[derive(Debug)]
pub struct CacheFlushCoordinator {
    chip_class: ChipClass,
    pending: CacheHazards,
}

impl CacheFlushCoordinator {
    pub fn new(chip_class: ChipClass) -> Self {
        Self {
            chip_class,
            pending: CacheHazards::empty(),
        }
    }

    pub fn raise(&mut self, hazards: CacheHazards) {
        self.pending |= hazards;
    }

    pub fn pending(&self) -> CacheHazards {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Append the synchronization packets for every pending hazard, then clear them.
    pub fn emit(&mut self, w: &mut Pm4Writer) {
        let hazards = std::mem::take(&mut self.pending);
        if hazards.is_empty() {
            return;
        }

        let cntl = coher_cntl_for(hazards);
        if cntl != 0 {
            match self.chip_class {
                ChipClass::Si => w.surface_sync(cntl),
                ChipClass::Cik => w.acquire_mem(cntl),
            }
        }

        if hazards.contains(CacheHazards::FLUSH_AND_INV_CB_META) {
            w.event_write(vgt_event_type::FLUSH_AND_INV_CB_META, 0);
        }
        if hazards.contains(CacheHazards::FLUSH_AND_INV_DB_META) {
            w.event_write(vgt_event_type::FLUSH_AND_INV_DB_META, 0);
        }

        if hazards.contains(CacheHazards::WAIT_3D_IDLE) {
            w.event_write(vgt_event_type::PS_PARTIAL_FLUSH, 4);
        } else if hazards.contains(CacheHazards::STREAMOUT_FLUSH) {
            // Stream-out buffers may be read back as a source.
            w.event_write(vgt_event_type::VS_PARTIAL_FLUSH, 4);
        }

        tracing::trace!(?hazards, cntl, "cache flush emitted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidraw_pm4::{parse_pm4_stream, Pm4Opcode};

    fn opcodes(dwords: &[u32]) -> Vec<Pm4Opcode> {
        parse_pm4_stream(dwords)
            .unwrap()
            .iter()
            .map(|p| p.opcode().unwrap())
            .collect()
    }

    #[test]
    fn shader_and_constant_invalidation_share_one_action() {
        let mut flush = CacheFlushCoordinator::new(ChipClass::Si);
        flush.raise(CacheHazards::INV_SHADER_CACHE);
        flush.raise(CacheHazards::INV_CONST_CACHE);
        let mut w = Pm4Writer::new();
        flush.emit(&mut w);
        let dw = w.finish();
        assert_eq!(opcodes(&dw), vec![Pm4Opcode::SurfaceSync]);
        assert_eq!(
            dw[1],
            cp_coher_cntl::SH_ICACHE_ACTION_ENA | cp_coher_cntl::SH_KCACHE_ACTION_ENA
        );
        assert!(!flush.is_pending());
    }

    #[test]
    fn either_shader_hazard_alone_invalidates_both_caches() {
        assert_eq!(
            coher_cntl_for(CacheHazards::INV_CONST_CACHE),
            coher_cntl_for(CacheHazards::INV_SHADER_CACHE)
        );
    }

    #[test]
    fn cik_uses_acquire_mem() {
        let mut flush = CacheFlushCoordinator::new(ChipClass::Cik);
        flush.raise(CacheHazards::INV_TEX_CACHE);
        let mut w = Pm4Writer::new();
        flush.emit(&mut w);
        let dw = w.finish();
        assert_eq!(opcodes(&dw), vec![Pm4Opcode::AcquireMem]);
        assert_eq!(
            dw[1],
            cp_coher_cntl::TC_ACTION_ENA | cp_coher_cntl::TCL1_ACTION_ENA
        );
    }

    #[test]
    fn events_follow_the_action_and_worst_case_holds() {
        let mut flush = CacheFlushCoordinator::new(ChipClass::Cik);
        flush.raise(CacheHazards::all());
        let mut w = Pm4Writer::new();
        flush.emit(&mut w);
        let dw = w.finish();
        assert_eq!(dw.len(), CACHE_FLUSH_WORST_CASE_DWORDS);
        assert_eq!(CACHE_FLUSH_WORST_CASE_DWORDS, 13);
        assert_eq!(
            opcodes(&dw),
            vec![
                Pm4Opcode::AcquireMem,
                Pm4Opcode::EventWrite,
                Pm4Opcode::EventWrite,
                Pm4Opcode::EventWrite
            ]
        );
        // WAIT_3D_IDLE wins over the stream-out VS flush.
        assert_eq!(
            dw[12],
            vgt_event_type::event_type(vgt_event_type::PS_PARTIAL_FLUSH)
                | vgt_event_type::event_index(4)
        );
    }

    #[test]
    fn streamout_flush_adds_vs_partial_flush() {
        let mut flush = CacheFlushCoordinator::new(ChipClass::Si);
        flush.raise(CacheHazards::STREAMOUT_FLUSH);
        let mut w = Pm4Writer::new();
        flush.emit(&mut w);
        let dw = w.finish();
        assert_eq!(opcodes(&dw), vec![Pm4Opcode::SurfaceSync, Pm4Opcode::EventWrite]);
        assert_eq!(
            dw[6],
            vgt_event_type::event_type(vgt_event_type::VS_PARTIAL_FLUSH)
                | vgt_event_type::event_index(4)
        );
    }

    #[test]
    fn nothing_pending_emits_nothing() {
        let mut flush = CacheFlushCoordinator::new(ChipClass::Si);
        let mut w = Pm4Writer::new();
        flush.emit(&mut w);
        assert!(w.is_empty());
    }
}
