//! Safe PM4 packet builder.
//!
//! Tracks the open packet so headers always carry the right body count, and
//! coalesces register writes to consecutive registers of the same space into a
//! single SET_*_REG packet.

use crate::pm4_cmd::{
    encode_draw_initiator, encode_index_type, pkt3, DrawSource, IndexSwap, IndexType, Pm4Opcode,
    RegisterSpace,
};
use crate::sid;

/// Dword sizes of the fixed-size packets, header included.
pub const SURFACE_SYNC_DWORDS: usize = 5;
pub const ACQUIRE_MEM_DWORDS: usize = 7;
pub const EVENT_WRITE_DWORDS: usize = 2;
pub const INDEX_TYPE_DWORDS: usize = 2;
pub const NUM_INSTANCES_DWORDS: usize = 2;
pub const DRAW_INDEX_2_DWORDS: usize = 6;
pub const DRAW_INDEX_AUTO_DWORDS: usize = 3;
pub const COPY_DATA_DWORDS: usize = 6;

#[derive(Clone, Copy, Debug)]
struct OpenPacket {
    header_at: usize,
    opcode: Pm4Opcode,
}

#[derive(Clone, Copy, Debug)]
struct LastReg {
    space: RegisterSpace,
    dword_offset: u32,
    header_at: usize,
}

#[derive(Debug, Default, Clone)]
pub struct Pm4Writer {
    buf: Vec<u32>,
    open: Option<OpenPacket>,
    last_reg: Option<LastReg>,
}

impl Pm4Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(dwords: usize) -> Self {
        Self {
            buf: Vec::with_capacity(dwords),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_dwords(&self) -> &[u32] {
        &self.buf
    }

    pub fn finish(self) -> Vec<u32> {
        assert!(self.open.is_none(), "PM4 packet left open");
        self.buf
    }

    /// Begin a packet; the header is patched by [`Self::end`].
    pub fn begin(&mut self, opcode: Pm4Opcode) {
        assert!(self.open.is_none(), "PM4 packet {opcode:?} begun inside an open packet");
        self.open = Some(OpenPacket {
            header_at: self.buf.len(),
            opcode,
        });
        self.buf.push(0);
        self.last_reg = None;
    }

    pub fn add(&mut self, dword: u32) {
        debug_assert!(self.open.is_some(), "PM4 body dword written outside a packet");
        self.buf.push(dword);
    }

    pub fn end(&mut self, predicate: bool) {
        let Some(open) = self.open.take() else {
            panic!("PM4 end without begin");
        };
        let body = self.buf.len() - open.header_at - 1;
        assert!(body >= 1, "PM4 packet {:?} has an empty body", open.opcode);
        self.buf[open.header_at] = pkt3(open.opcode, body, predicate);
    }

    /// Append pre-encoded dwords (e.g. an already serialized state block).
    pub fn append_raw(&mut self, dwords: &[u32]) {
        assert!(self.open.is_none(), "raw dwords appended inside an open packet");
        self.buf.extend_from_slice(dwords);
        self.last_reg = None;
    }

    /// Write one register, extending the previous SET_*_REG packet when `reg`
    /// directly follows the last register written in the same space.
    ///
    /// Panics when `reg` lies outside every register space.
    pub fn set_reg(&mut self, reg: u32, value: u32) {
        let space = RegisterSpace::classify(reg)
            .unwrap_or_else(|| panic!("invalid register offset 0x{reg:08X}"));
        let dword_offset = space.dword_offset(reg);

        match self.last_reg {
            Some(last) if last.space == space && last.dword_offset + 1 == dword_offset => {
                self.buf.push(value);
                let body = self.buf.len() - last.header_at - 1;
                self.buf[last.header_at] = pkt3(space.opcode(), body, false);
                self.last_reg = Some(LastReg {
                    dword_offset,
                    ..last
                });
            }
            _ => {
                let header_at = self.buf.len();
                self.begin(space.opcode());
                self.add(dword_offset);
                self.add(value);
                self.end(false);
                self.last_reg = Some(LastReg {
                    space,
                    dword_offset,
                    header_at,
                });
            }
        }
    }

    pub fn surface_sync(&mut self, cp_coher_cntl: u32) {
        self.begin(Pm4Opcode::SurfaceSync);
        self.add(cp_coher_cntl); // CP_COHER_CNTL
        self.add(0xFFFF_FFFF); // CP_COHER_SIZE
        self.add(0); // CP_COHER_BASE
        self.add(0x0000_000A); // POLL_INTERVAL
        self.end(false);
    }

    pub fn acquire_mem(&mut self, cp_coher_cntl: u32) {
        self.begin(Pm4Opcode::AcquireMem);
        self.add(cp_coher_cntl); // CP_COHER_CNTL
        self.add(0xFFFF_FFFF); // CP_COHER_SIZE
        self.add(0xFF); // CP_COHER_SIZE_HI
        self.add(0); // CP_COHER_BASE
        self.add(0); // CP_COHER_BASE_HI
        self.add(0x0000_000A); // POLL_INTERVAL
        self.end(false);
    }

    pub fn event_write(&mut self, event_type: u32, event_index: u32) {
        self.begin(Pm4Opcode::EventWrite);
        self.add(
            sid::vgt_event_type::event_type(event_type)
                | sid::vgt_event_type::event_index(event_index),
        );
        self.end(false);
    }

    pub fn index_type(&mut self, index_type: IndexType, swap: IndexSwap, predicate: bool) {
        self.begin(Pm4Opcode::IndexType);
        self.add(encode_index_type(index_type, swap));
        self.end(predicate);
    }

    pub fn num_instances(&mut self, instance_count: u32, predicate: bool) {
        self.begin(Pm4Opcode::NumInstances);
        self.add(instance_count);
        self.end(predicate);
    }

    /// Bounds-checked indexed draw reading indices from `index_va` by DMA.
    pub fn draw_index_2(
        &mut self,
        max_size: u32,
        index_va: u64,
        index_count: u32,
        predicate: bool,
    ) {
        self.begin(Pm4Opcode::DrawIndex2);
        self.add(max_size);
        self.add(index_va as u32);
        self.add(((index_va >> 32) & 0xFF) as u32);
        self.add(index_count);
        self.add(encode_draw_initiator(DrawSource::Dma, false));
        self.end(predicate);
    }

    /// Auto-indexed draw; `use_opaque` sources the count from the stream-out filled size.
    pub fn draw_index_auto(&mut self, count: u32, use_opaque: bool, predicate: bool) {
        self.begin(Pm4Opcode::DrawIndexAuto);
        self.add(count);
        self.add(encode_draw_initiator(DrawSource::AutoIndex, use_opaque));
        self.end(predicate);
    }

    /// Copy one dword from memory at `src_va` into register `dst_reg`.
    pub fn copy_data_mem_to_reg(&mut self, src_va: u64, dst_reg: u32) {
        self.begin(Pm4Opcode::CopyData);
        self.add(
            sid::copy_data::src_sel(sid::copy_data::SRC_MEM)
                | sid::copy_data::dst_sel(sid::copy_data::DST_REG)
                | sid::copy_data::WR_CONFIRM,
        );
        self.add(src_va as u32); // src address lo
        self.add((src_va >> 32) as u32); // src address hi
        self.add(dst_reg >> 2);
        self.add(0); // unused
        self.end(true);
    }
}
