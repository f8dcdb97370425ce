use pretty_assertions::assert_eq;
use sidraw_pm4::cmd_writer::{
    ACQUIRE_MEM_DWORDS, DRAW_INDEX_2_DWORDS, DRAW_INDEX_AUTO_DWORDS, EVENT_WRITE_DWORDS,
    INDEX_TYPE_DWORDS, NUM_INSTANCES_DWORDS, SURFACE_SYNC_DWORDS,
};
use sidraw_pm4::pm4_cmd::{pkt3, IndexSwap, IndexType, Pm4Opcode};
use sidraw_pm4::{find_register_write, parse_pm4_stream, sid, Pm4ParseError, Pm4Writer};

#[test]
fn writer_packets_walk_back_to_their_declared_sizes() {
    let mut w = Pm4Writer::new();
    w.surface_sync(sid::cp_coher_cntl::TC_ACTION_ENA);
    w.acquire_mem(sid::cp_coher_cntl::TC_ACTION_ENA);
    w.event_write(sid::vgt_event_type::PS_PARTIAL_FLUSH, 4);
    w.index_type(IndexType::Uint32, IndexSwap::None, false);
    w.num_instances(7, false);
    w.draw_index_2(240, 0x0000_0012_3456_7800, 36, false);
    w.draw_index_auto(3, false, false);
    let dw = w.finish();

    let packets = parse_pm4_stream(&dw).expect("stream must parse");
    let sizes: Vec<(Option<Pm4Opcode>, usize)> = packets
        .iter()
        .map(|p| (p.opcode(), p.body.len() + 1))
        .collect();
    assert_eq!(
        sizes,
        vec![
            (Some(Pm4Opcode::SurfaceSync), SURFACE_SYNC_DWORDS),
            (Some(Pm4Opcode::AcquireMem), ACQUIRE_MEM_DWORDS),
            (Some(Pm4Opcode::EventWrite), EVENT_WRITE_DWORDS),
            (Some(Pm4Opcode::IndexType), INDEX_TYPE_DWORDS),
            (Some(Pm4Opcode::NumInstances), NUM_INSTANCES_DWORDS),
            (Some(Pm4Opcode::DrawIndex2), DRAW_INDEX_2_DWORDS),
            (Some(Pm4Opcode::DrawIndexAuto), DRAW_INDEX_AUTO_DWORDS),
        ]
    );
}

#[test]
fn indexed_draw_body_layout() {
    let mut w = Pm4Writer::new();
    w.draw_index_2(240, 0x0000_0012_3456_7840, 36, true);
    let dw = w.finish();
    let pkt = &parse_pm4_stream(&dw).unwrap()[0];
    assert!(pkt.header.predicate);
    // max size, address lo, address hi, count, initiator (DMA source select)
    assert_eq!(pkt.body, &[240, 0x3456_7840, 0x12, 36, 0]);
}

#[test]
fn auto_index_draw_sets_source_select_and_opaque() {
    let mut w = Pm4Writer::new();
    w.draw_index_auto(3, false, false);
    w.draw_index_auto(0, true, false);
    let dw = w.finish();
    let packets = parse_pm4_stream(&dw).unwrap();
    assert_eq!(packets[0].body, &[3, sid::vgt_draw_initiator::DI_SRC_SEL_AUTO_INDEX]);
    assert_eq!(
        packets[1].body,
        &[0, sid::vgt_draw_initiator::DI_SRC_SEL_AUTO_INDEX | (1 << 6)]
    );
}

#[test]
fn register_writes_decode_to_byte_addresses() {
    let mut w = Pm4Writer::new();
    w.set_reg(sid::vgt_indx_offset::ADDR, 5);
    w.set_reg(sid::vgt_multi_prim_ib_reset_indx::ADDR, 0xFFFF);
    w.set_reg(sid::vgt_primitive_type::ADDR_SI, sid::vgt_primitive_type::DI_PT_TRILIST);
    let dw = w.finish();

    let packets = parse_pm4_stream(&dw).unwrap();
    assert_eq!(packets.len(), 2);
    let writes: Vec<(u32, u32)> = packets[0].register_writes().unwrap().collect();
    assert_eq!(writes, vec![(0x028408, 5), (0x02840C, 0xFFFF)]);
    assert_eq!(
        find_register_write(&dw, sid::vgt_primitive_type::ADDR_SI),
        Some(sid::vgt_primitive_type::DI_PT_TRILIST)
    );
    assert_eq!(find_register_write(&dw, sid::pa_cl_clip_cntl::ADDR), None);
}

#[test]
fn truncated_packet_is_reported() {
    let dw = [pkt3(Pm4Opcode::DrawIndexAuto, 2, false), 3];
    assert_eq!(
        parse_pm4_stream(&dw),
        Err(Pm4ParseError::Truncated {
            offset: 0,
            needed: 2,
            available: 1
        })
    );
}
