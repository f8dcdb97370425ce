//! The command buffer being filled for the next hand-off.

use sidraw_pm4::Pm4Writer;

use crate::state_block::StateBlock;
use crate::winsys::{BufferReloc, CommandBuffer};

#[derive(Debug)]
pub struct CommandStream {
    writer: Pm4Writer,
    capacity: usize,
    relocs: Vec<BufferReloc>,
}

impl CommandStream {
    pub fn new(capacity_dwords: usize) -> Self {
        Self {
            writer: Pm4Writer::with_capacity(capacity_dwords),
            capacity: capacity_dwords,
            relocs: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.writer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether `dwords` more fit without handing the buffer off.
    pub fn has_space(&self, dwords: usize) -> bool {
        self.len() + dwords <= self.capacity
    }

    pub fn as_dwords(&self) -> &[u32] {
        self.writer.as_dwords()
    }

    pub fn relocs(&self) -> &[BufferReloc] {
        &self.relocs
    }

    pub fn writer(&mut self) -> &mut Pm4Writer {
        &mut self.writer
    }

    /// Copy a serialized block in and record its buffer dependencies.
    pub fn emit_block(&mut self, block: &StateBlock) {
        self.writer.append_raw(block.dwords());
        for reloc in block.buffers() {
            self.add_reloc(*reloc);
        }
    }

    pub fn add_reloc(&mut self, reloc: BufferReloc) {
        match self.relocs.iter_mut().find(|r| r.handle == reloc.handle) {
            Some(existing) => existing.usage = existing.usage.merge(reloc.usage),
            None => self.relocs.push(reloc),
        }
    }

    /// Detach the filled buffer and start an empty one.
    pub fn take(&mut self) -> CommandBuffer {
        let writer = std::mem::replace(&mut self.writer, Pm4Writer::with_capacity(self.capacity));
        CommandBuffer {
            dwords: writer.finish(),
            relocs: std::mem::take(&mut self.relocs),
        }
    }
}
