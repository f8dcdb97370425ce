//! Immutable, pre-serialized register blocks and the budgeted cache that hands
//! them out.
//!
//! A block is built once through a [`StateBlockBuilder`] and then shared as an
//! `Rc<StateBlock>`. Blocks are compared by [`StateBlock::id`], never by
//! content: two blocks with identical registers are still different blocks.

use std::cell::Cell;
use std::rc::Rc;

use sidraw_pm4::Pm4Writer;

use crate::error::DrawError;
use crate::winsys::{BufferHandle, BufferReloc, BufferUsage, ResourceAddressing, UploadAllocator};

/// Serial number of a state block, unique for the lifetime of its cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateBlockId(u64);

/// Counts one live block against the cache budget until dropped.
#[derive(Debug)]
struct Lease {
    live: Rc<Cell<usize>>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

#[derive(Debug)]
pub struct StateBlock {
    id: StateBlockId,
    dwords: Vec<u32>,
    regs: Vec<(u32, u32)>,
    buffers: Vec<BufferReloc>,
    sh_data: Vec<u32>,
    _lease: Lease,
}

impl StateBlock {
    pub fn id(&self) -> StateBlockId {
        self.id
    }

    /// Serialized PM4 dwords, ready to be copied into a command buffer.
    pub fn dwords(&self) -> &[u32] {
        &self.dwords
    }

    pub fn len_dwords(&self) -> usize {
        self.dwords.len()
    }

    /// Register writes in the order they were recorded.
    pub fn registers(&self) -> &[(u32, u32)] {
        &self.regs
    }

    /// Last value written to `reg` by this block.
    pub fn register(&self, reg: u32) -> Option<u32> {
        self.regs
            .iter()
            .rev()
            .find(|&&(r, _)| r == reg)
            .map(|&(_, v)| v)
    }

    pub fn buffers(&self) -> &[BufferReloc] {
        &self.buffers
    }

    /// Descriptor words uploaded out-of-line and referenced by a user-data pointer.
    pub fn sh_data(&self) -> &[u32] {
        &self.sh_data
    }
}

/// Hands out state blocks against a fixed budget of live blocks.
#[derive(Debug)]
pub struct StateBlockCache {
    budget: usize,
    live: Rc<Cell<usize>>,
    next_id: u64,
}

impl StateBlockCache {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            live: Rc::new(Cell::new(0)),
            next_id: 0,
        }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Blocks currently alive, including builders that have not finished yet.
    pub fn live_blocks(&self) -> usize {
        self.live.get()
    }

    /// Start a new, empty block.
    pub fn allocate(&mut self) -> Result<StateBlockBuilder, DrawError> {
        let live = self.live.get();
        if live >= self.budget {
            tracing::warn!(live, budget = self.budget, "state block budget exhausted");
            return Err(DrawError::OutOfStateBlocks {
                live,
                budget: self.budget,
            });
        }
        self.live.set(live + 1);
        let id = StateBlockId(self.next_id);
        self.next_id += 1;
        Ok(StateBlockBuilder {
            id,
            writer: Pm4Writer::new(),
            regs: Vec::new(),
            buffers: Vec::new(),
            sh_data: Vec::new(),
            lease: Lease {
                live: Rc::clone(&self.live),
            },
        })
    }
}

#[derive(Debug)]
pub struct StateBlockBuilder {
    id: StateBlockId,
    writer: Pm4Writer,
    regs: Vec<(u32, u32)>,
    buffers: Vec<BufferReloc>,
    sh_data: Vec<u32>,
    lease: Lease,
}

impl StateBlockBuilder {
    pub fn set_reg(&mut self, reg: u32, value: u32) {
        self.writer.set_reg(reg, value);
        self.regs.push((reg, value));
    }

    /// Raw packet access for commands that are not register writes.
    pub fn packets(&mut self) -> &mut Pm4Writer {
        &mut self.writer
    }

    /// Reference `handle` from this block. Repeated references merge their usage.
    pub fn add_buffer(&mut self, handle: BufferHandle, usage: BufferUsage) {
        match self.buffers.iter_mut().find(|r| r.handle == handle) {
            Some(existing) => existing.usage = existing.usage.merge(usage),
            None => self.buffers.push(BufferReloc { handle, usage }),
        }
    }

    pub fn sh_data_add(&mut self, word: u32) {
        self.sh_data.push(word);
    }

    /// Upload the accumulated descriptor words and point the two user-data
    /// registers starting at `user_data_reg` at them. No-op when nothing was added.
    pub fn sh_data_end<W>(&mut self, winsys: &mut W, user_data_reg: u32) -> Result<(), DrawError>
    where
        W: UploadAllocator + ResourceAddressing + ?Sized,
    {
        if self.sh_data.is_empty() {
            return Ok(());
        }
        let Some(buffer) = winsys.upload(&self.sh_data) else {
            tracing::warn!(dwords = self.sh_data.len(), "descriptor upload failed");
            return Err(DrawError::UploadExhausted);
        };
        let va = winsys.resource_va(buffer.handle, 0);
        self.add_buffer(buffer.handle, BufferUsage::Read);
        self.set_reg(user_data_reg, va as u32);
        self.set_reg(user_data_reg + 4, (va >> 32) as u32);
        Ok(())
    }

    pub fn finish(self) -> Rc<StateBlock> {
        Rc::new(StateBlock {
            id: self.id,
            dwords: self.writer.finish(),
            regs: self.regs,
            buffers: self.buffers,
            sh_data: self.sh_data,
            _lease: self.lease,
        })
    }
}
