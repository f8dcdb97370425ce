//! Fixed-order slots that bind one state block each and remember whether that
//! block still has to reach the command stream.

use std::rc::Rc;

use crate::state_block::StateBlock;

/// Emission order. Later hardware stages assume earlier ones are configured,
/// so dirty atoms are always written in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AtomId {
    Vs,
    Ps,
    Spi,
    VertexBuffers,
    DrawInfo,
    Draw,
}

impl AtomId {
    pub const COUNT: usize = 6;

    pub const ALL: [AtomId; Self::COUNT] = [
        AtomId::Vs,
        AtomId::Ps,
        AtomId::Spi,
        AtomId::VertexBuffers,
        AtomId::DrawInfo,
        AtomId::Draw,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Default)]
struct Atom {
    block: Option<Rc<StateBlock>>,
    dirty: bool,
    changed: bool,
}

#[derive(Debug, Default)]
pub struct AtomTable {
    atoms: [Atom; AtomId::COUNT],
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `block` to `id`, releasing the previous block.
    ///
    /// Any other block marks the atom dirty, whatever its contents. Rebinding the
    /// block instance already bound is a no-op. Returns whether the binding changed.
    pub fn bind(&mut self, id: AtomId, block: Rc<StateBlock>) -> bool {
        let atom = &mut self.atoms[id.index()];
        if atom
            .block
            .as_ref()
            .is_some_and(|bound| Rc::ptr_eq(bound, &block))
        {
            return false;
        }
        atom.block = Some(block);
        atom.dirty = true;
        atom.changed = true;
        true
    }

    pub fn block(&self, id: AtomId) -> Option<&Rc<StateBlock>> {
        self.atoms[id.index()].block.as_ref()
    }

    pub fn is_dirty(&self, id: AtomId) -> bool {
        let atom = &self.atoms[id.index()];
        atom.dirty && atom.block.is_some()
    }

    /// Whether `id` was bound to a different block since the last [`Self::clear_changed`].
    pub fn changed(&self, id: AtomId) -> bool {
        self.atoms[id.index()].changed
    }

    pub fn clear_changed(&mut self) {
        for atom in &mut self.atoms {
            atom.changed = false;
        }
    }

    /// Re-emit `id` on the next flush even though its block did not change.
    pub fn force_dirty(&mut self, id: AtomId) {
        self.atoms[id.index()].dirty = true;
    }

    pub fn force_all_dirty(&mut self) {
        for atom in &mut self.atoms {
            atom.dirty = true;
        }
    }

    /// Exact serialized size of every dirty atom.
    pub fn dirty_dwords(&self) -> usize {
        AtomId::ALL
            .iter()
            .filter(|&&id| self.is_dirty(id))
            .filter_map(|&id| self.block(id))
            .map(|b| b.len_dwords())
            .sum()
    }

    /// Dirty atoms in emission order; their dirty flags are cleared.
    pub fn take_dirty(&mut self) -> Vec<(AtomId, Rc<StateBlock>)> {
        let mut out = Vec::new();
        for id in AtomId::ALL {
            let atom = &mut self.atoms[id.index()];
            if !atom.dirty {
                continue;
            }
            atom.dirty = false;
            if let Some(block) = &atom.block {
                out.push((id, Rc::clone(block)));
            }
        }
        out
    }

    /// Drop the block bound to `id`, e.g. when its shader selector is deleted.
    pub fn unbind(&mut self, id: AtomId) {
        let atom = &mut self.atoms[id.index()];
        atom.block = None;
        atom.dirty = false;
        atom.changed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_block::StateBlockCache;

    fn block(cache: &mut StateBlockCache, value: u32) -> Rc<StateBlock> {
        let mut b = cache.allocate().unwrap();
        b.set_reg(0x028408, value);
        b.finish()
    }

    #[test]
    fn identical_contents_in_a_new_block_mark_dirty() {
        let mut cache = StateBlockCache::new(8);
        let mut atoms = AtomTable::new();
        atoms.bind(AtomId::DrawInfo, block(&mut cache, 1));
        assert_eq!(atoms.take_dirty().len(), 1);
        assert!(!atoms.is_dirty(AtomId::DrawInfo));

        assert!(atoms.bind(AtomId::DrawInfo, block(&mut cache, 1)));
        assert!(atoms.is_dirty(AtomId::DrawInfo));
    }

    #[test]
    fn rebinding_the_same_instance_stays_clean() {
        let mut cache = StateBlockCache::new(8);
        let mut atoms = AtomTable::new();
        let b = block(&mut cache, 1);
        atoms.bind(AtomId::Vs, Rc::clone(&b));
        atoms.take_dirty();
        atoms.clear_changed();

        assert!(!atoms.bind(AtomId::Vs, b));
        assert!(!atoms.is_dirty(AtomId::Vs));
        assert!(!atoms.changed(AtomId::Vs));
    }

    #[test]
    fn replaced_block_is_released() {
        let mut cache = StateBlockCache::new(8);
        let mut atoms = AtomTable::new();
        atoms.bind(AtomId::Vs, block(&mut cache, 1));
        atoms.bind(AtomId::Vs, block(&mut cache, 2));
        assert_eq!(cache.live_blocks(), 1);
    }

    #[test]
    fn dirty_atoms_come_out_in_fixed_order() {
        let mut cache = StateBlockCache::new(8);
        let mut atoms = AtomTable::new();
        atoms.bind(AtomId::DrawInfo, block(&mut cache, 1));
        atoms.bind(AtomId::Vs, block(&mut cache, 2));
        atoms.bind(AtomId::Spi, block(&mut cache, 3));
        let order: Vec<_> = atoms.take_dirty().into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![AtomId::Vs, AtomId::Spi, AtomId::DrawInfo]);
    }

    #[test]
    fn forced_atoms_are_reemitted_and_unbound_ones_skipped() {
        let mut cache = StateBlockCache::new(8);
        let mut atoms = AtomTable::new();
        atoms.bind(AtomId::Ps, block(&mut cache, 1));
        atoms.take_dirty();
        atoms.force_all_dirty();
        assert_eq!(atoms.dirty_dwords(), 3);
        let emitted = atoms.take_dirty();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].0, AtomId::Ps);
    }
}
