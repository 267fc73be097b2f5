use std::cell::Cell;

use super::{Unit, UnitId};

struct Slot {
    id: UnitId,
    /// Empty while the unit's own `response` runs.
    unit: Option<Box<dyn Unit>>,
    tombstoned: Cell<bool>,
}

/// Live units in registration order, which is id order: an id is reserved
/// when its registration starts, and a registration that finishes late still
/// takes the place its id gives it.
///
/// Insertion happens at frame start or between frames, removal only in
/// `sweep` at frame end.
/// Tombstoning and id reservation take `&self` so they stay available while
/// a unit's response holds a shared borrow of the registry.
pub struct UnitRegistry {
    next_id: Cell<u32>,
    slots: Vec<Slot>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            slots: Vec::new(),
        }
    }

    /// Hands out the next id. Ids whose registration fails are burned.
    pub fn reserve_id(&self) -> UnitId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        UnitId::new(id)
    }

    pub(crate) fn insert(&mut self, id: UnitId, unit: Box<dyn Unit>) {
        debug_assert!(!self.contains(id), "unit {id} registered twice");
        log::debug!("unit {id} registered ({})", unit.label());
        let at = self.slots.partition_point(|s| s.id < id);
        self.slots.insert(
            at,
            Slot {
                id,
                unit: Some(unit),
                tombstoned: Cell::new(false),
            },
        );
    }

    fn slot(&self, id: UnitId) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == id)
    }

    /// True until the unit is swept, tombstoned or not.
    pub fn contains(&self, id: UnitId) -> bool {
        self.slot(id).is_some()
    }

    pub fn is_tombstoned(&self, id: UnitId) -> bool {
        self.slot(id).is_some_and(|s| s.tombstoned.get())
    }

    /// Marks a unit for removal at the end of the frame.
    ///
    /// Returns false for unknown ids. Repeated calls are no-ops.
    pub fn tombstone(&self, id: UnitId) -> bool {
        match self.slot(id) {
            Some(slot) => {
                slot.tombstoned.set(true);
                true
            }
            None => false,
        }
    }

    /// `None` for unknown ids and for the unit whose response is running.
    pub fn get(&self, id: UnitId) -> Option<&(dyn Unit + 'static)> {
        self.slot(id)?.unit.as_deref()
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut (dyn Unit + 'static)> {
        self.slots
            .iter_mut()
            .find(|s| s.id == id)?
            .unit
            .as_deref_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.slots.iter().map(|s| s.id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn id_at(&self, index: usize) -> Option<UnitId> {
        self.slots.get(index).map(|s| s.id)
    }

    pub(crate) fn take(&mut self, index: usize) -> Option<Box<dyn Unit>> {
        self.slots.get_mut(index)?.unit.take()
    }

    pub(crate) fn put_back(&mut self, index: usize, unit: Box<dyn Unit>) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.unit = Some(unit);
        }
    }

    /// Removes tombstoned units, preserving the order of the rest.
    pub(crate) fn sweep(&mut self) -> Vec<(UnitId, Box<dyn Unit>)> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.slots.len());

        for slot in self.slots.drain(..) {
            if slot.tombstoned.get() {
                if let Some(unit) = slot.unit {
                    removed.push((slot.id, unit));
                }
            } else {
                kept.push(slot);
            }
        }

        self.slots = kept;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FrameCtx;
    use crate::error::Result;

    struct Nop;

    impl Unit for Nop {
        fn response(&mut self, _ctx: &mut FrameCtx<'_>) -> Result<()> {
            Ok(())
        }
    }

    fn registry_with(n: usize) -> (UnitRegistry, Vec<UnitId>) {
        let mut registry = UnitRegistry::new();
        let ids: Vec<_> = (0..n)
            .map(|_| {
                let id = registry.reserve_id();
                registry.insert(id, Box::new(Nop));
                id
            })
            .collect();
        (registry, ids)
    }

    #[test]
    fn ids_start_at_one_and_never_repeat() {
        let (mut registry, ids) = registry_with(3);
        assert_eq!(ids, [UnitId::new(1), UnitId::new(2), UnitId::new(3)]);

        registry.tombstone(ids[2]);
        registry.sweep();
        // A burned or swept id is not handed out again.
        let _burned = registry.reserve_id();
        assert_eq!(registry.reserve_id(), UnitId::new(5));
    }

    #[test]
    fn tombstoned_units_stay_until_sweep() {
        let (mut registry, ids) = registry_with(3);
        assert!(registry.tombstone(ids[1]));
        assert!(registry.contains(ids[1]));
        assert!(registry.is_tombstoned(ids[1]));

        let removed = registry.sweep();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, ids[1]);
        assert!(!registry.contains(ids[1]));
        assert_eq!(registry.ids().collect::<Vec<_>>(), [ids[0], ids[2]]);
    }

    #[test]
    fn tombstone_is_idempotent_and_rejects_unknown_ids() {
        let (mut registry, ids) = registry_with(1);
        assert!(registry.tombstone(ids[0]));
        assert!(registry.tombstone(ids[0]));
        assert!(!registry.tombstone(UnitId::new(99)));
        assert_eq!(registry.sweep().len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn taken_slot_hides_the_running_unit() {
        let (mut registry, ids) = registry_with(2);
        let unit = registry.take(0).expect("slot 0");
        assert!(registry.get(ids[0]).is_none());
        assert!(registry.get(ids[1]).is_some());
        assert!(registry.contains(ids[0]));

        registry.put_back(0, unit);
        assert!(registry.get(ids[0]).is_some());
    }

    #[test]
    fn late_insertion_takes_its_id_position() {
        let mut registry = UnitRegistry::new();
        let slow = registry.reserve_id();
        let fast = registry.reserve_id();
        registry.insert(fast, Box::new(Nop));
        registry.insert(slow, Box::new(Nop));

        assert_eq!(registry.ids().collect::<Vec<_>>(), [slow, fast]);
        assert_eq!(registry.id_at(0), Some(slow));
    }

    #[test]
    fn interleaved_registration_keeps_ids_unique() {
        let mut registry = UnitRegistry::new();
        let mut seen = std::collections::HashSet::new();
        for round in 0..10 {
            let id = registry.reserve_id();
            assert!(seen.insert(id));
            if round % 3 != 2 {
                registry.insert(id, Box::new(Nop));
            }
            if round % 2 == 0 {
                if let Some(first) = registry.ids().next() {
                    registry.tombstone(first);
                }
                registry.sweep();
            }
        }
        assert!(registry.ids().all(|id| seen.contains(&id)));
    }
}
