//! The hardware-breakpoint slot table (§3 "Breakpoint slot", §4.6).
//!
//! Pure bookkeeping: which slot holds which breakpoint, and the
//! `IBREAKENABLE` bitmask that mirrors it. Writing that state to the target
//! is [`super::communication_interface`]'s job, since it needs the SR-write
//! recipe of §4.3.

use crate::architecture::xtensa::config::XT_NUM_BREAKPOINTS;
use crate::core::Breakpoint;

/// A fixed-size table of `XT_NUM_BREAKPOINTS` hardware breakpoint slots.
#[derive(Debug, Clone)]
pub struct BreakpointTable {
    slots: [Option<Breakpoint>; XT_NUM_BREAKPOINTS],
}

impl Default for BreakpointTable {
    fn default() -> Self {
        Self {
            slots: [None; XT_NUM_BREAKPOINTS],
        }
    }
}

impl BreakpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots, i.e. [`XT_NUM_BREAKPOINTS`].
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently unused.
    pub fn free_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    /// The lowest-index free slot, if any.
    pub fn lowest_free_slot(&self) -> Option<usize> {
        self.slots.iter().position(|s| s.is_none())
    }

    /// Occupies `slot` with `bp`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is already occupied; callers are expected to have
    /// obtained `slot` from [`BreakpointTable::lowest_free_slot`] first.
    pub fn occupy(&mut self, slot: usize, bp: Breakpoint) {
        assert!(self.slots[slot].is_none(), "breakpoint slot {slot} already in use");
        self.slots[slot] = Some(bp);
    }

    /// Finds the slot holding a breakpoint at `bp.address`, if any.
    pub fn slot_for(&self, bp: Breakpoint) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.map(|existing| existing.address) == Some(bp.address))
    }

    /// Clears `slot`.
    pub fn clear(&mut self, slot: usize) {
        self.slots[slot] = None;
    }

    /// The `IBREAKENABLE` bitmask this table implies: bit `n` set iff slot
    /// `n` is occupied.
    pub fn enable_mask(&self) -> u32 {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .fold(0u32, |mask, (i, _)| mask | (1 << i))
    }

    /// Drops every breakpoint without touching the target. Used when a
    /// reset is observed and the on-chip mirror is known to have reverted
    /// to its power-on state (all slots disabled).
    pub fn clear_all(&mut self) {
        self.slots = [None; XT_NUM_BREAKPOINTS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Breakpoint;

    #[test]
    fn starts_with_every_slot_free() {
        let table = BreakpointTable::new();
        assert_eq!(table.free_count(), XT_NUM_BREAKPOINTS);
        assert_eq!(table.enable_mask(), 0);
    }

    #[test]
    fn occupy_updates_enable_mask_and_free_count() {
        let mut table = BreakpointTable::new();
        let slot = table.lowest_free_slot().unwrap();
        table.occupy(slot, Breakpoint::hardware(0x4000_0000));
        assert_eq!(slot, 0);
        assert_eq!(table.free_count(), XT_NUM_BREAKPOINTS - 1);
        assert_eq!(table.enable_mask(), 0b01);
    }

    #[test]
    fn full_table_has_no_free_slot() {
        let mut table = BreakpointTable::new();
        for i in 0..XT_NUM_BREAKPOINTS {
            table.occupy(i, Breakpoint::hardware(i as u32));
        }
        assert_eq!(table.lowest_free_slot(), None);
    }

    #[test]
    fn slot_for_finds_by_address() {
        let mut table = BreakpointTable::new();
        let bp = Breakpoint::hardware(0x1234);
        table.occupy(1, bp);
        assert_eq!(table.slot_for(bp), Some(1));
        assert_eq!(table.slot_for(Breakpoint::hardware(0x9999)), None);
    }
}
