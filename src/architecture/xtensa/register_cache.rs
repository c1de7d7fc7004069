//! The register cache (§3 "Register-cache entry", §4.4).
//!
//! This module only tracks the bookkeeping (value, `valid`, `dirty`); the
//! TAP recipes that actually populate or flush a slot live in
//! [`super::communication_interface`], which is the only thing that also
//! has access to an [`super::xdm::Xdm`].

use crate::architecture::xtensa::registers::REGISTER_COUNT;
use crate::core::RegisterId;

#[derive(Debug, Clone, Copy, Default)]
struct CacheEntry {
    value: u32,
    /// `true` if `value` reflects the target.
    valid: bool,
    /// `true` if `value` has been locally written and not yet flushed.
    dirty: bool,
}

/// A fixed-size cache over the 85-entry register table.
///
/// Invariant (§3): after a successful [`RegisterCache::mark_flushed`] pass,
/// no entry is simultaneously dirty and invalid.
#[derive(Debug, Clone)]
pub struct RegisterCache {
    entries: [CacheEntry; REGISTER_COUNT],
}

impl Default for RegisterCache {
    fn default() -> Self {
        Self {
            entries: [CacheEntry::default(); REGISTER_COUNT],
        }
    }
}

impl RegisterCache {
    /// An empty cache: every entry invalid and clean.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached value if valid, without triggering a target read.
    pub fn get(&self, id: RegisterId) -> Option<u32> {
        let entry = &self.entries[id.0 as usize];
        entry.valid.then_some(entry.value)
    }

    /// Records a value freshly read from the target: valid, clean.
    pub fn fill(&mut self, id: RegisterId, value: u32) {
        self.entries[id.0 as usize] = CacheEntry {
            value,
            valid: true,
            dirty: false,
        };
    }

    /// Records a local write: valid, dirty, pending flush.
    pub fn write(&mut self, id: RegisterId, value: u32) {
        self.entries[id.0 as usize] = CacheEntry {
            value,
            valid: true,
            dirty: true,
        };
    }

    /// Whether `id` has a write pending flush to the target.
    pub fn is_dirty(&self, id: RegisterId) -> bool {
        self.entries[id.0 as usize].dirty
    }

    /// Clears the dirty flag for `id` once its value has been written back.
    pub fn mark_flushed(&mut self, id: RegisterId) {
        self.entries[id.0 as usize].dirty = false;
    }

    /// The indices with a write pending, in **reverse** table order.
    ///
    /// Reverse order matters (§4.4 "Restore"): writing special registers
    /// uses `a0` as scratch, clobbering low-index general registers. Special
    /// registers sit at the high end of the table, so visiting high indices
    /// first and general registers (the low end) last means the final `a0`
    /// value written is the one the caller actually asked for.
    pub fn dirty_in_writeback_order(&self) -> Vec<RegisterId> {
        self.entries
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, e)| e.dirty)
            .map(|(i, _)| RegisterId(i as u8))
            .collect()
    }

    /// Marks `id` dirty without changing its cached value.
    ///
    /// Used when a recipe is about to overwrite the target's register as
    /// scratch space without going through [`RegisterCache::write`]: the
    /// cache's existing value is what the pre-resume writeback needs to
    /// restore to undo the clobber (§4.3, §4.5 step 2).
    pub fn clobber(&mut self, id: RegisterId) {
        let value = self.get(id).unwrap_or(0);
        self.write(id, value);
    }

    /// Invalidates every entry (§3 "implicitly invalidated ... on any
    /// observed core reset"; §4.4 "Cache invalidation").
    ///
    /// Dirty local writes that were never flushed are discarded along with
    /// their validity — a reset or resume means the target's own state has
    /// diverged from whatever was cached, so a stale local write is no
    /// longer meaningful to replay.
    pub fn invalidate_all(&mut self) {
        self.entries = [CacheEntry::default(); REGISTER_COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cache_has_no_valid_entries() {
        let cache = RegisterCache::new();
        assert_eq!(cache.get(RegisterId(0)), None);
    }

    #[test]
    fn fill_then_get_round_trips() {
        let mut cache = RegisterCache::new();
        cache.fill(RegisterId(3), 0xDEAD_BEEF);
        assert_eq!(cache.get(RegisterId(3)), Some(0xDEAD_BEEF));
        assert!(!cache.is_dirty(RegisterId(3)));
    }

    #[test]
    fn write_marks_dirty_and_writeback_order_is_reversed() {
        use pretty_assertions::assert_eq;

        let mut cache = RegisterCache::new();
        cache.write(RegisterId(1), 1);
        cache.write(RegisterId(64), 2);
        cache.write(RegisterId(10), 3);
        assert_eq!(
            cache.dirty_in_writeback_order(),
            vec![RegisterId(64), RegisterId(10), RegisterId(1)]
        );
    }

    #[test]
    fn mark_flushed_clears_dirty_but_keeps_valid() {
        let mut cache = RegisterCache::new();
        cache.write(RegisterId(5), 42);
        cache.mark_flushed(RegisterId(5));
        assert!(!cache.is_dirty(RegisterId(5)));
        assert_eq!(cache.get(RegisterId(5)), Some(42));
    }

    #[test]
    fn invalidate_all_clears_everything() {
        let mut cache = RegisterCache::new();
        cache.write(RegisterId(5), 42);
        cache.invalidate_all();
        assert_eq!(cache.get(RegisterId(5)), None);
        assert!(!cache.is_dirty(RegisterId(5)));
    }
}
