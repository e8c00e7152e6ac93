//! Counters describing the work done by a mapper.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub(crate) struct Statistics {
    plans_built: AtomicUsize,
    routines_compiled: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
    forward_links: AtomicUsize,
}

impl Statistics {
    pub fn add_plan_built(&self) {
        self.plans_built.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_routine_compiled(&self) {
        self.routines_compiled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_forward_link(&self) {
        self.forward_links.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(
        &self,
        descriptors: usize,
        routines: usize,
        converters: usize,
    ) -> StatisticsSnapshot {
        StatisticsSnapshot {
            plans_built: self.plans_built.load(Ordering::Relaxed),
            routines_compiled: self.routines_compiled.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            forward_links: self.forward_links.load(Ordering::Relaxed),
            descriptors,
            routines,
            converters,
        }
    }
}

/// A point-in-time copy of the counters of a [`Mapper`](crate::Mapper).
///
/// The cumulative counters survive converter registration; `routines`
/// reflects the cache after it was cleared.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct StatisticsSnapshot {
    /// Property plans derived.
    pub plans_built: usize,

    /// Routines compiled and published.
    pub routines_compiled: usize,

    /// Routine lookups, top-level or nested, answered by the cache.
    pub cache_hits: usize,

    /// Routine lookups that had to build, wait for a build or link a
    /// forward reference. A lookup is counted once however often it waits.
    pub cache_misses: usize,

    /// Nested links created as forward references.
    pub forward_links: usize,

    /// Interned type descriptors.
    pub descriptors: usize,

    /// Routines currently cached.
    pub routines: usize,

    /// Registered converters.
    pub converters: usize,
}
