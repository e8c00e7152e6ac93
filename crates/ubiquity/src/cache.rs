//! The routine cache: published routines plus the builds in progress.

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    cache::single_flight::{Flight, FlightGuard, SingleFlight},
    config::Config,
    key::TypePairKey,
    routine::Routine,
};

mod sharded;
mod single_flight;

/// The outcome of [`RoutineCache::claim`].
pub(crate) enum Claim<'a, C: Config> {
    /// The routine is published.
    Ready(Arc<Routine<C>>),

    /// The caller owns the build and must publish or drop the guard.
    Owner(BuildGuard<'a, C>),

    /// Another build of the key is ongoing.
    Building(Arc<Flight>),
}

pub(crate) type BuildGuard<'a, C> =
    FlightGuard<'a, TypePairKey, <C as Config>::BuildHasher>;

/// Concurrent `key -> routine` store with single-flight builds.
///
/// Routines are never evicted; the cache only shrinks through
/// [`clear`](RoutineCache::clear), which needs exclusive access.
pub(crate) struct RoutineCache<C: Config> {
    routines: DashMap<TypePairKey, Arc<Routine<C>>, C::BuildHasher>,
    flights: SingleFlight<TypePairKey, C::BuildHasher>,
}

impl<C: Config> RoutineCache<C> {
    pub fn new() -> Self {
        Self {
            routines: DashMap::with_hasher(C::BuildHasher::default()),
            flights: SingleFlight::new(C::shard_amount()),
        }
    }

    pub fn get(&self, key: &TypePairKey) -> Option<Arc<Routine<C>>> {
        self.routines.get(key).map(|routine| routine.clone())
    }

    pub fn claim(&self, key: &TypePairKey) -> Claim<'_, C> {
        if let Some(routine) = self.get(key) {
            return Claim::Ready(routine);
        }

        match self.flights.claim(key) {
            single_flight::Claim::Owner(guard) => {
                // published between the lookup and the claim
                match self.get(key) {
                    Some(routine) => Claim::Ready(routine),
                    None => Claim::Owner(guard),
                }
            }
            single_flight::Claim::InFlight(flight) => Claim::Building(flight),
        }
    }

    /// Publishes the routine built under `guard` and releases the claim.
    pub fn publish(
        &self,
        guard: BuildGuard<'_, C>,
        routine: Routine<C>,
    ) -> Arc<Routine<C>> {
        let routine = Arc::new(routine);
        self.routines.insert(guard.key().clone(), routine.clone());
        drop(guard);

        routine
    }

    pub fn clear(&mut self) { self.routines.clear(); }

    pub fn len(&self) -> usize { self.routines.len() }
}

impl<C: Config> std::fmt::Debug for RoutineCache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutineCache")
            .field("routines", &self.routines.len())
            .field("flights", &self.flights)
            .finish()
    }
}
