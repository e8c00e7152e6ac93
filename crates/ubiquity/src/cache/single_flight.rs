//! Blocking single-flight: at most one build per key at a time.

use std::{
    collections::HashMap,
    hash::{BuildHasher, Hash},
    sync::Arc,
    thread::ThreadId,
};

use parking_lot::{Condvar, Mutex};

use crate::cache::sharded::Sharded;

/// An ongoing build, owned by one thread.
pub(crate) struct Flight {
    owner: ThreadId,
    landed: Mutex<bool>,
    condvar: Condvar,
}

impl Flight {
    fn new() -> Self {
        Self {
            owner: std::thread::current().id(),
            landed: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// The thread performing the build.
    pub const fn owner(&self) -> ThreadId { self.owner }

    /// Whether the build is performed by the calling thread.
    pub fn is_owned_by_current_thread(&self) -> bool {
        self.owner == std::thread::current().id()
    }

    /// Blocks until the owner publishes or abandons the build.
    pub fn wait(&self) {
        let mut landed = self.landed.lock();
        while !*landed {
            self.condvar.wait(&mut landed);
        }
    }

    fn land(&self) {
        *self.landed.lock() = true;
        self.condvar.notify_all();
    }
}

impl std::fmt::Debug for Flight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flight")
            .field("owner", &self.owner)
            .field("landed", &*self.landed.lock())
            .finish()
    }
}

/// The outcome of [`SingleFlight::claim`].
pub(crate) enum Claim<'a, K: Eq + Hash, S: BuildHasher> {
    /// The caller now owns the build for the key.
    Owner(FlightGuard<'a, K, S>),

    /// Another build for the key is ongoing.
    InFlight(Arc<Flight>),
}

/// Suppresses duplicate concurrent builds of the same key.
pub(crate) struct SingleFlight<K, S> {
    map: Sharded<HashMap<K, Arc<Flight>, S>>,
    build_hasher: S,
}

impl<K, S> std::fmt::Debug for SingleFlight<K, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight")
            .field("shards", &self.map.shard_amount())
            .finish_non_exhaustive()
    }
}

impl<K: Eq + Hash + Clone, S: BuildHasher + Default> SingleFlight<K, S> {
    pub fn new(shard_amount: usize) -> Self {
        Self {
            map: Sharded::new(shard_amount.next_power_of_two(), |_| {
                HashMap::with_hasher(S::default())
            }),
            build_hasher: S::default(),
        }
    }

    /// Claims the build of `key`, or returns the flight already building it.
    ///
    /// The claim is released when the returned guard is dropped, waking up
    /// every waiter.
    pub fn claim(&self, key: &K) -> Claim<'_, K, S> {
        let shard_index = self.map.shard_index(self.build_hasher.hash_one(key));
        let mut shard = self.map.write_shard(shard_index);

        if let Some(flight) = shard.get(key) {
            return Claim::InFlight(flight.clone());
        }

        let flight = Arc::new(Flight::new());
        shard.insert(key.clone(), flight.clone());

        Claim::Owner(FlightGuard {
            single_flight: self,
            shard_index,
            key: key.clone(),
            flight,
        })
    }
}

/// Ownership of an ongoing build.
pub(crate) struct FlightGuard<'a, K: Eq + Hash, S: BuildHasher> {
    single_flight: &'a SingleFlight<K, S>,
    shard_index: usize,
    key: K,
    flight: Arc<Flight>,
}

impl<K: Eq + Hash, S: BuildHasher> FlightGuard<'_, K, S> {
    pub const fn key(&self) -> &K { &self.key }
}

impl<K: Eq + Hash, S: BuildHasher> Drop for FlightGuard<'_, K, S> {
    fn drop(&mut self) {
        self.single_flight.map.write_shard(self.shard_index).remove(&self.key);
        self.flight.land();
    }
}
