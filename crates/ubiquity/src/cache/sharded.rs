use crossbeam_utils::CachePadded;
use parking_lot::{RwLock, RwLockWriteGuard};

/// A fixed number of independently locked shards, selected by hash.
pub(crate) struct Sharded<T> {
    shards: Box<[CachePadded<RwLock<T>>]>,
    mask: usize,
}

impl<T> Sharded<T> {
    pub fn new(
        shard_amount: usize,
        mut make_shard: impl FnMut(usize) -> T,
    ) -> Self {
        assert!(
            shard_amount.is_power_of_two(),
            "shard_amount must be a power of two"
        );

        let shards = (0..shard_amount)
            .map(|index| CachePadded::new(RwLock::new(make_shard(index))))
            .collect::<Box<[_]>>();

        Self { shards, mask: shard_amount - 1 }
    }

    pub fn shard_amount(&self) -> usize { self.shards.len() }

    pub fn write_shard(&self, shard_index: usize) -> RwLockWriteGuard<'_, T> {
        self.shards[shard_index].write()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub const fn shard_index(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }
}
