//! Configuration module for customizing mapper behavior.
//!
//! The [`Config`] trait selects the hasher used by the internal concurrent
//! maps, the number of single-flight shards and the policy applied to
//! self-referential type graphs. [`DefaultConfig`] is suitable for most uses.
//!
//! # Creating Custom Configurations
//!
//! ```rust
//! use fxhash::FxBuildHasher;
//! use ubiquity::{Config, CyclePolicy, Mapper};
//!
//! #[derive(
//!     Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
//! )]
//! struct StrictConfig;
//!
//! impl Config for StrictConfig {
//!     type BuildHasher = FxBuildHasher;
//!
//!     // Reject self-referential types instead of linking forward references
//!     fn cycle_policy() -> CyclePolicy { CyclePolicy::FailFast }
//! }
//!
//! let mapper = Mapper::<StrictConfig>::with_config();
//! ```

use std::{
    fmt::Debug,
    hash::{BuildHasher, Hash},
    sync::LazyLock,
};

use fxhash::FxBuildHasher;

/// What to do when building a routine requires the routine currently being
/// built on the same thread (a self-referential type graph such as
/// `Node { children: Vec<Node> }`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub enum CyclePolicy {
    /// Link the nested routine through a forward reference that is resolved
    /// from the cache on first invocation, once the outer build is published.
    #[default]
    ForwardReference,

    /// Abort the build with a [`CyclicTypeError`](crate::CyclicTypeError).
    /// Nothing is published for the aborted keys.
    FailFast,
}

/// Configuration trait for the [`Mapper`](crate::Mapper).
///
/// # Required Associated Types
///
/// ## `BuildHasher`
///
/// The hasher builder for the internal concurrent maps (descriptor interner,
/// routine cache, single-flight table, converter registry). Keys are already
/// pre-hashed, so a fast non-cryptographic hasher is the right choice.
///
/// # Configurable Methods
///
/// - [`shard_amount()`](Config::shard_amount) - single-flight shard count
/// - [`cycle_policy()`](Config::cycle_policy) - self-referential type policy
///
/// # Thread Safety
///
/// All Config implementations must be `Send + Sync` since the mapper is
/// shared between threads.
pub trait Config:
    Default
    + Debug
    + Clone
    + Copy
    + PartialEq
    + Eq
    + Hash
    + Send
    + Sync
    + 'static
{
    /// The standard hasher builder used by the mapper's internal maps.
    type BuildHasher: BuildHasher + Default + Clone + Send + Sync + 'static;

    /// The number of shards of the single-flight table guarding routine
    /// builds. Rounded up to the next power of two.
    ///
    /// # Default Value
    ///
    /// Four times the available parallelism, rounded up to a power of two.
    #[must_use]
    fn shard_amount() -> usize { default_shard_amount() }

    /// The policy applied when a routine build needs itself.
    ///
    /// # Default Value
    ///
    /// [`CyclePolicy::ForwardReference`].
    #[must_use]
    fn cycle_policy() -> CyclePolicy { CyclePolicy::ForwardReference }
}

/// The default configuration: `FxHash` for internal maps, default sharding and
/// forward references for self-referential types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct DefaultConfig;

impl Config for DefaultConfig {
    type BuildHasher = FxBuildHasher;
}

/// Returns the default number of shards to use.
///
/// The default is calculated as `4 * available_parallelism`, rounded up to
/// the next power of two. The value is computed once and cached.
fn default_shard_amount() -> usize {
    static DEFAULT_SHARD_AMOUNT: LazyLock<usize> = LazyLock::new(|| {
        (std::thread::available_parallelism().map_or(1, usize::from) * 4)
            .next_power_of_two()
    });

    *DEFAULT_SHARD_AMOUNT
}
