//! The mapping facade.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Mapper<C>                            │
//! │  ┌───────────────────┐  ┌──────────────────┐  ┌───────────┐  │
//! │  │ Descriptor        │  │ Routine Cache    │  │ Converter │  │
//! │  │ Interner          │  │ - key -> routine │  │ Registry  │  │
//! │  │ - TypeId -> Arc   │  │ - single-flight  │  └───────────┘  │
//! │  └───────────────────┘  └──────────────────┘                 │
//! └──────────────────────────────────────────────────────────────┘
//!           │ miss                           ▲ publish
//!           ▼                                │
//!   PlanBuilder ──> PropertyPlan ──> Synthesizer ──> Routine
//! ```
//!
//! A call to [`Mapper::map`] resolves the descriptors of both types, builds
//! the [`TypePairKey`] and looks it up in the routine cache. On a hit, the
//! routine is invoked directly. On a miss, the calling thread claims the key,
//! derives a plan, compiles it (linking the routines of nested pairs through
//! the same cache) and publishes the routine before invoking it.

use std::{any::Any, sync::Arc};

use crate::{
    cache::{BuildGuard, Claim, RoutineCache},
    config::{Config, CyclePolicy, DefaultConfig},
    convert::{Converter, ConverterRegistry},
    descriptor::{
        Instance, Mappable, Object, Property, TypeHandle,
        interner::DescriptorInterner,
    },
    error::{
        ConstructionError, CyclicTypeError, MapError, NullSourceError,
        TypeMismatchError,
    },
    key::TypePairKey,
    plan::PlanBuilder,
    routine::{Link, Routine, Synthesizer},
    statistics::{Statistics, StatisticsSnapshot},
};

/// Copies instances of one mappable type into new instances of another.
///
/// A mapper owns the interned type descriptors, the routine cache and the
/// registered converters. Routines are built lazily, once per type pair, and
/// reused for the lifetime of the mapper.
///
/// # Thread Safety
///
/// - `&Mapper`: Safe to share across threads for mapping
/// - `&mut Mapper`: Required for converter registration
/// - `Arc<Mapper>` or a `static`: The typical way to share a mapper
///
/// # Example
///
/// ```rust
/// use ubiquity::{Mappable, Mapper};
///
/// #[derive(Debug, Default, PartialEq, Mappable)]
/// struct User {
///     name: String,
///     age: u32,
/// }
///
/// #[derive(Debug, Default, PartialEq, Mappable)]
/// struct UserDto {
///     name: String,
///     age: u32,
///     email: String,
/// }
///
/// let mapper = Mapper::new();
/// let user = User { name: "Ada".to_owned(), age: 36 };
///
/// let dto: UserDto = mapper.map(&user).unwrap();
///
/// assert_eq!(dto, UserDto {
///     name: "Ada".to_owned(),
///     age: 36,
///     email: String::new(),
/// });
/// ```
pub struct Mapper<C: Config = DefaultConfig> {
    interner: DescriptorInterner<C>,
    converters: ConverterRegistry<C>,
    cache: RoutineCache<C>,
    statistics: Statistics,
}

static_assertions::assert_impl_all!(Mapper: Send, Sync);

impl Mapper<DefaultConfig> {
    /// Creates a mapper with the [`DefaultConfig`].
    #[must_use]
    pub fn new() -> Self { Self::with_config() }
}

impl<C: Config> Default for Mapper<C> {
    fn default() -> Self { Self::with_config() }
}

impl<C: Config> Mapper<C> {
    /// Creates a mapper using the configuration `C`.
    #[must_use]
    pub fn with_config() -> Self {
        Self {
            interner: DescriptorInterner::new(),
            converters: ConverterRegistry::new(),
            cache: RoutineCache::new(),
            statistics: Statistics::default(),
        }
    }

    /// Returns the canonical descriptor handle of `T`.
    ///
    /// Repeated calls return handles to the same allocation.
    pub fn descriptor<T: Mappable>(&self) -> TypeHandle {
        self.interner.intern::<T>()
    }

    /// Returns the key of the pair `(S, T)`.
    pub fn key<S: Mappable, T: Mappable>(&self) -> TypePairKey {
        TypePairKey::new(self.descriptor::<S>(), self.descriptor::<T>())
    }

    /// Returns the routine mapping `S` into `T`, building it if needed.
    ///
    /// Useful to warm the cache before the first mapping call.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::CyclicType`] if the pair needs itself while
    /// [`CyclePolicy::FailFast`] is configured.
    pub fn routine<S: Mappable, T: Mappable>(
        &self,
    ) -> Result<Arc<Routine<C>>, MapError> {
        self.resolve(&self.key::<S, T>())
    }

    /// Maps `source` into a new instance of `T`.
    ///
    /// # Errors
    ///
    /// - [`MapError::Construction`] if `T`, or a nested target type reached
    ///   through a present value, cannot be instantiated. When `T` itself is
    ///   not constructible, the routine cache is left untouched.
    /// - [`MapError::CyclicType`] if the pair needs itself while
    ///   [`CyclePolicy::FailFast`] is configured.
    pub fn map<S: Mappable, T: Mappable>(
        &self,
        source: &S,
    ) -> Result<T, MapError> {
        let routine = self.constructible_routine::<S, T>()?;

        downcast(routine.invoke(self, source)?)
    }

    /// Maps an optional `source` into a new instance of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NullSource`] if `source` is `None`, without
    /// touching the routine cache. Otherwise fails like [`Mapper::map`].
    pub fn map_nullable<S: Mappable, T: Mappable>(
        &self,
        source: Option<&S>,
    ) -> Result<T, MapError> {
        self.map(source.ok_or(NullSourceError)?)
    }

    /// Populates `destination` from `source`.
    ///
    /// Target properties without a compatible source keep their current
    /// value. `T` does not need a constructor.
    ///
    /// # Errors
    ///
    /// - [`MapError::Construction`] if a nested target type reached through a
    ///   present value cannot be instantiated.
    /// - [`MapError::CyclicType`] if the pair needs itself while
    ///   [`CyclePolicy::FailFast`] is configured.
    pub fn map_into<S: Mappable, T: Mappable>(
        &self,
        source: &S,
        destination: &mut T,
    ) -> Result<(), MapError> {
        self.routine::<S, T>()?.populate(self, source, destination)
    }

    /// Maps every source in order, looking the routine up only once.
    ///
    /// # Errors
    ///
    /// Fails like [`Mapper::map`], on the first failing source.
    pub fn map_all<'s, S: Mappable, T: Mappable>(
        &self,
        sources: impl IntoIterator<Item = &'s S>,
    ) -> Result<Vec<T>, MapError> {
        let routine = self.constructible_routine::<S, T>()?;

        sources
            .into_iter()
            .map(|source| downcast(routine.invoke(self, source)?))
            .collect()
    }

    /// Maps a type-erased source into a new instance of the `target` type.
    ///
    /// The source type is taken from the runtime type of `source`. `target`
    /// must be a handle returned by [`Mapper::descriptor`] of this mapper.
    ///
    /// # Errors
    ///
    /// - [`MapError::NullSource`] if `source` is `None`.
    /// - Otherwise fails like [`Mapper::map`].
    pub fn map_dyn(
        &self,
        source: Option<&dyn Object>,
        target: &TypeHandle,
    ) -> Result<Instance, MapError> {
        let source = source.ok_or(NullSourceError)?;

        if !target.is_constructible() {
            return Err(ConstructionError::new(target.name()).into());
        }

        let key = TypePairKey::new(
            self.interner.intern_shape(&source.object_shape()),
            target.clone(),
        );

        self.resolve(&key)?.invoke(self, source.as_any())
    }

    /// Registers a converter from property type `A` to property type `B`.
    ///
    /// The converter is used for every same-named property pair of these
    /// types, taking precedence over the default copy. Cached routines are
    /// discarded so the converter applies everywhere. Returns the converter
    /// it replaces, if any.
    pub fn register_converter<A: Property, B: Property>(
        &mut self,
        convert: impl Fn(&A) -> B + Send + Sync + 'static,
    ) -> Option<Converter> {
        let replaced = self.converters.insert(Converter::new(convert));
        self.cache.clear();

        tracing::debug!(
            source_type = std::any::type_name::<A>(),
            target_type = std::any::type_name::<B>(),
            "registered converter, routine cache cleared"
        );

        replaced
    }

    /// Returns a snapshot of the mapper's counters.
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.statistics.snapshot(
            self.interner.len(),
            self.cache.len(),
            self.converters.len(),
        )
    }

    fn constructible_routine<S: Mappable, T: Mappable>(
        &self,
    ) -> Result<Arc<Routine<C>>, MapError> {
        let target = self.descriptor::<T>();

        if !target.is_constructible() {
            return Err(ConstructionError::new(target.name()).into());
        }

        self.resolve(&TypePairKey::new(self.descriptor::<S>(), target))
    }

    /// Returns the published routine of `key`, building it or waiting for
    /// the thread building it.
    pub(crate) fn resolve(
        &self,
        key: &TypePairKey,
    ) -> Result<Arc<Routine<C>>, MapError> {
        let mut claim = self.cache.claim(key);
        self.record_lookup(&claim);

        loop {
            match claim {
                Claim::Ready(routine) => return Ok(routine),

                Claim::Owner(guard) => return self.build_routine(key, guard),

                // waiting on our own build would never return
                Claim::Building(flight)
                    if flight.is_owned_by_current_thread() =>
                {
                    return Err(CyclicTypeError::new(key).into());
                }

                Claim::Building(flight) => {
                    // the build is either published or abandoned, retry
                    flight.wait();
                    claim = self.cache.claim(key);
                }
            }
        }
    }

    /// Links the routine of a nested pair while another routine is being
    /// compiled. Never waits for another thread.
    pub(crate) fn link(&self, key: &TypePairKey) -> Result<Link<C>, MapError> {
        let claim = self.cache.claim(key);
        self.record_lookup(&claim);

        match claim {
            Claim::Ready(routine) => Ok(Link::Ready(routine)),

            Claim::Owner(guard) => {
                Ok(Link::Ready(self.build_routine(key, guard)?))
            }

            Claim::Building(flight) => {
                let reentrant = flight.is_owned_by_current_thread();

                if reentrant && C::cycle_policy() == CyclePolicy::FailFast {
                    return Err(CyclicTypeError::new(key).into());
                }

                tracing::trace!(
                    key = ?key,
                    owner = ?flight.owner(),
                    reentrant,
                    "linking forward reference"
                );
                self.statistics.add_forward_link();

                Ok(Link::forward(key.clone()))
            }
        }
    }

    fn record_lookup(&self, claim: &Claim<'_, C>) {
        if matches!(claim, Claim::Ready(_)) {
            self.statistics.add_cache_hit();
        } else {
            self.statistics.add_cache_miss();
        }
    }

    #[tracing::instrument(level = "debug", skip(self, guard))]
    fn build_routine(
        &self,
        key: &TypePairKey,
        guard: BuildGuard<'_, C>,
    ) -> Result<Arc<Routine<C>>, MapError> {
        let builder = PlanBuilder::new(&self.interner, &self.converters);

        // decided from the type graph alone, so concurrent builds of other
        // pairs on the cycle cannot turn it into a forward link
        if C::cycle_policy() == CyclePolicy::FailFast {
            let cycle = builder
                .find_cycle(key, |nested| self.cache.get(nested).is_some());

            if let Some(cycle) = cycle {
                return Err(CyclicTypeError::new(&cycle).into());
            }
        }

        let plan = builder.build(key);
        self.statistics.add_plan_built();

        // on failure the guard is dropped unpublished and waiters retry
        let routine = Synthesizer::new(self).compile(plan)?;
        self.statistics.add_routine_compiled();

        Ok(self.cache.publish(guard, routine))
    }
}

impl<C: Config> std::fmt::Debug for Mapper<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("interner", &self.interner)
            .field("converters", &self.converters)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn downcast<T: Any>(instance: Instance) -> Result<T, MapError> {
    instance
        .downcast::<T>()
        .map(|instance| *instance)
        .map_err(|_| {
            TypeMismatchError::new(std::any::type_name::<T>()).into()
        })
}
