//! Compiled copy routines.
//!
//! A [`Routine`] is the executable form of a [`PropertyPlan`]: every plan
//! operation is compiled into a closure specialized for its
//! [`CopyStrategy`], so invoking a routine performs no strategy dispatch and
//! no property lookup by name. Routines are immutable once built, apart from
//! memoized forward links, and can be invoked concurrently without limit.

use std::{
    any::Any,
    sync::{Arc, OnceLock, Weak},
};

use crate::{
    config::Config,
    descriptor::{Instance, TypeHandle, shape::AssignFn},
    error::{MapError, TypeMismatchError},
    key::TypePairKey,
    mapper::Mapper,
    plan::{CopyStrategy, PropertyOperation, PropertyPlan},
};

/// Copies one property from a source instance into a target instance.
type Operation<C> = Box<
    dyn Fn(&Mapper<C>, &dyn Any, &mut dyn Any) -> Result<(), MapError>
        + Send
        + Sync,
>;

/// Produces a new target value from a source value.
type Producer<C> = Box<
    dyn Fn(&Mapper<C>, &dyn Any) -> Result<Instance, MapError> + Send + Sync,
>;

/// Assigns into an existing target value from a source value.
type Assign<C> = Box<
    dyn Fn(&Mapper<C>, &dyn Any, &mut dyn Any) -> Result<(), MapError>
        + Send
        + Sync,
>;

/// The compiled copy function of one type pair.
pub struct Routine<C: Config> {
    key: TypePairKey,
    plan: PropertyPlan,
    source: TypeHandle,
    target: TypeHandle,
    operations: Box<[Operation<C>]>,
}

impl<C: Config> Routine<C> {
    /// The pair this routine copies.
    #[must_use]
    pub const fn key(&self) -> &TypePairKey { &self.key }

    /// The plan this routine was compiled from.
    #[must_use]
    pub const fn plan(&self) -> &PropertyPlan { &self.plan }

    /// Creates a new target instance populated from `source`.
    ///
    /// # Errors
    ///
    /// - [`MapError::Construction`] if the target type, or a nested target
    ///   type reached through a present value, has no constructor.
    /// - [`MapError::TypeMismatch`] if `source` is not of the source type.
    pub fn invoke(
        &self,
        mapper: &Mapper<C>,
        source: &dyn Any,
    ) -> Result<Instance, MapError> {
        self.check_source(source)?;

        let mut target = self.target.instantiate()?;
        self.run(mapper, source, target.as_mut())?;

        Ok(target)
    }

    /// Populates an existing target instance from `source`.
    ///
    /// Target properties outside of the plan are left untouched.
    ///
    /// # Errors
    ///
    /// - [`MapError::Construction`] if a nested target type reached through a
    ///   present value has no constructor.
    /// - [`MapError::TypeMismatch`] if `source` or `destination` is not of the
    ///   expected type.
    pub fn populate(
        &self,
        mapper: &Mapper<C>,
        source: &dyn Any,
        destination: &mut dyn Any,
    ) -> Result<(), MapError> {
        self.check_source(source)?;

        if (*destination).type_id() != self.target.described_type_id() {
            return Err(TypeMismatchError::new(self.target.name()).into());
        }

        self.run(mapper, source, destination)
    }

    fn check_source(&self, source: &dyn Any) -> Result<(), TypeMismatchError> {
        if (*source).type_id() == self.source.described_type_id() {
            Ok(())
        } else {
            Err(TypeMismatchError::new(self.source.name()))
        }
    }

    fn run(
        &self,
        mapper: &Mapper<C>,
        source: &dyn Any,
        target: &mut dyn Any,
    ) -> Result<(), MapError> {
        for operation in &self.operations {
            operation(mapper, source, target)?;
        }

        Ok(())
    }
}

impl<C: Config> std::fmt::Debug for Routine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Routine")
            .field("key", &self.key)
            .field("operations", &self.plan.operations().len())
            .finish_non_exhaustive()
    }
}

/// How a compiled routine reaches the routine of a nested pair.
pub(crate) enum Link<C: Config> {
    /// The nested routine was available at build time.
    Ready(Arc<Routine<C>>),

    /// The nested routine was being built when this link was created; it is
    /// looked up on first use and memoized.
    Forward { key: TypePairKey, resolved: OnceLock<Weak<Routine<C>>> },
}

impl<C: Config> Link<C> {
    pub fn forward(key: TypePairKey) -> Self {
        Self::Forward { key, resolved: OnceLock::new() }
    }

    fn invoke(
        &self,
        mapper: &Mapper<C>,
        source: &dyn Any,
    ) -> Result<Instance, MapError> {
        match self {
            Self::Ready(routine) => routine.invoke(mapper, source),

            Self::Forward { key, resolved } => {
                if let Some(routine) = resolved.get().and_then(Weak::upgrade) {
                    return routine.invoke(mapper, source);
                }

                let routine = mapper.resolve(key)?;

                // a stale link (after the cache was cleared) keeps resolving
                let _ = resolved.set(Arc::downgrade(&routine));

                routine.invoke(mapper, source)
            }
        }
    }
}

/// Compiles property plans into routines.
pub(crate) struct Synthesizer<'a, C: Config> {
    mapper: &'a Mapper<C>,
}

impl<'a, C: Config> Synthesizer<'a, C> {
    pub const fn new(mapper: &'a Mapper<C>) -> Self { Self { mapper } }

    /// Compiles `plan`, linking every nested pair through the mapper.
    pub fn compile(&self, plan: PropertyPlan) -> Result<Routine<C>, MapError> {
        let key = plan.key().clone();
        let (Some(source), Some(target)) =
            (key.source().cloned(), key.target().cloned())
        else {
            return Err(TypeMismatchError::new(key.target_name()).into());
        };

        let operations = plan
            .operations()
            .iter()
            .map(|operation| {
                self.compile_operation(&source, &target, operation)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Routine {
            key,
            plan,
            source,
            target,
            operations: operations.into_boxed_slice(),
        })
    }

    fn compile_operation(
        &self,
        source: &TypeHandle,
        target: &TypeHandle,
        operation: &PropertyOperation,
    ) -> Result<Operation<C>, MapError> {
        let source_property =
            source.properties()[operation.source_index()].clone();
        let target_property =
            target.properties()[operation.target_index()].clone();

        let assign = self.compile_assign(operation.strategy())?;

        Ok(Box::new(
            move |mapper: &Mapper<C>,
                  source: &dyn Any,
                  target: &mut dyn Any|
                  -> Result<(), MapError> {
                let value = source_property.read(source)?;

                match target_property.write(target)? {
                    Some(slot) => assign(mapper, value, slot),
                    None => Ok(()),
                }
            },
        ))
    }

    /// Compiles a strategy that writes into an existing target value.
    ///
    /// Scalars and collections are updated in place, everything else is
    /// produced anew and moved into the slot.
    fn compile_assign(
        &self,
        strategy: &CopyStrategy,
    ) -> Result<Assign<C>, MapError> {
        match strategy {
            CopyStrategy::Direct(shape) => {
                let clone_into = shape.clone_into_fn();
                let type_name = shape.type_name();

                Ok(Box::new(
                    move |_: &Mapper<C>,
                          source: &dyn Any,
                          slot: &mut dyn Any|
                          -> Result<(), MapError> {
                        if clone_into(source, slot) {
                            Ok(())
                        } else {
                            Err(TypeMismatchError::new(type_name).into())
                        }
                    },
                ))
            }

            CopyStrategy::Collection { source, target, element } => {
                let len = source.len_fn();
                let get = source.get_fn();
                let reset = target.reset_fn();
                let push = target.push_fn();
                let source_name = source.type_name();
                let target_name = target.type_name();
                let element = self.compile_producer(element)?;

                Ok(Box::new(
                    move |mapper: &Mapper<C>,
                          source: &dyn Any,
                          slot: &mut dyn Any|
                          -> Result<(), MapError> {
                        let length = len(source)
                            .ok_or(TypeMismatchError::new(source_name))?;

                        if !reset(slot, length) {
                            return Err(
                                TypeMismatchError::new(target_name).into()
                            );
                        }

                        for index in 0..length {
                            let value = get(source, index)
                                .ok_or(TypeMismatchError::new(source_name))?;

                            if !push(slot, element(mapper, value)?) {
                                return Err(TypeMismatchError::new(
                                    target_name,
                                )
                                .into());
                            }
                        }

                        Ok(())
                    },
                ))
            }

            CopyStrategy::Convert { .. }
            | CopyStrategy::Nested { .. }
            | CopyStrategy::Optional { .. } => {
                self.produce_then_assign(strategy)
            }
        }
    }

    fn produce_then_assign(
        &self,
        strategy: &CopyStrategy,
    ) -> Result<Assign<C>, MapError> {
        let (assign, type_name) = target_slot(strategy);
        let produce = self.compile_producer(strategy)?;

        Ok(Box::new(
            move |mapper: &Mapper<C>,
                  source: &dyn Any,
                  slot: &mut dyn Any|
                  -> Result<(), MapError> {
                if assign(slot, produce(mapper, source)?) {
                    Ok(())
                } else {
                    Err(TypeMismatchError::new(type_name).into())
                }
            },
        ))
    }

    /// Compiles a strategy that creates a new target value.
    fn compile_producer(
        &self,
        strategy: &CopyStrategy,
    ) -> Result<Producer<C>, MapError> {
        match strategy {
            CopyStrategy::Direct(shape) => {
                let clone_boxed = shape.clone_boxed_fn();
                let type_name = shape.type_name();

                Ok(Box::new(
                    move |_: &Mapper<C>,
                          source: &dyn Any|
                          -> Result<Instance, MapError> {
                        clone_boxed(source)
                            .ok_or(TypeMismatchError::new(type_name).into())
                    },
                ))
            }

            CopyStrategy::Convert { converter, .. } => {
                let converter = converter.clone();

                Ok(Box::new(
                    move |_: &Mapper<C>,
                          source: &dyn Any|
                          -> Result<Instance, MapError> {
                        converter.convert(source).ok_or_else(|| {
                            TypeMismatchError::new(converter.source_name())
                                .into()
                        })
                    },
                ))
            }

            CopyStrategy::Nested { key, .. } => {
                let link = self.mapper.link(key)?;

                Ok(Box::new(
                    move |mapper: &Mapper<C>,
                          source: &dyn Any|
                          -> Result<Instance, MapError> {
                        link.invoke(mapper, source)
                    },
                ))
            }

            CopyStrategy::Optional { source, target, inner } => {
                let get = source.get_fn();
                let wrap = target.wrap_fn();
                let source_name = source.type_name();
                let target_name = target.type_name();
                let inner = self.compile_producer(inner)?;

                Ok(Box::new(
                    move |mapper: &Mapper<C>,
                          source: &dyn Any|
                          -> Result<Instance, MapError> {
                        let value = get(source)
                            .ok_or(TypeMismatchError::new(source_name))?;

                        let produced = match value {
                            Some(value) => Some(inner(mapper, value)?),
                            None => None,
                        };

                        wrap(produced)
                            .ok_or(TypeMismatchError::new(target_name).into())
                    },
                ))
            }

            CopyStrategy::Collection { source, target, element } => {
                let len = source.len_fn();
                let get = source.get_fn();
                let with_capacity = target.with_capacity_fn();
                let push = target.push_fn();
                let source_name = source.type_name();
                let target_name = target.type_name();
                let element = self.compile_producer(element)?;

                Ok(Box::new(
                    move |mapper: &Mapper<C>,
                          source: &dyn Any|
                          -> Result<Instance, MapError> {
                        let length = len(source)
                            .ok_or(TypeMismatchError::new(source_name))?;
                        let mut collection = with_capacity(length);

                        for index in 0..length {
                            let value = get(source, index)
                                .ok_or(TypeMismatchError::new(source_name))?;

                            let value = element(mapper, value)?;

                            if !push(collection.as_mut(), value) {
                                return Err(TypeMismatchError::new(
                                    target_name,
                                )
                                .into());
                            }
                        }

                        Ok(collection)
                    },
                ))
            }
        }
    }
}

/// The assignment into a target slot of the strategy's target type.
fn target_slot(strategy: &CopyStrategy) -> (AssignFn, &'static str) {
    match strategy {
        CopyStrategy::Direct(shape) => (shape.assign_fn(), shape.type_name()),
        CopyStrategy::Convert { target, .. } => {
            (target.assign_fn(), target.type_name())
        }
        CopyStrategy::Nested { target, .. } => {
            (target.assign_fn(), target.type_name())
        }
        CopyStrategy::Optional { target, .. } => {
            (target.assign_fn(), target.type_name())
        }
        CopyStrategy::Collection { target, .. } => {
            (target.assign_fn(), target.type_name())
        }
    }
}
