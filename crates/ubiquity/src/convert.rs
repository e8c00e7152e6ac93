//! User-registered conversions between property types that differ.
//!
//! The plan builder consults the registry before any other classification, so
//! a converter also overrides the default copy of same-typed properties.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use crate::{config::Config, descriptor::Instance};

type ConvertFn = dyn Fn(&dyn Any) -> Option<Instance> + Send + Sync;

/// A type-erased conversion from one property type to another.
#[derive(Clone)]
pub struct Converter {
    source_type: TypeId,
    target_type: TypeId,
    source_name: &'static str,
    target_name: &'static str,
    convert: Arc<ConvertFn>,
}

impl Converter {
    /// Wraps a conversion function from `A` to `B`.
    pub fn new<A: Any, B: Any + Send>(
        convert: impl Fn(&A) -> B + Send + Sync + 'static,
    ) -> Self {
        Self {
            source_type: TypeId::of::<A>(),
            target_type: TypeId::of::<B>(),
            source_name: std::any::type_name::<A>(),
            target_name: std::any::type_name::<B>(),
            convert: Arc::new(move |source: &dyn Any| {
                source
                    .downcast_ref::<A>()
                    .map(|source| Box::new(convert(source)) as Instance)
            }),
        }
    }

    /// The `TypeId` of the converted type.
    #[must_use]
    pub const fn source_type(&self) -> TypeId { self.source_type }

    /// The `TypeId` of the produced type.
    #[must_use]
    pub const fn target_type(&self) -> TypeId { self.target_type }

    /// The name of the converted type.
    #[must_use]
    pub const fn source_name(&self) -> &'static str { self.source_name }

    /// The name of the produced type.
    #[must_use]
    pub const fn target_name(&self) -> &'static str { self.target_name }

    /// Converts a value, returning `None` if it is not of the source type.
    #[must_use]
    pub fn convert(&self, source: &dyn Any) -> Option<Instance> {
        (self.convert)(source)
    }
}

impl PartialEq for Converter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.convert, &other.convert)
    }
}

impl Eq for Converter {}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Converter({} -> {})", self.source_name, self.target_name)
    }
}

/// Converters indexed by `(source type, target type)`.
pub(crate) struct ConverterRegistry<C: Config> {
    converters: HashMap<(TypeId, TypeId), Converter, C::BuildHasher>,
}

impl<C: Config> ConverterRegistry<C> {
    pub fn new() -> Self {
        Self { converters: HashMap::with_hasher(C::BuildHasher::default()) }
    }

    /// Registers a converter, returning the one it replaces.
    pub fn insert(&mut self, converter: Converter) -> Option<Converter> {
        self.converters.insert(
            (converter.source_type, converter.target_type),
            converter,
        )
    }

    pub fn get(&self, source: TypeId, target: TypeId) -> Option<&Converter> {
        self.converters.get(&(source, target))
    }

    pub fn len(&self) -> usize { self.converters.len() }
}

impl<C: Config> std::fmt::Debug for ConverterRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.converters.values()).finish()
    }
}
