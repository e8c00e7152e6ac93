//! Type descriptors: the canonical description of a mappable type.
//!
//! A [`TypeDescriptor`] lists the properties of a type in declaration order,
//! each with a [`Shape`] and type-erased accessors, plus an optional
//! constructor. Descriptors are normally produced by `#[derive(Mappable)]`
//! and interned once per mapper into a [`TypeHandle`], so that two handles
//! describe the same type if and only if they point to the same allocation.

use std::{
    any::{Any, TypeId},
    marker::PhantomData,
    ops::Deref,
    sync::Arc,
};

use fxhash::FxHashMap;

use crate::error::{ConstructionError, TypeMismatchError};

pub(crate) mod interner;
pub mod shape;

pub use shape::{
    CollectionShape, Instance, ObjectShape, OptionalShape, Property,
    ScalarShape, Shape,
};

/// A type whose properties can be copied by the [`Mapper`](crate::Mapper).
///
/// Usually derived with `#[derive(Mappable)]`. A manual implementation builds
/// its descriptor with [`TypeDescriptor::builder`]:
///
/// ```rust
/// use ubiquity::{
///     Mappable, Property,
///     descriptor::{Shape, TypeDescriptor},
/// };
///
/// #[derive(Debug, Default)]
/// struct Money {
///     cents: i64,
///     currency: String,
/// }
///
/// impl Property for Money {
///     fn shape() -> Shape { Shape::object::<Self>() }
/// }
///
/// impl Mappable for Money {
///     fn describe() -> TypeDescriptor {
///         TypeDescriptor::builder::<Self>()
///             .default_constructor()
///             .property("cents", |this| &this.cents, |this| &mut this.cents)
///             .read_only("currency", |this| &this.currency)
///             .build()
///     }
/// }
///
/// let descriptor = Money::describe();
/// assert_eq!(descriptor.properties().len(), 2);
/// ```
pub trait Mappable: Property + Sized {
    /// Describes the properties of this type.
    fn describe() -> TypeDescriptor;
}

/// A mappable value behind a trait object.
///
/// Lets [`Mapper::map_dyn`](crate::Mapper::map_dyn) resolve the source type
/// from the runtime type of the value.
pub trait Object: Any + Send + Sync {
    /// The object shape of the runtime type.
    fn object_shape(&self) -> ObjectShape;

    /// Upcasts to [`Any`].
    fn as_any(&self) -> &dyn Any;
}

impl<T: Mappable> Object for T {
    fn object_shape(&self) -> ObjectShape { ObjectShape::of::<T>() }

    fn as_any(&self) -> &dyn Any { self }
}

/// Canonical description of a mappable type.
pub struct TypeDescriptor {
    type_id: TypeId,
    name: &'static str,
    properties: Vec<PropertyDescriptor>,
    index: FxHashMap<&'static str, usize>,
    constructor: Option<fn() -> Instance>,
}

impl TypeDescriptor {
    /// Starts describing the type `S`.
    #[must_use]
    pub fn builder<S: Any + Send + Sync>() -> DescriptorBuilder<S> {
        DescriptorBuilder {
            properties: Vec::new(),
            constructor: None,
            _phantom: PhantomData,
        }
    }

    /// The `TypeId` of the described type.
    #[must_use]
    pub const fn described_type_id(&self) -> TypeId { self.type_id }

    /// The name of the described type.
    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }

    /// The properties in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor] { &self.properties }

    /// Looks up a property by name, returning its index and descriptor.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<(usize, &PropertyDescriptor)> {
        self.index.get(name).map(|&index| (index, &self.properties[index]))
    }

    /// Whether the mapper can create new instances of this type.
    #[must_use]
    pub const fn is_constructible(&self) -> bool { self.constructor.is_some() }

    /// Creates a new instance with the type's constructor.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if the type has no constructor.
    pub fn instantiate(&self) -> Result<Instance, ConstructionError> {
        self.constructor
            .map(|constructor| constructor())
            .ok_or(ConstructionError::new(self.name))
    }

    pub(crate) const fn constructor(&self) -> Option<fn() -> Instance> {
        self.constructor
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("properties", &self.properties)
            .field("constructible", &self.is_constructible())
            .finish()
    }
}

/// Builder for a [`TypeDescriptor`] of the type `S`.
pub struct DescriptorBuilder<S> {
    properties: Vec<PropertyDescriptor>,
    constructor: Option<fn() -> Instance>,
    _phantom: PhantomData<fn() -> S>,
}

impl<S: Any + Send + Sync> DescriptorBuilder<S> {
    /// Uses [`Default::default`] as the constructor.
    #[must_use]
    pub fn default_constructor(mut self) -> Self
    where
        S: Default,
    {
        self.constructor = Some(construct_default::<S>);
        self
    }

    /// Uses the given function as the constructor.
    #[must_use]
    pub fn constructor(mut self, constructor: fn() -> Instance) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Adds a readable and writable property.
    #[must_use]
    pub fn property<F: Property>(
        mut self,
        name: &'static str,
        read: fn(&S) -> &F,
        write: fn(&mut S) -> &mut F,
    ) -> Self {
        self.properties.push(PropertyDescriptor {
            name,
            shape: F::shape(),
            accessor: Arc::new(Accessor { read, write: Some(write) }),
        });
        self
    }

    /// Adds a property that can be read but never written by the mapper.
    #[must_use]
    pub fn read_only<F: Property>(
        mut self,
        name: &'static str,
        read: fn(&S) -> &F,
    ) -> Self {
        self.properties.push(PropertyDescriptor {
            name,
            shape: F::shape(),
            accessor: Arc::new(Accessor { read, write: None }),
        });
        self
    }

    /// Finishes the descriptor.
    ///
    /// When two properties share a name, the first one wins the name lookup.
    #[must_use]
    pub fn build(self) -> TypeDescriptor {
        let mut index = FxHashMap::default();
        for (position, property) in self.properties.iter().enumerate() {
            index.entry(property.name).or_insert(position);
        }

        TypeDescriptor {
            type_id: TypeId::of::<S>(),
            name: std::any::type_name::<S>(),
            properties: self.properties,
            index,
            constructor: self.constructor,
        }
    }
}

fn construct_default<S: Default + Any + Send>() -> Instance {
    Box::new(S::default())
}

/// A single named property of a [`TypeDescriptor`].
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: &'static str,
    shape: Shape,
    accessor: Arc<dyn ErasedAccessor>,
}

impl PropertyDescriptor {
    /// The property name used for matching.
    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }

    /// The shape of the property value.
    #[must_use]
    pub const fn shape(&self) -> &Shape { &self.shape }

    /// Whether the property has no write accessor.
    #[must_use]
    pub fn is_read_only(&self) -> bool { !self.accessor.is_writable() }

    /// Borrows the property value of `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`TypeMismatchError`] if `instance` is not of the declaring
    /// type.
    pub fn read<'a>(
        &self,
        instance: &'a dyn Any,
    ) -> Result<&'a dyn Any, TypeMismatchError> {
        self.accessor.read(instance)
    }

    /// Mutably borrows the property value of `instance`.
    ///
    /// Returns `Ok(None)` for read-only properties.
    ///
    /// # Errors
    ///
    /// Returns [`TypeMismatchError`] if `instance` is not of the declaring
    /// type.
    pub fn write<'a>(
        &self,
        instance: &'a mut dyn Any,
    ) -> Result<Option<&'a mut dyn Any>, TypeMismatchError> {
        self.accessor.write(instance)
    }
}

impl std::fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

trait ErasedAccessor: Send + Sync {
    fn is_writable(&self) -> bool;

    fn read<'a>(
        &self,
        instance: &'a dyn Any,
    ) -> Result<&'a dyn Any, TypeMismatchError>;

    fn write<'a>(
        &self,
        instance: &'a mut dyn Any,
    ) -> Result<Option<&'a mut dyn Any>, TypeMismatchError>;
}

struct Accessor<S, F> {
    read: fn(&S) -> &F,
    write: Option<fn(&mut S) -> &mut F>,
}

impl<S: Any + Send + Sync, F: Property> ErasedAccessor for Accessor<S, F> {
    fn is_writable(&self) -> bool { self.write.is_some() }

    fn read<'a>(
        &self,
        instance: &'a dyn Any,
    ) -> Result<&'a dyn Any, TypeMismatchError> {
        let instance = instance
            .downcast_ref::<S>()
            .ok_or(TypeMismatchError::new(std::any::type_name::<S>()))?;

        Ok((self.read)(instance))
    }

    fn write<'a>(
        &self,
        instance: &'a mut dyn Any,
    ) -> Result<Option<&'a mut dyn Any>, TypeMismatchError> {
        let instance = instance
            .downcast_mut::<S>()
            .ok_or(TypeMismatchError::new(std::any::type_name::<S>()))?;

        Ok(self.write.map(|write| write(instance) as &mut dyn Any))
    }
}

/// An interned, shared [`TypeDescriptor`].
///
/// Equality is identity: two handles are equal when they point to the same
/// descriptor. Within one mapper every type has exactly one descriptor, so
/// identity coincides with type equality.
#[derive(Clone)]
pub struct TypeHandle(Arc<TypeDescriptor>);

impl TypeHandle {
    pub(crate) fn new(descriptor: TypeDescriptor) -> Self {
        Self(Arc::new(descriptor))
    }

    /// Whether both handles point to the same descriptor.
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }
}

impl Deref for TypeHandle {
    type Target = TypeDescriptor;

    fn deref(&self) -> &Self::Target { &self.0 }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool { Self::ptr_eq(self, other) }
}

impl Eq for TypeHandle {}

impl std::hash::Hash for TypeHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.type_id.hash(state);
    }
}

impl std::fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.name)
    }
}
