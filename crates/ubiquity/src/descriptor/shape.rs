//! Value shapes: how a property's value is laid out and how to copy it
//! without knowing its static type.
//!
//! Every shape carries monomorphized function pointers created from the
//! concrete Rust type, so the compiled routines never inspect a value beyond a
//! single `TypeId` comparison per downcast.

use std::{
    any::{Any, TypeId},
    collections::VecDeque,
    sync::Arc,
    time::{Duration, SystemTime},
};

use crate::descriptor::{Mappable, TypeDescriptor};

/// An owned, type-erased value produced by a routine.
pub type Instance = Box<dyn Any + Send>;

/// A type that can appear as a property of a [`Mappable`] type.
///
/// Implemented for scalar leaves (integers, floats, `bool`, `char`,
/// `String`, `&'static str`, `Arc<str>`, `Duration`, `SystemTime`, `()`),
/// for `Option<T>`, `Vec<T>` and `VecDeque<T>`, and by
/// `#[derive(Mappable)]` for every derived type.
#[diagnostic::on_unimplemented(
    message = "The type `{Self}` cannot be used as a mappable property",
    note = "You can derive `Mappable` for your own structs using \
            `#[derive(Mappable)]`"
)]
pub trait Property: Any + Send + Sync {
    /// Returns the shape of this type.
    fn shape() -> Shape;
}

/// The layout of a property value.
#[derive(Debug, Clone)]
pub enum Shape {
    /// A leaf value copied by cloning.
    Scalar(ScalarShape),

    /// Another mappable type, copied through its own routine.
    Object(ObjectShape),

    /// `Option<T>`.
    Optional(OptionalShape),

    /// A sequence such as `Vec<T>`.
    Collection(CollectionShape),
}

impl Shape {
    /// Returns the object shape of the mappable type `T`.
    #[must_use]
    pub fn object<T: Mappable>() -> Self {
        Self::Object(ObjectShape::of::<T>())
    }

    /// Returns the scalar shape of the clonable type `T`.
    #[must_use]
    pub fn scalar<T: Clone + Any + Send + Sync>() -> Self {
        Self::Scalar(ScalarShape::of::<T>())
    }

    /// The `TypeId` of the described type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        match self {
            Self::Scalar(shape) => shape.type_id,
            Self::Object(shape) => shape.type_id,
            Self::Optional(shape) => shape.type_id,
            Self::Collection(shape) => shape.type_id,
        }
    }

    /// The name of the described type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(shape) => shape.type_name,
            Self::Object(shape) => shape.type_name,
            Self::Optional(shape) => shape.type_name,
            Self::Collection(shape) => shape.type_name,
        }
    }

    /// Moves an owned value of the described type into `slot`.
    ///
    /// Returns `false` if either side is not of the described type.
    pub(crate) const fn assign_fn(&self) -> AssignFn {
        match self {
            Self::Scalar(shape) => shape.assign,
            Self::Object(shape) => shape.assign,
            Self::Optional(shape) => shape.assign,
            Self::Collection(shape) => shape.assign,
        }
    }
}

pub(crate) type AssignFn = fn(&mut dyn Any, Instance) -> bool;

/// Shape of a leaf value copied with [`Clone`].
#[derive(Clone, Copy)]
pub struct ScalarShape {
    type_id: TypeId,
    type_name: &'static str,
    clone_into: fn(&dyn Any, &mut dyn Any) -> bool,
    clone_boxed: fn(&dyn Any) -> Option<Instance>,
    assign: AssignFn,
}

impl ScalarShape {
    /// Returns the scalar shape of `T`.
    #[must_use]
    pub fn of<T: Clone + Any + Send + Sync>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            clone_into: clone_into::<T>,
            clone_boxed: clone_boxed::<T>,
            assign: assign::<T>,
        }
    }

    /// The `TypeId` of the scalar type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId { self.type_id }

    /// The name of the scalar type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str { self.type_name }

    pub(crate) const fn clone_into_fn(
        &self,
    ) -> fn(&dyn Any, &mut dyn Any) -> bool {
        self.clone_into
    }

    pub(crate) const fn clone_boxed_fn(
        &self,
    ) -> fn(&dyn Any) -> Option<Instance> {
        self.clone_boxed
    }

    pub(crate) const fn assign_fn(&self) -> AssignFn { self.assign }
}

impl std::fmt::Debug for ScalarShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ScalarShape").field(&self.type_name).finish()
    }
}

/// Shape of a nested [`Mappable`] type.
#[derive(Clone, Copy)]
pub struct ObjectShape {
    type_id: TypeId,
    type_name: &'static str,
    describe: fn() -> TypeDescriptor,
    assign: AssignFn,
}

impl ObjectShape {
    /// Returns the object shape of `T`.
    #[must_use]
    pub fn of<T: Mappable>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            describe: T::describe,
            assign: assign::<T>,
        }
    }

    /// The `TypeId` of the object type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId { self.type_id }

    /// The name of the object type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str { self.type_name }

    pub(crate) const fn describe_fn(&self) -> fn() -> TypeDescriptor {
        self.describe
    }

    pub(crate) const fn assign_fn(&self) -> AssignFn { self.assign }
}

impl std::fmt::Debug for ObjectShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ObjectShape").field(&self.type_name).finish()
    }
}

/// Shape of `Option<T>`.
#[derive(Clone)]
pub struct OptionalShape {
    type_id: TypeId,
    type_name: &'static str,
    inner: Box<Shape>,
    get: fn(&dyn Any) -> Option<Option<&dyn Any>>,
    wrap: fn(Option<Instance>) -> Option<Instance>,
    assign: AssignFn,
}

impl OptionalShape {
    /// Returns the shape of `Option<T>`.
    #[must_use]
    pub fn of<T: Property>() -> Self {
        Self {
            type_id: TypeId::of::<Option<T>>(),
            type_name: std::any::type_name::<Option<T>>(),
            inner: Box::new(T::shape()),
            get: optional_get::<T>,
            wrap: optional_wrap::<T>,
            assign: assign::<Option<T>>,
        }
    }

    /// The `TypeId` of the optional type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId { self.type_id }

    /// The name of the optional type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str { self.type_name }

    /// The shape of the wrapped value.
    #[must_use]
    pub fn inner(&self) -> &Shape { &self.inner }

    pub(crate) const fn get_fn(
        &self,
    ) -> fn(&dyn Any) -> Option<Option<&dyn Any>> {
        self.get
    }

    pub(crate) const fn wrap_fn(
        &self,
    ) -> fn(Option<Instance>) -> Option<Instance> {
        self.wrap
    }

    pub(crate) const fn assign_fn(&self) -> AssignFn { self.assign }
}

impl std::fmt::Debug for OptionalShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionalShape")
            .field("type_name", &self.type_name)
            .field("inner", &self.inner)
            .finish()
    }
}

/// Shape of an ordered sequence (`Vec<T>`, `VecDeque<T>`).
#[derive(Clone)]
pub struct CollectionShape {
    type_id: TypeId,
    type_name: &'static str,
    element: Box<Shape>,
    len: fn(&dyn Any) -> Option<usize>,
    get: fn(&dyn Any, usize) -> Option<&dyn Any>,
    with_capacity: fn(usize) -> Instance,
    reset: fn(&mut dyn Any, usize) -> bool,
    push: fn(&mut dyn Any, Instance) -> bool,
    assign: AssignFn,
}

impl CollectionShape {
    pub(crate) fn of<S: Sequence>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            type_name: std::any::type_name::<S>(),
            element: Box::new(S::Element::shape()),
            len: sequence_len::<S>,
            get: sequence_get::<S>,
            with_capacity: sequence_with_capacity::<S>,
            reset: sequence_reset::<S>,
            push: sequence_push::<S>,
            assign: assign::<S>,
        }
    }

    /// The `TypeId` of the collection type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId { self.type_id }

    /// The name of the collection type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str { self.type_name }

    /// The shape of the elements.
    #[must_use]
    pub fn element(&self) -> &Shape { &self.element }

    pub(crate) const fn len_fn(&self) -> fn(&dyn Any) -> Option<usize> {
        self.len
    }

    pub(crate) const fn get_fn(
        &self,
    ) -> fn(&dyn Any, usize) -> Option<&dyn Any> {
        self.get
    }

    pub(crate) const fn with_capacity_fn(&self) -> fn(usize) -> Instance {
        self.with_capacity
    }

    pub(crate) const fn reset_fn(&self) -> fn(&mut dyn Any, usize) -> bool {
        self.reset
    }

    pub(crate) const fn push_fn(&self) -> fn(&mut dyn Any, Instance) -> bool {
        self.push
    }

    pub(crate) const fn assign_fn(&self) -> AssignFn { self.assign }
}

impl std::fmt::Debug for CollectionShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionShape")
            .field("type_name", &self.type_name)
            .field("element", &self.element)
            .finish()
    }
}

/// An ordered, index-addressable sequence of properties.
pub(crate) trait Sequence: Any + Send + Sync {
    type Element: Property;

    fn with_capacity(capacity: usize) -> Self;

    fn length(&self) -> usize;

    fn element(&self, index: usize) -> Option<&Self::Element>;

    fn clear_and_reserve(&mut self, capacity: usize);

    fn push_element(&mut self, element: Self::Element);
}

impl<T: Property> Sequence for Vec<T> {
    type Element = T;

    fn with_capacity(capacity: usize) -> Self { Self::with_capacity(capacity) }

    fn length(&self) -> usize { self.len() }

    fn element(&self, index: usize) -> Option<&T> { self.get(index) }

    fn clear_and_reserve(&mut self, capacity: usize) {
        *self = Self::with_capacity(capacity);
    }

    fn push_element(&mut self, element: T) { self.push(element); }
}

impl<T: Property> Sequence for VecDeque<T> {
    type Element = T;

    fn with_capacity(capacity: usize) -> Self { Self::with_capacity(capacity) }

    fn length(&self) -> usize { self.len() }

    fn element(&self, index: usize) -> Option<&T> { self.get(index) }

    fn clear_and_reserve(&mut self, capacity: usize) {
        *self = Self::with_capacity(capacity);
    }

    fn push_element(&mut self, element: T) { self.push_back(element); }
}

fn assign<T: Any>(slot: &mut dyn Any, value: Instance) -> bool {
    let Some(slot) = slot.downcast_mut::<T>() else {
        return false;
    };

    match value.downcast::<T>() {
        Ok(value) => {
            *slot = *value;
            true
        }
        Err(_) => false,
    }
}

fn clone_into<T: Clone + Any>(source: &dyn Any, target: &mut dyn Any) -> bool {
    match (source.downcast_ref::<T>(), target.downcast_mut::<T>()) {
        (Some(source), Some(target)) => {
            target.clone_from(source);
            true
        }
        _ => false,
    }
}

fn clone_boxed<T: Clone + Any + Send>(source: &dyn Any) -> Option<Instance> {
    source.downcast_ref::<T>().map(|value| Box::new(value.clone()) as Instance)
}

fn optional_get<T: Property>(source: &dyn Any) -> Option<Option<&dyn Any>> {
    source
        .downcast_ref::<Option<T>>()
        .map(|value| value.as_ref().map(|value| value as &dyn Any))
}

fn optional_wrap<T: Property>(value: Option<Instance>) -> Option<Instance> {
    match value {
        None => Some(Box::new(None::<T>)),
        Some(value) => value
            .downcast::<T>()
            .ok()
            .map(|value| Box::new(Some(*value)) as Instance),
    }
}

fn sequence_len<S: Sequence>(source: &dyn Any) -> Option<usize> {
    source.downcast_ref::<S>().map(Sequence::length)
}

fn sequence_get<S: Sequence>(
    source: &dyn Any,
    index: usize,
) -> Option<&dyn Any> {
    source
        .downcast_ref::<S>()
        .and_then(|sequence| sequence.element(index))
        .map(|element| element as &dyn Any)
}

fn sequence_with_capacity<S: Sequence>(capacity: usize) -> Instance {
    Box::new(S::with_capacity(capacity))
}

fn sequence_reset<S: Sequence>(target: &mut dyn Any, capacity: usize) -> bool {
    target.downcast_mut::<S>().is_some_and(|sequence| {
        sequence.clear_and_reserve(capacity);
        true
    })
}

fn sequence_push<S: Sequence>(target: &mut dyn Any, element: Instance) -> bool {
    let Some(sequence) = target.downcast_mut::<S>() else {
        return false;
    };

    match element.downcast::<S::Element>() {
        Ok(element) => {
            sequence.push_element(*element);
            true
        }
        Err(_) => false,
    }
}

impl<T: Property> Property for Option<T> {
    fn shape() -> Shape { Shape::Optional(OptionalShape::of::<T>()) }
}

impl<T: Property> Property for Vec<T> {
    fn shape() -> Shape { Shape::Collection(CollectionShape::of::<Self>()) }
}

impl<T: Property> Property for VecDeque<T> {
    fn shape() -> Shape { Shape::Collection(CollectionShape::of::<Self>()) }
}

macro_rules! scalar_property {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Property for $ty {
                fn shape() -> Shape { Shape::scalar::<Self>() }
            }
        )*
    };
}

scalar_property! {
    bool, char,
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
    f32, f64,
    String, &'static str, Arc<str>,
    Duration, SystemTime,
    (),
}
