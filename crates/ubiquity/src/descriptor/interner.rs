use std::any::TypeId;

use dashmap::DashMap;

use crate::{
    config::Config,
    descriptor::{Mappable, ObjectShape, TypeHandle},
};

/// Interns one canonical [`TypeHandle`] per type.
pub(crate) struct DescriptorInterner<C: Config> {
    handles: DashMap<TypeId, TypeHandle, C::BuildHasher>,
}

impl<C: Config> DescriptorInterner<C> {
    pub fn new() -> Self {
        Self { handles: DashMap::with_hasher(C::BuildHasher::default()) }
    }

    pub fn intern<T: Mappable>(&self) -> TypeHandle {
        self.intern_shape(&ObjectShape::of::<T>())
    }

    pub fn intern_shape(&self, shape: &ObjectShape) -> TypeHandle {
        if let Some(handle) = self.handles.get(&shape.type_id()) {
            return handle.clone();
        }

        // describe outside of the shard lock; a racing thread may describe
        // the same type, the first insertion wins
        let descriptor = (shape.describe_fn())();

        self.handles
            .entry(shape.type_id())
            .or_insert_with(|| TypeHandle::new(descriptor))
            .clone()
    }

    pub fn len(&self) -> usize { self.handles.len() }
}

impl<C: Config> std::fmt::Debug for DescriptorInterner<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorInterner")
            .field("len", &self.handles.len())
            .finish()
    }
}
