//! Property plans: what to copy for a type pair, and how.
//!
//! A [`PropertyPlan`] is derived once per [`TypePairKey`] by matching every
//! writable target property with the same-named source property and choosing
//! a [`CopyStrategy`] for the pair of value shapes. Target properties without
//! a compatible source are left out of the plan; the target keeps whatever
//! value its constructor gave them.

use std::collections::HashSet;

use crate::{
    config::Config,
    convert::{Converter, ConverterRegistry},
    descriptor::{
        CollectionShape, ObjectShape, OptionalShape, ScalarShape, Shape,
        interner::DescriptorInterner,
    },
    key::TypePairKey,
};

/// How one property value is copied.
#[derive(Debug, Clone)]
pub enum CopyStrategy {
    /// Same scalar type on both sides, copied by cloning.
    Direct(ScalarShape),

    /// A registered converter produces the target value.
    Convert {
        /// The registered converter.
        converter: Converter,

        /// The shape of the produced value.
        target: Shape,
    },

    /// Object to object, through the routine of the nested pair.
    Nested {
        /// The key of the nested routine.
        key: TypePairKey,

        /// The target object shape.
        target: ObjectShape,
    },

    /// `Option` to `Option`.
    Optional {
        /// The source optional shape.
        source: OptionalShape,

        /// The target optional shape.
        target: OptionalShape,

        /// The strategy for the wrapped value.
        inner: Box<CopyStrategy>,
    },

    /// Sequence to sequence, element by element.
    Collection {
        /// The source collection shape.
        source: CollectionShape,

        /// The target collection shape.
        target: CollectionShape,

        /// The strategy for each element.
        element: Box<CopyStrategy>,
    },
}

impl CopyStrategy {
    /// The key of the nested routine this strategy delegates to, looking
    /// through optional and collection wrappers.
    #[must_use]
    pub fn nested_key(&self) -> Option<&TypePairKey> {
        match self {
            Self::Nested { key, .. } => Some(key),
            Self::Optional { inner, .. } => inner.nested_key(),
            Self::Collection { element, .. } => element.nested_key(),
            Self::Direct(_) | Self::Convert { .. } => None,
        }
    }
}

impl PartialEq for CopyStrategy {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Direct(a), Self::Direct(b)) => a.type_id() == b.type_id(),

            (
                Self::Convert { converter: a, target: a_target },
                Self::Convert { converter: b, target: b_target },
            ) => a == b && a_target.type_id() == b_target.type_id(),

            (Self::Nested { key: a, .. }, Self::Nested { key: b, .. }) => {
                a == b
            }

            (
                Self::Optional { source: a_source, target: a_target, inner: a },
                Self::Optional { source: b_source, target: b_target, inner: b },
            ) => {
                a_source.type_id() == b_source.type_id()
                    && a_target.type_id() == b_target.type_id()
                    && a == b
            }

            (
                Self::Collection {
                    source: a_source,
                    target: a_target,
                    element: a,
                },
                Self::Collection {
                    source: b_source,
                    target: b_target,
                    element: b,
                },
            ) => {
                a_source.type_id() == b_source.type_id()
                    && a_target.type_id() == b_target.type_id()
                    && a == b
            }

            _ => false,
        }
    }
}

impl Eq for CopyStrategy {}

/// One copy step of a [`PropertyPlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyOperation {
    name: &'static str,
    source_index: usize,
    target_index: usize,
    strategy: CopyStrategy,
}

impl PropertyOperation {
    /// The matched property name.
    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }

    /// The index of the property in the source descriptor.
    #[must_use]
    pub const fn source_index(&self) -> usize { self.source_index }

    /// The index of the property in the target descriptor.
    #[must_use]
    pub const fn target_index(&self) -> usize { self.target_index }

    /// How the value is copied.
    #[must_use]
    pub const fn strategy(&self) -> &CopyStrategy { &self.strategy }
}

/// The ordered copy operations for one type pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPlan {
    key: TypePairKey,
    operations: Vec<PropertyOperation>,
}

impl PropertyPlan {
    /// The pair this plan was derived for.
    #[must_use]
    pub const fn key(&self) -> &TypePairKey { &self.key }

    /// The operations in target declaration order.
    #[must_use]
    pub fn operations(&self) -> &[PropertyOperation] { &self.operations }

    /// Looks up the operation writing the target property `name`.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&PropertyOperation> {
        self.operations.iter().find(|operation| operation.name == name)
    }
}

/// Derives property plans.
pub(crate) struct PlanBuilder<'a, C: Config> {
    interner: &'a DescriptorInterner<C>,
    converters: &'a ConverterRegistry<C>,
}

impl<'a, C: Config> PlanBuilder<'a, C> {
    pub const fn new(
        interner: &'a DescriptorInterner<C>,
        converters: &'a ConverterRegistry<C>,
    ) -> Self {
        Self { interner, converters }
    }

    pub fn build(&self, key: &TypePairKey) -> PropertyPlan {
        let plan = self.derive(key);

        tracing::debug!(
            key = ?key,
            operations = plan.operations.len(),
            "built property plan"
        );

        plan
    }

    /// Finds a pair, reachable from `key` through nested strategies, whose
    /// plan leads back to the pair itself.
    ///
    /// Pairs for which `is_settled` returns `true` are known to be acyclic
    /// and are not descended into.
    pub fn find_cycle(
        &self,
        key: &TypePairKey,
        is_settled: impl Fn(&TypePairKey) -> bool,
    ) -> Option<TypePairKey> {
        let mut path = Vec::new();
        let mut acyclic = HashSet::with_hasher(C::BuildHasher::default());

        self.visit(key, &is_settled, &mut path, &mut acyclic)
    }

    fn visit(
        &self,
        key: &TypePairKey,
        is_settled: &impl Fn(&TypePairKey) -> bool,
        path: &mut Vec<TypePairKey>,
        acyclic: &mut HashSet<TypePairKey, C::BuildHasher>,
    ) -> Option<TypePairKey> {
        if path.contains(key) {
            return Some(key.clone());
        }

        if acyclic.contains(key) || is_settled(key) {
            return None;
        }

        path.push(key.clone());

        let plan = self.derive(key);
        for nested in plan
            .operations
            .iter()
            .filter_map(|operation| operation.strategy.nested_key())
        {
            if let Some(cycle) = self.visit(nested, is_settled, path, acyclic)
            {
                return Some(cycle);
            }
        }

        path.pop();
        acyclic.insert(key.clone());

        None
    }

    fn derive(&self, key: &TypePairKey) -> PropertyPlan {
        let (Some(source), Some(target)) = (key.source(), key.target()) else {
            return PropertyPlan { key: key.clone(), operations: Vec::new() };
        };

        let mut operations = Vec::with_capacity(target.properties().len());

        for (target_index, target_property) in
            target.properties().iter().enumerate()
        {
            if target_property.is_read_only() {
                tracing::trace!(
                    property = target_property.name(),
                    "skipping read-only target property"
                );
                continue;
            }

            let Some((source_index, source_property)) =
                source.property(target_property.name())
            else {
                tracing::trace!(
                    property = target_property.name(),
                    "skipping target property without a source"
                );
                continue;
            };

            let Some(strategy) =
                self.classify(source_property.shape(), target_property.shape())
            else {
                tracing::trace!(
                    property = target_property.name(),
                    source_type = source_property.shape().type_name(),
                    target_type = target_property.shape().type_name(),
                    "skipping incompatible property"
                );
                continue;
            };

            operations.push(PropertyOperation {
                name: target_property.name(),
                source_index,
                target_index,
                strategy,
            });
        }

        PropertyPlan { key: key.clone(), operations }
    }

    fn classify(&self, source: &Shape, target: &Shape) -> Option<CopyStrategy> {
        if let Some(converter) =
            self.converters.get(source.type_id(), target.type_id())
        {
            return Some(CopyStrategy::Convert {
                converter: converter.clone(),
                target: target.clone(),
            });
        }

        match (source, target) {
            (Shape::Scalar(source), Shape::Scalar(target))
                if source.type_id() == target.type_id() =>
            {
                Some(CopyStrategy::Direct(*target))
            }

            (Shape::Object(source), Shape::Object(target)) => {
                Some(CopyStrategy::Nested {
                    key: TypePairKey::new(
                        self.interner.intern_shape(source),
                        self.interner.intern_shape(target),
                    ),
                    target: *target,
                })
            }

            (Shape::Optional(source), Shape::Optional(target)) => self
                .classify(source.inner(), target.inner())
                .map(|inner| CopyStrategy::Optional {
                    source: source.clone(),
                    target: target.clone(),
                    inner: Box::new(inner),
                }),

            (Shape::Collection(source), Shape::Collection(target)) => self
                .classify(source.element(), target.element())
                .map(|element| CopyStrategy::Collection {
                    source: source.clone(),
                    target: target.clone(),
                    element: Box::new(element),
                }),

            _ => None,
        }
    }
}
