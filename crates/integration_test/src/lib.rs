//! Shared fixture types for the `ubiquity` integration tests.
//!
//! The order model reproduces the reference scenario: an order with a
//! reference object and a list of products, each with its own reference
//! object.

#![allow(missing_docs)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]

use std::collections::VecDeque;

use ubiquity::{Config, CyclePolicy, Mappable};

// ============================================================================
// Order Model
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Mappable)]
pub struct ReferenceObject {
    pub id: i64,
    pub label: String,
    pub code: String,
}

impl ReferenceObject {
    pub fn new(id: i64, label: &str, code: &str) -> Self {
        Self { id, label: label.to_owned(), code: code.to_owned() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Mappable)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub product_type: ReferenceObject,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Mappable)]
pub struct Order {
    pub id: i64,
    pub order_type: ReferenceObject,
    pub products: Vec<Product>,
}

/// Creates the reference order: two products, three reference objects.
pub fn create_order() -> Order {
    Order {
        id: 200,
        order_type: ReferenceObject::new(10, "Direct sell order", "DIRECT"),
        products: vec![
            Product {
                id: 123_456,
                name: "product 1".to_owned(),
                description: "First test product, yeay !".to_owned(),
                product_type: ReferenceObject::new(
                    25,
                    "Nice and lovely products",
                    "NICE",
                ),
            },
            Product {
                id: 123_452,
                name: "product 2".to_owned(),
                description: "Second test product, yeay !".to_owned(),
                product_type: ReferenceObject::new(
                    22,
                    "Kawaii japanese stuff",
                    "KAWAII",
                ),
            },
        ],
    }
}

// ============================================================================
// Order Views (different target types)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Mappable)]
pub struct ReferenceView {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Mappable)]
pub struct ProductView {
    pub name: String,
    pub product_type: ReferenceView,
    pub price: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Mappable)]
pub struct OrderView {
    pub id: i64,
    pub order_type: ReferenceView,
    pub products: VecDeque<ProductView>,
    pub comment: String,
}

// ============================================================================
// Self-Referential Types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Mappable)]
pub struct Category {
    pub name: String,
    pub children: Vec<Category>,
}

impl Category {
    pub fn leaf(name: &str) -> Self {
        Self { name: name.to_owned(), children: Vec::new() }
    }

    pub fn node(name: &str, children: Vec<Self>) -> Self {
        Self { name: name.to_owned(), children }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Mappable)]
pub struct Department {
    pub name: String,
    pub teams: Vec<Team>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Mappable)]
pub struct Team {
    pub name: String,
    pub spin_off: Option<Department>,
}

// ============================================================================
// Unconstructible Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Mappable)]
#[mappable(no_constructor)]
pub struct Handle {
    pub id: i64,
    pub label: String,
}

impl Handle {
    pub fn new(label: &str) -> Self { Self { id: 0, label: label.to_owned() } }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Mappable)]
pub struct Holder {
    pub order_type: Option<ReferenceObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Mappable)]
#[mappable(no_constructor)]
pub struct HandleHolder {
    pub order_type: Option<Handle>,
}

// ============================================================================
// Configurations
// ============================================================================

/// Rejects self-referential type graphs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct FailFastConfig;

impl Config for FailFastConfig {
    type BuildHasher = fxhash::FxBuildHasher;

    fn cycle_policy() -> CyclePolicy { CyclePolicy::FailFast }
}

/// A single single-flight shard, to maximize contention in tests.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct SingleShardConfig;

impl Config for SingleShardConfig {
    type BuildHasher = fxhash::FxBuildHasher;

    fn shard_amount() -> usize { 1 }
}
