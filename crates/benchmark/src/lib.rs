//! Fixtures for the order-copy benchmark.

#![allow(missing_docs)]

use ubiquity::{Config, Mappable};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct BenchConfig;

impl Config for BenchConfig {
    type BuildHasher = fxhash::FxBuildHasher;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Mappable)]
pub struct ReferenceObject {
    pub id: i64,
    pub label: String,
    pub code: String,
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

#[must_use]
pub fn create_order() -> Order {
    let reference = |id, label: &str, code: &str| ReferenceObject {
        id,
        label: label.to_owned(),
        code: code.to_owned(),
    };

    Order {
        id: 200,
        order_type: reference(10, "Direct sell order", "DIRECT"),
        products: vec![
            Product {
                id: 123_456,
                name: "product 1".to_owned(),
                product_type: reference(25, "Nice and lovely products", "NICE"),
                description: "First test product, yeay !".to_owned(),
            },
            Product {
                id: 123_452,
                name: "product 2".to_owned(),
                product_type: reference(22, "Kawaii japanese stuff", "KAWAII"),
                description: "Second test product, yeay !".to_owned(),
            },
        ],
    }
}

/// The copy a developer would write by hand, field by field.
#[must_use]
pub fn copy_by_hand(order: &Order) -> Order {
    let copy_reference = |reference: &ReferenceObject| ReferenceObject {
        id: reference.id,
        label: reference.label.clone(),
        code: reference.code.clone(),
    };

    Order {
        id: order.id,
        order_type: copy_reference(&order.order_type),
        products: order
            .products
            .iter()
            .map(|product| Product {
                id: product.id,
                name: product.name.clone(),
                product_type: copy_reference(&product.product_type),
                description: product.description.clone(),
            })
            .collect(),
    }
}
