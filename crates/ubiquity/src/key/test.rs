use std::{
    any::{Any, TypeId},
    hash::{BuildHasher, Hash, Hasher},
};

use fxhash::FxBuildHasher;

use crate::{
    Mappable, TypeHandle, TypePairKey, config::DefaultConfig,
    descriptor::interner::DescriptorInterner,
};

#[derive(Debug, Default, Mappable)]
#[mappable(crate = crate)]
struct Customer {
    id: u64,
}

#[derive(Debug, Default, Mappable)]
#[mappable(crate = crate)]
struct CustomerRecord {
    id: u64,
}

fn handles() -> (TypeHandle, TypeHandle) {
    let interner = DescriptorInterner::<DefaultConfig>::new();
    (interner.intern::<Customer>(), interner.intern::<CustomerRecord>())
}

fn hash_of(key: &TypePairKey) -> u64 {
    let mut hasher = FxBuildHasher::default().build_hasher();
    key.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn same_pair_is_equal() {
    let (customer, record) = handles();

    let first = TypePairKey::new(customer.clone(), record.clone());
    let second = TypePairKey::new(customer, record);

    assert_eq!(first, second);
    assert_eq!(first.hash_value(), second.hash_value());
    assert_eq!(hash_of(&first), hash_of(&second));
}

#[test]
fn pair_order_matters() {
    let (customer, record) = handles();

    let forward = TypePairKey::new(customer.clone(), record.clone());
    let backward = TypePairKey::new(record, customer);

    assert_ne!(forward, backward);
}

#[test]
fn identical_components_are_equal() {
    let (customer, _) = handles();

    let key = TypePairKey::new(customer.clone(), customer);

    assert_eq!(key, key.clone());
    assert_eq!(key.source(), key.target());
}

#[test]
fn absent_components_do_not_panic() {
    let (customer, _) = handles();

    let empty = TypePairKey::from_parts(None, None);
    let half = TypePairKey::from_parts(Some(customer.clone()), None);
    let other_half = TypePairKey::from_parts(None, Some(customer));

    assert_eq!(empty, TypePairKey::from_parts(None, None));
    assert_eq!(hash_of(&empty), hash_of(&TypePairKey::from_parts(None, None)));
    assert_ne!(half, other_half);
    assert_ne!(empty, half);
    assert_eq!(empty.source_name(), "<absent>");
}

#[test]
fn handles_from_different_interners_are_distinct() {
    let (first, _) = handles();
    let (second, _) = handles();

    assert_eq!(first.described_type_id(), second.described_type_id());
    assert_ne!(
        TypePairKey::new(first.clone(), first),
        TypePairKey::new(second.clone(), second)
    );
}

#[test]
fn debug_shows_direction() {
    let (customer, record) = handles();

    let key = TypePairKey::new(customer, record);
    let debug = format!("{key:?}");

    assert!(debug.contains("Customer -> "));
    assert!(debug.ends_with("CustomerRecord"));
}

#[test]
fn handles_report_the_described_type() {
    let (customer, record) = handles();

    assert_eq!(customer.described_type_id(), TypeId::of::<Customer>());
    assert_eq!(record.described_type_id(), TypeId::of::<CustomerRecord>());

    // `Any` in scope must not change what a handle reports
    assert_ne!(customer.described_type_id(), Any::type_id(&customer));
}
