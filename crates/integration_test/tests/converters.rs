//! User-registered converters for property types that differ.

use std::time::Duration;

use ubiquity::{Mappable, Mapper};
use ubiquity_integration_test::{Order, ReferenceObject, create_order};

#[derive(Debug, Clone, Default, PartialEq, Eq, Mappable)]
struct Shipment {
    weight_grams: u32,
    eta: Duration,
    reference: ReferenceObject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Mappable)]
struct ShipmentLabel {
    weight_grams: String,
    eta: u64,
    reference: String,
}

fn shipment() -> Shipment {
    Shipment {
        weight_grams: 1500,
        eta: Duration::from_secs(90),
        reference: ReferenceObject::new(3, "Express", "EXP"),
    }
}

#[test]
fn converters_apply_to_mismatched_pairs() {
    let mut mapper = Mapper::new();
    mapper.register_converter(|grams: &u32| format!("{grams} g"));
    mapper.register_converter(|eta: &Duration| eta.as_secs());

    let label: ShipmentLabel = mapper.map(&shipment()).unwrap();

    assert_eq!(label.weight_grams, "1500 g");
    assert_eq!(label.eta, 90);
    // no converter for the nested object
    assert!(label.reference.is_empty());
}

#[test]
fn converters_can_flatten_objects() {
    let mut mapper = Mapper::new();
    mapper.register_converter(|reference: &ReferenceObject| {
        reference.code.clone()
    });

    let label: ShipmentLabel = mapper.map(&shipment()).unwrap();

    assert_eq!(label.reference, "EXP");
}

#[test]
fn converters_override_same_type_copies() {
    let mut mapper = Mapper::new();
    mapper.register_converter(|code: &String| code.to_lowercase());

    let copy: Order = mapper.map(&create_order()).unwrap();

    assert_eq!(copy.order_type.code, "direct");
    assert_eq!(copy.products[1].product_type.code, "kawaii");
    assert_eq!(copy.id, 200);
}

#[test]
fn registration_clears_cached_routines() {
    let mut mapper = Mapper::new();
    let order = create_order();

    let before: Order = mapper.map(&order).unwrap();
    assert_eq!(before.order_type.label, "Direct sell order");
    assert_eq!(mapper.statistics().routines, 3);

    mapper.register_converter(|id: &i64| id + 1);
    assert_eq!(mapper.statistics().routines, 0);

    let after: Order = mapper.map(&order).unwrap();
    assert_eq!(after.id, 201);
    assert_eq!(after.products[0].id, 123_457);
    assert_eq!(mapper.statistics().routines_compiled, 6);
}

#[test]
fn registering_twice_replaces_the_converter() {
    let mut mapper = Mapper::new();

    let first = mapper.register_converter(|grams: &u32| grams.to_string());
    let replaced =
        mapper.register_converter(|grams: &u32| format!("{} kg", grams / 1000));

    assert!(first.is_none());
    assert!(replaced.is_some());
    assert_eq!(mapper.statistics().converters, 1);

    let label: ShipmentLabel = mapper.map(&shipment()).unwrap();
    assert_eq!(label.weight_grams, "1 kg");
}
