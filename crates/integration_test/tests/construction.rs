//! Targets the mapper cannot instantiate.

use ubiquity::{ConstructionError, MapError, Mapper};
use ubiquity_integration_test::{
    Handle, HandleHolder, Holder, ReferenceObject,
};

#[test]
fn unconstructible_target_is_rejected_before_the_cache() {
    let mapper = Mapper::new();
    let source = ReferenceObject::new(1, "label", "CODE");

    let result = mapper.map::<ReferenceObject, Handle>(&source);

    let Err(MapError::Construction(error)) = result else {
        panic!("expected a construction error");
    };
    assert!(error.type_name().ends_with("Handle"));

    let statistics = mapper.statistics();
    assert_eq!(statistics.routines, 0);
    assert_eq!(statistics.plans_built, 0);
    assert_eq!(statistics.cache_misses, 0);
}

#[test]
fn unconstructible_target_can_be_populated() {
    let mapper = Mapper::new();
    let source = ReferenceObject::new(1, "label", "CODE");
    let mut handle = Handle::new("old");

    mapper.map_into(&source, &mut handle).unwrap();

    assert_eq!(handle, Handle { id: 1, label: "label".to_owned() });
}

#[test]
fn unconstructible_type_can_be_a_source() {
    let mapper = Mapper::new();
    let handle = Handle { id: 9, label: "nine".to_owned() };

    let reference: ReferenceObject = mapper.map(&handle).unwrap();

    assert_eq!(reference, ReferenceObject::new(9, "nine", ""));
}

#[test]
fn nested_unconstructible_target_fails_when_present() {
    let mapper = Mapper::new();
    let source = Holder {
        order_type: Some(ReferenceObject::new(1, "label", "CODE")),
    };
    let mut destination = HandleHolder { order_type: None };

    let result = mapper.map_into(&source, &mut destination);

    assert_eq!(
        result,
        Err(MapError::Construction(ConstructionError::new(
            std::any::type_name::<Handle>()
        )))
    );
    // the routine itself was built and stays cached
    assert_eq!(mapper.statistics().routines, 2);
}

#[test]
fn nested_unconstructible_target_is_fine_when_absent() {
    let mapper = Mapper::new();
    let source = Holder { order_type: None };
    let mut destination =
        HandleHolder { order_type: Some(Handle::new("stale")) };

    mapper.map_into(&source, &mut destination).unwrap();

    assert_eq!(destination.order_type, None);
}
