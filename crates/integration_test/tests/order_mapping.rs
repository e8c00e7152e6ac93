//! End-to-end tests on the reference order model.

use std::sync::Arc;

use ubiquity::Mapper;
use ubiquity_integration_test::{
    Order, OrderView, ProductView, ReferenceView, create_order,
};

#[test]
fn order_copy_is_deep_and_equal() {
    let mapper = Mapper::new();
    let order = create_order();

    let copy: Order = mapper.map(&order).unwrap();

    assert_eq!(copy, order);
    assert_eq!(copy.id, 200);
    assert_eq!(copy.order_type.label, "Direct sell order");
    assert_eq!(copy.products.len(), 2);

    // new instances all the way down
    assert_ne!(copy.products.as_ptr(), order.products.as_ptr());
    assert_ne!(
        copy.order_type.label.as_ptr(),
        order.order_type.label.as_ptr()
    );
    for (copied, original) in copy.products.iter().zip(&order.products) {
        assert_eq!(copied, original);
        assert!(!std::ptr::eq(copied, original));
        assert_ne!(
            copied.product_type.code.as_ptr(),
            original.product_type.code.as_ptr()
        );
    }
}

#[test]
fn source_is_left_untouched() {
    let mapper = Mapper::new();
    let order = create_order();
    let snapshot = order.clone();

    let _: Order = mapper.map(&order).unwrap();

    assert_eq!(order, snapshot);
}

#[test]
fn nested_pairs_get_their_own_routines() {
    let mapper = Mapper::new();

    let _: Order = mapper.map(&create_order()).unwrap();

    // Order, Product, ReferenceObject
    let statistics = mapper.statistics();
    assert_eq!(statistics.routines, 3);
    assert_eq!(statistics.plans_built, 3);
    assert_eq!(statistics.descriptors, 3);
}

#[test]
fn repeated_mapping_reuses_the_routine() {
    let mapper = Mapper::new();
    let order = create_order();

    let before = mapper.routine::<Order, Order>().unwrap();
    for _ in 0..100 {
        let copy: Order = mapper.map(&order).unwrap();
        assert_eq!(copy, order);
    }
    let after = mapper.routine::<Order, Order>().unwrap();

    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(mapper.statistics().plans_built, 3);
    assert_eq!(mapper.statistics().routines_compiled, 3);
}

#[test]
fn order_maps_into_a_differently_shaped_view() {
    let mapper = Mapper::new();
    let order = create_order();

    let view: OrderView = mapper.map(&order).unwrap();

    assert_eq!(view.id, 200);
    assert_eq!(view.order_type, ReferenceView {
        code: "DIRECT".to_owned(),
        label: "Direct sell order".to_owned(),
    });
    assert_eq!(
        view.products.iter().cloned().collect::<Vec<_>>(),
        vec![
            ProductView {
                name: "product 1".to_owned(),
                product_type: ReferenceView {
                    code: "NICE".to_owned(),
                    label: "Nice and lovely products".to_owned(),
                },
                price: 0,
            },
            ProductView {
                name: "product 2".to_owned(),
                product_type: ReferenceView {
                    code: "KAWAII".to_owned(),
                    label: "Kawaii japanese stuff".to_owned(),
                },
                price: 0,
            },
        ]
    );
    assert!(view.comment.is_empty());
}

#[test]
fn map_into_overwrites_matched_properties_only() {
    let mapper = Mapper::new();
    let order = create_order();
    let mut view = OrderView {
        id: -1,
        comment: "keep me".to_owned(),
        ..OrderView::default()
    };

    mapper.map_into(&order, &mut view).unwrap();

    assert_eq!(view.id, 200);
    assert_eq!(view.products.len(), 2);
    assert_eq!(view.comment, "keep me");
}
