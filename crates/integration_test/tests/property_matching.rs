//! Property matching rules: names, shapes and attributes.

use std::collections::VecDeque;

use ubiquity::{Mappable, Mapper};

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct Employee {
    id: u32,
    name: String,
    salary: f64,
    manager: Option<String>,
    skills: Vec<String>,
    #[mappable(read_only)]
    badge: String,
    #[mappable(skip)]
    password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct EmployeeRecord {
    id: u64,
    #[mappable(rename = "name")]
    full_name: String,
    salary: f64,
    manager: Option<String>,
    skills: VecDeque<String>,
    badge: String,
    password: String,
    office: String,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct Badge {
    #[mappable(read_only)]
    badge: String,
    name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct Wrapper<T> {
    value: T,
    values: Vec<T>,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct Keywords {
    r#type: String,
    r#match: bool,
}

fn employee() -> Employee {
    Employee {
        id: 7,
        name: "Grace".to_owned(),
        salary: 4200.5,
        manager: Some("Ada".to_owned()),
        skills: vec!["cobol".to_owned(), "navy".to_owned()],
        badge: "B-7".to_owned(),
        password: "hunter2".to_owned(),
    }
}

#[test]
fn matched_properties_are_copied() {
    let mapper = Mapper::new();

    let record: EmployeeRecord = mapper.map(&employee()).unwrap();

    assert_eq!(record.full_name, "Grace");
    assert!((record.salary - 4200.5).abs() < f64::EPSILON);
    assert_eq!(record.manager.as_deref(), Some("Ada"));
    assert_eq!(record.skills, ["cobol", "navy"]);
}

#[test]
fn incompatible_property_is_skipped() {
    let mapper = Mapper::new();

    let record: EmployeeRecord = mapper.map(&employee()).unwrap();

    // `u32` and `u64` are different scalar types
    assert_eq!(record.id, 0);
    assert!(mapper
        .routine::<Employee, EmployeeRecord>()
        .unwrap()
        .plan()
        .operation("id")
        .is_none());
}

#[test]
fn unmatched_property_keeps_its_default() {
    let mapper = Mapper::new();

    let record: EmployeeRecord = mapper.map(&employee()).unwrap();

    assert!(record.office.is_empty());
}

#[test]
fn read_only_source_is_readable() {
    let mapper = Mapper::new();

    let record: EmployeeRecord = mapper.map(&employee()).unwrap();

    assert_eq!(record.badge, "B-7");
}

#[test]
fn read_only_target_is_never_written() {
    let mapper = Mapper::new();

    let badge: Badge = mapper.map(&employee()).unwrap();

    assert!(badge.badge.is_empty());
    assert_eq!(badge.name, "Grace");
}

#[test]
fn skipped_field_is_invisible() {
    let mapper = Mapper::new();

    let record: EmployeeRecord = mapper.map(&employee()).unwrap();

    assert!(record.password.is_empty());
    assert!(mapper
        .descriptor::<Employee>()
        .property("password")
        .is_none());
}

#[test]
fn empty_collection_maps_to_empty_collection() {
    let mapper = Mapper::new();
    let source = Employee { skills: Vec::new(), ..employee() };

    let record: EmployeeRecord = mapper.map(&source).unwrap();

    assert!(record.skills.is_empty());
}

#[test]
fn absent_optional_clears_the_target() {
    let mapper = Mapper::new();
    let source = Employee { manager: None, ..employee() };
    let mut record = EmployeeRecord {
        manager: Some("Linus".to_owned()),
        ..EmployeeRecord::default()
    };

    mapper.map_into(&source, &mut record).unwrap();

    assert_eq!(record.manager, None);
}

#[test]
fn generic_types_are_mappable() {
    let mapper = Mapper::new();
    let source = Wrapper { value: 3_u8, values: vec![1, 2, 3] };

    let copy: Wrapper<u8> = mapper.map(&source).unwrap();
    let mismatched: Wrapper<u16> = mapper.map(&source).unwrap();

    assert_eq!(copy, source);
    assert_eq!(mismatched, Wrapper::default());
}

#[test]
fn raw_identifiers_use_plain_names() {
    let mapper = Mapper::new();
    let descriptor = mapper.descriptor::<Keywords>();

    let names = descriptor
        .properties()
        .iter()
        .map(ubiquity::descriptor::PropertyDescriptor::name)
        .collect::<Vec<_>>();

    assert_eq!(names, ["type", "match"]);

    let source = Keywords { r#type: "struct".to_owned(), r#match: true };
    let copy: Keywords = mapper.map(&source).unwrap();
    assert_eq!(copy, source);
}

#[test]
fn descriptor_lists_properties_in_declaration_order() {
    let mapper = Mapper::new();
    let descriptor = mapper.descriptor::<EmployeeRecord>();

    let names = descriptor
        .properties()
        .iter()
        .map(ubiquity::descriptor::PropertyDescriptor::name)
        .collect::<Vec<_>>();

    assert_eq!(names, [
        "id", "name", "salary", "manager", "skills", "badge", "password",
        "office"
    ]);
    assert!(descriptor.is_constructible());
}
