//! Self-referential and mutually recursive type graphs.

use std::{sync::Barrier, thread};

use tracing_test::traced_test;
use ubiquity::{MapError, Mapper};
use ubiquity_integration_test::{Category, Department, FailFastConfig, Team};

fn catalog() -> Category {
    Category::node("catalog", vec![
        Category::node("books", vec![
            Category::leaf("fiction"),
            Category::leaf("poetry"),
        ]),
        Category::leaf("music"),
        Category::node("games", Vec::new()),
    ])
}

fn company() -> Department {
    Department {
        name: "engineering".to_owned(),
        teams: vec![
            Team { name: "compilers".to_owned(), spin_off: None },
            Team {
                name: "runtime".to_owned(),
                spin_off: Some(Department {
                    name: "research".to_owned(),
                    teams: vec![Team {
                        name: "gc".to_owned(),
                        spin_off: None,
                    }],
                }),
            },
        ],
    }
}

#[test]
fn self_referential_type_is_copied() {
    let mapper = Mapper::new();
    let catalog = catalog();

    let copy: Category = mapper.map(&catalog).unwrap();

    assert_eq!(copy, catalog);
    assert_eq!(copy.children[0].children[1].name, "poetry");
    assert!(copy.children[2].children.is_empty());
}

#[test]
fn self_referential_type_uses_a_single_routine() {
    let mapper = Mapper::new();

    let _: Category = mapper.map(&catalog()).unwrap();
    let _: Category = mapper.map(&catalog()).unwrap();

    let statistics = mapper.statistics();
    assert_eq!(statistics.routines_compiled, 1);
    assert_eq!(statistics.forward_links, 1);
}

#[test]
fn mutually_recursive_types_are_copied() {
    let mapper = Mapper::new();
    let company = company();

    let copy: Department = mapper.map(&company).unwrap();

    assert_eq!(copy, company);

    // Department and Team, the Department link from Team is forward
    let statistics = mapper.statistics();
    assert_eq!(statistics.routines_compiled, 2);
    assert_eq!(statistics.forward_links, 1);
}

#[test]
fn entering_the_cycle_from_the_other_side() {
    let mapper = Mapper::new();
    let mut engineering = company();
    let team = engineering.teams.remove(1);

    let copy: Team = mapper.map(&team).unwrap();
    let department: Department = mapper.map(&company()).unwrap();

    assert_eq!(copy, team);
    assert_eq!(department, company());
    assert_eq!(mapper.statistics().routines_compiled, 2);
}

#[test]
fn fail_fast_rejects_self_reference() {
    let mapper = Mapper::<FailFastConfig>::with_config();

    let result = mapper.map::<Category, Category>(&catalog());

    let Err(MapError::CyclicType(error)) = &result else {
        panic!("expected a cyclic type error, got {result:?}");
    };
    assert!(error.source_type().ends_with("Category"));
    assert!(error.target_type().ends_with("Category"));
    assert_eq!(mapper.statistics().routines, 0);
}

#[test]
fn fail_fast_publishes_nothing_for_mutual_recursion() {
    let mapper = Mapper::<FailFastConfig>::with_config();

    let result = mapper.map::<Department, Department>(&company());

    assert!(matches!(result, Err(MapError::CyclicType(_))));

    // the cycle is found before any plan is built or published
    let statistics = mapper.statistics();
    assert_eq!(statistics.routines, 0);
    assert_eq!(statistics.routines_compiled, 0);
    assert_eq!(statistics.plans_built, 0);
}

#[test]
fn fail_fast_is_independent_of_concurrent_builds() {
    for _ in 0..200 {
        let mapper = Mapper::<FailFastConfig>::with_config();
        let barrier = Barrier::new(2);

        let (departments, teams) = thread::scope(|scope| {
            let departments = scope.spawn(|| {
                barrier.wait();
                mapper.routine::<Department, Department>()
            });
            let teams = scope.spawn(|| {
                barrier.wait();
                mapper.routine::<Team, Team>()
            });

            (departments.join().unwrap(), teams.join().unwrap())
        });

        assert!(matches!(departments, Err(MapError::CyclicType(_))));
        assert!(matches!(teams, Err(MapError::CyclicType(_))));
        assert_eq!(mapper.statistics().routines, 0);
        assert_eq!(mapper.statistics().routines_compiled, 0);
    }
}

#[test]
#[traced_test]
fn forward_links_are_logged() {
    let mapper = Mapper::new();

    let _: Category = mapper.map(&catalog()).unwrap();

    assert!(logs_contain("linking forward reference"));
}
