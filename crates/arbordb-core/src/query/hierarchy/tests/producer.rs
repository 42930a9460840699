use crate::{
    error::{HierarchyError, QueryError},
    obs::{StatisticsTraceEvent, StatisticsTraceSink, TraceComputerKind},
    query::{
        formula::Formula,
        hierarchy::{
            ChildrenStatisticsComputer, ComputerBase, HierarchyFilter, RootStatisticsComputer,
            SiblingsStatisticsComputer, StatisticsBase, StatisticsProducer, StatisticsType,
            StatisticsTypeSet,
        },
    },
    test_support::{RankingSorter, TreeIndex, context_for, execution},
};
use arbordb_primitives::PrimaryKey;
use std::{rc::Rc, sync::Mutex};

const CHILDREN: StatisticsTypeSet = StatisticsTypeSet::of(StatisticsType::ChildrenCount);

fn small_tree() -> Rc<TreeIndex> {
    Rc::new(TreeIndex::new().with_children(1, &[2, 3]).with_children(2, &[4]))
}

fn root_computer(
    producer: &StatisticsProducer<PrimaryKey>,
) -> RootStatisticsComputer<PrimaryKey> {
    RootStatisticsComputer::new(ComputerBase::new(
        producer.context().expect("open scope"),
        StatisticsBase::WithoutUserFilter,
        CHILDREN,
    ))
}

#[test]
fn registration_outside_a_scope_is_a_usage_error() {
    let mut producer: StatisticsProducer<PrimaryKey> = StatisticsProducer::new();
    let index = small_tree();
    let orphan_context = Rc::new(context_for(&index, &[]));
    let computer = RootStatisticsComputer::new(ComputerBase::new(
        orphan_context,
        StatisticsBase::WithoutUserFilter,
        CHILDREN,
    ));

    let err = producer
        .register_computer("megaMenu", computer.into())
        .expect_err("no scope");
    assert!(matches!(err, QueryError::MissingHierarchyScope { .. }));
}

#[test]
fn nested_scopes_fail_fast_naming_the_constraint() {
    let mut producer: StatisticsProducer<PrimaryKey> = StatisticsProducer::new();
    let index = small_tree();

    let err = producer
        .execute_within_scope(context_for(&index, &[]), |producer| {
            producer.execute_within_scope(
                context_for(&index, &[]).for_reference("brand"),
                |_| Ok(()),
            )
        })
        .expect_err("nested scope");

    match err {
        HierarchyError::Query(QueryError::NestedHierarchyScope { constraint }) => {
            assert_eq!(constraint, "hierarchyOfReference(`brand`)");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn scope_closes_even_when_the_body_fails() {
    let mut producer: StatisticsProducer<PrimaryKey> = StatisticsProducer::new();
    let index = small_tree();

    let result: Result<(), HierarchyError> = producer
        .execute_within_scope(context_for(&index, &[]), |_| {
            Err(QueryError::ScopeStillOpen.into())
        });
    assert!(result.is_err());

    // a new scope opens cleanly afterwards
    producer
        .execute_within_scope(context_for(&index, &[]), |_| Ok(()))
        .expect("reopened scope");
}

#[test]
fn duplicate_output_names_are_rejected_per_scope() {
    let mut producer: StatisticsProducer<PrimaryKey> = StatisticsProducer::new();
    let index = small_tree();

    let err = producer
        .execute_within_scope(context_for(&index, &[]), |producer| {
            let first = root_computer(producer);
            producer.register_computer("megaMenu", first.into())?;

            let second = root_computer(producer);
            Err::<(), HierarchyError>(producer
                .register_computer("megaMenu", second.into())
                .expect_err("duplicate name")
                .into())
        })
        .expect_err("duplicate");

    assert!(matches!(
        err,
        HierarchyError::Query(QueryError::DuplicateOutputName { ref name }) if name == "megaMenu"
    ));
}

#[test]
fn fabricate_inside_an_open_scope_is_rejected() {
    let mut producer: StatisticsProducer<PrimaryKey> = StatisticsProducer::new();
    let index = small_tree();

    let err = producer
        .execute_within_scope(context_for(&index, &[]), |producer| {
            producer.fabricate(&execution(&[])).map(|_| ())
        })
        .expect_err("open scope");
    assert!(matches!(
        err,
        HierarchyError::Query(QueryError::ScopeStillOpen)
    ));
}

#[test]
fn fabricate_combines_self_and_reference_hierarchies() {
    let mut producer: StatisticsProducer<PrimaryKey> = StatisticsProducer::new();
    let self_index = small_tree();
    let brand_index = Rc::new(TreeIndex::new().with_children(10, &[11, 12]));

    producer
        .execute_within_scope(context_for(&self_index, &[]), |producer| {
            let computer = root_computer(producer);
            producer.register_computer("megaMenu", computer.into())?;
            Ok(())
        })
        .expect("self scope");

    producer
        .execute_within_scope(
            context_for(&brand_index, &[]).for_reference("brand"),
            |producer| {
                let computer = root_computer(producer);
                producer.register_computer("brandMenu", computer.into())?;
                Ok(())
            },
        )
        .expect("reference scope");

    let hierarchy = producer.fabricate(&execution(&[])).expect("fabricate");

    assert!(!hierarchy.is_empty());
    let mega = &hierarchy.self_hierarchy["megaMenu"];
    assert_eq!(mega[0].primary_key, PrimaryKey(1));
    let brand = &hierarchy.reference_hierarchy["brand"]["brandMenu"];
    assert_eq!(brand[0].primary_key, PrimaryKey(10));
    assert_eq!(brand[0].children_count, Some(2));
}

#[test]
fn one_shared_sort_pass_covers_every_computer_of_a_set() {
    let mut producer: StatisticsProducer<PrimaryKey> = StatisticsProducer::new();
    let index = small_tree();
    let sorter = Rc::new(RankingSorter::new(&[3, 4, 2, 1]));

    producer
        .execute_within_scope(
            context_for(&index, &[])
                .with_hierarchy_filter(HierarchyFilter::within(Formula::constant(
                    [2].into_iter().collect(),
                )))
                .with_sorter(sorter),
            |producer| {
                let context = producer.context()?;
                producer.register_computer(
                    "menu",
                    RootStatisticsComputer::new(ComputerBase::new(
                        Rc::clone(&context),
                        StatisticsBase::WithoutUserFilter,
                        CHILDREN,
                    ))
                    .into(),
                )?;
                producer.register_computer(
                    "siblings",
                    SiblingsStatisticsComputer::new(ComputerBase::new(
                        context,
                        StatisticsBase::WithoutUserFilter,
                        CHILDREN,
                    ))
                    .into(),
                )?;
                Ok(())
            },
        )
        .expect("scope");

    let hierarchy = producer.fabricate(&execution(&[])).expect("fabricate");

    // ranking 3 < 2 reorders both outputs of the set
    let menu = &hierarchy.self_hierarchy["menu"];
    let children: Vec<u32> = menu[0]
        .children
        .iter()
        .map(|info| info.primary_key.as_u32())
        .collect();
    assert_eq!(children, [3, 2]);

    let siblings: Vec<u32> = hierarchy.self_hierarchy["siblings"]
        .iter()
        .map(|info| info.primary_key.as_u32())
        .collect();
    assert_eq!(siblings, [3, 2]);
}

#[test]
fn sort_pass_is_idempotent_over_fabrications() {
    let build = || {
        let mut producer: StatisticsProducer<PrimaryKey> = StatisticsProducer::new();
        let index = small_tree();
        let sorter = Rc::new(RankingSorter::new(&[4, 3, 2, 1]));

        producer
            .execute_within_scope(
                context_for(&index, &[]).with_sorter(sorter),
                |producer| {
                    let computer = root_computer(producer);
                    producer.register_computer("menu", computer.into())
                        .map_err(HierarchyError::from)
                },
            )
            .expect("scope");
        producer
    };

    let first = build().fabricate(&execution(&[])).expect("first");
    let second = build().fabricate(&execution(&[])).expect("second");
    assert_eq!(first.self_hierarchy, second.self_hierarchy);
}

#[test]
fn level_info_serializes_for_the_response_boundary() {
    let index = small_tree();
    let context = Rc::new(context_for(&index, &[]));
    let computer = RootStatisticsComputer::new(ComputerBase::new(
        context,
        StatisticsBase::WithoutUserFilter,
        CHILDREN,
    ));
    let infos = crate::query::hierarchy::StatisticsComputer::from(computer)
        .create_statistics(&execution(&[]))
        .expect("statistics");

    let json = serde_json::to_value(&infos).expect("serializable");
    assert_eq!(json[0]["primary_key"], 1);
    assert_eq!(json[0]["children_count"], 2);
    assert!(json[0]["queried_entity_count"].is_null());
}

//
// Trace
//

struct TestTraceSink;

static TRACE_EVENTS: Mutex<Vec<StatisticsTraceEvent>> = Mutex::new(Vec::new());
static TEST_TRACE_SINK: TestTraceSink = TestTraceSink;

impl StatisticsTraceSink for TestTraceSink {
    fn on_event(&self, event: StatisticsTraceEvent) {
        TRACE_EVENTS.lock().expect("trace lock").push(event);
    }
}

#[test]
fn fabrication_emits_start_computer_and_finish_events() {
    TRACE_EVENTS.lock().expect("trace lock").clear();

    let mut producer: StatisticsProducer<PrimaryKey> =
        StatisticsProducer::new().with_trace_sink(&TEST_TRACE_SINK);
    let index = small_tree();

    producer
        .execute_within_scope(
            context_for(&index, &[]).with_hierarchy_filter(HierarchyFilter::within(
                Formula::constant([2].into_iter().collect()),
            )),
            |producer| {
                let context = producer.context()?;
                producer.register_computer(
                    "fromNode",
                    ChildrenStatisticsComputer::new(ComputerBase::new(
                        context,
                        StatisticsBase::WithoutUserFilter,
                        CHILDREN,
                    ))
                    .into(),
                )?;
                Ok(())
            },
        )
        .expect("scope");

    producer.fabricate(&execution(&[])).expect("fabricate");

    let events = TRACE_EVENTS.lock().expect("trace lock");
    assert!(matches!(
        events[0],
        StatisticsTraceEvent::Start { outputs: 1, .. }
    ));
    assert!(matches!(
        events[1],
        StatisticsTraceEvent::Computer {
            kind: TraceComputerKind::Children,
            trees: 1,
            ..
        }
    ));
    assert!(matches!(
        events[2],
        StatisticsTraceEvent::Finish { outputs: 1, .. }
    ));
}
