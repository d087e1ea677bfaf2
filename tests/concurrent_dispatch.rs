//! Ordering under concurrent workers, and parent resolution over random trees.

use build_events::operation::{
    BuildOperationCategory, ExecuteTaskDetails, OperationOutcome, RunBuildWorkDetails,
};
use build_events::types::{DispatchConfig, OperationId, ParentResolution};
use build_events::{
    Config, MapperRegistry, OperationFinish, OperationStart, OperationType, ProgressBridge,
    ProgressEvent, ProgressMessage, ProgressStream, SubscriptionSet,
};
use chrono::Utc;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn bridge(parent_resolution: ParentResolution) -> ProgressBridge {
    let config = Config {
        dispatch: DispatchConfig {
            listener_queue_capacity: 16 * 1024,
            parent_resolution,
        },
        ..Config::default()
    };
    ProgressBridge::new(&config, MapperRegistry::with_default_mappers().unwrap()).unwrap()
}

fn start(id: u64, parent: Option<u64>, is_task: bool) -> OperationStart {
    let parent = parent.map(OperationId::new);
    if is_task {
        OperationStart::new(
            OperationId::new(id),
            parent,
            BuildOperationCategory::Task,
            ExecuteTaskDetails {
                task_path: format!(":t{id}"),
                build_path: ":".to_string(),
                task_class: "DefaultTask".to_string(),
            },
            Utc::now(),
        )
    } else {
        OperationStart::new(
            OperationId::new(id),
            parent,
            BuildOperationCategory::RunWork,
            RunBuildWorkDetails {
                build_path: ":".to_string(),
            },
            Utc::now(),
        )
    }
}

fn finish(id: u64) -> OperationFinish {
    OperationFinish::new(OperationId::new(id), Utc::now(), OperationOutcome::Success)
}

fn events(stream: &mut ProgressStream) -> Vec<ProgressEvent> {
    stream
        .drain()
        .into_iter()
        .filter_map(|message| match message {
            ProgressMessage::Event { event, .. } => Some(event),
            ProgressMessage::EndOfStream { .. } => None,
        })
        .collect()
}

/// Every event refers to a parent that is open at that point of the stream,
/// and every operation starts before it finishes.
fn assert_well_nested(events: &[ProgressEvent]) {
    let mut open = HashSet::new();
    for event in events {
        let descriptor = event.descriptor();
        let id = descriptor.id();
        if let Some(parent) = descriptor.parent_id() {
            assert!(open.contains(&parent), "{id} refers to closed parent {parent}");
        }
        if event.is_started() {
            assert!(open.insert(id), "{id} started twice");
        } else {
            assert!(open.remove(&id), "{id} finished before starting");
        }
    }
    assert!(open.is_empty(), "operations left open: {open:?}");
}

#[test]
fn test_concurrent_workers_preserve_nesting() {
    const WORKERS: u64 = 8;
    const TASKS_PER_WORKER: u64 = 200;

    let bridge = bridge(ParentResolution::NearestEnabledAncestor);
    let mut stream = bridge.connect(SubscriptionSet::all());
    let dispatcher = bridge.begin_build();

    dispatcher.on_start(start(0, None, false)).unwrap();
    std::thread::scope(|scope| {
        for worker in 0..WORKERS {
            let dispatcher = &dispatcher;
            scope.spawn(move || {
                let phase = 1 + worker * (TASKS_PER_WORKER + 1);
                dispatcher.on_start(start(phase, Some(0), false)).unwrap();
                for offset in 1..=TASKS_PER_WORKER {
                    let id = phase + offset;
                    dispatcher.on_start(start(id, Some(phase), true)).unwrap();
                    dispatcher.on_finish(finish(id)).unwrap();
                }
                dispatcher.on_finish(finish(phase)).unwrap();
            });
        }
    });
    dispatcher.on_finish(finish(0)).unwrap();
    assert_eq!(dispatcher.complete(), 0);

    let events = events(&mut stream);
    assert_eq!(events.len() as u64, 2 * (1 + WORKERS * (TASKS_PER_WORKER + 1)));
    assert_well_nested(&events);
}

/// A random operation tree: node `i` has a parent among `0..i` or none, and
/// is either a task or a build phase.
fn tree() -> impl Strategy<Value = Vec<(Option<usize>, bool)>> {
    prop::collection::vec((any::<Option<prop::sample::Index>>(), any::<bool>()), 1..40).prop_map(
        |nodes| {
            nodes
                .into_iter()
                .enumerate()
                .map(|(i, (parent, is_task))| {
                    let parent = if i == 0 { None } else { parent.map(|p| p.index(i)) };
                    (parent, is_task)
                })
                .collect()
        },
    )
}

/// Subscription set for a connection that wants tasks, build phases, both
/// or neither.
fn subscriptions(want_tasks: bool, want_phases: bool) -> SubscriptionSet {
    let mut requested = Vec::new();
    if want_tasks {
        requested.push(OperationType::Task);
    }
    if want_phases {
        requested.push(OperationType::BuildPhase);
    }
    SubscriptionSet::new(requested)
}

/// Expected parent per visible operation for one connection.
fn expected_parents(
    nodes: &[(Option<usize>, bool)],
    enabled: impl Fn(bool) -> bool,
) -> HashMap<u64, Option<u64>> {
    let mut expected = HashMap::new();
    for (i, (parent, is_task)) in nodes.iter().enumerate() {
        if !enabled(*is_task) {
            continue;
        }
        let mut ancestor = *parent;
        while let Some(candidate) = ancestor {
            if enabled(nodes[candidate].1) {
                break;
            }
            ancestor = nodes[candidate].0;
        }
        expected.insert(i as u64, ancestor.map(|p| p as u64));
    }
    expected
}

proptest! {
    #[test]
    fn prop_children_reparent_to_nearest_ancestor_each_connection_saw(
        nodes in tree(),
        first in (any::<bool>(), any::<bool>()),
        second in (any::<bool>(), any::<bool>()),
    ) {
        let bridge = bridge(ParentResolution::NearestEnabledAncestor);
        let mut streams = [
            bridge.connect(subscriptions(first.0, first.1)),
            bridge.connect(subscriptions(second.0, second.1)),
        ];
        let dispatcher = bridge.begin_build();

        // Parents precede children by index, so ascending starts and
        // descending finishes form a valid schedule.
        for (i, (parent, is_task)) in nodes.iter().enumerate() {
            dispatcher.on_start(start(i as u64, parent.map(|p| p as u64), *is_task)).unwrap();
        }
        for i in (0..nodes.len()).rev() {
            dispatcher.on_finish(finish(i as u64)).unwrap();
        }
        prop_assert_eq!(dispatcher.complete(), 0);

        for (stream, (want_tasks, want_phases)) in streams.iter_mut().zip([first, second]) {
            let expected = expected_parents(&nodes, |is_task| {
                if is_task { want_tasks } else { want_phases }
            });

            let events = events(stream);
            prop_assert_eq!(events.len(), 2 * expected.len());
            assert_well_nested(&events);
            for event in &events {
                let descriptor = event.descriptor();
                let parent = expected.get(&descriptor.id().get()).copied();
                prop_assert_eq!(Some(descriptor.parent_id().map(OperationId::get)), parent);
            }
        }
    }
}
