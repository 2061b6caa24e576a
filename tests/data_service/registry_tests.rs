//! Registry round-trip and concurrency tests

use datareduce_rs::{
    try_cast, DataService, FrameworkError, TableWorkspace, Workspace, Workspace2D, WorkspaceHandle,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;

fn handle(n: usize) -> WorkspaceHandle {
    Arc::new(Workspace2D::new(n, 2))
}

proptest! {
    #[test]
    fn add_then_retrieve_returns_same_object(name in "[A-Za-z_][A-Za-z0-9_]{0,16}", n in 1usize..5) {
        let service = DataService::new();
        let ws = handle(n);
        service.add(&name, Arc::clone(&ws)).unwrap();

        prop_assert!(Arc::ptr_eq(&service.retrieve(&name).unwrap(), &ws));
        prop_assert!(matches!(
            service.add(&name, handle(n)),
            Err(FrameworkError::DuplicateName(_))
        ));
    }

    #[test]
    fn add_or_replace_keeps_latest(name in "[a-z]{1,8}", count in 1usize..6) {
        let service = DataService::new();
        let handles: Vec<WorkspaceHandle> = (0..count).map(|i| handle(i + 1)).collect();
        for ws in &handles {
            service.add_or_replace(&name, Arc::clone(ws)).unwrap();
        }
        prop_assert!(Arc::ptr_eq(&service.retrieve(&name).unwrap(), &handles[count - 1]));
        prop_assert_eq!(service.len(), 1);
    }
}

#[test]
fn test_failed_cast_is_an_ordinary_none() {
    let service = DataService::new();
    service.add("table", Arc::new(TableWorkspace::new(2))).unwrap();

    let stored = service.retrieve("table").unwrap();
    assert!(try_cast::<Workspace2D>(&stored).is_none());
    assert!(try_cast::<TableWorkspace>(&stored).is_some());
}

#[test]
fn test_workspace_outlives_registry_entry() {
    let service = DataService::new();
    let ws = handle(3);
    service.add("ws", Arc::clone(&ws)).unwrap();

    let held = service.retrieve("ws").unwrap();
    service.remove("ws").unwrap();
    assert!(!service.does_exist("ws"));
    assert_eq!(held.id(), "Workspace2D");
    assert_eq!(Arc::strong_count(&ws), 2);
}

#[test]
fn test_concurrent_add_or_replace_is_last_writer_wins() {
    let service = Arc::new(DataService::new());
    let workers: Vec<_> = (0..8)
        .map(|t| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for i in 0..50 {
                    service.add_or_replace("shared", handle(t * 100 + i + 1)).unwrap();
                    let seen = service.retrieve("shared").unwrap();
                    assert!(try_cast::<Workspace2D>(&seen).is_some());
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(service.names(), vec!["shared".to_string()]);
    let last = service.retrieve_as::<Workspace2D>("shared").unwrap();
    assert!(last.n_histograms() > 0);
}

#[test]
fn test_concurrent_distinct_adds() {
    let service = Arc::new(DataService::new());
    let workers: Vec<_> = (0..4)
        .map(|t| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for i in 0..25 {
                    service.add(&format!("ws_{}_{}", t, i), handle(1)).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(service.len(), 100);
}
