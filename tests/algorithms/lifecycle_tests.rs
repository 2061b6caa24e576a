//! Tests for the initialize/execute life cycle, child algorithms and
//! cancellation

use crate::test_helpers::service_with;
use datareduce_rs::algorithm::{
    Algorithm, AlgorithmManager, AlgorithmState, ExecutionContext, InitContext,
};
use datareduce_rs::properties::Direction;
use datareduce_rs::{DataService, FrameworkError, Result, Workspace2D};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Doubles every Y value and remembers the workspace it produced.
struct Doubler {
    init_calls: Arc<AtomicUsize>,
    produced: Arc<Mutex<Option<Arc<Workspace2D>>>>,
}

impl Algorithm for Doubler {
    fn name(&self) -> &str {
        "Doubler"
    }

    fn init(&mut self, ctx: &mut InitContext<'_>) -> Result<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        ctx.declare_workspace::<Workspace2D>("InputWorkspace", Direction::Input, "")?;
        ctx.declare_workspace::<Workspace2D>("OutputWorkspace", Direction::Output, "")?;
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let input = ctx.get_workspace::<Workspace2D>("InputWorkspace")?;
        let output = Arc::new(input.map_spectra(usize::MAX, |_, y, _| {
            y.iter_mut().for_each(|v| *v *= 2.0)
        }));
        *self.produced.lock() = Some(Arc::clone(&output));
        ctx.set_workspace("OutputWorkspace", output)
    }
}

/// Fails with a recognized error, or panics.
struct Failing {
    panic: bool,
}

impl Algorithm for Failing {
    fn name(&self) -> &str {
        if self.panic {
            "Panicking"
        } else {
            "Failing"
        }
    }

    fn init(&mut self, _ctx: &mut InitContext<'_>) -> Result<()> {
        Ok(())
    }

    fn exec(&mut self, _ctx: &mut ExecutionContext<'_>) -> Result<()> {
        if self.panic {
            panic!("numerical blow-up");
        }
        Err(FrameworkError::Runtime("bad input".to_string()))
    }
}

/// Checks for cancellation before doing anything.
struct Interruptible;

impl Algorithm for Interruptible {
    fn name(&self) -> &str {
        "Interruptible"
    }

    fn init(&mut self, _ctx: &mut InitContext<'_>) -> Result<()> {
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        for _ in 0..3 {
            ctx.interruption_point()?;
        }
        Ok(())
    }
}

/// Declaring its properties always fails.
struct BadInit;

impl Algorithm for BadInit {
    fn name(&self) -> &str {
        "BadInit"
    }

    fn init(&mut self, ctx: &mut InitContext<'_>) -> Result<()> {
        ctx.declare_value("Value", 1.0_f64, Direction::Input)?;
        Err(FrameworkError::InvalidArgument("cannot declare".to_string()))
    }

    fn exec(&mut self, _ctx: &mut ExecutionContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Runs the child named by `Child` and reports what happened to it.
struct Parent;

impl Algorithm for Parent {
    fn name(&self) -> &str {
        "Parent"
    }

    fn init(&mut self, ctx: &mut InitContext<'_>) -> Result<()> {
        ctx.declare_value("Child", String::new(), Direction::Input)?;
        ctx.declare_value("ChildInitialized", false, Direction::Output)?;
        ctx.declare_value("ChildSucceeded", false, Direction::Output)?;
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let name: String = ctx.get_value("Child")?;
        let mut child = ctx.create_child_algorithm(&name, None)?;
        ctx.set_value("ChildInitialized", child.is_initialized())?;
        if child.is_initialized() {
            let succeeded = child.execute()?;
            ctx.set_value("ChildSucceeded", succeeded)?;
        }
        Ok(())
    }
}

/// Produces two outputs and stores the second only when asked.
struct TwoOutputs;

impl Algorithm for TwoOutputs {
    fn name(&self) -> &str {
        "TwoOutputs"
    }

    fn init(&mut self, ctx: &mut InitContext<'_>) -> Result<()> {
        ctx.declare_workspace::<Workspace2D>("First", Direction::Output, "")?;
        ctx.declare_workspace::<Workspace2D>("Second", Direction::Output, "")?;
        ctx.declare_value("StoreSecond", false, Direction::Input)?;
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        ctx.set_workspace("First", Arc::new(Workspace2D::new(1, 1)))?;
        ctx.set_workspace("Second", Arc::new(Workspace2D::new(2, 1)))?;
        if ctx.get_value::<bool>("StoreSecond")? {
            ctx.store_output("Second")?;
        }
        Ok(())
    }
}

struct Fixture {
    service: Arc<DataService>,
    manager: Arc<AlgorithmManager>,
    init_calls: Arc<AtomicUsize>,
    produced: Arc<Mutex<Option<Arc<Workspace2D>>>>,
}

fn fixture() -> Fixture {
    let service = service_with("raw", [1.0, 2.0, 3.0]);
    let manager = AlgorithmManager::new(Arc::clone(&service));
    let init_calls = Arc::new(AtomicUsize::new(0));
    let produced = Arc::new(Mutex::new(None));

    let (calls, slot) = (Arc::clone(&init_calls), Arc::clone(&produced));
    manager
        .subscribe("Doubler", 1, move || {
            Box::new(Doubler {
                init_calls: Arc::clone(&calls),
                produced: Arc::clone(&slot),
            })
        })
        .unwrap();
    manager
        .subscribe("Failing", 1, || Box::new(Failing { panic: false }))
        .unwrap();
    manager
        .subscribe("Panicking", 1, || Box::new(Failing { panic: true }))
        .unwrap();
    manager.subscribe("Interruptible", 1, || Box::new(Interruptible)).unwrap();
    manager.subscribe("BadInit", 1, || Box::new(BadInit)).unwrap();
    manager.subscribe("Parent", 1, || Box::new(Parent)).unwrap();
    manager.subscribe("TwoOutputs", 1, || Box::new(TwoOutputs)).unwrap();

    Fixture {
        service,
        manager,
        init_calls,
        produced,
    }
}

#[test]
fn test_end_to_end_output_is_committed() {
    let f = fixture();
    let mut alg = f.manager.create_unmanaged("Doubler", None).unwrap();
    assert_eq!(alg.state(), AlgorithmState::Constructed);

    alg.initialize().unwrap();
    alg.set_property_value("InputWorkspace", "raw").unwrap();
    alg.set_property_value("OutputWorkspace", "doubled").unwrap();
    assert!(alg.execute().unwrap());
    assert!(alg.is_executed());
    assert_eq!(alg.state(), AlgorithmState::Executed);

    let stored = f.service.retrieve_as::<Workspace2D>("doubled").unwrap();
    let produced = f.produced.lock().clone().unwrap();
    assert!(Arc::ptr_eq(&stored, &produced));
    assert_eq!(stored.read_y(0).unwrap().to_vec(), vec![2.0, 4.0, 6.0]);

    // A second initialize neither re-runs the hook nor redeclares anything.
    alg.initialize().unwrap();
    assert_eq!(f.init_calls.load(Ordering::SeqCst), 1);
    assert_eq!(alg.properties().len(), 2);
}

#[test]
fn test_execute_can_be_repeated() {
    let f = fixture();
    let mut alg = f.manager.create("Doubler", None).unwrap();
    alg.set_properties("InputWorkspace=raw;OutputWorkspace=raw").unwrap();

    alg.execute().unwrap();
    alg.set_property_value("InputWorkspace", "raw").unwrap();
    alg.execute().unwrap();

    let stored = f.service.retrieve_as::<Workspace2D>("raw").unwrap();
    assert_eq!(stored.read_y(0).unwrap().to_vec(), vec![4.0, 8.0, 12.0]);
}

#[test]
fn test_execute_requires_initialize() {
    let f = fixture();
    let mut alg = f.manager.create_unmanaged("Doubler", None).unwrap();
    assert!(matches!(alg.execute(), Err(FrameworkError::Runtime(_))));
    assert!(!alg.is_executed());
}

#[test]
fn test_invalid_properties_stop_execution() {
    let f = fixture();
    let mut alg = f.manager.create("Doubler", None).unwrap();
    alg.set_properties("InputWorkspace=absent;OutputWorkspace=out").unwrap();

    match alg.execute() {
        Err(FrameworkError::Runtime(message)) => {
            assert!(message.contains("Some invalid properties"));
            assert!(message.contains("InputWorkspace"));
        }
        other => panic!("expected a runtime error, got {:?}", other),
    }
    assert_eq!(alg.state(), AlgorithmState::Failed);
    assert!(f.produced.lock().is_none());
    assert!(!f.service.does_exist("out"));
}

#[test]
fn test_top_level_error_propagates() {
    let f = fixture();
    let mut alg = f.manager.create("Failing", None).unwrap();
    assert!(matches!(alg.execute(), Err(FrameworkError::Runtime(_))));
    assert!(!alg.is_executed());
    assert_eq!(alg.state(), AlgorithmState::Failed);
}

#[test]
fn test_child_error_is_swallowed() {
    let f = fixture();
    let mut parent = f.manager.create("Parent", None).unwrap();
    parent.set_property_value("Child", "Failing").unwrap();

    assert!(parent.execute().unwrap());
    assert!(parent.get_value::<bool>("ChildInitialized").unwrap());
    assert!(!parent.get_value::<bool>("ChildSucceeded").unwrap());

    let children = f.manager.children_of(parent.id());
    assert_eq!(children.len(), 1);
    assert_eq!(f.manager.parent_of(children[0]), Some(parent.id()));
}

#[test]
fn test_child_with_failed_init_is_still_returned() {
    let f = fixture();
    let mut parent = f.manager.create("Parent", None).unwrap();
    parent.set_property_value("Child", "BadInit").unwrap();

    assert!(parent.execute().unwrap());
    assert!(!parent.get_value::<bool>("ChildInitialized").unwrap());
}

#[test]
fn test_failed_init_can_be_retried_cleanly() {
    let f = fixture();
    let mut alg = f.manager.create_unmanaged("BadInit", None).unwrap();
    assert!(matches!(alg.initialize(), Err(FrameworkError::InvalidArgument(_))));
    assert_eq!(alg.state(), AlgorithmState::Failed);
    assert!(alg.properties().is_empty());

    // The retry fails the same way rather than with a duplicate declaration.
    assert!(matches!(alg.initialize(), Err(FrameworkError::InvalidArgument(_))));
    assert!(matches!(
        f.manager.create("BadInit", None),
        Err(FrameworkError::InvalidArgument(_))
    ));
}

#[test]
fn test_unknown_child_aborts_parent() {
    let f = fixture();
    let mut parent = f.manager.create("Parent", None).unwrap();
    parent.set_property_value("Child", "NoSuchAlgorithm").unwrap();
    assert!(matches!(parent.execute(), Err(FrameworkError::NotFound(_))));
}

#[test]
fn test_panic_is_resumed_and_clears_executed() {
    let f = fixture();
    let mut alg = f.manager.create("Panicking", None).unwrap();
    let result = panic::catch_unwind(AssertUnwindSafe(|| alg.execute()));
    assert!(result.is_err());
    assert!(!alg.is_executed());
    assert_eq!(alg.state(), AlgorithmState::Failed);
}

#[test]
fn test_panic_in_child_is_not_swallowed() {
    let f = fixture();
    let mut parent = f.manager.create("Parent", None).unwrap();
    parent.set_property_value("Child", "Panicking").unwrap();

    let result = panic::catch_unwind(AssertUnwindSafe(|| parent.execute()));
    assert!(result.is_err());
    assert!(!parent.is_executed());
}

#[test]
fn test_cancellation() {
    let f = fixture();
    let mut alg = f.manager.create("Interruptible", None).unwrap();

    alg.cancellation_handle().cancel();
    assert!(matches!(alg.execute(), Err(FrameworkError::Cancelled(_))));

    // The request is consumed by the run it stopped.
    assert!(alg.execute().unwrap());
}

#[test]
fn test_cancellation_reaches_children() {
    let f = fixture();
    let mut parent = f.manager.create("Parent", None).unwrap();
    parent.set_property_value("Child", "Interruptible").unwrap();

    parent.cancel();
    assert!(matches!(parent.execute(), Err(FrameworkError::Cancelled(_))));
}

#[test]
fn test_only_first_output_is_committed() {
    let f = fixture();
    let mut alg = f.manager.create("TwoOutputs", None).unwrap();
    alg.set_properties("First=a;Second=b").unwrap();
    alg.execute().unwrap();
    assert!(f.service.does_exist("a"));
    assert!(!f.service.does_exist("b"));

    alg.set_properties("First=c;Second=d;StoreSecond=1").unwrap();
    alg.execute().unwrap();
    assert!(f.service.does_exist("c"));
    assert!(f.service.does_exist("d"));
}

#[test]
fn test_child_outputs_are_not_committed() {
    let f = fixture();
    let parent = f.manager.create("Parent", None).unwrap();
    let mut child = f.manager.create_child(parent.id(), "Doubler", None).unwrap();
    child.initialize().unwrap();
    child.set_properties("InputWorkspace=raw;OutputWorkspace=child_out").unwrap();

    assert!(child.execute().unwrap());
    assert!(child.get_workspace::<Workspace2D>("OutputWorkspace").is_ok());
    assert!(!f.service.does_exist("child_out"));
}
