//! Tests for the built-in algorithms

use crate::test_helpers::service_with;
use approx::assert_relative_eq;
use datareduce_rs::{AlgorithmManager, DataService, FrameworkConfig, FrameworkError, Workspace2D};
use std::sync::Arc;

fn manager_for(service: &Arc<DataService>) -> Arc<AlgorithmManager> {
    AlgorithmManager::new(Arc::clone(service))
}

#[test]
fn test_create_workspace_splits_spectra() {
    let service = Arc::new(DataService::new());
    let manager = manager_for(&service);

    let mut alg = manager.create("CreateWorkspace", None).unwrap();
    alg.set_properties("OutputWorkspace=two;DataX=0,1,0,1;DataY=1,2,3,4;DataE=1,1,2,2;NSpec=2")
        .unwrap();
    alg.execute().unwrap();

    let ws = service.retrieve_as::<Workspace2D>("two").unwrap();
    assert_eq!(ws.n_histograms(), 2);
    assert_eq!(ws.blocksize(), 2);
    assert_eq!(ws.read_y(1).unwrap().to_vec(), vec![3.0, 4.0]);
    assert_eq!(ws.read_e(1).unwrap().to_vec(), vec![2.0, 2.0]);
}

#[test]
fn test_create_workspace_rejects_bad_shapes() {
    let service = Arc::new(DataService::new());
    let manager = manager_for(&service);

    let mut alg = manager.create("CreateWorkspace", None).unwrap();
    alg.set_properties("OutputWorkspace=bad;DataX=0,1,2;DataY=1,2,3;NSpec=2")
        .unwrap();
    assert!(matches!(alg.execute(), Err(FrameworkError::InvalidArgument(_))));

    alg.set_properties("DataX=0,1;NSpec=1").unwrap();
    assert!(matches!(alg.execute(), Err(FrameworkError::InvalidArgument(_))));

    alg.set_properties("NSpec=0").unwrap();
    assert!(matches!(alg.execute(), Err(FrameworkError::Runtime(_))));
    assert!(!service.does_exist("bad"));
}

#[test]
fn test_scale_multiply_and_add() {
    let service = service_with("raw", [1.0, -2.0, 3.0]);
    let manager = manager_for(&service);

    let mut scale = manager.create("Scale", None).unwrap();
    scale
        .set_properties("InputWorkspace=raw;OutputWorkspace=scaled;Factor=-2")
        .unwrap();
    scale.execute().unwrap();
    let scaled = service.retrieve_as::<Workspace2D>("scaled").unwrap();
    assert_eq!(scaled.read_y(0).unwrap().to_vec(), vec![-2.0, 4.0, -6.0]);
    assert_relative_eq!(scaled.read_e(0).unwrap()[0], 0.2);

    let mut add = manager.create("Scale", None).unwrap();
    add.set_properties("InputWorkspace=raw;OutputWorkspace=shifted;Factor=10;Operation=Add")
        .unwrap();
    add.execute().unwrap();
    let shifted = service.retrieve_as::<Workspace2D>("shifted").unwrap();
    assert_eq!(shifted.read_y(0).unwrap().to_vec(), vec![11.0, 8.0, 13.0]);
    assert_relative_eq!(shifted.read_e(0).unwrap()[0], 0.1);
}

#[test]
fn test_scale_rejects_unknown_operation() {
    let service = service_with("raw", [1.0, 2.0, 3.0]);
    let manager = manager_for(&service);

    let mut scale = manager.create("Scale", None).unwrap();
    scale
        .set_properties("InputWorkspace=raw;OutputWorkspace=out;Operation=Divide")
        .unwrap();
    assert!(matches!(scale.execute(), Err(FrameworkError::Runtime(_))));
}

#[test]
fn test_parallel_and_sequential_scale_agree() {
    let service = Arc::new(DataService::new());
    let data_y: Vec<String> = (0..40).map(|i| (i as f64 * 0.5).to_string()).collect();
    let data_x: Vec<String> = (0..40).map(|i| (i % 4).to_string()).collect();

    for (threshold, output) in [(1, "parallel"), (usize::MAX, "sequential")] {
        let config = FrameworkConfig {
            parallel_threshold: threshold,
            ..FrameworkConfig::default()
        };
        let manager = AlgorithmManager::with_config(Arc::clone(&service), config);

        let mut create = manager.create("CreateWorkspace", None).unwrap();
        create.set_property_value("OutputWorkspace", "many").unwrap();
        create.set_property_value("DataX", &data_x.join(",")).unwrap();
        create.set_property_value("DataY", &data_y.join(",")).unwrap();
        create.set_property_value("NSpec", "10").unwrap();
        create.execute().unwrap();

        let mut scale = manager.create("Scale", None).unwrap();
        scale.set_property_value("InputWorkspace", "many").unwrap();
        scale.set_property_value("OutputWorkspace", output).unwrap();
        scale.set_property_value("Factor", "3").unwrap();
        scale.execute().unwrap();
    }

    let parallel = service.retrieve_as::<Workspace2D>("parallel").unwrap();
    let sequential = service.retrieve_as::<Workspace2D>("sequential").unwrap();
    assert_eq!(parallel.y(), sequential.y());
    assert_eq!(parallel.read_y(9).unwrap()[3], 19.5 * 3.0);
}

#[test]
fn test_normalise_to_max_runs_child_scale() {
    let service = service_with("raw", [1.0, 4.0, 2.0]);
    let manager = manager_for(&service);

    let mut normalise = manager.create("NormaliseToMax", None).unwrap();
    normalise
        .set_properties("InputWorkspace=raw;OutputWorkspace=norm")
        .unwrap();
    assert!(normalise.execute().unwrap());

    let norm = service.retrieve_as::<Workspace2D>("norm").unwrap();
    assert_eq!(norm.read_y(0).unwrap().to_vec(), vec![0.25, 1.0, 0.5]);

    let children = manager.children_of(normalise.id());
    assert_eq!(children.len(), 1);
    let record = manager
        .history()
        .into_iter()
        .find(|r| r.id == children[0])
        .unwrap();
    assert_eq!(record.name, "Scale");
}

#[test]
fn test_normalise_all_zero_fails() {
    let service = service_with("zeros", [0.0, 0.0, 0.0]);
    let manager = manager_for(&service);

    let mut normalise = manager.create("NormaliseToMax", None).unwrap();
    normalise
        .set_properties("InputWorkspace=zeros;OutputWorkspace=norm")
        .unwrap();
    assert!(matches!(normalise.execute(), Err(FrameworkError::Runtime(_))));
    assert!(!service.does_exist("norm"));
}

#[test]
fn test_evaluate_function() {
    let service = service_with("raw", [0.0, 0.0, 0.0]);
    let manager = manager_for(&service);

    let mut evaluate = manager.create("EvaluateFunction", None).unwrap();
    evaluate
        .set_property_value(
            "Function",
            "name=LinearBackground,A0=1,A1=2;name=FlatBackground,A0=0;ties=(f1.A0=f0.A0/2)",
        )
        .unwrap();
    evaluate
        .set_properties("InputWorkspace=raw;OutputWorkspace=model")
        .unwrap();
    evaluate.execute().unwrap();

    let model = service.retrieve_as::<Workspace2D>("model").unwrap();
    assert_eq!(model.read_y(0).unwrap().to_vec(), vec![1.5, 3.5, 5.5]);
    assert_eq!(model.read_e(0).unwrap().to_vec(), vec![0.0, 0.0, 0.0]);
}

#[test]
fn test_evaluate_function_composite_through_set_properties() {
    let service = service_with("raw", [0.0, 0.0, 0.0]);
    let manager = manager_for(&service);

    let mut evaluate = manager.create("EvaluateFunction", None).unwrap();
    evaluate
        .set_properties(
            "InputWorkspace=raw;Function=name=FlatBackground,A0=1;name=FlatBackground,A0=2;OutputWorkspace=summed",
        )
        .unwrap();
    assert_eq!(
        evaluate.get_property_value("Function").unwrap(),
        "name=FlatBackground,A0=1;name=FlatBackground,A0=2"
    );
    evaluate.execute().unwrap();

    let summed = service.retrieve_as::<Workspace2D>("summed").unwrap();
    assert_eq!(summed.read_y(0).unwrap().to_vec(), vec![3.0, 3.0, 3.0]);
}

#[test]
fn test_evaluate_function_bad_definition() {
    let service = service_with("raw", [0.0, 0.0, 0.0]);
    let manager = manager_for(&service);

    let mut evaluate = manager.create("EvaluateFunction", None).unwrap();
    evaluate
        .set_property_value("Function", "name=NotAFunction")
        .unwrap();
    evaluate
        .set_properties("InputWorkspace=raw;OutputWorkspace=model")
        .unwrap();
    assert!(matches!(evaluate.execute(), Err(FrameworkError::NotFound(_))));

    evaluate.set_property_value("Function", "").unwrap();
    evaluate.set_property_value("InputWorkspace", "raw").unwrap();
    assert!(matches!(evaluate.execute(), Err(FrameworkError::Runtime(_))));
}
