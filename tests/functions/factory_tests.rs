//! Tests for building functions from definition strings

use crate::test_helpers::Constants;
use datareduce_rs::functions::{Function, FunctionFactory};
use datareduce_rs::FrameworkError;
use ndarray::array;

#[test]
fn test_definition_round_trip_preserves_values() {
    let factory = FunctionFactory::with_builtins();
    let text = "name=Gaussian,Height=3,PeakCentre=1,Sigma=0.5;name=LinearBackground,A0=0,A1=0.25;ties=(f1.A0=f0.Height/3)";
    let original = factory.create_function(text).unwrap();
    let rebuilt = factory.create_function(&original.definition()).unwrap();

    assert_eq!(rebuilt.n_params(), original.n_params());
    assert_eq!(rebuilt.n_active(), original.n_active());
    for i in 0..original.n_params() {
        assert_eq!(
            rebuilt.parameter_name(i).unwrap(),
            original.parameter_name(i).unwrap()
        );
        assert_eq!(rebuilt.parameter(i).unwrap(), original.parameter(i).unwrap());
    }

    let x = array![0.0, 1.0, 2.0];
    assert_eq!(rebuilt.function(&x).unwrap(), original.function(&x).unwrap());
    assert_eq!(rebuilt.get_parameter("f1.A0").unwrap(), 1.0);
}

#[test]
fn test_custom_functions_join_the_factory() {
    let mut factory = FunctionFactory::with_builtins();
    factory
        .subscribe("Constants", || {
            Box::new(Constants::with_params(&[("c0", 0.0), ("c1", 0.0)]))
        })
        .unwrap();

    let f = factory
        .create_function("name=Constants,c0=1,c1=2;name=FlatBackground,A0=3")
        .unwrap();
    assert_eq!(f.n_params(), 3);
    assert_eq!(f.parameter_name(1).unwrap(), "f0.c1");
    assert_eq!(f.function(&array![5.0]).unwrap()[0], 6.0);

    assert!(matches!(
        factory.subscribe("Constants", || {
            Box::new(Constants::with_params(&[("c0", 0.0)]))
        }),
        Err(FrameworkError::DuplicateName(_))
    ));
}

#[test]
fn test_unknown_function_and_parameter() {
    let factory = FunctionFactory::with_builtins();
    assert!(matches!(
        factory.create_function("name=Voigt,Height=1"),
        Err(FrameworkError::NotFound(_))
    ));
    assert!(factory
        .create_function("name=FlatBackground,A0=1;ties=(f3.A0=1)")
        .is_err());
}
