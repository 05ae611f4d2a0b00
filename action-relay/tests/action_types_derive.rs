//! Tests for #[derive(ActionTypes)] macro

use action_relay::ActionTypes;

#[test]
fn test_basic_derive() {
    #[derive(ActionTypes, Clone, Copy, Debug, PartialEq)]
    enum Types {
        CreateCar,
        EditCar,
        EditWheels,
    }

    assert_eq!(Types::CreateCar.action_type(), "CREATE_CAR");
    assert_eq!(Types::EditWheels.name(), "EDIT_WHEELS");
    assert_eq!(
        Types::all(),
        &[Types::CreateCar, Types::EditCar, Types::EditWheels]
    );
}

#[test]
fn test_namespace() {
    #[derive(ActionTypes, Clone, Copy, Debug)]
    #[action_types(namespace = "CAR")]
    enum CarTypes {
        CreateCar,
        EditCar,
        EditWheels,
    }

    let types = CarTypes::type_map();
    assert_eq!(types.len(), 3);
    assert_eq!(types["CREATE_CAR"], "CAR_CREATE_CAR");
    assert_eq!(types["EDIT_CAR"], "CAR_EDIT_CAR");
    assert_eq!(types["EDIT_WHEELS"], "CAR_EDIT_WHEELS");
}

#[test]
fn test_matches_create_types() {
    #[derive(ActionTypes, Clone, Copy, Debug)]
    #[action_types(namespace = "ROUTES")]
    enum Routes {
        Create,
        Edit,
    }

    assert_eq!(
        Routes::type_map(),
        action_relay::create_route_types(["CREATE", "EDIT"])
    );
}

#[test]
fn test_rename() {
    #[derive(ActionTypes, Clone, Copy, Debug)]
    #[action_types(namespace = "CAR")]
    enum CarTypes {
        #[action_types(rename = "FETCH")]
        LoadCar,
        HTTPSync,
    }

    assert_eq!(CarTypes::LoadCar.name(), "FETCH");
    assert_eq!(CarTypes::LoadCar.action_type(), "CAR_FETCH");
    assert_eq!(CarTypes::HTTPSync.action_type(), "CAR_HTTP_SYNC");
    assert_eq!(
        CarTypes::LoadCar.action_type().triple()[2],
        "CAR_FETCH_FAIL"
    );
}
