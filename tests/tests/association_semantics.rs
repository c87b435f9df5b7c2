//! Many-to-many membership semantics: removing a member severs the
//! relationship without deleting the member.

use retrace_tests::prelude::*;

#[test]
fn test_removing_membership_keeps_member_alive() {
    let west = territory("west");
    let employee = employee_with_territories("Ada", &[west.clone()]);
    let employees = CollectionHandle::from_items([employee.clone()], true).unwrap();

    let memberships = employee.collection("territories").unwrap();
    memberships.remove_entity(&west).unwrap();

    assert_eq!(west.tracking_state(), TrackingState::Unchanged);
    assert!(memberships.cached_deletes().is_empty());
    assert!(memberships.is_empty());
    drop(employees);
}

#[test]
fn test_modified_member_survives_membership_removal() {
    let west = territory("west");
    let employee = employee_with_territories("Ada", &[west.clone()]);
    let _employees = CollectionHandle::from_items([employee.clone()], true).unwrap();

    west.set_attr("name", "far west").unwrap();
    let memberships = employee.collection("territories").unwrap();
    memberships.remove_entity(&west).unwrap();

    // The scalar edit still needs persisting even though the membership is gone.
    assert_eq!(west.tracking_state(), TrackingState::Modified);
    assert!(memberships.cached_deletes().is_empty());
}

#[test]
fn test_new_membership_is_added() {
    let employee = employee_with_territories("Ada", &[]);
    let _employees = CollectionHandle::from_items([employee.clone()], true).unwrap();

    let east = territory("east");
    let memberships = employee.collection("territories").unwrap();
    memberships.push(east.clone()).unwrap();

    assert_eq!(east.tracking_state(), TrackingState::Added);
    assert!(east.identity().is_some());
}

#[test]
fn test_owner_deletion_does_not_cascade_through_memberships() {
    let west = territory("west");
    let employee = employee_with_territories("Ada", &[west.clone()]);
    let employees = CollectionHandle::from_items([employee.clone()], true).unwrap();

    employees.remove(0).unwrap();

    // The employee is deleted; the shared territory is not.
    assert_eq!(employee.tracking_state(), TrackingState::Deleted);
    assert_eq!(west.tracking_state(), TrackingState::Unchanged);
}

#[test]
fn test_membership_removal_is_absent_from_changes() {
    let west = territory("west");
    let east = territory("east");
    let employee = employee_with_territories("Ada", &[west.clone(), east.clone()]);
    let employees = CollectionHandle::from_items([employee.clone()], true).unwrap();

    let memberships = employee.collection("territories").unwrap();
    memberships.remove_entity(&west).unwrap();

    // Nothing resolved to a tracked change, so the change-set is empty.
    let changes = employees.get_changes().unwrap();
    assert!(changes.is_empty());
}
