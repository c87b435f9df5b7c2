//! Cycle and shared-reference safety: every traversal must terminate and
//! process each node once, whatever shape the graph takes.

use retrace_tests::prelude::*;

#[test]
fn test_set_tracking_terminates_on_a_cycle() {
    let (parent, child) = cyclic_parent_child();
    let roots = CollectionHandle::from_items([parent.clone()], false).unwrap();

    roots.set_tracking(true).unwrap();

    assert!(parent.identity().is_some());
    assert!(child.identity().is_some());
    assert!(parent.collection("children").unwrap().tracking());

    roots.set_tracking(false).unwrap();
    assert!(!parent.collection("children").unwrap().tracking());
}

#[test]
fn test_get_changes_terminates_on_a_cycle() {
    let (parent, child) = cyclic_parent_child();
    let roots = CollectionHandle::from_items([parent.clone()], true).unwrap();

    child.set_attr("name", "renamed").unwrap();

    let changes = roots.get_changes().unwrap();
    assert_eq!(changes.len(), 1);
    let parent_clone = changes.get(0).unwrap();
    assert!(parent_clone.has_same_identity(&parent));
    let child_clone = parent_clone.collection("children").unwrap().get(0).unwrap();
    assert!(child_clone.has_same_identity(&child));
    assert_eq!(child_clone.tracking_state(), TrackingState::Modified);
}

#[test]
fn test_accept_changes_terminates_on_a_cycle() {
    let (parent, child) = cyclic_parent_child();
    let roots = CollectionHandle::from_items([parent.clone()], true).unwrap();

    child.set_attr("name", "renamed").unwrap();
    accept_changes(&roots).unwrap();

    assert_eq!(parent.tracking_state(), TrackingState::Unchanged);
    assert_eq!(child.tracking_state(), TrackingState::Unchanged);
    assert_eq!(child.modified_properties(), None);
}

#[test]
fn test_self_reference_terminates() {
    let node = customer("Contoso", "Seattle");
    node.declare_reference("self_link").unwrap();
    node.set_reference("self_link", Some(node.clone())).unwrap();
    let roots = CollectionHandle::from_items([node.clone()], false).unwrap();

    roots.set_tracking(true).unwrap();
    node.set_attr("city", "Redmond").unwrap();

    let changes = roots.get_changes().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(
        changes.get(0).unwrap().tracking_state(),
        TrackingState::Modified
    );
}

#[test]
fn test_shared_reference_in_changes_stays_shared() {
    // A modified order reaches the same modified customer twice: directly
    // and through an order line. The extracted copy must alias one customer
    // clone, not two.
    let shared = customer("Contoso", "Seattle");
    let line = detail("widget", 3);
    let parent = order_with_details(1001, &[line.clone()]);
    parent.set_reference("customer", Some(shared.clone())).unwrap();
    line.declare_reference("customer").unwrap();
    line.set_reference("customer", Some(shared.clone())).unwrap();
    let orders = CollectionHandle::from_items([parent.clone()], true).unwrap();

    shared.set_attr("city", "Redmond").unwrap();
    line.set_attr("quantity", 4i64).unwrap();

    let changes = orders.get_changes().unwrap();
    assert_eq!(changes.len(), 1);
    let root = changes.get(0).unwrap();
    let direct = root.reference("customer").unwrap();
    let via_line = root
        .collection("details")
        .unwrap()
        .get(0)
        .unwrap()
        .reference("customer")
        .unwrap();
    assert!(direct.same_entity(&via_line));
    assert!(direct.has_same_identity(&shared));
}
