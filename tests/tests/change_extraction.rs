//! End-to-end change extraction: minimality, deletion replay, splice
//! integrity, and the edit / extract / accept lifecycle.

use retrace_tests::prelude::*;

mod minimality {
    use super::*;

    #[test]
    fn test_unchanged_siblings_are_pruned() {
        let changed = detail("widget", 3);
        let untouched = detail("gadget", 1);
        let order = order_with_details(1001, &[changed.clone(), untouched.clone()]);
        let orders = CollectionHandle::from_items([order.clone()], true).unwrap();

        changed.set_attr("quantity", 4i64).unwrap();

        let changes = orders.get_changes().unwrap();
        assert_eq!(changes.len(), 1);
        let details = changes.get(0).unwrap().collection("details").unwrap();
        assert_eq!(details.len(), 1);
        assert!(details.get(0).unwrap().has_same_identity(&changed));
    }

    #[test]
    fn test_non_contributing_reference_is_dropped() {
        let order = order(1001);
        let customer = customer("Contoso", "Seattle");
        let orders = CollectionHandle::from_items([order.clone()], true).unwrap();
        order.set_reference("customer", Some(customer)).unwrap();

        order.set_attr("shipped", true).unwrap();

        let changes = orders.get_changes().unwrap();
        assert_eq!(changes.len(), 1);
        let extracted = changes.get(0).unwrap();
        assert_eq!(extracted.tracking_state(), TrackingState::Modified);
        // The untouched customer carries no changes and is nulled out.
        assert!(extracted.reference("customer").is_none());
    }

    #[test]
    fn test_deleted_reference_target_does_not_surface_owner() {
        // A deletion is persisted through the collection that owns the
        // deleted entity; an untouched order merely pointing at it has
        // nothing to contribute.
        let order = order(1001);
        let customer = customer("Contoso", "Seattle");
        let orders = CollectionHandle::from_items([order.clone()], true).unwrap();
        order.set_reference("customer", Some(customer.clone())).unwrap();

        customer.set_tracking_state(TrackingState::Deleted);

        let changes = orders.get_changes().unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_shared_modified_reference_surfaces_one_owner() {
        // Two untouched orders share one modified customer: the change-set
        // carries the customer once, under the first order that reaches it.
        let shared = customer("Contoso", "Seattle");
        let first = order(1001);
        let second = order(1002);
        first.set_reference("customer", Some(shared.clone())).unwrap();
        second.set_reference("customer", Some(shared.clone())).unwrap();
        let orders =
            CollectionHandle::from_items([first.clone(), second.clone()], true).unwrap();

        shared.set_attr("city", "Redmond").unwrap();

        let changes = orders.get_changes().unwrap();
        assert_eq!(changes.len(), 1);
        let extracted = changes.get(0).unwrap();
        assert!(extracted.has_same_identity(&first));
        let extracted_customer = extracted.reference("customer").unwrap();
        assert!(extracted_customer.has_same_identity(&shared));
        assert_eq!(extracted_customer.tracking_state(), TrackingState::Modified);
    }

    #[test]
    fn test_wholly_unchanged_graph_extracts_nothing() {
        let order = order_with_details(1001, &[detail("widget", 3)]);
        let orders = CollectionHandle::from_items([order], true).unwrap();

        let changes = orders.get_changes().unwrap();
        assert!(changes.is_empty());
    }
}

mod deletion_replay {
    use super::*;

    #[test]
    fn test_nested_deletion_surfaces_through_owner() {
        let doomed = detail("widget", 3);
        let order = order_with_details(1001, &[doomed.clone()]);
        let orders = CollectionHandle::from_items([order.clone()], true).unwrap();

        let details = order.collection("details").unwrap();
        details.remove_entity(&doomed).unwrap();
        assert!(details.is_empty());

        let changes = orders.get_changes().unwrap();
        assert_eq!(changes.len(), 1);
        let extracted_details = changes.get(0).unwrap().collection("details").unwrap();
        assert_eq!(extracted_details.len(), 1);
        let extracted = extracted_details.get(0).unwrap();
        assert_eq!(extracted.tracking_state(), TrackingState::Deleted);
        assert!(extracted.has_same_identity(&doomed));

        // The live graph is back to its pre-extraction shape.
        assert!(details.is_empty());
        assert_eq!(details.cached_deletes().len(), 1);
    }

    #[test]
    fn test_extraction_is_idempotent_after_deletion() {
        let doomed = detail("widget", 3);
        let order = order_with_details(1001, &[doomed.clone()]);
        let orders = CollectionHandle::from_items([order.clone()], true).unwrap();
        order.collection("details").unwrap().remove_entity(&doomed).unwrap();

        let first = orders.get_changes().unwrap();
        let second = orders.get_changes().unwrap();

        for changes in [first, second] {
            let details = changes.get(0).unwrap().collection("details").unwrap();
            assert_eq!(details.len(), 1);
            assert_eq!(
                details.get(0).unwrap().tracking_state(),
                TrackingState::Deleted
            );
        }
        assert_eq!(order.collection("details").unwrap().len(), 0);
    }

    #[test]
    fn test_extracted_copy_is_independent_of_live_graph() {
        let order = order(1001);
        let orders = CollectionHandle::from_items([order.clone()], true).unwrap();
        order.set_attr("shipped", true).unwrap();

        let changes = orders.get_changes().unwrap();
        let extracted = changes.get(0).unwrap();
        extracted.set_attr("shipped", false).unwrap();
        extracted.set_tracking_state(TrackingState::Unchanged);

        // Mutating the copy leaves the live entity alone.
        assert_eq!(order.attr("shipped"), Some(Value::Bool(true)));
        assert_eq!(order.tracking_state(), TrackingState::Modified);
    }
}

mod lifecycle {
    use super::*;

    #[test]
    fn test_edit_extract_accept_round_trip() {
        // Build and track a small order graph.
        let keep = detail("widget", 3);
        let doom = detail("gadget", 1);
        let order = order_with_details(1001, &[keep.clone(), doom.clone()]);
        let orders = CollectionHandle::from_items([order.clone()], true).unwrap();

        // Edit: one scalar change, one deletion, one addition.
        keep.set_attr("quantity", 5i64).unwrap();
        let details = order.collection("details").unwrap();
        details.remove_entity(&doom).unwrap();
        let added = detail("sprocket", 2);
        details.push(added.clone()).unwrap();

        // Extract: all three edits surface.
        let changes = orders.get_changes().unwrap();
        let extracted_details = changes.get(0).unwrap().collection("details").unwrap();
        assert_eq!(extracted_details.len(), 3);

        // Accept: the live graph is rebased to a clean baseline.
        accept_changes(&orders).unwrap();
        assert_eq!(order.tracking_state(), TrackingState::Unchanged);
        assert_eq!(keep.tracking_state(), TrackingState::Unchanged);
        assert_eq!(keep.modified_properties(), None);
        assert_eq!(added.tracking_state(), TrackingState::Unchanged);
        assert!(details.cached_deletes().is_empty());

        // Nothing left to extract.
        let after = orders.get_changes().unwrap();
        assert!(after.is_empty());
    }

    #[test]
    fn test_changed_items_shallow_view() {
        let keep = detail("widget", 3);
        let doom = detail("gadget", 1);
        let details =
            CollectionHandle::from_items([keep.clone(), doom.clone()], true).unwrap();

        keep.set_attr("quantity", 5i64).unwrap();
        details.remove_entity(&doom).unwrap();

        let changed = details.changed_items();
        assert_eq!(changed.len(), 2);
        assert!(changed.iter().any(|i| i.same_entity(&keep)));
        assert!(changed.iter().any(|i| i.same_entity(&doom)));
    }
}
