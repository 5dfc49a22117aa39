// ABOUTME: Property tests over generated plan shapes.
// ABOUTME: Checks action order and group layout survive building, submission, and decoding.

mod support;

use proptest::prelude::*;
use rollplan::listener::Listeners;
use rollplan::plan::{DeploymentPlan, PlanBuilder};
use rollplan::protocol::{
    ApplierResponse, ResponseWriter, UpdateResult, decode_response, encode_execute_request,
    read_execute_request,
};
use rollplan::types::ServerIdentity;
use std::io::Cursor;
use std::sync::Arc;
use support::FixedHashDistributor;

/// Build a single-set plan with `units` deploy actions and the given layout,
/// where `layout[i]` is the number of groups in concurrent-set `i`.
fn build_plan(units: usize, layout: &[usize]) -> DeploymentPlan {
    let mut actions = PlanBuilder::new(Arc::new(FixedHashDistributor::default()))
        .deploy("unit-0.war")
        .unwrap();
    for i in 1..units {
        actions = actions.deploy(&format!("unit-{i}.war")).unwrap();
    }

    let mut scoped = actions.to_server_group("g0-0").unwrap();
    for (set, &groups) in layout.iter().enumerate() {
        for group in 0..groups {
            if set == 0 && group == 0 {
                continue;
            }
            let name = format!("g{set}-{group}");
            scoped = if group == 0 {
                scoped.rolling_to_next_group(&name).unwrap()
            } else {
                scoped.to_server_group(&name).unwrap()
            };
        }
    }
    scoped.build()
}

fn expected_layout(layout: &[usize]) -> Vec<Vec<String>> {
    layout
        .iter()
        .enumerate()
        .map(|(set, &groups)| (0..groups).map(|g| format!("g{set}-{g}")).collect())
        .collect()
}

proptest! {
    #[test]
    fn layout_and_action_order_are_preserved(
        units in 1usize..6,
        layout in prop::collection::vec(1usize..4, 1..4),
    ) {
        let plan = build_plan(units, &layout);
        let set = plan.set_plan();

        let names: Vec<&str> = set.actions().iter().map(|a| a.unit_name().as_str()).collect();
        let expected: Vec<String> = (0..units).map(|i| format!("unit-{i}.war")).collect();
        prop_assert_eq!(names, expected.iter().map(String::as_str).collect::<Vec<_>>());
        prop_assert_eq!(set.concurrent_group_names(), expected_layout(&layout));

        let request = encode_execute_request(&plan).unwrap();
        let sent = read_execute_request(Cursor::new(request)).unwrap();
        prop_assert_eq!(sent.id(), plan.id());
        prop_assert_eq!(sent.set_plan(), plan.set_plan());
    }

    #[test]
    fn decoded_tree_follows_stream_order(
        units in 1usize..5,
        layout in prop::collection::vec(1usize..3, 1..3),
    ) {
        let plan = build_plan(units, &layout);
        let set = plan.set_plan();
        let groups: Vec<String> = expected_layout(&layout).into_iter().flatten().collect();

        let mut writer = ResponseWriter::new(plan.id()).set(set.id());
        for action in set.actions().iter().rev() {
            let servers: Vec<ServerIdentity> = groups
                .iter()
                .map(|g| ServerIdentity::new("h1", g.as_str(), format!("{g}-s")))
                .collect();
            writer = writer
                .action(action.id(), &ApplierResponse::servers_identified(servers.clone()))
                .unwrap();
            for server in &servers {
                writer = writer
                    .server(action.id(), server, &UpdateResult::success(None))
                    .unwrap();
            }
        }
        let result = decode_response(&plan, &Listeners::empty(), Cursor::new(writer.complete()))
            .unwrap();

        let reported: Vec<_> = set.actions().iter().rev().map(|a| a.id()).collect();
        let layout_names = expected_layout(&layout);
        let set_result = result.set_result(&set.id()).unwrap();
        prop_assert_eq!(set_result.action_ids(), reported.as_slice());
        prop_assert_eq!(set_result.server_group_sets(), layout_names.as_slice());

        for action in set.actions() {
            let node = result.action_result(&action.id()).unwrap();
            prop_assert_eq!(node.server_group_results().len(), groups.len());
            prop_assert!(node.is_success());
        }
        prop_assert!(result.is_success());
    }
}

proptest! {
    #[test]
    fn content_after_scoping_always_fails(
        units in 1usize..4,
        layout in prop::collection::vec(1usize..3, 1..3),
        replacement in any::<bool>(),
    ) {
        let plan = build_plan(units, &layout);
        let mut scoped = PlanBuilder::new(Arc::new(FixedHashDistributor::default()))
            .deploy("unit-0.war")
            .unwrap()
            .to_server_group("g0-0")
            .unwrap();
        for group in plan.set_plan().concurrent_group_names().concat().iter().skip(1) {
            scoped = scoped.to_server_group(group).unwrap();
        }

        let content = Cursor::new(b"war".to_vec());
        let err = if replacement {
            scoped.full_replace("late.war", "late.war", content).unwrap_err()
        } else {
            scoped.add("late.war", "late.war", content).unwrap_err()
        };
        prop_assert!(err.is_invalid_state());
        prop_assert_eq!(err.directive(), Some(if replacement { "full_replace" } else { "add" }));
    }
}
