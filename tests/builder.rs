// ABOUTME: Integration tests for composing deployment plans with the typed builder.
// ABOUTME: Covers follow-up directives, group scoping, multiple sets, and content handling.

mod support;

use rollplan::content::DigestDistributor;
use rollplan::plan::{ActionKind, PlanBuilder, PlanError};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use support::{DropCounter, FixedHashDistributor};

fn builder() -> PlanBuilder<rollplan::plan::Initial> {
    PlanBuilder::new(Arc::new(FixedHashDistributor::default()))
}

fn war(content: &str) -> Cursor<Vec<u8>> {
    Cursor::new(content.as_bytes().to_vec())
}

#[test]
fn add_and_deploy_to_one_group() {
    support::init_tracing();

    let plan = builder()
        .add("app", "app.war", war("bytes"))
        .unwrap()
        .and_deploy()
        .unwrap()
        .to_server_group("main-group")
        .unwrap()
        .build();

    let set = plan.set_plan();
    let kinds: Vec<ActionKind> = set.actions().iter().map(|a| a.kind()).collect();
    assert_eq!(kinds, vec![ActionKind::Add, ActionKind::Deploy]);
    assert_eq!(set.actions()[0].content_file_name(), Some("app.war"));
    assert_eq!(set.actions()[1].unit_name().as_str(), "app");
    assert_eq!(set.concurrent_group_names(), vec![vec!["main-group"]]);
    assert_eq!(plan.attached_content().len(), 1);
}

#[test]
fn replace_then_remove_replaced_unit() {
    let plan = builder()
        .add("app-v2", "app.war", war("v2"))
        .unwrap()
        .and_replace("app-v1")
        .unwrap()
        .and_remove_undeployed()
        .unwrap()
        .to_server_group("g")
        .unwrap()
        .build();

    let actions = plan.set_plan().actions();
    assert_eq!(actions.len(), 3);
    assert_eq!(actions[1].kind(), ActionKind::Replace);
    assert_eq!(actions[1].replaced_unit_name().unwrap().as_str(), "app-v1");
    assert_eq!(actions[2].kind(), ActionKind::Remove);
    assert_eq!(actions[2].unit_name().as_str(), "app-v1");
}

#[test]
fn undeploy_then_remove_same_unit() {
    let plan = builder()
        .undeploy("old.war")
        .unwrap()
        .and_remove_undeployed()
        .unwrap()
        .to_server_group("g")
        .unwrap()
        .build();

    let actions = plan.set_plan().actions();
    assert_eq!(actions[0].kind(), ActionKind::Undeploy);
    assert_eq!(actions[1].kind(), ActionKind::Remove);
    assert_eq!(actions[1].unit_name(), actions[0].unit_name());
}

#[test]
fn full_replace_uses_replacement_distribution() {
    let distributor = Arc::new(FixedHashDistributor::default());
    let plan = PlanBuilder::new(distributor.clone())
        .full_replace("app.war", "app.war", war("new"))
        .unwrap()
        .to_server_group("g")
        .unwrap()
        .build();

    assert_eq!(
        distributor.calls.lock().clone(),
        vec![("app.war".to_string(), true)]
    );
    let action = &plan.set_plan().actions()[0];
    assert_eq!(action.kind(), ActionKind::FullReplace);
    assert_eq!(action.content_hash().unwrap().as_bytes(), &[0xCD; 20]);
}

#[test]
fn rollout_policy_applies_to_most_recent_group() {
    let plan = builder()
        .deploy("app.war")
        .unwrap()
        .to_server_group("a")
        .unwrap()
        .with_rollback()
        .unwrap()
        .to_server_group("b")
        .unwrap()
        .rolling_to_servers()
        .unwrap()
        .allow_failure_percentage(25)
        .unwrap()
        .rolling_to_next_group("c")
        .unwrap()
        .allow_failures(2)
        .unwrap()
        .build();

    let set = plan.set_plan();
    assert_eq!(set.concurrent_group_names(), vec![vec!["a", "b"], vec!["c"]]);

    let a = set.server_group_plan("a").unwrap();
    assert!(a.is_rollback_enabled());
    assert!(!a.is_rolling_to_servers());

    let b = set.server_group_plan("b").unwrap();
    assert!(b.is_rolling_to_servers());
    assert_eq!(b.max_failure_percentage(), 25);

    assert_eq!(set.server_group_plan("c").unwrap().max_failures(), 2);
}

#[test]
fn latest_failure_limit_wins() {
    let count_last = builder()
        .deploy("app.war")
        .unwrap()
        .to_server_group("g")
        .unwrap()
        .allow_failure_percentage(20)
        .unwrap()
        .allow_failures(3)
        .unwrap()
        .build();
    let group = count_last.set_plan().server_group_plan("g").unwrap();
    assert_eq!(group.max_failures(), 3);
    assert_eq!(group.max_failure_percentage(), 0);

    let percentage_last = builder()
        .deploy("app.war")
        .unwrap()
        .to_server_group("g")
        .unwrap()
        .allow_failures(3)
        .unwrap()
        .allow_failure_percentage(20)
        .unwrap()
        .build();
    let group = percentage_last.set_plan().server_group_plan("g").unwrap();
    assert_eq!(group.max_failures(), 0);
    assert_eq!(group.max_failure_percentage(), 20);
}

#[test]
fn set_options_are_recorded_on_current_set() {
    let plan = builder()
        .with_rollback_across_groups()
        .with_graceful_shutdown(Duration::from_secs(15))
        .without_single_server_rollback()
        .with_metadata("ticket", serde_json::json!("OPS-12"))
        .redeploy("app.war")
        .unwrap()
        .to_server_group("g")
        .unwrap()
        .build();

    assert!(plan.is_rollback_across_groups());
    let set = plan.set_plan();
    assert!(set.is_graceful_shutdown());
    assert_eq!(set.graceful_shutdown_millis(), 15_000);
    assert!(!set.is_single_server_rollback());
    assert_eq!(set.metadata()["ticket"], "OPS-12");
}

#[test]
fn new_deployment_set_keeps_earlier_sets_in_order() {
    let plan = builder()
        .deploy("a.war")
        .unwrap()
        .to_server_group("g1")
        .unwrap()
        .new_deployment_set()
        .with_shutdown()
        .deploy("b.war")
        .unwrap()
        .to_server_group("g2")
        .unwrap()
        .build();

    let sets: Vec<_> = plan.set_plans().iter().collect();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].actions()[0].unit_name().as_str(), "a.war");
    assert_eq!(sets[1].actions()[0].unit_name().as_str(), "b.war");
    assert!(!sets[0].is_shutdown());
    assert!(sets[1].is_shutdown());
    assert_ne!(sets[0].id(), sets[1].id());
}

#[test]
fn action_directive_after_scoping_is_rejected() {
    let scoped = builder()
        .deploy("a.war")
        .unwrap()
        .to_server_group("g")
        .unwrap();

    let err = scoped.clone().deploy("b.war").unwrap_err();
    assert!(err.is_invalid_state());
    assert_eq!(err.directive(), Some("deploy"));

    let err = scoped.undeploy("a.war").unwrap_err();
    assert_eq!(err.directive(), Some("undeploy"));
}

#[test]
fn rejected_content_after_scoping_is_dropped() {
    let (content, drops) = DropCounter::new(b"war");
    let err = builder()
        .deploy("a.war")
        .unwrap()
        .to_server_group("g")
        .unwrap()
        .add("b", "b.war", content)
        .unwrap_err();

    assert!(err.is_invalid_state());
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn branches_share_earlier_state() {
    let base = builder().deploy("a.war").unwrap();

    let left = base.clone().to_server_group("left").unwrap().build();
    let right = base.to_server_group("right").unwrap().build();

    assert_eq!(left.set_plan().concurrent_group_names(), vec![vec!["left"]]);
    assert_eq!(right.set_plan().concurrent_group_names(), vec![vec!["right"]]);
    assert_eq!(
        left.set_plan().actions()[0].id(),
        right.set_plan().actions()[0].id()
    );
}

#[test]
fn invalid_unit_name_is_reported() {
    let err = builder().deploy("").unwrap_err();
    assert!(matches!(err, PlanError::InvalidUnitName(_)));
}

#[test]
fn add_file_names_unit_after_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service.war");
    std::fs::write(&path, b"archive").unwrap();

    let plan = PlanBuilder::new(Arc::new(DigestDistributor))
        .add_file(&path)
        .unwrap()
        .and_deploy()
        .unwrap()
        .to_server_group("g")
        .unwrap()
        .build();

    let add = &plan.set_plan().actions()[0];
    assert_eq!(add.unit_name().as_str(), "service.war");
    assert_eq!(add.content_file_name(), Some("service.war"));
    assert_eq!(add.content_hash().unwrap().as_bytes().len(), 32);
}

#[test]
fn add_file_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = builder().add_file(dir.path().join("missing.war")).unwrap_err();
    assert!(matches!(err, PlanError::ContentDistribution { .. }));
}
