//! End-to-end hook scenarios
//!
//! Detection plus cleanup through the destroy-time hook facade.

use eni_cleanup::{
    CancellationToken, CleanupConfig, CleanupOptions, EniCleanupHook, GatewayError, HookPhase,
};
use eni_cleanup_test::{
    assert_manual_review_tags, available_eni, available_eni_in, eks_eni, eni_with_groups, in_use_eni, InMemoryGateway,
    InMemoryGatewayFactory, Operation, SummaryVerifier, REGION,
};
use eni_types::{CleanupAction, ErrorKind, NetworkInterfaceRecord};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn hook(
    records: Vec<NetworkInterfaceRecord>,
    configure: impl FnOnce(&mut CleanupConfig),
) -> (Arc<InMemoryGateway>, EniCleanupHook) {
    let gateway = Arc::new(InMemoryGateway::new(REGION).with_interfaces(records));
    let factory = Arc::new(InMemoryGatewayFactory::new().with_gateway(Arc::clone(&gateway)));
    let mut config = CleanupConfig::for_regions([REGION]);
    config.cleanup = CleanupOptions::immediate();
    configure(&mut config);
    let hook = EniCleanupHook::new(config, factory).unwrap();
    (gateway, hook)
}

#[tokio::test]
async fn test_reserved_interface_never_reaches_cleanup() {
    let (gateway, hook) = hook(vec![available_eni("eni-1"), eks_eni("eni-2")], |_| {});

    let report = hook.run(HookPhase::Destroy, &CancellationToken::new()).await;

    let verifier = SummaryVerifier::new(&report.summary);
    verifier.assert_counts(1, 0, 0).unwrap();
    verifier.assert_action("eni-1", CleanupAction::Deleted).unwrap();
    verifier.assert_absent("eni-2").unwrap();
    assert!(gateway.contains("eni-2"));
    assert_eq!(report.ignored, 1);
}

#[tokio::test]
async fn test_excluded_tag_is_skipped_and_other_proceeds() {
    let (gateway, hook) = hook(
        vec![
            available_eni("eni-1").with_tag("DoNotDelete", "true"),
            available_eni("eni-2"),
        ],
        |config| config.filter.exclude_tag_keys = vec!["DoNotDelete".to_string()],
    );

    let report = hook.run(HookPhase::Destroy, &CancellationToken::new()).await;

    let verifier = SummaryVerifier::new(&report.summary);
    verifier.assert_counts(1, 0, 1).unwrap();
    verifier.assert_action("eni-1", CleanupAction::Skipped).unwrap();
    verifier.assert_action("eni-2", CleanupAction::Deleted).unwrap();
    assert!(gateway.contains("eni-1"));
}

#[tokio::test]
async fn test_dry_run_is_idempotent() {
    let (gateway, hook) = hook(
        vec![
            available_eni("eni-1"),
            eni_with_groups("eni-2", &["sg-a"]),
            in_use_eni("eni-3"),
        ],
        |config| config.cleanup.dry_run = true,
    );

    let first = hook.run(HookPhase::Apply, &CancellationToken::new()).await;
    let second = hook.run(HookPhase::Apply, &CancellationToken::new()).await;

    assert!(first.dry_run);
    assert_eq!(first.summary, second.summary);
    assert_eq!(first.summary.skipped, 2);
    assert_eq!(gateway.mutation_count(), 0);
    assert_eq!(gateway.interfaces().len(), 3);
}

#[tokio::test]
async fn test_destroy_ignores_dry_run() {
    let (gateway, hook) = hook(vec![available_eni("eni-1")], |config| {
        config.cleanup.dry_run = true
    });

    let report = hook.run(HookPhase::Destroy, &CancellationToken::new()).await;

    assert!(!report.dry_run);
    assert_eq!(report.summary.success, 1);
    assert!(!gateway.contains("eni-1"));
}

#[tokio::test]
async fn test_second_live_run_finds_nothing() {
    let (gateway, hook) = hook(
        vec![available_eni("eni-1"), available_eni("eni-2")],
        |_| {},
    );

    let first = hook.run(HookPhase::Destroy, &CancellationToken::new()).await;
    let second = hook.run(HookPhase::Destroy, &CancellationToken::new()).await;

    assert_eq!(first.summary.success, 2);
    assert_eq!(second.summary.total(), 0);
    assert_eq!(gateway.calls_of(Operation::Delete).len(), 2);
}

#[tokio::test]
async fn test_tagged_interface_reclaimed_on_retry() {
    let (gateway, hook) = hook(vec![eni_with_groups("eni-1", &["sg-a"])], |_| {});
    gateway.fail(
        Operation::Delete,
        Some("eni-1"),
        GatewayError::api_with_code("DeleteNetworkInterface", "DependencyViolation", "in use"),
    );
    gateway.fail(
        Operation::ModifyGroups,
        Some("eni-1"),
        GatewayError::api("ModifyNetworkInterfaceAttribute", "throttled"),
    );

    let first = hook.run(HookPhase::Destroy, &CancellationToken::new()).await;
    SummaryVerifier::new(&first.summary)
        .assert_action("eni-1", CleanupAction::TaggedForManualReview)
        .unwrap();
    assert_manual_review_tags(&gateway, "eni-1").unwrap();

    gateway.clear_faults();
    let second = hook.run(HookPhase::Destroy, &CancellationToken::new()).await;

    let verifier = SummaryVerifier::new(&second.summary);
    verifier.assert_counts(1, 0, 0).unwrap();
    verifier.assert_action("eni-1", CleanupAction::Deleted).unwrap();
    assert!(!gateway.contains("eni-1"));
}

#[tokio::test]
async fn test_partial_region_failure() {
    let healthy = Arc::new(InMemoryGateway::new("us-west-2").with_interfaces([
        available_eni_in("eni-b1", "us-west-2"),
        available_eni_in("eni-b2", "us-west-2"),
        available_eni_in("eni-b3", "us-west-2"),
    ]));
    let factory = Arc::new(
        InMemoryGatewayFactory::new()
            .with_gateway(healthy)
            .with_unavailable_region("us-east-1", "unable to load credentials"),
    );
    let mut config = CleanupConfig::for_regions(["us-east-1", "us-west-2"]);
    config.cleanup = CleanupOptions::immediate();
    let hook = EniCleanupHook::new(config, factory).unwrap();

    let report = hook.run(HookPhase::Destroy, &CancellationToken::new()).await;

    assert_eq!(report.summary.total(), 3);
    assert_eq!(report.summary.success, 3);
    assert_eq!(report.region_errors.len(), 1);
    assert_eq!(report.region_errors[0].kind(), ErrorKind::RegionUnavailable);
    assert!(report.has_failures());
}

#[tokio::test]
async fn test_target_group_mode_end_to_end() {
    let (gateway, hook) = hook(
        vec![
            eni_with_groups("eni-1", &["sg-x", "sg-a"]),
            eni_with_groups("eni-2", &["sg-a"]),
        ],
        |config| {
            config.cleanup.disassociate_only = true;
            config.cleanup.target_security_group_id = Some("sg-x".to_string());
        },
    );

    let report = hook.run(HookPhase::Apply, &CancellationToken::new()).await;

    // eni-2 is filtered out by the listing itself
    assert_eq!(report.scanned, 1);
    SummaryVerifier::new(&report.summary)
        .assert_action("eni-1", CleanupAction::Disassociated)
        .unwrap();
    assert_eq!(
        gateway.interface("eni-1").unwrap().security_group_ids,
        vec!["sg-a"]
    );
    assert_eq!(gateway.calls_of(Operation::ModifyGroups), vec!["eni-1"]);
}

#[tokio::test]
async fn test_report_renders() {
    let (_gateway, hook) = hook(vec![available_eni("eni-1")], |_| {});

    let report = hook.run(HookPhase::Destroy, &CancellationToken::new()).await;

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["summary"]["success"], 1);
    assert_eq!(json["summary"]["outcomes"][0]["id"], "eni-1");
    assert!(report.render_text().contains("eni-1 [us-east-1] deleted"));
}
