// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Tier Deployment
//!
//! For any tier size and any set of rejected entities, every entity is
//! attempted and only accepted entities are instantiated. A service failure
//! at entity i stops the tier after exactly i + 1 attempts.

use cim_policy_orchestrator::config::DeploymentOptions;
use cim_policy_orchestrator::deployer::TierDeployer;
use proptest::prelude::*;

use crate::fixtures::{web_ip, web_tier, ScriptedService};

proptest! {
    #[test]
    fn prop_rejections_skip_only_rejected(
        count in 1usize..10,
        rejected in prop::collection::btree_set(0usize..10, 0..5),
        concurrency in 1usize..4,
    ) {
        let rejected: Vec<usize> = rejected.into_iter().filter(|i| *i < count).collect();
        let service = rejected
            .iter()
            .fold(ScriptedService::new().with_rules(2), |service, i| {
                service.reject(&web_ip(*i), &["server_ip: invalid"])
            });
        let options = DeploymentOptions {
            entity_concurrency: concurrency,
            ..DeploymentOptions::default()
        };

        let tier = web_tier(count);
        let report = tokio_test::block_on(TierDeployer::new(&service, &options).deploy_tier(&tier))
            .unwrap();

        let expected: Vec<String> = (0..count)
            .filter(|i| !rejected.contains(i))
            .map(web_ip)
            .collect();

        prop_assert_eq!(service.attempted_ips().len(), count);
        prop_assert_eq!(service.instantiated_ips(), expected);
        prop_assert_eq!(report.rejected(), rejected.len());
        prop_assert_eq!(report.total_rules(), 2 * (count - rejected.len()));
    }

    #[test]
    fn prop_service_failure_stops_tier(count in 1usize..10, fail_at in 0usize..10) {
        let fail_at = fail_at % count;
        let service = ScriptedService::new().fail_validate(&web_ip(fail_at));
        let options = DeploymentOptions::default();

        let tier = web_tier(count);
        let aborted = tokio_test::block_on(TierDeployer::new(&service, &options).deploy_tier(&tier))
            .unwrap_err();

        prop_assert_eq!(aborted.entity, format!("web-{}", fail_at));
        prop_assert_eq!(service.attempted_ips().len(), fail_at + 1);
        prop_assert_eq!(service.instantiated_ips().len(), fail_at);
        prop_assert_eq!(aborted.partial.deployed(), fail_at);
    }
}

proptest! {
    /// Under any concurrency the partial report accounts for every rule set created
    #[test]
    fn prop_concurrent_failure_reports_created_rules(
        count in 1usize..10,
        fail_at in 0usize..10,
        concurrency in 2usize..5,
    ) {
        let fail_at = fail_at % count;
        let service = ScriptedService::new()
            .with_rules(2)
            .delay_validate(&web_ip(fail_at), 20)
            .fail_validate(&web_ip(fail_at));
        let options = DeploymentOptions {
            entity_concurrency: concurrency,
            ..DeploymentOptions::default()
        };

        let tier = web_tier(count);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let aborted = runtime
            .block_on(TierDeployer::new(&service, &options).deploy_tier(&tier))
            .unwrap_err();

        let created = service.instantiated_ips();
        prop_assert_eq!(aborted.partial.deployed(), created.len());
        prop_assert_eq!(aborted.partial.total_rules(), 2 * created.len());
        prop_assert!(service.attempted_ips().len() <= fail_at + concurrency);
    }
}
