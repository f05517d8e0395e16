// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Service Dependency Resolution

use cim_policy_orchestrator::domain::Service;
use cim_policy_orchestrator::variables::ServiceDirectory;
use proptest::prelude::*;

use crate::fixtures::service;

/// Up to 8 services `svc-0..` with distinct IPs
fn services() -> impl Strategy<Value = Vec<Service>> {
    (0usize..8).prop_map(|count| {
        (0..count)
            .map(|i| service(&format!("svc-{}", i), &format!("10.0.2.{}", 10 + i), &[]))
            .collect()
    })
}

/// Dependency names, some of which never match a service
fn dependencies() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            (0usize..8).prop_map(|i| format!("svc-{}", i)),
            "[a-z]{3,8}".prop_map(|s| format!("missing-{}", s)),
        ],
        0..12,
    )
}

proptest! {
    /// Resolution keeps dependency order and drops exactly the unknown names
    #[test]
    fn prop_resolve_preserves_order_and_drops_unknown(
        services in services(),
        deps in dependencies(),
    ) {
        let directory = ServiceDirectory::from_services(&services);

        let expected: Vec<String> = deps
            .iter()
            .filter_map(|dep| services.iter().find(|s| &s.name == dep).map(|s| s.ip.clone()))
            .collect();

        prop_assert_eq!(directory.resolve(&deps), expected);
    }

    /// The order services are listed in does not affect resolution
    #[test]
    fn prop_resolve_independent_of_service_order(
        services in services(),
        deps in dependencies(),
    ) {
        let mut reversed = services.clone();
        reversed.reverse();

        prop_assert_eq!(
            ServiceDirectory::from_services(&services).resolve(&deps),
            ServiceDirectory::from_services(&reversed).resolve(&deps)
        );
    }

    /// Resolved list is never longer than the dependency list
    #[test]
    fn prop_resolve_never_grows(services in services(), deps in dependencies()) {
        let directory = ServiceDirectory::from_services(&services);
        prop_assert!(directory.resolve(&deps).len() <= deps.len());
    }
}
