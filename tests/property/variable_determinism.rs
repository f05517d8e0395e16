// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Variable Building
//!
//! The builder is pure: identical entities and tier context always produce
//! identical variable sets.

use cim_policy_orchestrator::domain::{DatabaseEngine, Database, Server, Tier, TierEntities, Topology};
use cim_policy_orchestrator::variables::{
    build_variables, plan_topology, TemplateVariables, TierContext, DEFAULT_SSH_SOURCES,
};
use proptest::prelude::*;

use crate::fixtures::{app_tier, secure_tier};

fn ipv4() -> impl Strategy<Value = String> {
    (1u8..=254, 0u8..=255, 0u8..=255, 1u8..=254)
        .prop_map(|(a, b, c, d)| format!("{}.{}.{}.{}", a, b, c, d))
}

fn server() -> impl Strategy<Value = Server> {
    (
        "[a-z]{1,8}",
        ipv4(),
        prop::option::of(Just("192.168.0.0/16".to_string())),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(name, ip, allowed_sources, enable_ssh)| Server {
            name,
            ip,
            allowed_sources,
            enable_ssh,
            ssh_sources: None,
        })
}

fn engine() -> impl Strategy<Value = DatabaseEngine> {
    prop_oneof![
        Just(DatabaseEngine::MySql),
        Just(DatabaseEngine::PostgreSql),
        Just(DatabaseEngine::MongoDb),
        Just(DatabaseEngine::Redis),
        "[a-z]{3,10}".prop_map(|name| DatabaseEngine::parse(&name)),
    ]
}

fn database() -> impl Strategy<Value = Database> {
    (
        "[a-z]{1,8}",
        engine(),
        ipv4(),
        prop::option::of(1u16..=65535),
        prop::collection::vec(ipv4(), 0..3),
    )
        .prop_map(|(name, engine, ip, port, replicas)| Database {
            name,
            engine,
            ip,
            port,
            app_subnet: "10.0.2.0/24".to_string(),
            backup_server: None,
            enable_replication: Some(!replicas.is_empty()),
            replicas,
        })
}

proptest! {
    #[test]
    fn prop_server_variables_deterministic(server in server()) {
        let tier = Tier::new("web_tier", "ls-web", TierEntities::Servers(vec![server]));
        let ctx = TierContext::for_tier(&tier);
        let entity = tier.entities.refs()[0];

        let first = build_variables(entity, &ctx);
        let second = build_variables(entity, &ctx);
        prop_assert_eq!(&first, &second);

        match first {
            TemplateVariables::WebServer(vars) => {
                prop_assert_eq!(vars.ssh_sources, DEFAULT_SSH_SOURCES);
            }
            other => prop_assert!(false, "unexpected variables: {:?}", other),
        }
    }

    /// An explicit port always wins; otherwise the engine decides
    #[test]
    fn prop_database_port_resolution(db in database()) {
        let tier = Tier::new("data_tier", "ls-data", TierEntities::Databases(vec![db.clone()]));
        let ctx = TierContext::for_tier(&tier);

        match build_variables(tier.entities.refs()[0], &ctx) {
            TemplateVariables::DatabaseServer(vars) => {
                let expected = db.port.unwrap_or_else(|| db.engine.default_port());
                prop_assert_eq!(vars.db_port, expected);
                prop_assert_eq!(vars.replica_ips, db.replicas.join(","));
            }
            other => prop_assert!(false, "unexpected variables: {:?}", other),
        }
    }

    /// Planning the same topology twice yields the same calls
    #[test]
    fn prop_plan_deterministic(dbs in prop::collection::vec(database(), 0..4)) {
        let dbs: Vec<Database> = dbs
            .into_iter()
            .enumerate()
            .map(|(i, mut db)| {
                db.name = format!("{}-{}", db.name, i);
                db
            })
            .collect();
        let topology = Topology::new(vec![
            secure_tier(),
            Tier::new("data_tier", "ls-data", TierEntities::Databases(dbs)),
            app_tier(),
        ]);

        let plan = plan_topology(&topology);
        prop_assert_eq!(&plan, &plan_topology(&topology));
        prop_assert_eq!(plan.len(), topology.entity_count());
    }
}
