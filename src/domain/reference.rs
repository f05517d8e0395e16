// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reference Topology
//!
//! A complete four-tier deployment used by the CLI when no topology document
//! is supplied, and by tests as a realistic input:
//!
//! - web tier: two public web servers
//! - application tier: five microservices with a dependency mesh
//! - data tier: PostgreSQL with replicas, MySQL, Redis
//! - secure tier: admin panel and monitoring behind zero-trust policies

use super::database::DatabaseEngine;
use super::topology::{
    Database, SecureResource, Server, Service, Tier, TierEntities, Topology,
};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn web_server(name: &str, ip: &str) -> Server {
    Server {
        name: name.to_string(),
        ip: ip.to_string(),
        allowed_sources: Some("0.0.0.0/0".to_string()),
        enable_ssh: None,
        ssh_sources: None,
    }
}

fn service(name: &str, ip: &str, port: u16, dependencies: &[&str]) -> Service {
    Service {
        name: name.to_string(),
        ip: ip.to_string(),
        port: Some(port),
        dependencies: strings(dependencies),
    }
}

fn zero_trust(name: &str, ip: &str, port: u16, users: &[&str]) -> SecureResource {
    SecureResource {
        name: name.to_string(),
        ip: ip.to_string(),
        port,
        authorized_users: strings(users),
        require_encryption: Some(true),
    }
}

/// Build the reference topology
pub fn reference_topology() -> Topology {
    let web = Tier::new(
        "web_tier",
        "ls-web",
        TierEntities::Servers(vec![
            web_server("web-1", "10.0.1.10"),
            web_server("web-2", "10.0.1.11"),
        ]),
    );

    let app = Tier::new(
        "app_tier",
        "ls-app",
        TierEntities::Services(vec![
            service("api-gateway", "10.0.2.10", 8080, &["user-service", "order-service"]),
            service("user-service", "10.0.2.11", 8081, &["auth-service"]),
            service("order-service", "10.0.2.12", 8082, &["user-service", "payment-service"]),
            service("payment-service", "10.0.2.13", 8083, &[]),
            service("auth-service", "10.0.2.14", 8084, &[]),
        ]),
    );

    let data = Tier::new(
        "data_tier",
        "ls-data",
        TierEntities::Databases(vec![
            Database {
                name: "users-db".to_string(),
                engine: DatabaseEngine::PostgreSql,
                ip: "10.0.3.10".to_string(),
                port: None,
                app_subnet: "10.0.2.0/24".to_string(),
                backup_server: Some("10.0.100.50".to_string()),
                enable_replication: Some(true),
                replicas: strings(&["10.0.3.11", "10.0.3.12"]),
            },
            Database {
                name: "orders-db".to_string(),
                engine: DatabaseEngine::MySql,
                ip: "10.0.3.20".to_string(),
                port: None,
                app_subnet: "10.0.2.0/24".to_string(),
                backup_server: Some("10.0.100.50".to_string()),
                enable_replication: None,
                replicas: Vec::new(),
            },
            Database {
                name: "cache".to_string(),
                engine: DatabaseEngine::Redis,
                ip: "10.0.3.30".to_string(),
                port: None,
                app_subnet: "10.0.2.0/24".to_string(),
                backup_server: None,
                enable_replication: None,
                replicas: Vec::new(),
            },
        ]),
    );

    let secure = Tier::new(
        "secure_resources",
        "ls-secure",
        TierEntities::Resources(vec![
            zero_trust("admin-panel", "10.0.5.10", 443, &["10.0.100.10", "10.0.100.11"]),
            zero_trust(
                "monitoring",
                "10.0.5.20",
                3000,
                &["10.0.100.10", "10.0.100.11", "10.0.100.12"],
            ),
        ]),
    );

    Topology::new(vec![web, app, data, secure])
}
