// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Models
//!
//! Core domain concepts for describing an infrastructure topology whose
//! network policies are generated from platform templates.
//!
//! # Value Objects with Invariants
//!
//! - [`Cidr`] - IPv4/IPv6 network in CIDR notation
//! - [`DatabaseEngine`] - Database engine with well-known port table
//!
//! # Topology
//!
//! - [`Topology`] - Ordered tiers, loaded from YAML or JSON
//! - [`Tier`] - Entities of one kind sharing a target switch
//! - [`Server`], [`Service`], [`Database`], [`SecureResource`] - Tier entities

pub mod database;
pub mod invariants;
pub mod network;
pub mod reference;
pub mod topology;

pub use database::{resolve_port, DatabaseEngine};
pub use invariants::{InvariantResult, InvariantViolation};
pub use network::{Cidr, NetworkError};
pub use reference::reference_topology;
pub use topology::{
    Database, EntityRef, SecureResource, Server, Service, Tier, TierEntities, TierKind, Topology,
    TopologyError,
};
