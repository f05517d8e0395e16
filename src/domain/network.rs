// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants
//!
//! Topology documents carry addresses as plain strings because they are sent
//! to the template API verbatim. These value objects are used to check them
//! once, when a topology is loaded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32 for IPv4, 0-128 for IPv6)")]
    InvalidPrefixLength(u8),

    #[error("Invalid port: {0} (must be 1-65535)")]
    InvalidPort(u16),
}

/// Parse a bare host address (no prefix length)
pub fn parse_host(addr: impl AsRef<str>) -> Result<IpAddr, NetworkError> {
    let addr = addr.as_ref();
    IpAddr::from_str(addr.trim()).map_err(|_| NetworkError::InvalidIpAddress(addr.to_string()))
}

/// Validate a transport port number
pub fn validate_port(port: u16) -> Result<u16, NetworkError> {
    if port == 0 {
        return Err(NetworkError::InvalidPort(port));
    }
    Ok(port)
}

/// CIDR block value object
///
/// Represents an IPv4 or IPv6 network in `address/prefix` notation.
/// Invariants:
/// - Valid IP address format
/// - Prefix length present and within range for the address family
///
/// # Examples
///
/// ```rust
/// use cim_policy_orchestrator::domain::Cidr;
///
/// let net = Cidr::new("10.0.100.0/24").unwrap();
/// assert_eq!(net.address().to_string(), "10.0.100.0");
/// assert_eq!(net.prefix_length(), 24);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cidr {
    address: IpAddr,
    prefix_length: u8,
}

impl Cidr {
    /// Parse a CIDR block such as `"10.0.2.0/24"`
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();

        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let address = IpAddr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_length)
    }

    /// Create from separate address and prefix
    pub fn from_parts(address: IpAddr, prefix_length: u8) -> Result<Self, NetworkError> {
        let max_prefix = match address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        if prefix_length > max_prefix {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        Ok(Self {
            address,
            prefix_length,
        })
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// True for `0.0.0.0/0` and `::/0`
    pub fn is_any(&self) -> bool {
        self.prefix_length == 0
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_length)
    }
}

impl FromStr for Cidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Validate a source list such as `"0.0.0.0/0"` or `"10.0.1.0/24,10.0.2.0/24"`
///
/// Each comma-separated element may be a CIDR block or a bare host address.
pub fn validate_source_list(list: &str) -> Result<(), NetworkError> {
    if list.trim().is_empty() {
        return Err(NetworkError::InvalidCidr(list.to_string()));
    }

    for item in list.split(',').map(str::trim) {
        if item.contains('/') {
            Cidr::new(item)?;
        } else {
            parse_host(item)?;
        }
    }
    Ok(())
}
