//! # Port Name Table
//!
//! Ports are named hierarchically by role under a per-instance namespace, e.g.
//! `/TestAssignmentGraspIt/ball:rpc` or `/icubSim/cartesianController/right_arm/state:o`. The name
//! table maps the names of ports which accept connections onto zmq endpoints.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network parameters, loaded from `net.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetParams {
    /// Map from port name to the zmq endpoint clients should connect to, for example
    /// `"/service" = "tcp://localhost:5100"`.
    pub names: HashMap<String, String>,
}

/// Resolves port names into zmq endpoints.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: HashMap<String, String>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NameTableError {
    #[error("No endpoint is registered for the port name {0}, add it to net.toml")]
    UnknownName(String),

    #[error("The endpoint {0} is not a tcp endpoint with a port")]
    InvalidEndpoint(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NameTable {
    /// Build a name table from the network parameters.
    pub fn new(params: &NetParams) -> Self {
        Self {
            names: params.names.clone(),
        }
    }

    /// Register (or replace) the endpoint for a name.
    pub fn register(&mut self, name: &str, endpoint: &str) {
        self.names.insert(name.into(), endpoint.into());
    }

    /// Get the endpoint a client should connect to in order to reach `name`.
    pub fn resolve(&self, name: &str) -> Result<&str, NameTableError> {
        self.names
            .get(name)
            .map(|s| s.as_str())
            .ok_or_else(|| NameTableError::UnknownName(name.into()))
    }

    /// Get the endpoint a server should bind to in order to serve `name`.
    pub fn resolve_bind(&self, name: &str) -> Result<String, NameTableError> {
        bind_endpoint(self.resolve(name)?)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a connect endpoint into the matching bind endpoint.
///
/// `tcp://host:port` becomes `tcp://*:port`, other transports (`inproc`, `ipc`) are returned
/// unchanged since they are bound and connected with the same address.
pub fn bind_endpoint(endpoint: &str) -> Result<String, NameTableError> {
    match endpoint.strip_prefix("tcp://") {
        Some(addr) => match addr.rsplit_once(':') {
            Some((_, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
                Ok(format!("tcp://*:{}", port))
            }
            _ => Err(NameTableError::InvalidEndpoint(endpoint.into())),
        },
        None => Ok(endpoint.into()),
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bind_endpoint() {
        assert_eq!(bind_endpoint("tcp://localhost:5100").unwrap(), "tcp://*:5100");
        assert_eq!(bind_endpoint("tcp://10.0.0.2:80").unwrap(), "tcp://*:80");
        assert_eq!(bind_endpoint("inproc://service").unwrap(), "inproc://service");
        assert!(bind_endpoint("tcp://localhost").is_err());
        assert!(bind_endpoint("tcp://localhost:").is_err());
    }

    #[test]
    fn test_resolve() {
        let mut params = NetParams::default();
        params
            .names
            .insert("/service".into(), "tcp://localhost:5100".into());

        let mut table = NameTable::new(&params);
        assert_eq!(table.resolve("/service").unwrap(), "tcp://localhost:5100");
        assert_eq!(table.resolve_bind("/service").unwrap(), "tcp://*:5100");
        assert!(matches!(
            table.resolve("/icubSim/gazeController"),
            Err(NameTableError::UnknownName(_))
        ));

        table.register("/icubSim/gazeController", "tcp://localhost:5200");
        assert_eq!(
            table.resolve("/icubSim/gazeController").unwrap(),
            "tcp://localhost:5200"
        );
    }
}
