//! # Grasp library.
//!
//! This library allows other crates in the workspace to access items defined inside the grasp
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Equipment - device capability interfaces and their network clients
pub mod eqpt;

/// Grasp control module - locates, grasps and lifts the object
pub mod grasp_ctrl;

/// Executable parameters
pub mod params;

/// Service server - exposes the grasp control module over RPC
pub mod svc_server;
