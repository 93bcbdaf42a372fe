//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command and response definitions for equipment (arms, gaze, hands)
pub mod eqpt;

/// Network module
pub mod net;

/// Request/reply messaging between named ports
pub mod rpc;
