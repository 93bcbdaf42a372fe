//! # Smoke test library.
//!
//! Black-box test of the grasp executable: places the ball in the simulated world, asks the grasp
//! service to pick it up and checks that a hand reached the ball and lifted it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Test harness - runs the test sequence over a set of ports
pub mod harness;

/// Test parameters
pub mod params;

/// Proximity monitor - watches the hands approaching the ball
pub mod proximity;

/// Test report
pub mod report;

/// Scenario presets
pub mod scenario;

/// World client - queries and moves the ball
pub mod world;
