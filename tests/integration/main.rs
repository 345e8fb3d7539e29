//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no real hardware
//! required.

mod compliance_tests;
mod database_tests;
mod mock_hw;
mod motion_tests;
mod service_tests;
