//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no broker and
//! no weather endpoint required.

mod api_tests;
mod http_server_tests;
mod mocks;
