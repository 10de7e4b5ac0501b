//! Shared utilities for the dstake ledger.

pub mod logging;

pub use logging::{init_logging, try_init_test_logging, LogFormat};
