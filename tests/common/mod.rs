// Common test utilities

pub mod harness;
