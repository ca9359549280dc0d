//! Shared fixtures for the workflow integration tests.

#![allow(dead_code)] // each test binary uses a different subset

pub mod builders;
pub mod scripted_remote;

pub use builders::*;
pub use scripted_remote::*;
