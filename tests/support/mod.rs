//! Shared helpers for integration tests.
//!
//! Each test binary pulls in only what it needs, so unused items are expected.
#![allow(dead_code)]

pub mod scripted;
pub mod socket_guard;
