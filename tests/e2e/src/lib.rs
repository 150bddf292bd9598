//! Larder End-to-End Tests
//!
//! Drives the engine the way a host would: construct it over a store
//! and a network, run populate and prune, then route requests through
//! `handle` and watch what the client sees. The journeys live in
//! `tests/`; this crate only carries the shared fixtures.

pub mod fixtures;
