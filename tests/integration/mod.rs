//! Integration Tests Module
//!
//! End-to-end tests for the AGUI bridge: stream conversion properties,
//! the per-run streaming service, thread sessions, and config persistence.

// Adapter conversion properties and the full-run scenario
mod stream_adapter_test;


// Thread session manager and broadcast fan-out
mod session_manager_test;
