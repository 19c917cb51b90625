//! Shared domain primitives for the Lambda managed-server demo.
//!
//! This crate owns the response contracts, workload sizing, WebSocket route
//! variants and the declarative stack (role, functions, URLs, outputs) along
//! with its Terraform rendering. It intentionally excludes AWS SDK and Lambda
//! runtime concerns.

pub mod contract;
pub mod routes;
pub mod stack;
pub mod terraform;
pub mod workload;
