#![forbid(unsafe_code)]

//! `opsmith` — remote execution of whitelisted primitives.
//!
//! A master sends a JSON [`Batch`](models::Batch) of named commands to a
//! slave over TCP; the slave runs each through its [`Registry`](registry::Registry)
//! and answers with one [`BatchResponse`](models::BatchResponse).

pub mod client;
pub mod config;
pub mod errors;
pub mod executor;
pub mod llm;
pub mod models;
pub mod primitives;
pub mod registry;
pub mod server;
pub mod telemetry;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
pub use registry::Registry;
