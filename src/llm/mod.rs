//! Natural-language front end for the master.
//!
//! Turns a free-form request into a [`Batch`](crate::models::Batch) by
//! asking a language model. The slave never sees any of this; it only
//! receives the resulting JSON.

pub mod client;
pub mod model;
pub mod prompt;

pub use client::{load_openai_key, LlmClient};
pub use model::{Backend, Model};
pub use prompt::{extract_batch, planning_prompt};
