//! Command dispatch and batch execution.
//!
//! Neither function returns an error: every failure is folded into a
//! [`Response`](crate::models::Response) so one bad command cannot abort
//! its batch or the connection carrying it.

pub mod batch;
pub mod dispatcher;

pub use batch::run_batch;
pub use dispatcher::dispatch;
