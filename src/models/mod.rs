//! Wire model types exchanged between master and slave.
//!
//! Request:
//! ```json
//! {"commands":[{"name":"ReadFile","args":["/tmp/a.txt"]}]}
//! ```
//!
//! Response:
//! ```json
//! {"results":[{"data":"...","error":"","status":0}],"status":0}
//! ```

pub mod command;
pub mod response;

pub use command::{Batch, Command};
pub use response::{BatchResponse, ErrorFrame, Response, STATUS_ERROR, STATUS_OK};
