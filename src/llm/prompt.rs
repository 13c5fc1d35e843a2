//! Prompt construction and batch extraction from model replies.

use serde_json::Deserializer;

use crate::models::Batch;
use crate::{AppError, Result};

/// Build the instruction asking a model to translate `request` into a batch
/// using only `primitives`.
#[must_use]
pub fn planning_prompt(request: &str, primitives: &[&str]) -> String {
    let catalogue = primitives
        .iter()
        .map(|name| format!("- {name}: {}", usage(name)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Translate the user's request into a JSON object of the form \
         {{\"commands\":[{{\"name\":\"<primitive>\",\"args\":[\"...\"]}}]}}.\n\
         Commands run in order on a remote machine. Use only these primitives:\n\
         {catalogue}\n\
         Paths may start with ~/ for the remote user's home directory.\n\
         Reply with the JSON object only.\n\n\
         Request: {request}"
    )
}

fn usage(name: &str) -> &'static str {
    match name {
        "ReadFile" => "[path] read a file",
        "CreateFile" => "[path] create or truncate a file",
        "WriteFile" => "[path, content] write to an existing file",
        "AppendFile" => "[path, content] append to an existing file",
        "DeleteFile" => "[path] delete a file",
        "CommandExec" => "[shell line] run a shell command and capture its output",
        _ => "see documentation",
    }
}

/// Find the first JSON object in `reply` that parses as a [`Batch`].
///
/// Models often wrap the JSON in prose or code fences; everything around the
/// object is ignored.
///
/// # Errors
///
/// Returns `AppError::Llm` if no candidate object parses.
pub fn extract_batch(reply: &str) -> Result<Batch> {
    for (start, _) in reply.match_indices('{') {
        let mut stream = Deserializer::from_str(&reply[start..]).into_iter::<Batch>();
        if let Some(Ok(batch)) = stream.next() {
            return Ok(batch);
        }
    }
    Err(AppError::Llm(
        "model reply did not contain a command batch".into(),
    ))
}
