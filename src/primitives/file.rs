//! File primitives: read, create, write, append, delete.
//!
//! `WriteFile` and `AppendFile` never create a missing file; pair them with
//! `CreateFile` in the same batch when the target may not exist yet.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::{expand_path, expect_args, require_non_empty, Primitive};
use crate::{AppError, Result};

/// Validate and expand the path argument shared by every file primitive.
fn target_path(raw: &str) -> Result<PathBuf> {
    let raw = require_non_empty(raw, "file path")?;
    expand_path(raw)
}

fn resource_error(action: &str, path: &Path, err: &std::io::Error) -> AppError {
    AppError::Resource(format!("could not {action} file {}: {err}", path.display()))
}

/// Read an entire file and return its contents.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadFile;

impl Primitive for ReadFile {
    fn name(&self) -> &str {
        "ReadFile"
    }

    fn execute(&self, args: &[String]) -> Result<String> {
        expect_args(self.name(), args, 1, "file path")?;
        let path = target_path(&args[0])?;

        let mut file = File::open(&path).map_err(|err| resource_error("open", &path, &err))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|err| resource_error("read", &path, &err))?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Create a file, truncating it if it already exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateFile;

impl Primitive for CreateFile {
    fn name(&self) -> &str {
        "CreateFile"
    }

    fn execute(&self, args: &[String]) -> Result<String> {
        expect_args(self.name(), args, 1, "file path")?;
        let path = target_path(&args[0])?;

        File::create(&path).map_err(|err| resource_error("create", &path, &err))?;

        Ok(format!("File {} created successfully", path.display()))
    }
}

/// Overwrite the start of an existing file with new content.
///
/// Opens write-only without truncation, matching a plain `open(O_WRONLY)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WriteFile;

impl Primitive for WriteFile {
    fn name(&self) -> &str {
        "WriteFile"
    }

    fn execute(&self, args: &[String]) -> Result<String> {
        expect_args(self.name(), args, 2, "file path and content")?;
        let path = target_path(&args[0])?;

        let mut file = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|err| resource_error("open", &path, &err))?;
        file.write_all(args[1].as_bytes())
            .map_err(|err| resource_error("write to", &path, &err))?;

        Ok("File written successfully".to_owned())
    }
}

/// Append content to the end of an existing file.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppendFile;

impl Primitive for AppendFile {
    fn name(&self) -> &str {
        "AppendFile"
    }

    fn execute(&self, args: &[String]) -> Result<String> {
        expect_args(self.name(), args, 2, "file path and content")?;
        let path = target_path(&args[0])?;

        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|err| resource_error("open", &path, &err))?;
        file.write_all(args[1].as_bytes())
            .map_err(|err| resource_error("append to", &path, &err))?;

        Ok("Appended Successfully".to_owned())
    }
}

/// Remove a file.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeleteFile;

impl Primitive for DeleteFile {
    fn name(&self) -> &str {
        "DeleteFile"
    }

    fn execute(&self, args: &[String]) -> Result<String> {
        expect_args(self.name(), args, 1, "file path")?;
        let path = target_path(&args[0])?;

        fs::remove_file(&path).map_err(|err| resource_error("delete", &path, &err))?;

        Ok(format!("File {} deleted successfully", path.display()))
    }
}
