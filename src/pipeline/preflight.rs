// src/pipeline/preflight.rs

//! Checks that must pass before a tool process is launched.

use std::env;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::errors::PreconditionError;

/// The memory image must exist and be openable for reading.
pub fn check_input(path: &Path) -> Result<(), PreconditionError> {
    if !path.exists() {
        return Err(PreconditionError::MissingInput(path.to_path_buf()));
    }

    if path.is_dir() {
        return Err(PreconditionError::UnreadableInput {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "is a directory"),
        });
    }

    File::open(path)
        .map(|_| ())
        .map_err(|source| PreconditionError::UnreadableInput {
            path: path.to_path_buf(),
            source,
        })
}

/// Create the results directory (and parents) if it doesn't exist yet.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PreconditionError> {
    if dir.exists() && !dir.is_dir() {
        return Err(PreconditionError::OutputDir {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "exists and is not a directory"),
        });
    }

    fs::create_dir_all(dir).map_err(|source| PreconditionError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Locate `program` the way the OS will when spawning it.
///
/// Names containing a path separator are checked directly (relative ones
/// against `working_dir` when given); bare names are searched on `PATH`.
pub fn resolve_program(
    program: &str,
    working_dir: Option<&Path>,
) -> Result<PathBuf, PreconditionError> {
    let candidate = Path::new(program);

    if candidate.components().count() > 1 || candidate.is_absolute() {
        let full = match working_dir {
            Some(dir) if candidate.is_relative() => dir.join(candidate),
            _ => candidate.to_path_buf(),
        };
        return if is_executable(&full) {
            Ok(full)
        } else {
            Err(PreconditionError::ProgramNotFound(program.to_string()))
        };
    }

    env::var_os("PATH")
        .iter()
        .flat_map(env::split_paths)
        .map(|dir| dir.join(program))
        .find(|path| is_executable(path))
        .ok_or_else(|| PreconditionError::ProgramNotFound(program.to_string()))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
