// src/pipeline/dispatch.rs

//! Static tool table: which files a tool writes and how it is invoked.

use std::path::{Path, PathBuf};

use crate::config::{INPUT_PLACEHOLDER, ToolCommand, ToolLaunch};
use crate::errors::PreconditionError;
use crate::exec::{Invocation, shell_quote};
use crate::types::ToolId;

/// File names a tool run produces inside the results directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolFiles {
    /// Full merged output of the scanner.
    pub raw: &'static str,
    /// Normalized findings, one per line.
    pub values: &'static str,
}

pub fn files_for(tool: ToolId) -> ToolFiles {
    match tool {
        ToolId::Aes => ToolFiles {
            raw: "aeskeyfind_output.txt",
            values: "aeskeyfind_values.txt",
        },
        ToolId::Rsa => ToolFiles {
            raw: "rsakeyfind_output.txt",
            values: "rsakeyfind_values.txt",
        },
        ToolId::Serpent => ToolFiles {
            raw: "serpent_output.txt",
            values: "serpent_values.txt",
        },
        ToolId::Twofish => ToolFiles {
            raw: "twofish_output.txt",
            values: "twofish_values.txt",
        },
    }
}

/// Concrete output paths for one tool under `output_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub raw: PathBuf,
    pub values: PathBuf,
}

pub fn output_paths(tool: ToolId, output_dir: &Path) -> ToolPaths {
    let files = files_for(tool);
    ToolPaths {
        raw: output_dir.join(files.raw),
        values: output_dir.join(files.values),
    }
}

/// Build the invocation for `command` against `input`.
///
/// Argv mode appends the input path as the last argument. Shell mode
/// substitutes the single-quoted path for every `{input}`.
pub fn build_invocation(
    command: &ToolCommand,
    shell: &str,
    input: &Path,
) -> Result<Invocation, PreconditionError> {
    let input_str = input
        .to_str()
        .ok_or_else(|| PreconditionError::NonUtf8Path(input.to_path_buf()))?;

    let mut invocation = match &command.launch {
        ToolLaunch::Argv { program, args } => Invocation::argv(
            program.clone(),
            args.iter().cloned().chain(std::iter::once(input_str.to_string())),
        ),
        ToolLaunch::Shell { template, .. } => Invocation::shell_with(
            shell,
            template.replace(INPUT_PLACEHOLDER, &shell_quote(input_str)),
        ),
    };

    if let Some(dir) = &command.working_dir {
        invocation = invocation.with_working_dir(dir);
    }

    Ok(invocation)
}
