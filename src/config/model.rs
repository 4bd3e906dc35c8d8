// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::DEFAULT_GRACE_PERIOD;
use crate::types::ToolId;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [runner]
/// grace_period = "3s"
/// shell = "sh"
///
/// [tool.aes]
/// program = "/usr/local/bin/aeskeyfind"
///
/// [tool.twofish]
/// shell = "keyscan -a twofish {input}"
/// ```
///
/// Every section is optional. Tool table names are checked against the
/// known tool ids during validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default)]
    pub tool: BTreeMap<String, ToolSection>,
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerSection {
    /// Time between SIGTERM and SIGKILL when a run is cancelled, e.g.
    /// `"500ms"`, `"3s"`.
    #[serde(default = "default_grace_period")]
    pub grace_period: String,

    /// Interpreter used for shell-mode tools (`<shell> -c <line>`).
    #[serde(default = "default_shell")]
    pub shell: String,
}

fn default_grace_period() -> String {
    format!("{}s", DEFAULT_GRACE_PERIOD.as_secs())
}

fn default_shell() -> String {
    "sh".to_string()
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            grace_period: default_grace_period(),
            shell: default_shell(),
        }
    }
}

/// `[tool.<id>]` section. Unset fields fall back to the built-in command
/// for that tool.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSection {
    /// Argv mode: the program to run. Shell mode: the scanner binary the
    /// line runs, checked before launch (default: the line's first word).
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    /// Shell line with an `{input}` placeholder. Mutually exclusive with
    /// `args`.
    pub shell: Option<String>,
    pub working_dir: Option<PathBuf>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub runner: RunnerSettings,
    pub tools: BTreeMap<ToolId, ToolCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    pub grace_period: Duration,
    pub shell: String,
}

/// How a tool is launched; the input image path is appended (argv) or
/// substituted for `{input}` (shell).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolLaunch {
    Argv { program: String, args: Vec<String> },
    /// `program` is the scanner the template invokes.
    Shell { template: String, program: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub launch: ToolLaunch,
    pub working_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// Built-in command line for each scanner.
    pub fn default_for(tool: ToolId) -> Self {
        let (program, args) = default_argv(tool);
        Self {
            launch: ToolLaunch::Argv { program, args },
            working_dir: None,
        }
    }

    /// The scanner binary.
    pub fn program(&self) -> &str {
        match &self.launch {
            ToolLaunch::Argv { program, .. } | ToolLaunch::Shell { program, .. } => program,
        }
    }

    /// Every program that must resolve before the tool may run: the
    /// interpreter (shell mode only), then the scanner.
    pub fn required_programs<'a>(&'a self, shell: &'a str) -> Vec<&'a str> {
        match &self.launch {
            ToolLaunch::Argv { program, .. } => vec![program.as_str()],
            ToolLaunch::Shell { program, .. } => vec![shell, program.as_str()],
        }
    }
}

/// Program and arguments (before the input path) each scanner is run with
/// when the config doesn't say otherwise.
pub fn default_argv(tool: ToolId) -> (String, Vec<String>) {
    let (program, args): (&str, &[&str]) = match tool {
        ToolId::Aes => ("aeskeyfind", &["-v", "-q"]),
        ToolId::Rsa => ("rsakeyfind", &[]),
        ToolId::Serpent => ("keyscan", &["-a", "serpent"]),
        ToolId::Twofish => ("keyscan", &["-a", "twofish"]),
    };
    (
        program.to_string(),
        args.iter().map(|s| s.to_string()).collect(),
    )
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        runner: RunnerSettings,
        tools: BTreeMap<ToolId, ToolCommand>,
    ) -> Self {
        Self { runner, tools }
    }

    /// Command for `tool`; every tool always has one after validation.
    pub fn tool(&self, tool: ToolId) -> ToolCommand {
        self.tools
            .get(&tool)
            .cloned()
            .unwrap_or_else(|| ToolCommand::default_for(tool))
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let tools = ToolId::ALL
            .iter()
            .map(|&id| (id, ToolCommand::default_for(id)))
            .collect();

        Self {
            runner: RunnerSettings {
                grace_period: DEFAULT_GRACE_PERIOD,
                shell: default_shell(),
            },
            tools,
        }
    }
}
