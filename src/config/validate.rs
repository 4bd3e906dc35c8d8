// src/config/validate.rs

use std::collections::BTreeMap;

use crate::config::duration::parse_duration;
use crate::config::model::{
    ConfigFile, RawConfigFile, RunnerSettings, ToolCommand, ToolLaunch, ToolSection, default_argv,
};
use crate::errors::{KeysweepError, Result};
use crate::types::ToolId;

/// Placeholder replaced by the quoted input path in shell templates.
pub const INPUT_PLACEHOLDER: &str = "{input}";

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = KeysweepError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let runner = validate_runner(&raw)?;

        let mut tools: BTreeMap<ToolId, ToolCommand> = ToolId::ALL
            .iter()
            .map(|&id| (id, ToolCommand::default_for(id)))
            .collect();

        for (name, section) in raw.tool.iter() {
            let tool: ToolId = name.parse().map_err(|_| {
                KeysweepError::ConfigError(format!(
                    "[tool.{name}]: unknown tool (expected aes, rsa, serpent or twofish)"
                ))
            })?;
            tools.insert(tool, resolve_tool(tool, section)?);
        }

        Ok(ConfigFile::new_unchecked(runner, tools))
    }
}

fn validate_runner(cfg: &RawConfigFile) -> Result<RunnerSettings> {
    let grace_period = parse_duration(&cfg.runner.grace_period).map_err(|e| {
        KeysweepError::ConfigError(format!("[runner].grace_period: {e}"))
    })?;

    if grace_period.is_zero() {
        return Err(KeysweepError::ConfigError(
            "[runner].grace_period must be greater than zero".to_string(),
        ));
    }

    let shell = cfg.runner.shell.trim();
    if shell.is_empty() {
        return Err(KeysweepError::ConfigError(
            "[runner].shell must not be empty".to_string(),
        ));
    }

    Ok(RunnerSettings {
        grace_period,
        shell: shell.to_string(),
    })
}

/// Merge a `[tool.<id>]` section over the built-in command for `tool`.
fn resolve_tool(tool: ToolId, section: &ToolSection) -> Result<ToolCommand> {
    let launch = match &section.shell {
        Some(template) => {
            if section.args.is_some() {
                return Err(KeysweepError::ConfigError(format!(
                    "[tool.{tool}]: `shell` cannot be combined with `args`"
                )));
            }
            if !template.contains(INPUT_PLACEHOLDER) {
                return Err(KeysweepError::ConfigError(format!(
                    "[tool.{tool}].shell must contain the {INPUT_PLACEHOLDER} placeholder"
                )));
            }
            ToolLaunch::Shell {
                template: template.clone(),
                program: shell_program(tool, template, section.program.as_deref())?,
            }
        }
        None => {
            let (default_program, default_args) = default_argv(tool);

            let program = section.program.clone().unwrap_or(default_program);
            if program.trim().is_empty() {
                return Err(KeysweepError::ConfigError(format!(
                    "[tool.{tool}].program must not be empty"
                )));
            }

            ToolLaunch::Argv {
                program,
                args: section.args.clone().unwrap_or(default_args),
            }
        }
    };

    Ok(ToolCommand {
        launch,
        working_dir: section.working_dir.clone(),
    })
}

/// Scanner run by a shell template: the explicit `program`, else the first
/// word of the line.
fn shell_program(tool: ToolId, template: &str, explicit: Option<&str>) -> Result<String> {
    if let Some(program) = explicit {
        if program.trim().is_empty() {
            return Err(KeysweepError::ConfigError(format!(
                "[tool.{tool}].program must not be empty"
            )));
        }
        return Ok(program.trim().to_string());
    }

    match template.split_whitespace().next() {
        Some(word) if is_plain_word(word) => Ok(word.to_string()),
        _ => Err(KeysweepError::ConfigError(format!(
            "[tool.{tool}]: cannot tell which program `shell` runs; set `program`"
        ))),
    }
}

/// True when the shell would take `word` literally as a command name.
fn is_plain_word(word: &str) -> bool {
    !word.contains(|c: char| "'\"\\$`=;|&<>(){}*?".contains(c))
}
