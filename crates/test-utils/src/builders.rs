#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use keysweep::config::{ConfigFile, RawConfigFile, RunnerSection, ToolSection};
use keysweep::types::ToolId;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                runner: RunnerSection::default(),
                tool: BTreeMap::new(),
            },
        }
    }

    pub fn with_tool(mut self, tool: ToolId, section: ToolSection) -> Self {
        self.config.tool.insert(tool.to_string(), section);
        self
    }

    pub fn grace_period(mut self, value: &str) -> Self {
        self.config.runner.grace_period = value.to_string();
        self
    }

    pub fn shell(mut self, interpreter: &str) -> Self {
        self.config.runner.shell = interpreter.to_string();
        self
    }

    /// The unvalidated config, for tests of validation itself.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ToolSection`.
pub struct ToolSectionBuilder {
    section: ToolSection,
}

impl ToolSectionBuilder {
    pub fn new() -> Self {
        Self {
            section: ToolSection::default(),
        }
    }

    /// Argv-mode tool: `<program> <args...> <input>`.
    pub fn program(mut self, program: &str) -> Self {
        self.section.program = Some(program.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.section.args.get_or_insert_with(Vec::new).push(arg.to_string());
        self
    }

    /// Argv-mode tool that runs `script` through `sh`, so the script itself
    /// doesn't need to be executable.
    pub fn sh_script(self, script: &Path) -> Self {
        self.program("sh").arg(&script.to_string_lossy())
    }

    /// Shell-mode tool; `template` should contain `{input}`.
    pub fn shell(mut self, template: &str) -> Self {
        self.section.shell = Some(template.to_string());
        self
    }

    pub fn working_dir(mut self, dir: &Path) -> Self {
        self.section.working_dir = Some(dir.to_path_buf());
        self
    }

    pub fn build(self) -> ToolSection {
        self.section
    }
}

impl Default for ToolSectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
