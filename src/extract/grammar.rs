// src/extract/grammar.rs

use regex::{Regex, RegexBuilder};

use crate::types::ToolId;

/// How the capture groups of a grammar become one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    /// Group 1 is the key size in bits, group 2 the hex byte offset.
    SizeAndOffset,
    /// Group 1 is the hex byte offset.
    Offset,
}

/// Pattern + record shape for one scanner's report format.
///
/// Patterns are written against whitespace-stripped text and compiled
/// case-insensitively.
#[derive(Debug, Clone)]
pub struct ToolGrammar {
    tool: ToolId,
    shape: RecordShape,
    regex: Regex,
}

impl ToolGrammar {
    pub fn for_tool(tool: ToolId) -> Result<Self, regex::Error> {
        let (pattern, shape) = match tool {
            // FOUND POSSIBLE 128-BIT KEY AT BYTE 1a2b
            // KEY: ...
            ToolId::Aes => (
                r"FOUNDPOSSIBLE(128|256)-BITKEYATBYTE([0-9a-f]+)KEY",
                RecordShape::SizeAndOffset,
            ),
            // FOUND PRIVATE KEY AT 3f00
            // version = ...
            ToolId::Rsa => (r"FOUNDPRIVATEKEYAT([0-9a-f]+)version", RecordShape::Offset),
            ToolId::Serpent => (
                r"FOUNDPOSSIBLESERPENTKEYATBYTE([0-9a-f]+)KEY",
                RecordShape::Offset,
            ),
            ToolId::Twofish => (
                r"FOUNDPOSSIBLETWOFISHKEYATBYTE([0-9a-f]+)KEY",
                RecordShape::Offset,
            ),
        };

        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { tool, shape, regex })
    }

    pub fn tool(&self) -> ToolId {
        self.tool
    }

    pub fn shape(&self) -> RecordShape {
        self.shape
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// All grammars, compiled once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct GrammarTable {
    aes: ToolGrammar,
    rsa: ToolGrammar,
    serpent: ToolGrammar,
    twofish: ToolGrammar,
}

impl GrammarTable {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            aes: ToolGrammar::for_tool(ToolId::Aes)?,
            rsa: ToolGrammar::for_tool(ToolId::Rsa)?,
            serpent: ToolGrammar::for_tool(ToolId::Serpent)?,
            twofish: ToolGrammar::for_tool(ToolId::Twofish)?,
        })
    }

    pub fn get(&self, tool: ToolId) -> &ToolGrammar {
        match tool {
            ToolId::Aes => &self.aes,
            ToolId::Rsa => &self.rsa,
            ToolId::Serpent => &self.serpent,
            ToolId::Twofish => &self.twofish,
        }
    }
}
