use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::syntax::{Conditional, GameVersion, ParameterType};
use crate::token::Token;
use crate::value::{Address, ParameterValue};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptArgument {
    pub name: String,
    #[serde(rename = "type")]
    pub ptype: ParameterType,
    #[serde(default)]
    pub description: String,
}

/// Declared arguments of a script reached through a call instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptCallInfo {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<ScriptArgument>,
}

impl ScriptCallInfo {
    pub fn argument_position(&self, name: &str) -> Option<usize> {
        self.arguments
            .iter()
            .position(|argument| argument.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableInfo {
    pub usage_count: usize,
    pub assignment_count: usize,
    pub argument_type: Option<ParameterType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledParameter {
    #[serde(rename = "type")]
    pub ptype: ParameterType,
    pub value: ParameterValue,
}

/// One command of the emitted, address-resolved sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub id: u16,
    pub line_number: usize,
    pub address: Option<Address>,
    pub conditional: Conditional,
    pub parameters: Vec<CompiledParameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub postfix: Vec<CompiledParameter>,
    pub commented: bool,
    pub text: String,
}

impl Command {
    pub fn is_standard(&self) -> bool {
        self.address.is_some()
    }
}

/// Output container of a compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptFile {
    pub name: String,
    pub game_version: GameVersion,
    pub arguments: Vec<ScriptArgument>,
    pub labels: BTreeMap<String, usize>,
    pub variables: BTreeMap<String, VariableInfo>,
    pub script_calls: BTreeMap<String, ScriptCallInfo>,
    pub commands: Vec<Command>,
}

impl ScriptFile {
    pub fn new(
        name: impl Into<String>,
        game_version: GameVersion,
        arguments: Vec<ScriptArgument>,
    ) -> Self {
        let mut variables = BTreeMap::new();
        for argument in &arguments {
            variables.insert(
                argument.name.clone(),
                VariableInfo {
                    argument_type: Some(argument.ptype),
                    ..VariableInfo::default()
                },
            );
        }
        Self {
            name: name.into(),
            game_version,
            arguments,
            labels: BTreeMap::new(),
            variables,
            script_calls: BTreeMap::new(),
            commands: Vec::new(),
        }
    }

    pub fn standard_commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|command| command.is_standard())
    }

    pub fn auxiliary_commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|command| !command.is_standard())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SymbolKind {
    Label,
    Variable,
}

/// A located occurrence of a label or variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub token: Token,
    pub kind: SymbolKind,
    pub line_number: usize,
    pub line_text: String,
    pub commented: bool,
}

#[cfg(test)]
mod script_tests {
    use super::*;

    #[test]
    fn new_script_registers_arguments_as_variables() {
        let script = ScriptFile::new(
            "plugin.test",
            GameVersion::TerranConflict,
            vec![ScriptArgument {
                name: "target".to_string(),
                ptype: ParameterType::VarShip,
                description: String::new(),
            }],
        );
        let target = script.variables.get("target").expect("argument variable");
        assert_eq!(target.argument_type, Some(ParameterType::VarShip));
        assert_eq!(target.usage_count, 0);
        assert!(script.labels.is_empty());
    }

    #[test]
    fn script_call_info_finds_arguments_case_insensitively() {
        let info: ScriptCallInfo = serde_json::from_str(
            r#"{"name":"lib.fly","arguments":[{"name":"ship","type":"varShip"},{"name":"Count","type":"varNumber"}]}"#,
        )
        .expect("script call json");
        assert_eq!(info.argument_position("count"), Some(1));
        assert_eq!(info.argument_position("missing"), None);
    }
}
