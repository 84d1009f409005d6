#![allow(dead_code)]

use std::sync::OnceLock;

use msci_compiler::{CompileOptions, CompileServices, CompiledScript, ScriptCompiler};
use msci_core::{Address, Command, GameVersion, ParameterValue, ScriptFile};
use msci_parser::{ObjectLibrary, SyntaxLibrary};

pub fn syntax() -> &'static SyntaxLibrary {
    static SYNTAX: OnceLock<SyntaxLibrary> = OnceLock::new();
    SYNTAX.get_or_init(SyntaxLibrary::standard)
}

pub fn objects() -> &'static ObjectLibrary {
    static OBJECTS: OnceLock<ObjectLibrary> = OnceLock::new();
    OBJECTS.get_or_init(ObjectLibrary::standard)
}

pub fn compiler(name: &str) -> ScriptCompiler<'static> {
    ScriptCompiler::new(
        CompileServices::without_scripts(syntax(), objects()),
        CompileOptions::new(name, GameVersion::TerranConflict),
    )
}

pub fn compile(lines: &[&str]) -> CompiledScript {
    match compiler("test").compile_script(lines) {
        Ok(compiled) => compiled,
        Err(errors) => panic!("script should compile: {:?}", errors),
    }
}

/// Verification errors as `"line: message"`.
pub fn verify_messages(lines: &[&str]) -> Vec<String> {
    let compiler = compiler("test");
    match compiler.verify(compiler.parse(lines)) {
        Ok(_) => Vec::new(),
        Err(parsed) => parsed
            .errors
            .iter()
            .map(|error| format!("{}: {}", error.line_number, error.message))
            .collect(),
    }
}

/// First emitted command read from `line`.
pub fn command_at(script: &ScriptFile, line: usize) -> &Command {
    script
        .commands
        .iter()
        .find(|command| command.line_number == line)
        .unwrap_or_else(|| panic!("no command on line {}", line))
}

/// Address a branching command jumps to when its condition fails.
pub fn jump_of(command: &Command) -> Option<Address> {
    command.parameters.iter().find_map(|param| match param.value {
        ParameterValue::Conditional { jump, .. } => jump,
        _ => None,
    })
}
