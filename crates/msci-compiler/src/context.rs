use msci_core::{
    GameVersion, NoScriptResolver, ObjectCatalog, ScriptArgument, ScriptCallResolver, SyntaxCatalog,
};

/// Settings of one compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub script_name: String,
    pub game_version: GameVersion,
    /// Declared arguments of the script being compiled.
    pub arguments: Vec<ScriptArgument>,
}

impl CompileOptions {
    pub fn new(script_name: impl Into<String>, game_version: GameVersion) -> Self {
        Self {
            script_name: script_name.into(),
            game_version,
            arguments: Vec::new(),
        }
    }

    pub fn with_arguments(mut self, arguments: Vec<ScriptArgument>) -> Self {
        self.arguments = arguments;
        self
    }
}

/// Read-only collaborators shared by every stage. Safe to share across
/// threads compiling different scripts.
#[derive(Clone, Copy)]
pub struct CompileServices<'a> {
    pub syntax: &'a dyn SyntaxCatalog,
    pub objects: &'a dyn ObjectCatalog,
    pub scripts: &'a dyn ScriptCallResolver,
}

static NO_SCRIPTS: NoScriptResolver = NoScriptResolver;

impl<'a> CompileServices<'a> {
    pub fn new(
        syntax: &'a dyn SyntaxCatalog,
        objects: &'a dyn ObjectCatalog,
        scripts: &'a dyn ScriptCallResolver,
    ) -> Self {
        Self {
            syntax,
            objects,
            scripts,
        }
    }

    /// Services for hosts that cannot load other scripts; script calls go
    /// unchecked.
    pub fn without_scripts(syntax: &'a dyn SyntaxCatalog, objects: &'a dyn ObjectCatalog) -> Self {
        Self::new(syntax, objects, &NO_SCRIPTS)
    }
}

#[cfg(test)]
mod context_tests {
    use super::*;
    use msci_core::ParameterType;
    use msci_parser::{ObjectLibrary, SyntaxLibrary};

    #[test]
    fn options_carry_declared_arguments() {
        let options = CompileOptions::new("plugin.test", GameVersion::AlbionPrelude).with_arguments(vec![
            ScriptArgument {
                name: "target".to_string(),
                ptype: ParameterType::VarShip,
                description: "ship to follow".to_string(),
            },
        ]);
        assert_eq!(options.script_name, "plugin.test");
        assert_eq!(options.arguments.len(), 1);
    }

    #[test]
    fn services_without_scripts_fail_every_lookup() {
        let syntax = SyntaxLibrary::standard();
        let objects = ObjectLibrary::standard();
        let services = CompileServices::without_scripts(&syntax, &objects);
        let error = services.scripts.resolve("lib.any").expect_err("no scripts");
        assert_eq!(error.code, "SCRIPT_CALL_NOT_FOUND");
        assert!(services.syntax.find(msci_core::cmd::RETURN, GameVersion::Threat).is_some());
    }
}
