use msci_core::{CommandTree, ErrorToken, ScriptFile};
use msci_parser::ScriptParser;
use tracing::debug;

use crate::codegen::generate;
use crate::context::{CompileOptions, CompileServices};
use crate::linker::{finalize, index, link};
use crate::macro_expand::expand_macros;
use crate::parameters::verify_parameters;
use crate::structure::verify_structure;
use crate::symbols::{identify_symbols, resolve_script_calls};
use crate::termination::verify_termination;

/// A script straight out of the parser. `errors` grows as verification runs.
#[derive(Debug, Clone)]
pub struct ParsedScript {
    pub tree: CommandTree,
    pub script: ScriptFile,
    pub errors: Vec<ErrorToken>,
    pub comment_errors: Vec<ErrorToken>,
}

/// A script that passed every verification stage. Only
/// [`ScriptCompiler::verify`] produces one.
#[derive(Debug, Clone)]
pub struct VerifiedScript {
    tree: CommandTree,
    script: ScriptFile,
    comment_errors: Vec<ErrorToken>,
}

impl VerifiedScript {
    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    pub fn script(&self) -> &ScriptFile {
        &self.script
    }

    pub fn comment_errors(&self) -> &[ErrorToken] {
        &self.comment_errors
    }
}

/// Linked tree plus the generated script. The tree stays available for
/// printing and symbol search.
#[derive(Debug, Clone)]
pub struct CompiledScript {
    pub tree: CommandTree,
    pub script: ScriptFile,
}

pub struct ScriptCompiler<'a> {
    services: CompileServices<'a>,
    options: CompileOptions,
}

impl<'a> ScriptCompiler<'a> {
    pub fn new(services: CompileServices<'a>, options: CompileOptions) -> Self {
        Self { services, options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    fn parser(&self) -> ScriptParser<'a> {
        ScriptParser::new(self.services.syntax, self.options.game_version)
    }

    fn stage(&self, stage: &str, errors: &[ErrorToken]) {
        debug!(
            script = %self.options.script_name,
            stage,
            errors = errors.len(),
            "stage complete"
        );
    }

    pub fn parse<S: AsRef<str>>(&self, lines: &[S]) -> ParsedScript {
        let outcome = self.parser().parse_script(lines);
        self.stage("parse", &outcome.errors);
        ParsedScript {
            tree: outcome.tree,
            script: ScriptFile::new(
                self.options.script_name.clone(),
                self.options.game_version,
                self.options.arguments.clone(),
            ),
            errors: outcome.errors,
            comment_errors: outcome.comment_errors,
        }
    }

    /// Expands macros, registers symbols and runs the structural, parametric
    /// and termination checks. Termination is only proven once the other
    /// checks came back clean. Hands the script back when anything failed.
    pub fn verify(&self, parsed: ParsedScript) -> Result<VerifiedScript, ParsedScript> {
        let ParsedScript {
            mut tree,
            mut script,
            mut errors,
            comment_errors,
        } = parsed;

        let found = expand_macros(&mut tree, &mut script, &self.parser());
        self.stage("macros", &found);
        errors.extend(found);

        let found = identify_symbols(&tree, &mut script);
        self.stage("symbols", &found);
        errors.extend(found);
        resolve_script_calls(&tree, &mut script, self.services.scripts);

        let found = verify_structure(&tree);
        self.stage("structure", &found);
        errors.extend(found);

        let found = verify_parameters(&mut tree, &script, self.services.objects);
        self.stage("parameters", &found);
        errors.extend(found);

        if errors.is_empty() {
            let found = verify_termination(&tree);
            self.stage("termination", &found);
            errors.extend(found);
        }

        if errors.is_empty() {
            Ok(VerifiedScript {
                tree,
                script,
                comment_errors,
            })
        } else {
            Err(ParsedScript {
                tree,
                script,
                errors,
                comment_errors,
            })
        }
    }

    /// Links, indexes and generates the command list of a verified script.
    pub fn compile(&self, verified: VerifiedScript) -> Result<CompiledScript, Vec<ErrorToken>> {
        let VerifiedScript {
            mut tree,
            mut script,
            ..
        } = verified;

        let mut errors = link(&mut tree);
        let addresses = index(&mut tree);
        errors.extend(finalize(&mut tree));
        self.stage("link", &errors);
        if !errors.is_empty() {
            return Err(errors);
        }

        let errors = generate(&tree, &mut script);
        self.stage("generate", &errors);
        if !errors.is_empty() {
            return Err(errors);
        }
        debug!(
            script = %script.name,
            addresses,
            commands = script.commands.len(),
            "compiled script"
        );
        Ok(CompiledScript { tree, script })
    }

    /// Parse, verify and compile in one go.
    pub fn compile_script<S: AsRef<str>>(&self, lines: &[S]) -> Result<CompiledScript, Vec<ErrorToken>> {
        let verified = self.verify(self.parse(lines)).map_err(|parsed| parsed.errors)?;
        self.compile(verified)
    }
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use msci_core::{GameVersion, ParameterType, ScriptArgument};
    use msci_parser::{ObjectLibrary, SyntaxLibrary};

    #[test]
    fn verify_hands_back_every_error_and_skips_termination() {
        let syntax = SyntaxLibrary::standard();
        let objects = ObjectLibrary::standard();
        let compiler = ScriptCompiler::new(
            CompileServices::without_scripts(&syntax, &objects),
            CompileOptions::new("test", GameVersion::TerranConflict),
        );
        let parsed = compiler.parse(&["fly away", "break", "inc 'x'"]);
        assert_eq!(parsed.errors.len(), 1);
        let failed = compiler.verify(parsed).expect_err("three problems");
        let messages: Vec<&str> = failed.errors.iter().map(|error| error.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Unrecognised command 'fly away'",
                "'break' cannot appear outside 'while'",
                "Expected Var/Number but found string 'x'",
            ]
        );
    }

    #[test]
    fn compile_registers_arguments_and_emits_commands() {
        let syntax = SyntaxLibrary::standard();
        let objects = ObjectLibrary::standard();
        let options = CompileOptions::new("plugin.test", GameVersion::TerranConflict).with_arguments(vec![
            ScriptArgument {
                name: "limit".to_string(),
                ptype: ParameterType::VarNumber,
                description: String::new(),
            },
        ]);
        let compiler = ScriptCompiler::new(CompileServices::without_scripts(&syntax, &objects), options);
        let compiled = compiler
            .compile_script(&["$total = $limit + 1", "return $total"])
            .expect("compiles");
        assert_eq!(compiled.script.name, "plugin.test");
        assert_eq!(compiled.script.commands.len(), 2);
        let limit = &compiled.script.variables["limit"];
        assert_eq!(limit.argument_type, Some(ParameterType::VarNumber));
        assert_eq!(limit.usage_count, 1);
    }
}
