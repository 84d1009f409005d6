use std::fs;
use std::path::Path;

use msci_compiler::{find_symbols, print_tree, CompileOptions, CompileServices, ScriptCompiler};
use msci_core::{MsciError, SymbolKind};
use msci_parser::{ObjectLibrary, SyntaxLibrary};
use tracing::debug;

use crate::{
    emit_diagnostics, emit_notes, load_objects, load_source, load_syntax, map_cli_output_encode,
    map_cli_output_write, CheckArgs, CompileArgs, DirectoryScriptResolver, FindArgs, LoadedSource,
    SourceArgs, TreeArgs,
};

/// Catalogs and resolver loaded for one invocation.
pub(crate) struct Toolchain {
    syntax: SyntaxLibrary,
    objects: ObjectLibrary,
    scripts: Option<DirectoryScriptResolver>,
}

impl Toolchain {
    pub(crate) fn load(args: &SourceArgs) -> Result<Self, MsciError> {
        let scripts = match &args.scripts_dir {
            Some(dir) => {
                let resolver = DirectoryScriptResolver::scan(Path::new(dir))?;
                debug!(dir = %dir, manifests = resolver.len(), "script resolver ready");
                Some(resolver)
            }
            None => None,
        };
        Ok(Self {
            syntax: load_syntax(args.catalog.as_deref())?,
            objects: load_objects(args.objects.as_deref())?,
            scripts,
        })
    }

    pub(crate) fn compiler(&self, source: &LoadedSource) -> ScriptCompiler<'_> {
        let services = match &self.scripts {
            Some(resolver) => CompileServices::new(&self.syntax, &self.objects, resolver),
            None => CompileServices::without_scripts(&self.syntax, &self.objects),
        };
        let options = CompileOptions::new(source.name.clone(), source.game_version)
            .with_arguments(source.arguments.clone());
        ScriptCompiler::new(services, options)
    }
}

pub(crate) fn run_check(args: CheckArgs) -> Result<i32, MsciError> {
    let source = load_source(&args.source)?;
    let toolchain = Toolchain::load(&args.source)?;
    let compiler = toolchain.compiler(&source);

    match compiler.verify(compiler.parse(&source.lines)) {
        Ok(verified) => {
            println!("RESULT:OK");
            println!("SCRIPT:{}", source.name);
            emit_notes(verified.comment_errors());
            Ok(0)
        }
        Err(parsed) => {
            let code = emit_diagnostics(&parsed.errors);
            emit_notes(&parsed.comment_errors);
            Ok(code)
        }
    }
}

pub(crate) fn run_compile(args: CompileArgs) -> Result<i32, MsciError> {
    let source = load_source(&args.source)?;
    let toolchain = Toolchain::load(&args.source)?;
    let compiler = toolchain.compiler(&source);

    let compiled = match compiler.compile_script(&source.lines) {
        Ok(compiled) => compiled,
        Err(errors) => return Ok(emit_diagnostics(&errors)),
    };
    let payload = serde_json::to_string_pretty(&compiled.script).map_err(map_cli_output_encode)?;
    match &args.output {
        Some(output) => {
            let path = Path::new(output);
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(map_cli_output_write)?;
            }
            fs::write(path, payload).map_err(map_cli_output_write)?;
            println!("RESULT:OK");
            println!("COMMANDS:{}", compiled.script.commands.len());
            println!("OUTPUT:{}", output);
        }
        None => println!("{}", payload),
    }
    Ok(0)
}

pub(crate) fn run_tree(args: TreeArgs) -> Result<i32, MsciError> {
    let source = load_source(&args.source)?;
    let toolchain = Toolchain::load(&args.source)?;
    let compiler = toolchain.compiler(&source);

    let tree = if args.linked {
        match compiler.compile_script(&source.lines) {
            Ok(compiled) => compiled.tree,
            Err(errors) => return Ok(emit_diagnostics(&errors)),
        }
    } else {
        compiler.parse(&source.lines).tree
    };
    print!("{}", print_tree(&tree));
    Ok(0)
}

pub(crate) fn run_find(args: FindArgs) -> Result<i32, MsciError> {
    let source = load_source(&args.source)?;
    let toolchain = Toolchain::load(&args.source)?;
    let parsed = toolchain.compiler(&source).parse(&source.lines);

    let kind = if args.symbol.starts_with('$') {
        SymbolKind::Variable
    } else {
        SymbolKind::Label
    };
    let found = find_symbols(&parsed.tree, &args.symbol, kind);
    println!("RESULT:OK");
    println!("COUNT:{}", found.len());
    for symbol in found {
        println!(
            "SYMBOL:{}:{}-{}|{}|{}",
            symbol.line_number,
            symbol.token.start,
            symbol.token.end,
            if symbol.commented { "commented" } else { "code" },
            serde_json::to_string(&symbol.line_text).expect("string json")
        );
    }
    Ok(0)
}
