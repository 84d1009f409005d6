use std::ffi::OsString;

use clap::Parser;
use msci_core::MsciError;
use tracing_subscriber::EnvFilter;

mod cli_args;
mod commands;
mod error_map;
mod resolver;
mod source_loader;

pub(crate) use cli_args::{CheckArgs, Cli, CompileArgs, FindArgs, Mode, SourceArgs, TreeArgs};
pub(crate) use error_map::{
    emit_diagnostics, emit_error, emit_notes, map_cli_catalog_read, map_cli_manifest_invalid,
    map_cli_manifest_read, map_cli_output_encode, map_cli_output_write, map_cli_source_read,
};
pub(crate) use resolver::DirectoryScriptResolver;
pub(crate) use source_loader::{load_objects, load_source, load_syntax, LoadedSource};
#[cfg(test)]
pub(crate) use source_loader::{parse_argument, resolve_source_file, script_name_from_path, split_lines};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    init_logging(cli.verbose);
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

/// Logs go to stderr; stdout carries results only. `RUST_LOG` wins over
/// `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "msci_cli=debug,msci_compiler=debug,msci_parser=debug,warn"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<i32, MsciError> {
    match cli.command {
        Mode::Check(args) => commands::run_check(args),
        Mode::Compile(args) => commands::run_compile(args),
        Mode::Tree(args) => commands::run_tree(args),
        Mode::Find(args) => commands::run_find(args),
    }
}

#[cfg(test)]
mod tests;
