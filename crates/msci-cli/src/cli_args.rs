use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "msci")]
#[command(about = "MSCI script compiler")]
pub(crate) struct Cli {
    /// Log compiler stages to stderr.
    #[arg(long = "verbose", global = true)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Verify a script and report diagnostics.
    Check(CheckArgs),
    /// Compile a script into its command list (JSON).
    Compile(CompileArgs),
    /// Print the command tree of a script.
    Tree(TreeArgs),
    /// List the occurrences of a label or `$variable`.
    Find(FindArgs),
}

/// Inputs shared by every subcommand.
#[derive(Debug, Args)]
pub(crate) struct SourceArgs {
    /// Script source, one command per line.
    pub(crate) file: String,
    /// Script name; defaults to the file stem.
    #[arg(long = "name")]
    pub(crate) name: Option<String>,
    #[arg(long = "game-version", default_value = "x3tc")]
    pub(crate) game_version: String,
    /// Syntax catalog JSON replacing the built-in one.
    #[arg(long = "catalog")]
    pub(crate) catalog: Option<String>,
    /// Object catalog JSON replacing the built-in one.
    #[arg(long = "objects")]
    pub(crate) objects: Option<String>,
    /// Directory searched for `<script>.json` manifests of called scripts.
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: Option<String>,
    /// Declared argument of the script, as `name=type` (e.g. `target=varShip`).
    #[arg(long = "arg")]
    pub(crate) arguments: Vec<String>,
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

#[derive(Debug, Args)]
pub(crate) struct CompileArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    /// Write the script file here instead of stdout.
    #[arg(long = "output")]
    pub(crate) output: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct TreeArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    /// Compile first and show addresses and jump targets.
    #[arg(long = "linked")]
    pub(crate) linked: bool,
}

#[derive(Debug, Args)]
pub(crate) struct FindArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    /// Label name, or variable name with a leading `$`.
    #[arg(long = "symbol")]
    pub(crate) symbol: String,
}
