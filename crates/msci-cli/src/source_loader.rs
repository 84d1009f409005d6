use std::fs;
use std::path::{Path, PathBuf};

use msci_core::{GameVersion, MsciError, ParameterType, ScriptArgument};
use msci_parser::{ObjectLibrary, SyntaxLibrary};

use crate::{map_cli_catalog_read, map_cli_source_read, SourceArgs};

/// A script read from disk plus everything needed to compile it.
#[derive(Debug, Clone)]
pub(crate) struct LoadedSource {
    pub(crate) name: String,
    pub(crate) game_version: GameVersion,
    pub(crate) arguments: Vec<ScriptArgument>,
    pub(crate) lines: Vec<String>,
}

pub(crate) fn load_source(args: &SourceArgs) -> Result<LoadedSource, MsciError> {
    let path = resolve_source_file(&args.file)?;
    let content = fs::read_to_string(&path).map_err(map_cli_source_read)?;
    let name = match &args.name {
        Some(name) => name.clone(),
        None => script_name_from_path(&path),
    };
    Ok(LoadedSource {
        name,
        game_version: args.game_version.parse()?,
        arguments: args
            .arguments
            .iter()
            .map(|raw| parse_argument(raw))
            .collect::<Result<_, _>>()?,
        lines: split_lines(&content),
    })
}

pub(crate) fn resolve_source_file(file: &str) -> Result<PathBuf, MsciError> {
    let path = PathBuf::from(file);
    if !path.exists() {
        return Err(MsciError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("script file does not exist: {}", path.display()),
        ));
    }
    if !path.is_file() {
        return Err(MsciError::new(
            "CLI_SOURCE_NOT_FILE",
            format!("script path is not a file: {}", path.display()),
        ));
    }
    Ok(path)
}

/// `plugin.fly.txt` becomes `plugin.fly`.
pub(crate) fn script_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "script".to_string())
}

pub(crate) fn split_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}

/// Parses `name=type`, where type is a parameter type name such as `varShip`.
pub(crate) fn parse_argument(raw: &str) -> Result<ScriptArgument, MsciError> {
    let invalid = || {
        MsciError::new(
            "CLI_ARGUMENT_INVALID",
            format!("expected name=type, got \"{}\"", raw),
        )
    };
    let (name, ptype) = raw.split_once('=').ok_or_else(invalid)?;
    if name.trim().is_empty() {
        return Err(invalid());
    }
    let ptype: ParameterType =
        serde_json::from_value(serde_json::Value::String(ptype.trim().to_string()))
            .map_err(|_| invalid())?;
    Ok(ScriptArgument {
        name: name.trim().to_string(),
        ptype,
        description: String::new(),
    })
}

pub(crate) fn load_syntax(path: Option<&str>) -> Result<SyntaxLibrary, MsciError> {
    match path {
        Some(path) => SyntaxLibrary::from_json(&fs::read_to_string(path).map_err(map_cli_catalog_read)?),
        None => Ok(SyntaxLibrary::standard()),
    }
}

pub(crate) fn load_objects(path: Option<&str>) -> Result<ObjectLibrary, MsciError> {
    match path {
        Some(path) => ObjectLibrary::from_json(&fs::read_to_string(path).map_err(map_cli_catalog_read)?),
        None => Ok(ObjectLibrary::standard()),
    }
}
