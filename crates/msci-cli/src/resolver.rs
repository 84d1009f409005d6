use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use msci_core::{MsciError, ScriptCallInfo, ScriptCallResolver};
use tracing::debug;
use walkdir::WalkDir;

use crate::{map_cli_manifest_invalid, map_cli_manifest_read};

const MANIFEST_SUFFIX: &str = ".json";

/// Resolves called scripts from `<name>.json` manifests found under a
/// directory tree. Manifests are indexed up front and read on demand.
#[derive(Debug, Clone, Default)]
pub(crate) struct DirectoryScriptResolver {
    manifests: HashMap<String, PathBuf>,
}

impl DirectoryScriptResolver {
    pub(crate) fn scan(root: &Path) -> Result<Self, MsciError> {
        if !root.is_dir() {
            return Err(MsciError::new(
                "CLI_SCRIPTS_DIR_INVALID",
                format!("scripts-dir is not a directory: {}", root.display()),
            ));
        }

        let mut manifests = HashMap::new();
        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            let Some(name) = file_name.strip_suffix(MANIFEST_SUFFIX) else {
                continue;
            };
            // First match in sorted walk order wins.
            manifests
                .entry(name.to_lowercase())
                .or_insert_with(|| entry.path().to_path_buf());
        }
        debug!(root = %root.display(), manifests = manifests.len(), "indexed script manifests");
        Ok(Self { manifests })
    }

    pub(crate) fn len(&self) -> usize {
        self.manifests.len()
    }
}

impl ScriptCallResolver for DirectoryScriptResolver {
    fn resolve(&self, name: &str) -> Result<ScriptCallInfo, MsciError> {
        let Some(path) = self.manifests.get(&name.to_lowercase()) else {
            return Err(MsciError::new(
                "SCRIPT_CALL_NOT_FOUND",
                format!("Script \"{}\" cannot be resolved.", name),
            ));
        };
        let raw = fs::read_to_string(path).map_err(map_cli_manifest_read)?;
        let mut info: ScriptCallInfo = serde_json::from_str(&raw).map_err(map_cli_manifest_invalid)?;
        info.name = name.to_string();
        Ok(info)
    }
}
