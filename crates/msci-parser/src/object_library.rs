use std::collections::HashMap;

use msci_core::{
    GameObjectKind, GameObjectRef, MsciError, ObjectCatalog, ScriptObjectGroup, ScriptObjectRef,
};
use serde::Deserialize;

const STANDARD_OBJECTS: &str = include_str!("../data/standard-objects.json");

#[derive(Debug, Deserialize)]
struct GameObjectEntry {
    name: String,
    kind: GameObjectKind,
    id: u32,
}

#[derive(Debug, Deserialize)]
struct ScriptObjectEntry {
    name: String,
    group: ScriptObjectGroup,
    id: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectDocument {
    #[serde(default)]
    game_objects: Vec<GameObjectEntry>,
    #[serde(default)]
    script_objects: Vec<ScriptObjectEntry>,
}

/// Game and script object names, looked up case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ObjectLibrary {
    game_objects: HashMap<String, GameObjectRef>,
    script_objects: HashMap<String, ScriptObjectRef>,
}

impl ObjectLibrary {
    pub fn from_json(source: &str) -> Result<Self, MsciError> {
        let document: ObjectDocument = serde_json::from_str(source)
            .map_err(|error| MsciError::new("OBJECT_LIBRARY_INVALID", error.to_string()))?;
        let mut library = Self::default();
        for entry in document.game_objects {
            library.insert_game_object(
                &entry.name,
                GameObjectRef {
                    kind: entry.kind,
                    id: entry.id,
                },
            );
        }
        for entry in document.script_objects {
            library.insert_script_object(
                &entry.name,
                ScriptObjectRef {
                    group: entry.group,
                    id: entry.id,
                },
            );
        }
        Ok(library)
    }

    pub fn standard() -> Self {
        Self::from_json(STANDARD_OBJECTS).expect("embedded standard objects must load")
    }

    pub fn insert_game_object(&mut self, name: &str, object: GameObjectRef) {
        self.game_objects.insert(name.to_lowercase(), object);
    }

    pub fn insert_script_object(&mut self, name: &str, object: ScriptObjectRef) {
        self.script_objects.insert(name.to_lowercase(), object);
    }
}

impl ObjectCatalog for ObjectLibrary {
    fn find_game_object(&self, name: &str) -> Option<GameObjectRef> {
        self.game_objects.get(&name.to_lowercase()).copied()
    }

    fn find_script_object(&self, name: &str) -> Option<ScriptObjectRef> {
        self.script_objects.get(&name.to_lowercase()).copied()
    }
}

#[cfg(test)]
mod object_library_tests {
    use super::*;

    #[test]
    fn standard_objects_resolve_case_insensitively() {
        let library = ObjectLibrary::standard();
        let sector = library
            .find_game_object("argon prime")
            .expect("argon prime sector");
        assert_eq!(sector.kind, GameObjectKind::Sector);
        let this = library.find_script_object("this").expect("THIS constant");
        assert_eq!(this.group, ScriptObjectGroup::Constant);
        assert!(library.find_game_object("Nowhere").is_none());
    }

    #[test]
    fn from_json_reports_invalid_documents() {
        let error = ObjectLibrary::from_json(r#"{"gameObjects":[{"name":"x"}]}"#)
            .expect_err("missing kind");
        assert_eq!(error.code, "OBJECT_LIBRARY_INVALID");

        let empty = ObjectLibrary::from_json("{}").expect("empty document");
        assert!(empty.find_script_object("TRUE").is_none());
    }
}
