use super::*;
use msci_core::{GameVersion, ParameterType, ScriptCallResolver};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be monotonic")
        .as_nanos();
    std::env::temp_dir().join(format!("msci-cli-{}-{}", name, nanos))
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent should be created");
    }
    fs::write(path, content).expect("file should be written");
}

fn source_args(file: &Path) -> SourceArgs {
    SourceArgs {
        file: file.to_string_lossy().to_string(),
        name: None,
        game_version: "x3tc".to_string(),
        catalog: None,
        objects: None,
        scripts_dir: None,
        arguments: Vec::new(),
    }
}

#[test]
fn resolve_source_file_validates_existence_and_kind() {
    let missing = temp_path("missing.txt");
    let error = resolve_source_file(missing.to_string_lossy().as_ref()).expect_err("missing file");
    assert_eq!(error.code, "CLI_SOURCE_NOT_FOUND");

    let dir = temp_path("source-dir");
    fs::create_dir_all(&dir).expect("dir");
    let error = resolve_source_file(dir.to_string_lossy().as_ref()).expect_err("directory");
    assert_eq!(error.code, "CLI_SOURCE_NOT_FILE");
}

#[test]
fn script_names_and_lines_come_from_the_file() {
    assert_eq!(script_name_from_path(Path::new("/tmp/plugin.fly.txt")), "plugin.fly");
    assert_eq!(
        split_lines("$a = 1\r\n\r\nreturn $a"),
        vec!["$a = 1".to_string(), String::new(), "return $a".to_string()]
    );
}

#[test]
fn parse_argument_reads_name_and_type() {
    let argument = parse_argument("target=varShip").expect("valid argument");
    assert_eq!(argument.name, "target");
    assert_eq!(argument.ptype, ParameterType::VarShip);

    for raw in ["target", "=varShip", "target=spaceship"] {
        let error = parse_argument(raw).expect_err("invalid argument");
        assert_eq!(error.code, "CLI_ARGUMENT_INVALID");
    }
}

#[test]
fn load_source_applies_name_version_and_arguments() {
    let file = temp_path("loader").join("plugin.loader.txt");
    write_file(&file, "$x = $limit\nreturn $x\n");
    let mut args = source_args(&file);
    args.game_version = "x3ap".to_string();
    args.arguments = vec!["limit=varNumber".to_string()];

    let source = load_source(&args).expect("source loads");
    assert_eq!(source.name, "plugin.loader");
    assert_eq!(source.game_version, GameVersion::AlbionPrelude);
    assert_eq!(source.arguments.len(), 1);
    assert_eq!(source.lines, vec!["$x = $limit", "return $x"]);

    args.game_version = "x4".to_string();
    let error = load_source(&args).expect_err("unknown version");
    assert_eq!(error.code, "GAME_VERSION_UNKNOWN");
}

#[test]
fn catalogs_fall_back_to_the_standard_ones() {
    assert!(load_syntax(None).is_ok());
    assert!(load_objects(None).is_ok());

    let error = load_syntax(Some("/definitely/missing/catalog.json")).expect_err("missing catalog");
    assert_eq!(error.code, "CLI_CATALOG_READ");

    let bad = temp_path("bad-objects.json");
    write_file(&bad, "{");
    let error = load_objects(Some(bad.to_string_lossy().as_ref())).expect_err("bad objects");
    assert_eq!(error.code, "OBJECT_LIBRARY_INVALID");
}

#[test]
fn directory_resolver_reads_manifests_by_name() {
    let root = temp_path("manifests");
    write_file(
        &root.join("lib").join("lib.fly.json"),
        r#"{"name":"lib.fly","arguments":[{"name":"ship","type":"varShip"}]}"#,
    );
    write_file(&root.join("notes.txt"), "not a manifest");
    write_file(&root.join("broken.json"), "{");

    let resolver = DirectoryScriptResolver::scan(&root).expect("scan");
    assert_eq!(resolver.len(), 2);

    let info = resolver.resolve("LIB.FLY").expect("manifest");
    assert_eq!(info.name, "LIB.FLY");
    assert_eq!(info.arguments[0].ptype, ParameterType::VarShip);

    assert_eq!(
        resolver.resolve("lib.missing").expect_err("missing").code,
        "SCRIPT_CALL_NOT_FOUND"
    );
    assert_eq!(
        resolver.resolve("broken").expect_err("broken").code,
        "CLI_MANIFEST_INVALID"
    );

    let error = DirectoryScriptResolver::scan(&root.join("notes.txt")).expect_err("not a dir");
    assert_eq!(error.code, "CLI_SCRIPTS_DIR_INVALID");
}

#[test]
fn run_commands_return_exit_codes() {
    let valid = temp_path("run").join("plugin.ok.txt");
    write_file(&valid, "$n = 3\nwhile $n\ndec $n\nend\nreturn $n\n");
    let invalid = temp_path("run").join("plugin.bad.txt");
    write_file(&invalid, "if $a\ninc $a\n");

    let run_file = |mode: &str, file: &Path| {
        run_cli_from_args(["msci", mode, file.to_string_lossy().as_ref()])
    };
    assert_eq!(run_file("check", &valid), 0);
    assert_eq!(run_file("check", &invalid), error_map::EXIT_INVALID);
    assert_eq!(run_file("tree", &invalid), 0);

    let output = temp_path("run-out").join("plugin.ok.json");
    let code = run_cli_from_args([
        "msci",
        "compile",
        valid.to_string_lossy().as_ref(),
        "--output",
        output.to_string_lossy().as_ref(),
    ]);
    assert_eq!(code, 0);
    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).expect("output written")).expect("json");
    assert_eq!(written["name"], "plugin.ok");
    assert_eq!(written["gameVersion"], "terranConflict");

    assert_eq!(
        run_cli_from_args(["msci", "find", valid.to_string_lossy().as_ref(), "--symbol", "$n"]),
        0
    );
    assert_eq!(run_file("check", &temp_path("nowhere.txt")), 1);
}
