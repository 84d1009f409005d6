use msci_core::{ErrorToken, MsciError};
use std::fmt::Display;

/// Exit code of a script that failed verification or compilation.
pub(crate) const EXIT_INVALID: i32 = 2;

fn map_error(code: &'static str, error: impl Display) -> MsciError {
    MsciError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: MsciError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).expect("string json")
    );
    1
}

pub(crate) fn emit_diagnostics(errors: &[ErrorToken]) -> i32 {
    println!("RESULT:INVALID");
    for error in errors {
        println!(
            "DIAGNOSTIC:{}:{}-{}|{}",
            error.line_number,
            error.start,
            error.end,
            serde_json::to_string(&error.message).expect("string json")
        );
    }
    EXIT_INVALID
}

pub(crate) fn emit_notes(notes: &[ErrorToken]) {
    for note in notes {
        println!(
            "NOTE:{}|{}",
            note.line_number,
            serde_json::to_string(&note.message).expect("string json")
        );
    }
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> MsciError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_catalog_read(error: std::io::Error) -> MsciError {
    map_error("CLI_CATALOG_READ", error)
}

pub(crate) fn map_cli_manifest_read(error: std::io::Error) -> MsciError {
    map_error("CLI_MANIFEST_READ", error)
}

pub(crate) fn map_cli_manifest_invalid(error: serde_json::Error) -> MsciError {
    map_error("CLI_MANIFEST_INVALID", error)
}

pub(crate) fn map_cli_output_write(error: std::io::Error) -> MsciError {
    map_error("CLI_OUTPUT_WRITE", error)
}

pub(crate) fn map_cli_output_encode(error: serde_json::Error) -> MsciError {
    map_error("CLI_OUTPUT_ENCODE", error)
}
