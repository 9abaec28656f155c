//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::IdentifyError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &IdentifyError) -> String {
    match e {
        IdentifyError::Validation(inner) => inner.to_string(),
        other => other.to_string(),
    }
}

/// Process exit code for an error: 2 for rejected input, 1 for everything else.
pub fn exit_code(e: &IdentifyError) -> i32 {
    match e {
        IdentifyError::Validation(_) => 2,
        _ => 1,
    }
}
