//! Argument validation against a declaration's parameter schema.

use serde_json::Value;
use signalforge_core::error::FunctionError;

/// Check `arguments` against `schema`, naming `function` in any error.
///
/// Every violation is reported, joined with `; `, each prefixed with the
/// JSON pointer of the offending value under `arguments`.
pub fn validate_arguments(
    function: &str,
    schema: &Value,
    arguments: &Value,
) -> Result<(), FunctionError> {
    let failure = |reason: String| FunctionError::ArgumentValidation {
        function: function.to_string(),
        reason,
    };

    let validator = jsonschema::validator_for(schema)
        .map_err(|e| failure(format!("invalid parameter schema: {e}")))?;

    let errors: Vec<String> = validator
        .iter_errors(arguments)
        .map(|e| format!("arguments{}: {}", e.instance_path, e))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(failure(errors.join("; ")))
    }
}
