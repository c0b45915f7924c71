//! Structural checks applied before trusting stored progress.

use super::CheckpointValidationError;
use serde_json::{Map, Value};

/// Validates a raw checkpoint state of the form
/// `{"step": <int>, "checkpointData": {...}}`.
///
/// `checkpointData` must be an object, `step` a non-negative integer, and
/// every key in `expected_keys` must be present in `checkpointData`.
///
/// # Errors
///
/// Returns the first [`CheckpointValidationError`] found.
pub fn validate_checkpoint_state(
    state: &Value,
    expected_keys: &[&str],
) -> Result<(), CheckpointValidationError> {
    let object = state
        .as_object()
        .ok_or(CheckpointValidationError::StateNotObject)?;
    let data = object
        .get("checkpointData")
        .and_then(Value::as_object)
        .ok_or(CheckpointValidationError::DataNotObject)?;
    let step = object
        .get("step")
        .ok_or(CheckpointValidationError::MissingStep)?;
    if step.as_u64().is_none() {
        return Err(step
            .as_i64()
            .map_or(CheckpointValidationError::InvalidStep, CheckpointValidationError::NegativeStep));
    }
    check_data_keys(data, expected_keys)
}

pub(crate) fn check_data_keys(
    data: &Map<String, Value>,
    expected_keys: &[&str],
) -> Result<(), CheckpointValidationError> {
    let missing: Vec<String> = expected_keys
        .iter()
        .filter(|key| !data.contains_key(**key))
        .map(|key| (*key).to_owned())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(CheckpointValidationError::MissingKeys(missing))
}
