//! Human-readable run summaries.

use crate::runner::domain::RunSummary;
use minijinja::Environment;

const SUMMARY_TEMPLATE: &str = "Job runner pass finished: {{ attempted }} attempted, \
{{ completed }} completed, {{ failed }} failed, {{ checkpointed }} checkpointed, \
{{ skipped }} skipped across {{ batches }} batch{% if batches != 1 %}es{% endif %} \
({{ startedAt }} to {{ finishedAt }}).";

/// Renders the chat message posted after a pass.
///
/// # Errors
///
/// Returns the template engine's error when rendering fails.
pub fn render_summary(summary: &RunSummary) -> Result<String, minijinja::Error> {
    let environment = Environment::new();
    environment.render_str(SUMMARY_TEMPLATE, summary)
}
