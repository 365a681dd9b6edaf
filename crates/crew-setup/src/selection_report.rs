use anyhow::{Context, Result};
use crew_cli::CliOutputFormat;
use crew_onboarding::SelectionOutcome;
use serde_json::{json, Value};

pub(crate) fn selection_report_json(outcome: &SelectionOutcome) -> Value {
    match outcome {
        SelectionOutcome::Selected { provider, model } => json!({
            "status": "selected",
            "provider": provider,
            "model": model,
        }),
        SelectionOutcome::Aborted(reason) => {
            let (provider, model) = outcome.clone().into_pair();
            json!({
                "status": "aborted",
                "reason": reason.as_str(),
                "provider": provider,
                "model": model,
            })
        }
    }
}

pub(crate) fn render_selection_report(
    outcome: &SelectionOutcome,
    format: CliOutputFormat,
) -> Result<String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string(&selection_report_json(outcome))
            .context("failed to render selection report"),
        CliOutputFormat::Text => Ok(match outcome {
            SelectionOutcome::Selected { provider, model } => {
                format!("selected provider={provider} model={model}")
            }
            SelectionOutcome::Aborted(reason) => format!("provider selection aborted: {reason}"),
        }),
    }
}
