use serde::Serialize;
use serde_json::json;
use vizrecon::Snapshot;

/// One line of session output
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub label: Option<String>,
    pub decision: &'static str,
    pub status: String,
    pub generation: u64,
    pub pending: bool,
    pub data: Option<serde_json::Value>,
}

impl StepReport {
    pub fn new<D: Serialize>(
        step: usize,
        label: Option<String>,
        decision: &'static str,
        snapshot: &Snapshot<D>,
    ) -> Self {
        Self {
            step,
            label,
            decision,
            status: snapshot.status.to_string(),
            generation: snapshot.generation,
            pending: snapshot.pending,
            data: snapshot.data.as_ref().map(|d| {
                serde_json::to_value(d.as_ref())
                    .unwrap_or_else(|e| json!({ "error": e.to_string() }))
            }),
        }
    }
}

pub fn print_report(report: &StepReport) {
    let label = report.label.as_deref().unwrap_or("");
    println!(
        "[{}] {:<10} {:<24} status={} generation={}{}",
        report.step,
        report.decision,
        label,
        report.status,
        report.generation,
        if report.pending { " (pending)" } else { "" }
    );
    if let Some(data) = &report.data {
        println!("      data: {}", data);
    }
}

pub fn print_json(reports: &[StepReport]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(reports)?);
    Ok(())
}
