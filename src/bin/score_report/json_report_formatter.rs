use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use pte_scorer::ScoringOutput;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Meta {
    pub generated_at: String,
    pub dictionary_path: String,
    pub config_path: Option<String>,
    pub cost_model: &'static str,
    pub case_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CaseReport {
    pub id: String,
    #[serde(flatten)]
    pub output: ScoringOutput,
}

#[derive(Debug, Serialize)]
pub struct Aggregate {
    pub mean_score_pte: f64,
    pub min_score_pte: f64,
    pub max_score_pte: f64,
    pub mean_accuracy: f64,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub meta: Meta,
    pub cases: Vec<CaseReport>,
    pub aggregate: Aggregate,
}

pub fn aggregate_cases(cases: &[CaseReport]) -> Aggregate {
    let scores: Vec<f64> = cases.iter().map(|c| c.output.summary.score_pte).collect();
    let accuracies: Vec<f64> = cases.iter().map(|c| c.output.stats.accuracy).collect();
    let mean = |values: &[f64]| {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    };
    let min = scores.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = scores.iter().copied().reduce(f64::max).unwrap_or(0.0);
    Aggregate {
        mean_score_pte: mean(&scores),
        min_score_pte: min,
        max_score_pte: max,
        mean_accuracy: mean(&accuracies),
    }
}

pub fn write_report(path: &Path, report: &Report) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create report output directory '{}': {err}",
                parent.display()
            )
        })?;
    }

    let mut file = File::create(path)
        .map_err(|err| format!("Failed to create report file '{}': {err}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, report).map_err(|err| {
        format!(
            "Failed to serialize report JSON '{}': {err}",
            path.display()
        )
    })?;
    file.write_all(b"\n")
        .map_err(|err| format!("Failed to finalize report file '{}': {err}", path.display()))?;
    Ok(())
}
