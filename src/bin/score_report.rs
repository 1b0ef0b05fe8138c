use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use pte_scorer::{PronunciationDictionary, ScorerBuilder, ScoringConfig, ScoringInput};
use tracing_subscriber::EnvFilter;

#[path = "score_report/json_report_formatter.rs"]
mod json_report_formatter;

use json_report_formatter::{aggregate_cases, write_report, CaseReport, Meta, Report};

#[derive(Debug, Parser)]
#[command(name = "score_report")]
#[command(about = "Score read-aloud responses and write a JSON report")]
struct Args {
    /// A scoring request JSON file, or a directory of them.
    #[arg(long, env = "PTE_SCORER_INPUT")]
    input: PathBuf,
    /// CMU-format pronunciation dictionary.
    #[arg(
        long,
        env = "PTE_SCORER_DICTIONARY",
        default_value = "test-data/cmudict-mini.txt"
    )]
    dictionary: PathBuf,
    /// Optional scoring config JSON; unspecified values keep their defaults.
    #[arg(long, env = "PTE_SCORER_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "PTE_SCORER_OUT")]
    out: Option<PathBuf>,
    /// Score words sequentially instead of on the rayon pool.
    #[arg(long, env = "PTE_SCORER_SEQUENTIAL", default_value_t = false)]
    sequential: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();
    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    let input_path = resolve_path(&repo_root, &args.input);
    let dictionary_path = resolve_path(&repo_root, &args.dictionary);
    let config_path = args.config.as_ref().map(|p| resolve_path(&repo_root, p));
    let out_path = resolve_out_path(&repo_root, args.out.as_ref());

    let config = match config_path.as_ref() {
        Some(path) => ScoringConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => ScoringConfig::default(),
    };
    let dictionary = PronunciationDictionary::load(&dictionary_path).map_err(|err| {
        format!(
            "Failed to load dictionary '{}': {err}",
            dictionary_path.display()
        )
    })?;
    let scorer = ScorerBuilder::new(config)
        .with_dictionary(Arc::new(dictionary))
        .with_parallelism(!args.sequential)
        .build()
        .map_err(|err| format!("Failed to build scorer: {err}"))?;

    let case_paths = collect_case_files(&input_path)?;
    if case_paths.is_empty() {
        return Err(format!(
            "No scoring requests found at '{}'.",
            input_path.display()
        ));
    }

    let mut cases = Vec::with_capacity(case_paths.len());
    for path in &case_paths {
        let data = fs::read_to_string(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
        let input: ScoringInput = serde_json::from_str(&data)
            .map_err(|err| format!("Failed to parse '{}': {err}", path.display()))?;
        let output = scorer
            .score(&input)
            .map_err(|err| format!("Failed to score '{}': {err}", path.display()))?;
        tracing::info!(
            case = %path.display(),
            score_pte = output.summary.score_pte,
            band = output.summary.band,
            "case scored"
        );
        cases.push(CaseReport {
            id: case_id(path),
            output,
        });
    }

    let aggregate = aggregate_cases(&cases);
    let report = Report {
        meta: Meta {
            generated_at: Utc::now().to_rfc3339(),
            dictionary_path: dictionary_path.display().to_string(),
            config_path: config_path.map(|p| p.display().to_string()),
            cost_model: scorer.cost_model_name(),
            case_count: cases.len(),
        },
        cases,
        aggregate,
    };
    write_report(&out_path, &report)?;
    println!("{}", out_path.display());
    Ok(())
}

fn collect_case_files(path: &Path) -> Result<Vec<PathBuf>, String> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let entries = fs::read_dir(path)
        .map_err(|err| format!("Failed to read directory '{}': {err}", path.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| format!("Failed to read directory entry: {err}"))?;
        let entry_path = entry.path();
        if entry_path.extension().is_some_and(|ext| ext == "json") {
            files.push(entry_path);
        }
    }
    files.sort();
    Ok(files)
}

fn case_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn resolve_out_path(repo_root: &Path, out: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = out {
        return resolve_path(repo_root, path);
    }

    let run_id = Utc::now().format("%Y%m%dT%H%M%SZ");
    repo_root
        .join("target")
        .join("score_reports")
        .join(format!("score-report-{run_id}.json"))
}

fn resolve_path(repo_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        repo_root.join(path)
    }
}
