use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uplift_policy::config::{AppConfig, ScoringConfig};
use uplift_policy::error::AppError;
use uplift_policy::models::ModelBundle;
use uplift_policy::scoring::{ContactPolicy, ScoringOutcome, ScoringRequest, ScoringService};
use uplift_policy::table::{write_contacts_to_path, FeatureTable};
use uplift_policy::telemetry;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Feature table to score (CSV with a header row)
    #[arg(long = "in", value_name = "PATH")]
    pub(crate) input: PathBuf,
    /// Destination for the selected contact list
    #[arg(long = "out", value_name = "PATH")]
    pub(crate) output: PathBuf,
    /// Model bundle directory (defaults to UPLIFT_MODEL_DIR)
    #[arg(long, value_name = "DIR")]
    pub(crate) models: Option<PathBuf>,
    /// Revenue per unit of uplift (defaults to UPLIFT_MARGIN)
    #[arg(long)]
    pub(crate) margin: Option<f64>,
    /// Cost per contact (defaults to UPLIFT_COST)
    #[arg(long)]
    pub(crate) cost: Option<f64>,
    /// Contact policy: `pos` keeps every profitable contact, `bestN` maximizes total profit
    #[arg(long, default_value = "pos")]
    pub(crate) policy: ContactPolicy,
    /// Force the bestN cutoff instead of optimizing it
    #[arg(long = "topn")]
    pub(crate) top_n: Option<usize>,
    /// Column holding customer identifiers
    #[arg(long)]
    pub(crate) id_col: Option<String>,
    /// Let bestN contact nobody when every prefix loses money
    #[arg(long)]
    pub(crate) allow_empty_best_n: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let ScoreArgs {
        input,
        output,
        models,
        margin,
        cost,
        policy,
        top_n,
        id_col,
        allow_empty_best_n,
    } = args;

    let mut scoring = config.scoring;
    if let Some(models) = models {
        scoring.model_dir = models;
    }
    scoring.allow_empty_best_n |= allow_empty_best_n;

    let request = ScoringRequest::new(
        margin.unwrap_or(scoring.margin),
        cost.unwrap_or(scoring.cost),
        policy,
    )
    .with_top_n(top_n)
    .with_id_column(id_col);

    let outcome = score_file(&scoring, &input, &request)?;
    write_contacts_to_path(&output, &outcome.selection.records)?;

    println!("{}", outcome.summary);
    println!("Saved: {}", output.display());
    Ok(())
}

fn score_file(
    scoring: &ScoringConfig,
    input: &Path,
    request: &ScoringRequest,
) -> Result<ScoringOutcome, AppError> {
    let bundle = ModelBundle::load(&scoring.model_dir)?;
    let service = ScoringService::from_bundle(bundle, scoring.settings());
    let table = FeatureTable::from_path(input)?;

    let outcome = service.score_table(&table, request)?;
    if !outcome.rejected.is_empty() {
        warn!(
            rejected = outcome.rejected.len(),
            scored = outcome.scored,
            "rows with unusable predictions were left out"
        );
    }
    info!(
        input = %input.display(),
        policy = %request.policy,
        contacts = outcome.summary.contacts,
        "scored feature table"
    );
    Ok(outcome)
}
