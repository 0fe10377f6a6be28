use anyhow::{Context, Result};
use categorical_bayes::{
    CrossValidationConfig, CrossValidator, Dataset, FeatureSelection, MicroAverage, Smoothing,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "categorical_bayes")]
#[command(about = "Cross-validate a categorical naive Bayes classifier on a CSV file")]
struct Cli {
    /// Headerless CSV file; the last column is the label
    #[arg(short, long, default_value = "data.csv")]
    data: PathBuf,

    /// Number of folds
    #[arg(short = 'k', long, default_value = "10")]
    folds: usize,

    /// Label treated as the positive class
    #[arg(short, long, default_value = "A")]
    positive_label: String,

    /// Use the first N columns as features
    #[arg(short, long, default_value = "5", conflicts_with = "columns")]
    features: usize,

    /// Use these column positions as features instead (e.g. 0,2,3)
    #[arg(short, long, value_delimiter = ',')]
    columns: Option<Vec<usize>>,

    #[arg(long, value_enum, default_value_t = SmoothingArg::Binary)]
    smoothing: SmoothingArg,

    #[arg(long, value_enum, default_value_t = MicroArg::Pooled)]
    micro: MicroArg,

    /// Log every trained model
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SmoothingArg {
    /// Denominator + 2
    Binary,
    /// Denominator + distinct values seen per feature
    Observed,
}

#[derive(Clone, Copy, ValueEnum)]
enum MicroArg {
    /// Pool confusion counts over all folds
    Pooled,
    /// Mean of the per-fold rates
    FoldMean,
}

impl Cli {
    fn config(&self) -> CrossValidationConfig {
        let features = match &self.columns {
            Some(columns) => FeatureSelection::Columns(columns.clone()),
            None => FeatureSelection::FirstN(self.features),
        };
        let smoothing = match self.smoothing {
            SmoothingArg::Binary => Smoothing::Binary,
            SmoothingArg::Observed => Smoothing::ObservedValues,
        };
        let micro_average = match self.micro {
            MicroArg::Pooled => MicroAverage::Pooled,
            MicroArg::FoldMean => MicroAverage::FoldMean,
        };

        CrossValidationConfig::default()
            .with_folds(self.folds)
            .with_positive_label(self.positive_label.as_str())
            .with_features(features)
            .with_smoothing(smoothing)
            .with_micro_average(micro_average)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder().with_max_level(level).init();

    let dataset = Dataset::from_path(&cli.data)
        .with_context(|| format!("failed to load dataset from {:?}", cli.data))?;
    info!(rows = dataset.len(), "loaded dataset");

    let validator = CrossValidator::new(cli.config());
    info!(
        folds = validator.config().folds,
        positive_label = %validator.config().positive_label,
        "running cross-validation"
    );
    let result = validator
        .run(&dataset)
        .context("cross-validation failed")?;

    println!("Micro Averages:");
    print!("{}", result.micro_average);
    println!("\nMacro Averages:");
    print!("{}", result.macro_average);

    Ok(())
}
