use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use bias_lite_preprocessing::{
    data_loader::{DEFAULT_SEED, DEFAULT_TEST_SIZE, load_csv},
    pre_processor::{DEFAULT_MAX_FEATURES, DEFAULT_MAX_NGRAM, DEFAULT_MIN_DF, DEFAULT_MIN_NGRAM},
};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    CLASSIFICATION_THRESHOLD, Classification, ExportedModel, Prediction, RuleSet, TrainingConfig,
    VectorizerConfig,
    model::{ClassWeight, DEFAULT_C, DEFAULT_MAX_ITER, DEFAULT_TOL, TrainerParams},
    train,
};

#[derive(Parser)]
#[command(name = "bias-lite")]
#[command(about = "Train and run a lightweight bias detector for short texts", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fit a model on a labeled CSV and export it as JSON
    Train(TrainArgs),
    /// Score text with an exported model
    Predict(PredictArgs),
    /// Flag gendered or loaded phrases and suggest replacements
    Analyze(AnalyzeArgs),
}

#[derive(Args)]
pub struct TrainArgs {
    /// CSV with `text` and `bias_present` columns
    #[arg(short, long, value_name = "PATH", env = "BIAS_LITE_DATA")]
    pub data: PathBuf,

    /// Where to write the model artifact
    #[arg(short, long, value_name = "PATH", env = "BIAS_LITE_MODEL", default_value = "model.json")]
    pub out: PathBuf,

    /// Also write the run config, fit summary and evaluation as JSON
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Held-out fraction
    #[arg(long, default_value_t = DEFAULT_TEST_SIZE)]
    pub test_size: f64,

    /// Seed for the stratified split
    #[arg(long, env = "BIAS_LITE_SEED", default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    #[arg(long, default_value_t = DEFAULT_MIN_NGRAM)]
    pub min_ngram: usize,

    #[arg(long, default_value_t = DEFAULT_MAX_NGRAM)]
    pub max_ngram: usize,

    /// Minimum number of training documents an n-gram must appear in
    #[arg(long, default_value_t = DEFAULT_MIN_DF)]
    pub min_df: usize,

    /// Vocabulary size cap, 0 for no cap
    #[arg(long, default_value_t = DEFAULT_MAX_FEATURES)]
    pub max_features: usize,

    /// Inverse regularization strength
    #[arg(short = 'C', long = "c", default_value_t = DEFAULT_C)]
    pub c: f64,

    #[arg(long, default_value_t = DEFAULT_MAX_ITER)]
    pub max_iter: usize,

    /// Gradient tolerance for convergence
    #[arg(long, default_value_t = DEFAULT_TOL)]
    pub tol: f64,

    #[arg(long, value_enum, default_value = "balanced")]
    pub class_weight: ClassWeightArg,
}

#[derive(ValueEnum, Clone, Copy)]
pub enum ClassWeightArg {
    /// Weight classes inversely to their frequency
    Balanced,
    /// Every example counts the same
    Uniform,
}

impl From<ClassWeightArg> for ClassWeight {
    fn from(arg: ClassWeightArg) -> Self {
        match arg {
            ClassWeightArg::Balanced => ClassWeight::Balanced,
            ClassWeightArg::Uniform => ClassWeight::Uniform,
        }
    }
}

impl TrainArgs {
    fn config(&self) -> TrainingConfig {
        TrainingConfig {
            test_size: self.test_size,
            seed: self.seed,
            vectorizer: VectorizerConfig {
                ngram_range: [self.min_ngram, self.max_ngram],
                min_df: self.min_df,
                max_features: (self.max_features > 0).then_some(self.max_features),
            },
            trainer: TrainerParams {
                c: self.c,
                max_iter: self.max_iter,
                tol: self.tol,
                class_weight: self.class_weight.into(),
                ..TrainerParams::default()
            },
        }
    }
}

/// Where the text to score comes from. Defaults to stdin.
#[derive(Args)]
pub struct InputArgs {
    /// Text to analyze (if not provided, reads from stdin)
    #[arg(value_name = "TEXT")]
    pub text: Option<String>,

    /// Read text from file
    #[arg(short, long, value_name = "PATH", conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Batch process texts (one per line)
    #[arg(short, long, value_name = "PATH", conflicts_with_all = ["text", "file"])]
    pub batch: Option<PathBuf>,
}

#[derive(Args)]
pub struct PredictArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Exported model artifact
    #[arg(short, long, value_name = "PATH", env = "BIAS_LITE_MODEL", default_value = "model.json")]
    pub model: PathBuf,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "probability")]
    pub format: OutputFormat,

    /// Classification threshold on P(biased), within [0, 1]
    #[arg(
        short = 't',
        long,
        default_value_t = CLASSIFICATION_THRESHOLD,
        value_parser = parse_threshold
    )]
    pub threshold: f64,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Also score the text with this model artifact
    #[arg(short, long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Classification threshold on P(biased), within [0, 1]
    #[arg(
        short = 't',
        long,
        default_value_t = CLASSIFICATION_THRESHOLD,
        value_parser = parse_threshold
    )]
    pub threshold: f64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Clone, Copy)]
pub enum OutputFormat {
    /// Output just the class label (0 or 1)
    Class,
    /// Output P(biased) as a float 0-1 (default)
    Probability,
    /// Output as JSON
    Json,
    /// Human-readable output with confidence
    Human,
}

enum InputSource {
    Single(String),
    Batch(Vec<String>),
}

pub fn run(cli: &Cli) -> Result<()> {
    init_logging(cli.verbose, cli.quiet);
    match &cli.command {
        Command::Train(args) => run_train(args),
        Command::Predict(args) => run_predict(args),
        Command::Analyze(args) => run_analyze(args),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn run_train(args: &TrainArgs) -> Result<()> {
    let examples = load_csv(&args.data)
        .with_context(|| format!("Failed to load dataset: {}", args.data.display()))?;
    info!(path = %args.data.display(), rows = examples.len(), "Loaded dataset");

    let config = args.config();
    let run = train(&examples, &config).context("Training failed")?;
    println!("{}", run.evaluation);

    let artifact = run.export().context("Failed to export model")?;
    artifact
        .write_json(&args.out)
        .with_context(|| format!("Failed to write model: {}", args.out.display()))?;

    if let Some(path) = &args.report {
        let report = serde_json::to_string_pretty(&run.summary(&config))?;
        fs::write(path, report)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        info!(path = %path.display(), "Training report written");
    }
    Ok(())
}

fn parse_threshold(raw: &str) -> std::result::Result<f64, String> {
    let threshold = raw.parse::<f64>().map_err(|e| e.to_string())?;
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(format!("threshold must lie in [0, 1], got {raw}"))
    }
}

fn run_predict(args: &PredictArgs) -> Result<()> {
    let model = load_model(&args.model)?;

    match read_input(&args.input)? {
        InputSource::Single(text) => {
            let prediction = model.predict(&text);
            println!("{}", format_prediction(prediction, args)?);
        }
        InputSource::Batch(texts) => {
            let predictions = texts.iter().map(|text| model.predict(text));
            if matches!(args.format, OutputFormat::Json) {
                let json_array = predictions
                    .map(|prediction| prediction_json(prediction, args.threshold))
                    .collect::<Vec<_>>();
                println!("{}", serde_json::to_string(&json_array)?);
            } else {
                for prediction in predictions {
                    println!("{}", format_prediction(prediction, args)?);
                }
            }
        }
    }
    Ok(())
}

fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let rules = RuleSet::default();
    let model = args.model.as_deref().map(load_model).transpose()?;

    let texts = match read_input(&args.input)? {
        InputSource::Single(text) => vec![text],
        InputSource::Batch(texts) => texts,
    };

    for text in &texts {
        let analysis = rules.analyze(text);
        let prediction = model.as_ref().map(|m| m.predict(text));

        if args.json {
            let mut value = serde_json::to_value(&analysis)?;
            if let Some(prediction) = prediction {
                value["prediction"] = prediction_json(prediction, args.threshold);
            }
            println!("{}", serde_json::to_string(&value)?);
            continue;
        }

        if let Some(prediction) = prediction {
            let class = prediction.classification(args.threshold);
            println!("Model: {class} ({prediction})");
        }
        if analysis.is_clean() {
            println!("No flagged phrases.");
            continue;
        }
        println!("Highlighted: {}", analysis.highlighted);
        println!("Suggested:   {}", analysis.improved);
        for hit in &analysis.hits {
            println!(
                "  - \"{}\" -> \"{}\" (x{}): {}",
                hit.phrase, hit.replacement, hit.occurrences, hit.hint
            );
        }
    }
    Ok(())
}

fn load_model(path: &Path) -> Result<ExportedModel> {
    let model = ExportedModel::read_json(path)
        .with_context(|| format!("Failed to load model: {}", path.display()))?;
    info!(path = %path.display(), num_features = model.num_features(), "Loaded model");
    Ok(model)
}

/// Priority: text arg > file > batch > stdin
fn read_input(input: &InputArgs) -> Result<InputSource> {
    if let Some(text) = &input.text {
        return Ok(InputSource::Single(text.clone()));
    }

    if let Some(path) = &input.file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        return Ok(InputSource::Single(text));
    }

    if let Some(path) = &input.batch {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
        let texts = contents.lines().map(String::from).collect();
        return Ok(InputSource::Batch(texts));
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(InputSource::Single(buffer))
}

fn prediction_json(prediction: Prediction, threshold: f64) -> serde_json::Value {
    let class = prediction.classification(threshold);
    serde_json::json!({
        "class": i64::from(class),
        "class_label": class,
        "probabilities": {
            "neutral": prediction.neutral_probability(),
            "biased": prediction.biased_probability(),
        },
    })
}

fn format_prediction(prediction: Prediction, args: &PredictArgs) -> Result<String> {
    let class = prediction.classification(args.threshold);
    Ok(match args.format {
        OutputFormat::Class => i64::from(class).to_string(),
        OutputFormat::Probability => format!("{:.4}", prediction.biased_probability()),
        OutputFormat::Json => serde_json::to_string(&prediction_json(prediction, args.threshold))?,
        OutputFormat::Human => {
            let confidence = match class {
                Classification::Neutral => prediction.neutral_probability(),
                Classification::Biased => prediction.biased_probability(),
            };
            format!("Result: {class}\nConfidence: {:.1}%", confidence * 100.0)
        }
    })
}
