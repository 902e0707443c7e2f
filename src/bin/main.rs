//! linsvm Command Line Interface
//!
//! Train, apply and inspect linear classifiers on LIBSVM-format data.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use linsvm::api::{ClassifierOptions, LinearSVM};
use linsvm::core::{Result, SVMError, SolverType};
use linsvm::data::read_problem_file;
use linsvm::evaluation;
use linsvm::model::Model;
use linsvm::persistence::{load_model, save_model};
use log::{error, info};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "linsvm")]
#[command(about = "Linear SVM and logistic regression by dual coordinate descent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "linsvm contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new model
    Train(TrainArgs),
    /// Make predictions using a trained model
    Predict(PredictArgs),
    /// Evaluate a model on test data
    Evaluate(EvaluateArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file (LIBSVM format)
    #[arg(long)]
    data: PathBuf,

    /// Output model file; `.json` selects JSON, defaults to `<data>.model`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Solver
    #[arg(short, long, default_value = "l2-loss-svc")]
    solver: CliSolver,

    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// Relative stopping tolerance (solver default if omitted)
    #[arg(short, long)]
    epsilon: Option<f64>,

    /// Maximum coordinate descent sweeps
    #[arg(short, long, default_value = "1000")]
    max_iterations: usize,

    /// Bias feature value; negative disables the bias term
    #[arg(short = 'B', long, default_value = "-1", allow_negative_numbers = true)]
    bias: f64,

    /// Class weight as LABEL:WEIGHT, may be repeated
    #[arg(short, long, value_parser = parse_class_weight)]
    weight: Vec<(i32, f64)>,

    /// Suppress training progress messages
    #[arg(short, long)]
    quiet: bool,

    /// Run n-fold cross-validation instead of saving a model
    #[arg(long)]
    cross_validation: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliSolver {
    /// L2-regularized logistic regression
    #[value(name = "logistic")]
    Logistic,
    /// L2-regularized squared hinge loss SVC (default)
    #[value(name = "l2-loss-svc")]
    L2LossSvc,
    /// L2-regularized hinge loss SVC
    #[value(name = "l1-loss-svc")]
    L1LossSvc,
}

impl From<CliSolver> for SolverType {
    fn from(cli_solver: CliSolver) -> Self {
        match cli_solver {
            CliSolver::Logistic => SolverType::L2rLr,
            CliSolver::L2LossSvc => SolverType::L2rL2LossSvcDual,
            CliSolver::L1LossSvc => SolverType::L2rL1LossSvcDual,
        }
    }
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input data file
    #[arg(long)]
    data: PathBuf,

    /// Output predictions file (optional, prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output probability estimates (logistic models only)
    #[arg(long)]
    probability: bool,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Test data file
    #[arg(long)]
    data: PathBuf,

    /// Show per-label metrics
    #[arg(long)]
    detailed: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn parse_class_weight(s: &str) -> std::result::Result<(i32, f64), String> {
    let (label, weight) = s
        .split_once(':')
        .ok_or_else(|| format!("expected LABEL:WEIGHT, got {s}"))?;
    let label = label
        .parse::<i32>()
        .map_err(|_| format!("invalid label: {label}"))?;
    let weight = weight
        .parse::<f64>()
        .map_err(|_| format!("invalid weight: {weight}"))?;
    Ok((label, weight))
}

fn default_model_path(data: &Path) -> PathBuf {
    let name = data
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "train".to_string());
    PathBuf::from(format!("{name}.model"))
}

fn train_command(args: TrainArgs) -> Result<()> {
    let options = ClassifierOptions {
        solver_type: args.solver.into(),
        cost: args.c,
        epsilon: args.epsilon,
        max_iterations: args.max_iterations,
        bias: (args.bias >= 0.0).then_some(args.bias),
        class_weights: args.weight.clone(),
        quiet: args.quiet,
        probability: false,
        cross_validation: args.cross_validation,
    };

    info!("Data file: {:?}", args.data);
    info!(
        "Parameters: solver={}, C={}, epsilon={}, max_iter={}",
        options.solver_type,
        options.cost,
        options.training_params().effective_epsilon(),
        options.max_iterations
    );

    let problem = read_problem_file(&args.data)?;
    info!(
        "Loaded {} examples with {} features",
        problem.len(),
        problem.n_features()
    );

    let svm = LinearSVM::from_options(&options);

    if let Some(folds) = options.cross_validation {
        let cv = svm.cross_validate(&problem, folds)?;
        println!("Cross Validation Accuracy = {}%", cv.accuracy);
        return Ok(());
    }

    let model = svm.train(&problem)?;
    if let Some(summary) = model.summary() {
        info!(
            "Training finished: iterations={:?}, converged={}",
            summary.iterations, summary.converged
        );
    }

    let output = args
        .output
        .unwrap_or_else(|| default_model_path(&args.data));
    save_model(&model, &output)?;
    info!("Model saved to: {output:?}");

    let metrics = evaluation::evaluate(&model, &problem)?;
    info!("Training accuracy: {:.2}%", metrics.accuracy);

    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let model = load_model(&args.model)?;
    if args.probability && !model.is_probability_model() {
        return Err(SVMError::UnsupportedOperation(format!(
            "probability output requires a logistic model, found {}",
            model.solver_type()
        )));
    }

    info!("Loading prediction data from: {:?}", args.data);
    let problem = read_problem_file(&args.data)?;

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    if args.probability {
        let labels: Vec<String> = model.labels().iter().map(i32::to_string).collect();
        writeln!(writer, "labels {}", labels.join(" "))?;
    }

    let mut predicted = Vec::with_capacity(problem.len());
    for (_, vector) in problem.iter() {
        if args.probability {
            let prediction = model.predict_probability(vector)?;
            write!(writer, "{}", prediction.label)?;
            for p in prediction.probabilities.iter().flatten() {
                write!(writer, " {p}")?;
            }
            writeln!(writer)?;
            predicted.push(prediction.label);
        } else {
            let prediction = model.predict(vector);
            writeln!(writer, "{}", prediction.label)?;
            predicted.push(prediction.label);
        }
    }
    writer.flush()?;

    if let Some(output_path) = &args.output {
        info!("Predictions saved to: {output_path:?}");
    }

    let metrics = evaluation::ClassificationMetrics::from_labels(problem.labels(), &predicted)?;
    info!(
        "Accuracy = {}% ({}/{})",
        metrics.accuracy, metrics.correct, metrics.total
    );

    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let model = load_model(&args.model)?;

    info!("Loading test data from: {:?}", args.data);
    let problem = read_problem_file(&args.data)?;
    let metrics = evaluation::evaluate(&model, &problem)?;

    println!("=== Model Evaluation ===");
    print_summary(&model);

    println!("\nTest Results:");
    println!(
        "  Accuracy: {:.2}% ({}/{})",
        metrics.accuracy, metrics.correct, metrics.total
    );

    if args.detailed {
        println!("\nPer-label Metrics:");
        for label in &metrics.per_label {
            println!(
                "  {:>6}  precision {:.4}  recall {:.4}  f1 {:.4}",
                label.label,
                label.precision(),
                label.recall(),
                label.f1_score()
            );
        }
    }

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let model = load_model(&args.model)?;
    print_summary(&model);

    println!("\nWeight vectors:");
    for (row, weights) in model.weights().iter().enumerate() {
        let n_show = weights.len().min(5);
        let nonzero = weights.iter().filter(|w| **w != 0.0).count();
        println!(
            "  w{row}: {nonzero} nonzero of {}, first {:?}",
            weights.len(),
            &weights[..n_show]
        );
    }

    Ok(())
}

fn print_summary(model: &Model) {
    println!("Model Summary:");
    println!("  Solver: {}", model.solver_type());
    println!("  Classes: {} {:?}", model.nr_class(), model.labels());
    println!("  Features: {}", model.n_features());
    match model.bias() {
        Some(bias) => println!("  Bias: {bias}"),
        None => println!("  Bias: none"),
    }
    println!("  Cost: {}", model.cost());
}
