//! High-level API for linear SVM training and prediction
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use linsvm::api::LinearSVM;
//! use linsvm::evaluation;
//! use linsvm::data::read_problem_file;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = LinearSVM::new()
//!     .with_c(1.0)
//!     .with_bias(1.0)
//!     .train_from_file("train.libsvm")?;
//!
//! let test = read_problem_file("test.libsvm")?;
//! let metrics = evaluation::evaluate(&model, &test)?;
//! println!("Accuracy: {:.2}%", metrics.accuracy);
//! # Ok(())
//! # }
//! ```
//!
//! Option strings in the LIBLINEAR style are accepted too:
//!
//! ```rust
//! use linsvm::api::ClassifierOptions;
//!
//! let options: ClassifierOptions = "-s 0 -c 4 -B 1 -w2 0.5 -q".parse().unwrap();
//! assert_eq!(options.cost, 4.0);
//! ```

use crate::core::{FeatureVector, Result, SVMError, SolverType, TrainingParams};
use crate::data::{read_problem_file, Problem};
use crate::evaluation::{self, CrossValidation};
use crate::model::Model;
use crate::optimizer::LinearSolver;
use std::path::Path;
use std::str::FromStr;

/// Every knob of the classifier surface
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierOptions {
    pub solver_type: SolverType,
    pub cost: f64,
    pub epsilon: Option<f64>,
    pub max_iterations: usize,
    pub bias: Option<f64>,
    pub class_weights: Vec<(i32, f64)>,
    pub quiet: bool,
    /// Report probabilities instead of decision values at prediction time
    pub probability: bool,
    /// Run n-fold cross-validation instead of returning a model
    pub cross_validation: Option<usize>,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        let params = TrainingParams::default();
        Self {
            solver_type: params.solver_type,
            cost: params.c,
            epsilon: params.epsilon,
            max_iterations: params.max_iterations,
            bias: params.bias,
            class_weights: params.class_weights,
            quiet: params.quiet,
            probability: false,
            cross_validation: None,
        }
    }
}

impl ClassifierOptions {
    pub fn training_params(&self) -> TrainingParams {
        TrainingParams {
            solver_type: self.solver_type,
            c: self.cost,
            epsilon: self.epsilon,
            max_iterations: self.max_iterations,
            bias: self.bias,
            class_weights: self.class_weights.clone(),
            quiet: self.quiet,
        }
    }
}

/// Parses `-s <code> -c <cost> -e <eps> -B <bias> -w<label> <weight> -v <folds> -q -b <0|1>`
impl FromStr for ClassifierOptions {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        let mut options = ClassifierOptions::default();
        let mut tokens = s.split_whitespace();

        while let Some(flag) = tokens.next() {
            if flag == "-q" {
                options.quiet = true;
                continue;
            }

            let value = tokens
                .next()
                .ok_or_else(|| SVMError::invalid(format!("missing value for option {flag}")))?;

            match flag {
                "-s" => options.solver_type = SolverType::from_code(parse_option(flag, value)?)?,
                "-c" => options.cost = parse_option(flag, value)?,
                "-e" => options.epsilon = Some(parse_option(flag, value)?),
                "-B" => {
                    let bias: f64 = parse_option(flag, value)?;
                    options.bias = (bias >= 0.0).then_some(bias);
                }
                "-v" => {
                    let folds: usize = parse_option(flag, value)?;
                    if folds < 2 {
                        return Err(SVMError::invalid("n-fold cross validation: n must >= 2"));
                    }
                    options.cross_validation = Some(folds);
                }
                "-b" => {
                    options.probability = match value {
                        "0" => false,
                        "1" => true,
                        other => {
                            return Err(SVMError::invalid(format!(
                                "option -b expects 0 or 1, got {other}"
                            )))
                        }
                    }
                }
                weight if weight.starts_with("-w") => {
                    let label: i32 = parse_option(flag, &weight[2..])?;
                    options.class_weights.push((label, parse_option(flag, value)?));
                }
                unknown => {
                    return Err(SVMError::invalid(format!("unknown option: {unknown}")));
                }
            }
        }

        Ok(options)
    }
}

fn parse_option<T: FromStr>(flag: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| SVMError::invalid(format!("invalid value for option {flag}: {value}")))
}

/// Result of [`train`]: a model, or a cross-validation report when requested
#[derive(Debug, Clone)]
pub enum TrainOutcome {
    Model(Model),
    CrossValidation(CrossValidation),
}

/// Train from `(label, vector)` pairs
pub fn train<I>(label_values: I, options: &ClassifierOptions) -> Result<TrainOutcome>
where
    I: IntoIterator<Item = (i32, FeatureVector)>,
{
    let problem: Problem = label_values.into_iter().collect();
    let svm = LinearSVM::from_options(options);

    match options.cross_validation {
        Some(folds) => svm.cross_validate(&problem, folds).map(TrainOutcome::CrossValidation),
        None => svm.train(&problem).map(TrainOutcome::Model),
    }
}

/// Predict one vector, returning the label and its confidence
///
/// With `options.probability` the confidence is the winning probability,
/// otherwise the absolute decision value.
pub fn predict(vector: &FeatureVector, model: &Model, options: &ClassifierOptions) -> Result<(i32, f64)> {
    let prediction = if options.probability {
        model.predict_probability(vector)?
    } else {
        model.predict(vector)
    };
    Ok((prediction.label, prediction.confidence()))
}

/// Linear SVM interface with builder pattern
#[derive(Debug, Clone, Default)]
pub struct LinearSVM {
    params: TrainingParams,
}

impl LinearSVM {
    /// Squared-hinge dual solver with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &ClassifierOptions) -> Self {
        Self {
            params: options.training_params(),
        }
    }

    pub fn with_solver(mut self, solver_type: SolverType) -> Self {
        self.params.solver_type = solver_type;
        self
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.params.c = c;
        self
    }

    /// Set convergence tolerance
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.params.epsilon = Some(epsilon);
        self
    }

    /// Set maximum number of sweeps
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.params.max_iterations = max_iterations;
        self
    }

    /// Add a bias feature with this value; negative disables it
    pub fn with_bias(mut self, bias: f64) -> Self {
        self.params.bias = (bias >= 0.0).then_some(bias);
        self
    }

    /// Multiply C by `weight` for examples labelled `label`
    pub fn with_class_weight(mut self, label: i32, weight: f64) -> Self {
        self.params.class_weights.push((label, weight));
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.params.quiet = quiet;
        self
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    pub fn train(&self, problem: &Problem) -> Result<Model> {
        LinearSolver::new(self.params.clone()).train(problem)
    }

    /// Train from LIBSVM format file
    pub fn train_from_file<P: AsRef<Path>>(&self, path: P) -> Result<Model> {
        let problem = read_problem_file(path)?;
        self.train(&problem)
    }

    /// n-fold cross-validation with these parameters; accuracy is logged unless quiet
    pub fn cross_validate(&self, problem: &Problem, n_folds: usize) -> Result<CrossValidation> {
        evaluation::cross_validate(problem, &self.params, n_folds)
    }
}

/// Convenience functions for quick operations
pub mod quick {
    use super::*;

    /// Train with default parameters on a LIBSVM file
    pub fn train_file<P: AsRef<Path>>(path: P) -> Result<Model> {
        LinearSVM::new().quiet(true).train_from_file(path)
    }

    /// Train on one file, return accuracy (percent) on another
    pub fn evaluate_split<P1: AsRef<Path>, P2: AsRef<Path>>(
        train_path: P1,
        test_path: P2,
    ) -> Result<f64> {
        let model = train_file(train_path)?;
        let test = read_problem_file(test_path)?;
        Ok(evaluation::evaluate(&model, &test)?.accuracy)
    }
}
