//! High-level training that turns a `Problem` into a `Model`
//!
//! Groups labels, applies class weights to the per-example costs and runs
//! one binary solve for two labels or one solve per label (one-vs-rest)
//! otherwise.

use crate::core::{Result, SVMError, TrainingParams, TrainingSummary};
use crate::data::Problem;
use crate::model::Model;
use crate::solver::{solve_binary, BinaryProblem, BinarySolution, StoppingCriteria};
use log::{info, warn};
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Linear SVM trainer
#[derive(Debug, Clone, Default)]
pub struct LinearSolver {
    params: TrainingParams,
}

impl LinearSolver {
    pub fn new(params: TrainingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Train a model on `problem`
    ///
    /// The problem's bias is overridden by the configured one; the caller's
    /// problem is never modified.
    pub fn train(&self, problem: &Problem) -> Result<Model> {
        self.params.validate()?;
        let problem = align_bias(problem, self.params.bias);

        let labels = distinct_labels(&problem);
        if labels.len() < 2 {
            return Err(SVMError::invalid(format!(
                "training needs at least 2 distinct labels, found {}",
                labels.len()
            )));
        }
        for &(label, _) in &self.params.class_weights {
            if !labels.contains(&label) {
                warn!("class label {label} specified in weight is not found");
            }
        }

        if !self.params.quiet {
            info!(
                "training {} on {} examples, {} features, {} labels",
                self.params.solver_type,
                problem.size(),
                problem.n_features(),
                labels.len()
            );
        }

        let solutions: Vec<BinarySolution> = if labels.len() == 2 {
            vec![self.solve_pair(&problem, labels[0], labels[1])]
        } else {
            labels
                .iter()
                .map(|&label| self.solve_one_vs_rest(&problem, label))
                .collect()
        };

        let summary = TrainingSummary {
            iterations: solutions.iter().map(|s| s.iterations).collect(),
            converged: solutions.iter().all(|s| s.converged),
        };
        if !self.params.quiet {
            info!(
                "training finished after {:?} sweeps, converged: {}",
                summary.iterations, summary.converged
            );
        }

        let weights = solutions.into_iter().map(|s| s.weights).collect();
        let model = Model::new(
            self.params.solver_type,
            labels,
            problem.n_features(),
            problem.bias(),
            self.params.c,
            weights,
        )?;
        Ok(model.with_summary(summary))
    }

    /// `positive` gets sign +1; every example is weighted by its own label
    fn solve_pair(&self, problem: &Problem, negative: i32, positive: i32) -> BinarySolution {
        let positive_cost = self.params.c * self.params.class_weight(positive);
        let negative_cost = self.params.c * self.params.class_weight(negative);

        let (signs, costs) = problem
            .labels()
            .iter()
            .map(|&label| {
                if label == positive {
                    (1.0, positive_cost)
                } else {
                    (-1.0, negative_cost)
                }
            })
            .unzip();

        self.solve(problem, signs, costs)
    }

    /// `target` against all other labels; the rest share the unweighted cost
    fn solve_one_vs_rest(&self, problem: &Problem, target: i32) -> BinarySolution {
        let positive_cost = self.params.c * self.params.class_weight(target);

        let (signs, costs) = problem
            .labels()
            .iter()
            .map(|&label| {
                if label == target {
                    (1.0, positive_cost)
                } else {
                    (-1.0, self.params.c)
                }
            })
            .unzip();

        self.solve(problem, signs, costs)
    }

    fn solve(&self, problem: &Problem, signs: Vec<f64>, costs: Vec<f64>) -> BinarySolution {
        let binary = BinaryProblem {
            vectors: problem.vectors(),
            signs,
            costs,
            dimension: problem.dimension(),
        };
        let criteria = StoppingCriteria {
            epsilon: self.params.effective_epsilon(),
            max_iterations: self.params.max_iterations,
        };
        solve_binary(self.params.solver_type, &binary, criteria, self.params.quiet)
    }
}

/// Borrow `problem` when its bias already matches, otherwise re-bias a copy
pub(crate) fn align_bias(problem: &Problem, bias: Option<f64>) -> Cow<'_, Problem> {
    if problem.bias() == bias {
        Cow::Borrowed(problem)
    } else {
        let mut aligned = problem.clone();
        aligned.set_bias(bias.unwrap_or(-1.0));
        Cow::Owned(aligned)
    }
}

/// Distinct labels of `problem` in ascending order
pub(crate) fn distinct_labels(problem: &Problem) -> Vec<i32> {
    problem
        .labels()
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
