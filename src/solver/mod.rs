//! Binary dual coordinate descent solvers
//!
//! Each solver updates one dual variable per step while keeping the primal
//! weight vector `w = sum_i alpha_i y_i x_i` in sync, sweeping the examples
//! in ascending order. The update rule depends on the loss:
//!
//! - `dual_cd`: hinge and squared-hinge SVC
//! - `logistic`: logistic regression with an inner Newton iteration

pub mod dual_cd;
pub mod logistic;

pub use self::dual_cd::{DualCoordinateDescent, LossRule};
pub use self::logistic::LogisticDualSolver;

use crate::core::{FeatureVector, SolverType};
use log::{debug, warn};

/// Two-class view over training vectors
///
/// Borrows the vectors; signs and per-example costs are owned.
#[derive(Debug, Clone)]
pub struct BinaryProblem<'a> {
    pub vectors: &'a [FeatureVector],
    /// +1.0 or -1.0 per example
    pub signs: Vec<f64>,
    /// Upper bound C_i per example, class weights applied
    pub costs: Vec<f64>,
    /// Length of the weight vector
    pub dimension: usize,
}

impl BinaryProblem<'_> {
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Termination settings shared by all solvers
#[derive(Debug, Clone, Copy)]
pub struct StoppingCriteria {
    /// Stop once the sweep violation falls to `epsilon` times the first sweep's
    pub epsilon: f64,
    pub max_iterations: usize,
}

/// Weights and convergence status of one binary solve
#[derive(Debug, Clone)]
pub struct BinarySolution {
    pub weights: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// One full pass over the dual variables
pub trait CoordinateSweep {
    /// Update every coordinate once and return the largest optimality violation seen
    fn sweep(&mut self) -> f64;

    /// Primal weights implied by the current dual variables
    fn into_weights(self) -> Vec<f64>;
}

/// Solve a binary problem with the update rule selected by `solver_type`
pub fn solve_binary(
    solver_type: SolverType,
    problem: &BinaryProblem<'_>,
    criteria: StoppingCriteria,
    quiet: bool,
) -> BinarySolution {
    match solver_type {
        SolverType::L2rLr => {
            run_sweeps(LogisticDualSolver::new(problem, criteria.epsilon), criteria, quiet)
        }
        SolverType::L2rL2LossSvcDual => run_sweeps(
            DualCoordinateDescent::new(problem, LossRule::SquaredHinge),
            criteria,
            quiet,
        ),
        SolverType::L2rL1LossSvcDual => run_sweeps(
            DualCoordinateDescent::new(problem, LossRule::Hinge),
            criteria,
            quiet,
        ),
    }
}

/// Sweep until the relative violation drops below epsilon or the iteration budget runs out
pub fn run_sweeps<S: CoordinateSweep>(
    mut solver: S,
    criteria: StoppingCriteria,
    quiet: bool,
) -> BinarySolution {
    let mut initial_violation = None;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < criteria.max_iterations {
        let violation = solver.sweep();
        iterations += 1;

        let reference = *initial_violation.get_or_insert(violation);
        debug!("sweep {iterations}: max violation {violation:.6e}");

        if violation <= criteria.epsilon * reference {
            converged = true;
            break;
        }
    }

    if !converged {
        if quiet {
            debug!("reached max number of iterations ({iterations})");
        } else {
            warn!("reached max number of iterations ({iterations}), returning current weights");
        }
    }

    BinarySolution {
        weights: solver.into_weights(),
        iterations,
        converged,
    }
}
