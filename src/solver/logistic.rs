//! Dual coordinate descent for L2-regularized logistic regression
//!
//! The dual has one variable per example, `0 < alpha_i < C_i`, paired with
//! its complement `C_i - alpha_i`. Each coordinate step minimizes a
//! one-dimensional sub-problem with the `z log z` entropy terms by a short
//! Newton iteration on whichever of the pair is smaller.

use crate::solver::{BinaryProblem, CoordinateSweep};

const MAX_INNER_ITERATIONS: usize = 100;
const INITIAL_INNER_EPSILON: f64 = 1e-2;
/// Step shrink when a Newton step leaves the feasible interval
const ETA: f64 = 0.1;

pub struct LogisticDualSolver<'a> {
    problem: &'a BinaryProblem<'a>,
    weights: Vec<f64>,
    alpha: Vec<f64>,
    complement: Vec<f64>,
    xtx: Vec<f64>,
    inner_epsilon: f64,
    min_inner_epsilon: f64,
}

impl<'a> LogisticDualSolver<'a> {
    pub fn new(problem: &'a BinaryProblem<'a>, epsilon: f64) -> Self {
        let mut weights = vec![0.0; problem.dimension];
        let mut alpha = Vec::with_capacity(problem.len());
        let mut complement = Vec::with_capacity(problem.len());
        let mut xtx = Vec::with_capacity(problem.len());

        for ((vector, &y), &cost) in problem
            .vectors
            .iter()
            .zip(&problem.signs)
            .zip(&problem.costs)
        {
            let a = (0.001 * cost).min(1e-8);
            alpha.push(a);
            complement.push(cost - a);
            xtx.push(vector.norm_squared());
            vector.add_scaled_to(y * a, &mut weights);
        }

        Self {
            problem,
            weights,
            alpha,
            complement,
            xtx,
            inner_epsilon: INITIAL_INNER_EPSILON,
            min_inner_epsilon: epsilon.min(1e-8),
        }
    }

    /// Current dual variables
    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }
}

/// Gradient of the one-variable sub-problem at `z`
fn sub_gradient(a: f64, b: f64, cost: f64, z: f64, z_old: f64) -> f64 {
    a * (z - z_old) + b + (z / (cost - z)).ln()
}

impl CoordinateSweep for LogisticDualSolver<'_> {
    fn sweep(&mut self) -> f64 {
        let mut max_violation: f64 = 0.0;
        let mut newton_iterations = 0;

        for i in 0..self.problem.len() {
            let x = &self.problem.vectors[i];
            let y = self.problem.signs[i];
            let cost = self.problem.costs[i];
            let a = self.xtx[i];
            let ywx = y * x.dot(&self.weights);

            // optimize the complement when that side is closer to the optimum
            let sign = if 0.5 * a * (self.complement[i] - self.alpha[i]) + ywx < 0.0 {
                -1.0
            } else {
                1.0
            };
            let z_old = if sign > 0.0 {
                self.alpha[i]
            } else {
                self.complement[i]
            };
            let b = sign * ywx;

            let mut z = z_old;
            if cost - z < 0.5 * cost {
                z *= 0.1;
            }
            let mut gp = sub_gradient(a, b, cost, z, z_old);
            max_violation = max_violation.max(gp.abs());

            let mut inner = 0;
            while inner <= MAX_INNER_ITERATIONS && gp.abs() >= self.inner_epsilon {
                let gpp = a + cost / (cost - z) / z;
                let step = z - gp / gpp;
                z = if step <= 0.0 {
                    z * ETA
                } else if step >= cost {
                    0.5 * (z + cost)
                } else {
                    step
                };
                gp = sub_gradient(a, b, cost, z, z_old);
                inner += 1;
            }
            newton_iterations += inner;

            if inner > 0 {
                if sign > 0.0 {
                    self.alpha[i] = z;
                    self.complement[i] = cost - z;
                } else {
                    self.complement[i] = z;
                    self.alpha[i] = cost - z;
                }
                x.add_scaled_to(sign * (z - z_old) * y, &mut self.weights);
            }
        }

        if newton_iterations <= self.problem.len() / 10 {
            self.inner_epsilon = self.min_inner_epsilon.max(0.1 * self.inner_epsilon);
        }

        max_violation
    }

    fn into_weights(self) -> Vec<f64> {
        self.weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FeatureVector;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_dual_variables_stay_inside_interval() {
        let vectors: Vec<FeatureVector> = [1.0, 2.0, -1.0, -2.0]
            .iter()
            .map(|&x| FeatureVector::new(vec![(1, x)]).unwrap())
            .collect();
        let problem = BinaryProblem {
            vectors: &vectors,
            signs: vec![1.0, 1.0, -1.0, -1.0],
            costs: vec![2.0; 4],
            dimension: 1,
        };
        let mut solver = LogisticDualSolver::new(&problem, 0.01);

        for _ in 0..20 {
            solver.sweep();
        }
        for &a in solver.alpha() {
            assert!(a > 0.0 && a < 2.0, "alpha {a} left (0, C)");
        }
        assert!(solver.into_weights()[0] > 0.0);
    }

    #[test]
    fn test_zero_vector_moves_to_half_cost() {
        // with x = 0 the sub-problem optimum is alpha = C / 2
        let vectors = vec![FeatureVector::empty()];
        let problem = BinaryProblem {
            vectors: &vectors,
            signs: vec![1.0],
            costs: vec![1.0],
            dimension: 1,
        };
        let mut solver = LogisticDualSolver::new(&problem, 0.01);

        solver.sweep();
        assert_abs_diff_eq!(solver.alpha()[0], 0.5, epsilon = 1e-2);
        assert_eq!(solver.into_weights(), vec![0.0]);
    }
}
