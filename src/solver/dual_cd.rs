//! Dual coordinate descent for L2-regularized linear SVC
//!
//! Solves
//!
//! ```text
//! min_alpha  0.5 alpha^T (Q + D) alpha - e^T alpha,   0 <= alpha_i <= U_i
//! ```
//!
//! with `Q_ij = y_i y_j x_i^T x_j`. Squared-hinge loss uses
//! `D_ii = 1 / (2 C_i)` and `U_i = inf`; hinge loss uses `D_ii = 0` and
//! `U_i = C_i`.

use crate::solver::{BinaryProblem, CoordinateSweep};

/// Loss-specific part of the coordinate update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossRule {
    /// max(0, 1 - y w^T x)^2
    SquaredHinge,
    /// max(0, 1 - y w^T x)
    Hinge,
}

impl LossRule {
    /// Diagonal term `D_ii` and upper bound `U_i` for an example with cost `cost`
    pub fn bounds(self, cost: f64) -> (f64, f64) {
        match self {
            LossRule::SquaredHinge => (0.5 / cost, f64::INFINITY),
            LossRule::Hinge => (0.0, cost),
        }
    }
}

/// Coordinate descent state for one binary problem
pub struct DualCoordinateDescent<'a> {
    problem: &'a BinaryProblem<'a>,
    weights: Vec<f64>,
    alpha: Vec<f64>,
    diag: Vec<f64>,
    upper: Vec<f64>,
    /// `Q_ii + D_ii`
    qd: Vec<f64>,
}

impl<'a> DualCoordinateDescent<'a> {
    pub fn new(problem: &'a BinaryProblem<'a>, rule: LossRule) -> Self {
        let n = problem.len();
        let mut diag = Vec::with_capacity(n);
        let mut upper = Vec::with_capacity(n);
        let mut qd = Vec::with_capacity(n);

        for (vector, &cost) in problem.vectors.iter().zip(&problem.costs) {
            let (d, u) = rule.bounds(cost);
            diag.push(d);
            upper.push(u);
            qd.push(d + vector.norm_squared());
        }

        Self {
            problem,
            weights: vec![0.0; problem.dimension],
            alpha: vec![0.0; n],
            diag,
            upper,
            qd,
        }
    }

    /// Current dual variables
    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }
}

impl CoordinateSweep for DualCoordinateDescent<'_> {
    fn sweep(&mut self) -> f64 {
        let mut max_violation: f64 = 0.0;

        for i in 0..self.problem.len() {
            // a zero vector with no diagonal term never moves w
            if self.qd[i] <= 0.0 {
                continue;
            }

            let x = &self.problem.vectors[i];
            let y = self.problem.signs[i];
            let alpha_i = self.alpha[i];

            let g = y * x.dot(&self.weights) - 1.0 + alpha_i * self.diag[i];
            let pg = if alpha_i == 0.0 {
                g.min(0.0)
            } else if alpha_i >= self.upper[i] {
                g.max(0.0)
            } else {
                g
            };
            max_violation = max_violation.max(pg.abs());

            if pg.abs() > 1e-12 {
                let new_alpha = (alpha_i - g / self.qd[i]).max(0.0).min(self.upper[i]);
                self.alpha[i] = new_alpha;
                x.add_scaled_to((new_alpha - alpha_i) * y, &mut self.weights);
            }
        }

        max_violation
    }

    fn into_weights(self) -> Vec<f64> {
        self.weights
    }
}
