//! Core type definitions for the linear SVM

use crate::core::{Result, SVMError};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Sparse feature vector with strictly ascending, 1-based indices
///
/// Absent indices are implicit zeros. The vector cannot be modified from
/// outside the crate once constructed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureVector {
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Create a feature vector from `(index, value)` pairs in any order
    ///
    /// Fails with `InvalidInput` on a zero index or a repeated index.
    pub fn new<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        let mut pairs: Vec<(usize, f64)> = pairs.into_iter().collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        for window in pairs.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(SVMError::invalid(format!(
                    "duplicate feature index {}",
                    window[0].0
                )));
            }
        }
        if let Some(&(0, _)) = pairs.first() {
            return Err(SVMError::invalid("feature indices must be positive"));
        }

        let (indices, values) = pairs.into_iter().unzip();
        Ok(Self { indices, values })
    }

    /// Create an empty (all-zero) vector
    pub fn empty() -> Self {
        Self::default()
    }

    /// Convert a dense list of values, numbering features from 1 and dropping zeros
    pub fn from_dense(values: &[f64]) -> Self {
        let (indices, values) = values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, &v)| (i + 1, v))
            .unzip();
        Self { indices, values }
    }

    /// Value at `index`, 0.0 if absent
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Iterate over `(index, value)` in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Largest stored index
    pub fn max_index(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    /// Number of stored (non-implicit) entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Dot product with a dense weight vector where `weights[j]` belongs to index `j + 1`
    ///
    /// Indices past the end of `weights` contribute nothing.
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.iter()
            .take_while(|&(idx, _)| idx <= weights.len())
            .map(|(idx, v)| weights[idx - 1] * v)
            .sum()
    }

    /// `weights += scale * self`, using the same index layout as [`FeatureVector::dot`]
    pub fn add_scaled_to(&self, scale: f64, weights: &mut [f64]) {
        for (idx, v) in self.iter() {
            if let Some(w) = weights.get_mut(idx - 1) {
                *w += scale * v;
            }
        }
    }

    /// Append an entry past the current last index
    pub(crate) fn push_last(&mut self, index: usize, value: f64) {
        debug_assert!(self.max_index().map_or(true, |last| index > last));
        self.indices.push(index);
        self.values.push(value);
    }

    /// Remove the last entry if it sits at `index`
    pub(crate) fn remove_last_at(&mut self, index: usize) {
        if self.max_index() == Some(index) {
            self.indices.pop();
            self.values.pop();
        }
    }
}

impl TryFrom<Vec<(usize, f64)>> for FeatureVector {
    type Error = SVMError;

    fn try_from(pairs: Vec<(usize, f64)>) -> Result<Self> {
        Self::new(pairs)
    }
}

impl TryFrom<HashMap<usize, f64>> for FeatureVector {
    type Error = SVMError;

    fn try_from(map: HashMap<usize, f64>) -> Result<Self> {
        Self::new(map)
    }
}

impl TryFrom<BTreeMap<usize, f64>> for FeatureVector {
    type Error = SVMError;

    fn try_from(map: BTreeMap<usize, f64>) -> Result<Self> {
        Self::new(map)
    }
}

/// Prediction result for one vector
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Predicted class label
    pub label: i32,
    /// One value for binary models, one per label otherwise
    pub decision_values: Vec<f64>,
    /// Per-label probabilities in model label order, logistic models only
    pub probabilities: Option<Vec<f64>>,
}

impl Prediction {
    pub fn new(label: i32, decision_values: Vec<f64>) -> Self {
        Self {
            label,
            decision_values,
            probabilities: None,
        }
    }

    pub fn with_probabilities(mut self, probabilities: Vec<f64>) -> Self {
        self.probabilities = Some(probabilities);
        self
    }

    /// Probability of the predicted label if available, otherwise the
    /// absolute decision value of the winning score
    pub fn confidence(&self) -> f64 {
        if let Some(probs) = &self.probabilities {
            return probs.iter().copied().fold(0.0, f64::max);
        }
        match self.decision_values.as_slice() {
            [single] => single.abs(),
            many => many
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max)
                .abs(),
        }
    }
}

/// Training algorithm selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverType {
    /// L2-regularized logistic regression, solved in the dual
    L2rLr,
    /// L2-regularized squared-hinge loss SVC, dual coordinate descent
    #[default]
    L2rL2LossSvcDual,
    /// L2-regularized hinge loss SVC, dual coordinate descent
    L2rL1LossSvcDual,
}

impl SolverType {
    pub const ALL: [SolverType; 3] = [
        SolverType::L2rLr,
        SolverType::L2rL2LossSvcDual,
        SolverType::L2rL1LossSvcDual,
    ];

    /// Numeric code used by `-s` option strings
    pub fn code(self) -> u8 {
        match self {
            SolverType::L2rLr => 0,
            SolverType::L2rL2LossSvcDual => 1,
            SolverType::L2rL1LossSvcDual => 3,
        }
    }

    /// Look up a solver by numeric code; 7 is the dual logistic alias
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 | 7 => Ok(SolverType::L2rLr),
            1 => Ok(SolverType::L2rL2LossSvcDual),
            3 => Ok(SolverType::L2rL1LossSvcDual),
            other => Err(SVMError::invalid(format!(
                "solver type {other} is not supported"
            ))),
        }
    }

    /// Name written to model files
    pub fn name(self) -> &'static str {
        match self {
            SolverType::L2rLr => "L2R_LR",
            SolverType::L2rL2LossSvcDual => "L2R_L2LOSS_SVC_DUAL",
            SolverType::L2rL1LossSvcDual => "L2R_L1LOSS_SVC_DUAL",
        }
    }

    /// Whether the model can produce probability estimates
    pub fn is_logistic(self) -> bool {
        matches!(self, SolverType::L2rLr)
    }

    pub fn default_epsilon(self) -> f64 {
        match self {
            SolverType::L2rLr => 0.01,
            SolverType::L2rL2LossSvcDual | SolverType::L2rL1LossSvcDual => 0.1,
        }
    }
}

impl fmt::Display for SolverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolverType {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|solver| solver.name() == s)
            .ok_or_else(|| SVMError::invalid(format!("unknown solver type: {s}")))
    }
}

/// Hyperparameters consumed by the linear solver
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingParams {
    pub solver_type: SolverType,
    /// Regularization parameter C
    pub c: f64,
    /// Relative stopping tolerance; `None` picks the solver default
    pub epsilon: Option<f64>,
    /// Maximum number of coordinate descent sweeps
    pub max_iterations: usize,
    /// Bias feature value; `None` trains without an intercept
    pub bias: Option<f64>,
    /// Per-label multipliers of C, in the order given
    pub class_weights: Vec<(i32, f64)>,
    /// Suppress training progress messages
    pub quiet: bool,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            solver_type: SolverType::default(),
            c: 1.0,
            epsilon: None,
            max_iterations: 1000,
            bias: None,
            class_weights: Vec::new(),
            quiet: false,
        }
    }
}

impl TrainingParams {
    pub fn effective_epsilon(&self) -> f64 {
        self.epsilon
            .unwrap_or_else(|| self.solver_type.default_epsilon())
    }

    /// Weight multiplier for `label`, 1.0 when none was given
    pub fn class_weight(&self, label: i32) -> f64 {
        self.class_weights
            .iter()
            .rev()
            .find(|&&(l, _)| l == label)
            .map_or(1.0, |&(_, w)| w)
    }

    /// Reject hyperparameters the solver cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(SVMError::invalid(format!(
                "C must be positive, got {}",
                self.c
            )));
        }
        if let Some(eps) = self.epsilon {
            if !(eps > 0.0) {
                return Err(SVMError::invalid(format!(
                    "epsilon must be positive, got {eps}"
                )));
            }
        }
        if self.max_iterations == 0 {
            return Err(SVMError::invalid("max_iterations must be at least 1"));
        }
        if let Some(bias) = self.bias {
            if !(bias >= 0.0 && bias.is_finite()) {
                return Err(SVMError::invalid(format!(
                    "bias must be non-negative, got {bias}"
                )));
            }
        }
        for &(label, weight) in &self.class_weights {
            if !(weight > 0.0 && weight.is_finite()) {
                return Err(SVMError::invalid(format!(
                    "weight for label {label} must be positive, got {weight}"
                )));
            }
        }
        Ok(())
    }
}

/// How training went, one entry per trained weight vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSummary {
    pub iterations: Vec<usize>,
    pub converged: bool,
}
