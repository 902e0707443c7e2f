//! Trained linear model
//!
//! A `Model` owns its weight vectors and never refers back to the training
//! data. Binary models hold one weight vector whose positive side is the
//! larger label; models with more labels hold one vector per label.

use crate::core::{
    Classifier, FeatureVector, Prediction, Result, SVMError, SolverType, TrainingSummary,
};

#[derive(Debug, Clone)]
pub struct Model {
    solver_type: SolverType,
    labels: Vec<i32>,
    n_features: usize,
    bias: Option<f64>,
    cost: f64,
    weights: Vec<Vec<f64>>,
    summary: Option<TrainingSummary>,
}

impl Model {
    /// Assemble a model, checking that the weight layout matches the labels
    pub fn new(
        solver_type: SolverType,
        labels: Vec<i32>,
        n_features: usize,
        bias: Option<f64>,
        cost: f64,
        weights: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if labels.len() < 2 {
            return Err(SVMError::invalid(format!(
                "a model needs at least 2 labels, got {}",
                labels.len()
            )));
        }
        if labels.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(SVMError::invalid(format!(
                "model labels must be distinct and ascending, got {labels:?}"
            )));
        }

        let expected_rows = if labels.len() == 2 { 1 } else { labels.len() };
        if weights.len() != expected_rows {
            return Err(SVMError::invalid(format!(
                "expected {expected_rows} weight vectors for {} labels, got {}",
                labels.len(),
                weights.len()
            )));
        }
        let dimension = n_features + usize::from(bias.is_some());
        if let Some(row) = weights.iter().find(|w| w.len() != dimension) {
            return Err(SVMError::invalid(format!(
                "weight vector has length {}, expected {dimension}",
                row.len()
            )));
        }

        Ok(Self {
            solver_type,
            labels,
            n_features,
            bias,
            cost,
            weights,
            summary: None,
        })
    }

    pub(crate) fn with_summary(mut self, summary: TrainingSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn solver_type(&self) -> SolverType {
        self.solver_type
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn nr_class(&self) -> usize {
        self.labels.len()
    }

    /// Feature universe size seen in training, bias excluded
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn bias(&self) -> Option<f64> {
        self.bias
    }

    /// Regularization parameter the model was trained with
    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    /// Convergence report; `None` for models loaded from disk
    pub fn summary(&self) -> Option<&TrainingSummary> {
        self.summary.as_ref()
    }

    pub fn is_probability_model(&self) -> bool {
        self.solver_type.is_logistic()
    }

    /// Raw score per weight vector
    ///
    /// Indices above `n_features()` are ignored, so a vector that already
    /// carries a bias entry scores the same as the raw vector.
    pub fn decision_values(&self, vector: &FeatureVector) -> Vec<f64> {
        self.weights
            .iter()
            .map(|w| {
                let mut value = vector.dot(&w[..self.n_features]);
                if let Some(bias) = self.bias {
                    value += w[self.n_features] * bias;
                }
                value
            })
            .collect()
    }

    /// Label with the highest score; ties go to the lowest label
    pub fn predict(&self, vector: &FeatureVector) -> Prediction {
        let decision_values = self.decision_values(vector);
        let label = self.label_for(&decision_values);
        Prediction::new(label, decision_values)
    }

    /// Predict with per-label probability estimates
    ///
    /// Only logistic regression models support this.
    pub fn predict_probability(&self, vector: &FeatureVector) -> Result<Prediction> {
        if !self.is_probability_model() {
            return Err(SVMError::UnsupportedOperation(format!(
                "probability output is only supported for logistic regression, model uses {}",
                self.solver_type
            )));
        }

        let prediction = self.predict(vector);
        let probabilities = match prediction.decision_values.as_slice() {
            [dec] => {
                let p = sigmoid(*dec);
                vec![1.0 - p, p]
            }
            many => {
                let raw: Vec<f64> = many.iter().map(|&d| sigmoid(d)).collect();
                let total: f64 = raw.iter().sum();
                raw.into_iter().map(|p| p / total).collect()
            }
        };
        Ok(prediction.with_probabilities(probabilities))
    }

    fn label_for(&self, decision_values: &[f64]) -> i32 {
        if let [dec] = decision_values {
            return if *dec > 0.0 {
                self.labels[1]
            } else {
                self.labels[0]
            };
        }

        let mut best = 0;
        for (k, &value) in decision_values.iter().enumerate().skip(1) {
            if value > decision_values[best] {
                best = k;
            }
        }
        self.labels[best]
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Models compare equal on everything that gets persisted
impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.solver_type == other.solver_type
            && self.labels == other.labels
            && self.n_features == other.n_features
            && self.bias == other.bias
            && self.cost == other.cost
            && self.weights == other.weights
    }
}

impl Classifier for Model {
    fn predict(&self, vector: &FeatureVector) -> Prediction {
        Model::predict(self, vector)
    }

    fn labels(&self) -> &[i32] {
        &self.labels
    }
}
