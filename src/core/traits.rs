//! Core traits for the linear SVM

use crate::core::{FeatureVector, Prediction};

/// Trained classifier mapping feature vectors to labels
pub trait Classifier: Send + Sync {
    /// Predict a single vector
    fn predict(&self, vector: &FeatureVector) -> Prediction;

    /// Predict multiple vectors, preserving order
    fn predict_batch(&self, vectors: &[FeatureVector]) -> Vec<Prediction> {
        vectors.iter().map(|v| self.predict(v)).collect()
    }

    /// Labels the classifier can emit, in model order
    fn labels(&self) -> &[i32];
}
