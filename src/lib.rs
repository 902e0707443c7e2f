//! Linear Support Vector Machine classification in Rust
//!
//! Trains L2-regularized linear classifiers (hinge loss, squared hinge loss
//! or logistic regression) on sparse data by dual coordinate descent, after
//! "A Dual Coordinate Descent Method for Large-scale Linear SVM" by Hsieh
//! et al.

pub mod api;
pub mod core;
pub mod data;
pub mod evaluation;
pub mod model;
pub mod optimizer;
pub mod persistence;
pub mod solver;

// Re-export main types for convenience
pub use crate::api::{ClassifierOptions, LinearSVM, TrainOutcome};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{Result, SVMError};
pub use crate::data::Problem;
pub use crate::evaluation::{ClassificationMetrics, CrossValidation};
pub use crate::model::Model;
pub use crate::optimizer::LinearSolver;
pub use crate::persistence::{load_model, save_model};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
