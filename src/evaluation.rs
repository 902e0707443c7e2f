//! Accuracy, per-label metrics and n-fold cross-validation

use crate::core::{Classifier, Result, SVMError, TrainingParams};
use crate::data::Problem;
use crate::optimizer::{align_bias, distinct_labels, LinearSolver};
use log::{debug, info, warn};

/// Percentage of positions where `predicted` matches `truth`
///
/// Empty input scores 0.
pub fn accuracy(truth: &[i32], predicted: &[i32]) -> Result<f64> {
    if truth.len() != predicted.len() {
        return Err(SVMError::invalid(format!(
            "got {} true labels but {} predictions",
            truth.len(),
            predicted.len()
        )));
    }
    if truth.is_empty() {
        return Ok(0.0);
    }

    let correct = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| t == p)
        .count();
    Ok(100.0 * correct as f64 / truth.len() as f64)
}

/// Counts for one label treated as the positive class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMetrics {
    pub label: i32,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl LabelMetrics {
    /// Calculate precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Calculate recall (sensitivity): TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Calculate F1 score: 2 * (precision * recall) / (precision + recall)
    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Accuracy plus per-label counts over a labelled set
#[derive(Debug, Clone)]
pub struct ClassificationMetrics {
    /// Percentage, as returned by [`accuracy`]
    pub accuracy: f64,
    pub total: usize,
    pub correct: usize,
    /// One entry per label seen in either list, ascending
    pub per_label: Vec<LabelMetrics>,
}

impl ClassificationMetrics {
    pub fn from_labels(truth: &[i32], predicted: &[i32]) -> Result<Self> {
        let accuracy = accuracy(truth, predicted)?;

        let mut labels: Vec<i32> = truth.iter().chain(predicted).copied().collect();
        labels.sort_unstable();
        labels.dedup();

        let per_label = labels
            .into_iter()
            .map(|label| {
                let mut metrics = LabelMetrics {
                    label,
                    true_positives: 0,
                    false_positives: 0,
                    false_negatives: 0,
                };
                for (&t, &p) in truth.iter().zip(predicted) {
                    match (t == label, p == label) {
                        (true, true) => metrics.true_positives += 1,
                        (false, true) => metrics.false_positives += 1,
                        (true, false) => metrics.false_negatives += 1,
                        (false, false) => {}
                    }
                }
                metrics
            })
            .collect();

        let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();

        Ok(Self {
            accuracy,
            total: truth.len(),
            correct,
            per_label,
        })
    }
}

/// Predict every example of `problem` and score against its labels
pub fn evaluate<C: Classifier>(classifier: &C, problem: &Problem) -> Result<ClassificationMetrics> {
    let predicted: Vec<i32> = classifier
        .predict_batch(problem.vectors())
        .into_iter()
        .map(|p| p.label)
        .collect();
    ClassificationMetrics::from_labels(problem.labels(), &predicted)
}

/// Held-out predictions in the original example order
#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidation {
    pub predictions: Vec<i32>,
    pub accuracy: f64,
    /// Folds actually used after clamping to the problem size
    pub folds: usize,
}

/// Contiguous fold ranges: fold `f` covers `[f*l/n, (f+1)*l/n)`
pub fn fold_bounds(len: usize, n_folds: usize) -> Vec<(usize, usize)> {
    (0..n_folds)
        .map(|f| (f * len / n_folds, (f + 1) * len / n_folds))
        .collect()
}

/// n-fold cross-validation with contiguous folds
pub fn cross_validate(
    problem: &Problem,
    params: &TrainingParams,
    n_folds: usize,
) -> Result<CrossValidation> {
    params.validate()?;
    if n_folds < 2 {
        return Err(SVMError::invalid(format!(
            "cross-validation needs at least 2 folds, got {n_folds}"
        )));
    }
    let problem = align_bias(problem, params.bias);
    let labels = distinct_labels(&problem);
    if labels.len() < 2 {
        return Err(SVMError::invalid(format!(
            "training needs at least 2 distinct labels, found {}",
            labels.len()
        )));
    }

    let len = problem.size();
    let n_folds = if n_folds > len {
        warn!("{n_folds} folds requested for {len} examples, using leave-one-out");
        len
    } else {
        n_folds
    };

    let solver = LinearSolver::new(params.clone());
    let mut predictions = vec![0; len];

    for (fold, (start, end)) in fold_bounds(len, n_folds).into_iter().enumerate() {
        let train_indices: Vec<usize> = (0..start).chain(end..len).collect();
        let train = problem.subset(&train_indices);
        debug!("fold {fold}: holding out examples {start}..{end}");

        let fold_labels = distinct_labels(&train);
        if let [only] = fold_labels.as_slice() {
            warn!("fold {fold} trains on the single label {only}, predicting it for held-out examples");
            predictions[start..end].fill(*only);
            continue;
        }

        let model = solver.train(&train)?;
        for i in start..end {
            predictions[i] = model.predict(problem.vector_at(i)).label;
        }
    }

    let accuracy = accuracy(problem.labels(), &predictions)?;
    if !params.quiet {
        info!("cross validation accuracy = {accuracy}%");
    }

    Ok(CrossValidation {
        predictions,
        accuracy,
        folds: n_folds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FeatureVector;
    use approx::assert_relative_eq;

    fn line_problem() -> Problem {
        [(-3.0, -1), (1.0, 1), (-2.0, -1), (2.0, 1), (-1.0, -1), (3.0, 1)]
            .iter()
            .map(|&(x, y)| (y, FeatureVector::new(vec![(1, x)]).unwrap()))
            .collect()
    }

    fn quiet_params() -> TrainingParams {
        TrainingParams {
            quiet: true,
            ..TrainingParams::default()
        }
    }

    #[test]
    fn test_accuracy_basic() {
        let acc = accuracy(&[1, 1, 0], &[1, 0, 0]).unwrap();
        assert_relative_eq!(acc, 200.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_accuracy_empty_is_zero() {
        assert_eq!(accuracy(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_accuracy_length_mismatch() {
        let result = accuracy(&[1, 2], &[1]);
        assert!(matches!(result, Err(SVMError::InvalidInput(_))));
    }

    #[test]
    fn test_accuracy_permutation_invariant() {
        let truth = [1, 2, 3, 1, 2];
        let predicted = [1, 3, 3, 2, 2];
        let order = [4, 0, 3, 1, 2];

        let permuted_truth: Vec<i32> = order.iter().map(|&i| truth[i]).collect();
        let permuted_pred: Vec<i32> = order.iter().map(|&i| predicted[i]).collect();

        assert_eq!(
            accuracy(&truth, &predicted).unwrap(),
            accuracy(&permuted_truth, &permuted_pred).unwrap()
        );
    }

    #[test]
    fn test_classification_metrics() {
        let metrics = ClassificationMetrics::from_labels(&[1, 1, 2, 3], &[1, 2, 2, 2]).unwrap();

        assert_eq!(metrics.total, 4);
        assert_eq!(metrics.correct, 2);
        assert_eq!(metrics.per_label.len(), 3);

        let two = &metrics.per_label[1];
        assert_eq!(two.label, 2);
        assert_eq!(two.true_positives, 1);
        assert_eq!(two.false_positives, 2);
        assert_eq!(two.false_negatives, 0);
        assert_relative_eq!(two.precision(), 1.0 / 3.0);
        assert_eq!(two.recall(), 1.0);

        let three = &metrics.per_label[2];
        assert_eq!(three.precision(), 0.0);
        assert_eq!(three.f1_score(), 0.0);
    }

    #[test]
    fn test_fold_bounds_cover_everything() {
        let bounds = fold_bounds(10, 3);
        assert_eq!(bounds, vec![(0, 3), (3, 6), (6, 10)]);

        let loo = fold_bounds(4, 4);
        assert_eq!(loo, vec![(0, 1), (1, 2), (2, 3), (3, 4)]);
    }

    #[test]
    fn test_cross_validation_leave_one_out() {
        let problem = line_problem();
        let cv = cross_validate(&problem, &quiet_params(), problem.size()).unwrap();

        assert_eq!(cv.folds, 6);
        assert_eq!(cv.predictions.len(), problem.size());
        assert_eq!(cv.predictions, problem.labels());
        assert_eq!(cv.accuracy, 100.0);
    }

    #[test]
    fn test_cross_validation_clamps_folds() {
        let problem = line_problem();
        let cv = cross_validate(&problem, &quiet_params(), 50).unwrap();
        assert_eq!(cv.folds, problem.size());
    }

    #[test]
    fn test_cross_validation_rejects_one_fold() {
        let problem = line_problem();
        let result = cross_validate(&problem, &quiet_params(), 1);
        assert!(matches!(result, Err(SVMError::InvalidInput(_))));
    }

    #[test]
    fn test_cross_validation_single_label_fold() {
        // the first fold holds every -1 example, so its training split is all +1
        let problem: Problem = [(-1.0, -1), (-2.0, -1), (1.0, 1), (2.0, 1)]
            .iter()
            .map(|&(x, y)| (y, FeatureVector::new(vec![(1, x)]).unwrap()))
            .collect();
        let cv = cross_validate(&problem, &quiet_params(), 2).unwrap();

        assert_eq!(cv.predictions, vec![1, 1, -1, -1]);
        assert_eq!(cv.accuracy, 0.0);
    }
}
