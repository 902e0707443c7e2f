//! Integration tests for the linsvm library
//!
//! These tests verify end-to-end functionality across multiple modules
//! and validate real-world usage scenarios.

use approx::assert_abs_diff_eq;
use linsvm::api::{quick, ClassifierOptions, LinearSVM, TrainOutcome};
use linsvm::data::{read_problem, read_problem_file, Problem};
use linsvm::evaluation;
use linsvm::persistence::{load_model, save_model};
use linsvm::{Classifier, FeatureVector, SVMError, SolverType};
use std::io::{Cursor, Write};
use tempfile::{NamedTempFile, TempDir};

fn separable_file() -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");

    // Classic linearly separable dataset
    writeln!(temp_file, "+1 1:2.0 2:1.0").expect("Failed to write");
    writeln!(temp_file, "+1 1:1.8 2:1.1").expect("Failed to write");
    writeln!(temp_file, "+1 1:2.2 2:0.9").expect("Failed to write");
    writeln!(temp_file, "-1 1:-2.0 2:-1.0").expect("Failed to write");
    writeln!(temp_file, "-1 1:-1.8 2:-1.1").expect("Failed to write");
    writeln!(temp_file, "-1 1:-2.2 2:-0.9").expect("Failed to write");
    temp_file.flush().expect("Failed to flush");
    temp_file
}

/// Three clusters on the axes of the plane plus one at the origin's opposite corner
fn three_class_problem() -> Problem {
    let data = "\
1 1:3.0 2:0.1
1 1:2.5 2:-0.2
1 1:3.2 2:0.3
2 1:0.1 2:3.0
2 1:-0.2 2:2.6
2 1:0.2 2:3.1
3 1:-3.0 2:-3.0
3 1:-2.7 2:-3.2
3 1:-3.1 2:-2.8
";
    read_problem(Cursor::new(data)).expect("Failed to parse problem")
}

/// Test complete workflow: data loading -> training -> evaluation
#[test]
fn test_complete_workflow_libsvm() {
    let temp_file = separable_file();

    let model = LinearSVM::new()
        .with_c(1.0)
        .with_epsilon(0.001)
        .with_max_iterations(1000)
        .quiet(true)
        .train_from_file(temp_file.path())
        .expect("Training should succeed");

    assert_eq!(model.labels(), &[-1, 1]);
    assert_eq!(model.n_features(), 2);
    assert_eq!(model.weights().len(), 1);

    let problem = read_problem_file(temp_file.path()).expect("Failed to load problem");
    let metrics = evaluation::evaluate(&model, &problem).expect("Evaluation should succeed");
    assert_eq!(metrics.accuracy, 100.0);
    assert_eq!(metrics.correct, 6);
    for label in &metrics.per_label {
        assert_eq!(label.f1_score(), 1.0);
    }

    let summary = model.summary().expect("Trained models carry a summary");
    assert!(summary.converged);
}

#[test]
fn test_every_solver_separates_the_data() {
    let temp_file = separable_file();
    let problem = read_problem_file(temp_file.path()).expect("Failed to load problem");

    for solver in SolverType::ALL {
        let model = LinearSVM::new()
            .with_solver(solver)
            .with_bias(1.0)
            .quiet(true)
            .train(&problem)
            .expect("Training should succeed");

        let accuracy = evaluation::evaluate(&model, &problem)
            .expect("Evaluation should succeed")
            .accuracy;
        assert_eq!(accuracy, 100.0, "{solver} misclassified training data");
        assert_eq!(model.weights()[0].len(), 3);
    }
}

#[test]
fn test_multiclass_one_vs_rest() {
    let problem = three_class_problem();
    let model = LinearSVM::new()
        .with_c(10.0)
        .with_epsilon(0.01)
        .with_bias(1.0)
        .quiet(true)
        .train(&problem)
        .expect("Training should succeed");

    assert_eq!(model.nr_class(), 3);
    assert_eq!(model.weights().len(), 3);

    let predictions = model.predict_batch(problem.vectors());
    let labels: Vec<i32> = predictions.iter().map(|p| p.label).collect();
    assert_eq!(labels, problem.labels());
    assert!(predictions.iter().all(|p| p.decision_values.len() == 3));

    let far_axis = FeatureVector::new(vec![(1, 0.0), (2, 10.0)]).unwrap();
    assert_eq!(model.predict(&far_axis).label, 2);
}

#[test]
fn test_multiclass_probabilities_sum_to_one() {
    let problem = three_class_problem();
    let model = LinearSVM::new()
        .with_solver(SolverType::L2rLr)
        .with_c(10.0)
        .with_epsilon(0.01)
        .with_bias(1.0)
        .quiet(true)
        .train(&problem)
        .expect("Training should succeed");

    for vector in problem.vectors() {
        let prediction = model.predict_probability(vector).expect("Logistic model");
        let probabilities = prediction.probabilities.expect("Probabilities requested");
        assert_eq!(probabilities.len(), 3);
        assert_abs_diff_eq!(probabilities.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_model_round_trip_both_formats() {
    let problem = three_class_problem();
    let model = LinearSVM::new()
        .with_bias(1.0)
        .quiet(true)
        .train(&problem)
        .expect("Training should succeed");

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    for name in ["model.txt", "model.json"] {
        let path = temp_dir.path().join(name);
        save_model(&model, &path).expect("Saving should succeed");
        let loaded = load_model(&path).expect("Loading should succeed");

        assert_eq!(loaded, model, "{name} did not round-trip");
        for vector in problem.vectors() {
            assert_eq!(loaded.predict(vector), model.predict(vector));
        }
    }
}

#[test]
fn test_option_string_training() {
    let problem = three_class_problem();
    let options: ClassifierOptions = "-s 3 -c 5 -B 1 -q".parse().unwrap();

    let pairs = problem
        .iter()
        .map(|(label, vector)| (label, vector.clone()))
        .collect::<Vec<_>>();

    match linsvm::api::train(pairs, &options).expect("Training should succeed") {
        TrainOutcome::Model(model) => {
            assert_eq!(model.solver_type(), SolverType::L2rL1LossSvcDual);
            assert_eq!(model.bias(), Some(1.0));
            assert_eq!(model.cost(), 5.0);
        }
        other => panic!("expected a model, got {other:?}"),
    }
}

#[test]
fn test_cross_validation_on_separable_data() {
    let temp_file = separable_file();
    let problem = read_problem_file(temp_file.path()).expect("Failed to load problem");

    let cv = LinearSVM::new()
        .quiet(true)
        .cross_validate(&problem, 3)
        .expect("Cross-validation should succeed");

    assert_eq!(cv.folds, 3);
    assert_eq!(cv.predictions.len(), problem.len());
    assert!(cv.accuracy >= 0.0 && cv.accuracy <= 100.0);
}

#[test]
fn test_quick_evaluate_split() {
    let temp_file = separable_file();
    let accuracy = quick::evaluate_split(temp_file.path(), temp_file.path())
        .expect("Evaluation should succeed");
    assert_eq!(accuracy, 100.0);
}

#[test]
fn test_error_handling() {
    // Nonexistent file
    let result = LinearSVM::new().train_from_file("/nonexistent/file.libsvm");
    assert!(matches!(result, Err(SVMError::IoError(_))));

    // Malformed line reports its position
    let result = read_problem(Cursor::new("+1 1:1.0\n+1 2:abc\n"));
    assert!(matches!(result, Err(SVMError::ParseError { line: 2, .. })));

    // A single label cannot be trained
    let problem = read_problem(Cursor::new("+1 1:1.0\n+1 1:2.0\n")).unwrap();
    let result = LinearSVM::new().quiet(true).train(&problem);
    assert!(matches!(result, Err(SVMError::InvalidInput(_))));

    // Bad hyperparameters
    let problem = read_problem(Cursor::new("+1 1:1.0\n-1 1:-1.0\n")).unwrap();
    let result = LinearSVM::new().with_c(0.0).train(&problem);
    assert!(matches!(result, Err(SVMError::InvalidInput(_))));
}

#[test]
fn test_prediction_ignores_unseen_features() {
    let temp_file = separable_file();
    let model = quick::train_file(temp_file.path()).expect("Training should succeed");

    let base = FeatureVector::new(vec![(1, 1.0), (2, 0.5)]).unwrap();
    let extended = FeatureVector::new(vec![(1, 1.0), (2, 0.5), (40, 100.0)]).unwrap();
    assert_eq!(model.decision_values(&base), model.decision_values(&extended));
}

#[test]
fn test_overlapping_imbalanced_data_beats_majority_baseline() {
    // 7 negatives, 3 positives; one point of each class sits on the wrong side
    let data = "\
-1 1:-3.0
-1 1:-2.5
-1 1:-2.0
-1 1:-1.5
-1 1:-1.0
-1 1:-0.5
-1 1:2.5
+1 1:-1.0
+1 1:2.0
+1 1:3.0
";
    let problem = read_problem(Cursor::new(data)).expect("Failed to parse problem");
    let majority = 100.0 * 7.0 / 10.0;

    for solver in SolverType::ALL {
        let model = LinearSVM::new()
            .with_solver(solver)
            .with_bias(1.0)
            .quiet(true)
            .train(&problem)
            .expect("Training should succeed");

        let accuracy = evaluation::evaluate(&model, &problem)
            .expect("Evaluation should succeed")
            .accuracy;
        assert!(
            accuracy >= majority,
            "{solver} scored {accuracy}% below the {majority}% majority baseline"
        );
    }
}
