//! Training set of labelled sparse vectors with optional bias feature

use crate::core::{FeatureVector, Result, SVMError};

/// Ordered collection of `(label, vector)` training examples
///
/// When a bias is active every stored vector carries one extra entry at
/// index `n_features() + 1` holding the bias value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Problem {
    labels: Vec<i32>,
    vectors: Vec<FeatureVector>,
    n_features: usize,
    bias: Option<f64>,
}

impl Problem {
    /// Create an empty problem without bias
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a problem from parallel label and vector lists
    pub fn from_parts(labels: Vec<i32>, vectors: Vec<FeatureVector>) -> Result<Self> {
        if labels.len() != vectors.len() {
            return Err(SVMError::invalid(format!(
                "got {} labels but {} vectors",
                labels.len(),
                vectors.len()
            )));
        }
        Ok(labels.into_iter().zip(vectors).collect())
    }

    /// Append one example
    pub fn add(&mut self, label: i32, mut vector: FeatureVector) {
        let max_index = vector.max_index().unwrap_or(0);
        if max_index > self.n_features {
            match self.bias {
                Some(bias) => {
                    self.strip_bias();
                    self.n_features = max_index;
                    self.append_bias(bias);
                }
                None => self.n_features = max_index,
            }
        }
        if let Some(bias) = self.bias {
            vector.push_last(self.n_features + 1, bias);
        }
        self.labels.push(label);
        self.vectors.push(vector);
    }

    /// Set the bias feature value; a negative value removes it
    ///
    /// Removing an absent bias is a no-op.
    pub fn set_bias(&mut self, bias: f64) {
        self.strip_bias();
        if bias >= 0.0 {
            self.append_bias(bias);
        }
    }

    fn strip_bias(&mut self) {
        if self.bias.take().is_some() {
            let index = self.n_features + 1;
            for vector in &mut self.vectors {
                vector.remove_last_at(index);
            }
        }
    }

    fn append_bias(&mut self, bias: f64) {
        let index = self.n_features + 1;
        for vector in &mut self.vectors {
            vector.push_last(index, bias);
        }
        self.bias = Some(bias);
    }

    /// Active bias value
    pub fn bias(&self) -> Option<f64> {
        self.bias
    }

    /// Number of examples
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label of example `i`
    ///
    /// # Panics
    /// Panics if `i >= size()`
    pub fn label_at(&self, i: usize) -> i32 {
        self.labels[i]
    }

    /// Vector of example `i`, including the bias entry when active
    ///
    /// # Panics
    /// Panics if `i >= size()`
    pub fn vector_at(&self, i: usize) -> &FeatureVector {
        &self.vectors[i]
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn vectors(&self) -> &[FeatureVector] {
        &self.vectors
    }

    /// Largest feature index over all examples, bias excluded
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Length of a weight vector for this problem, bias included
    pub fn dimension(&self) -> usize {
        self.n_features + usize::from(self.bias.is_some())
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &FeatureVector)> + '_ {
        self.labels.iter().copied().zip(self.vectors.iter())
    }

    /// Copy of the selected examples sharing this problem's feature universe and bias
    ///
    /// # Panics
    /// Panics if any index is out of range
    pub fn subset(&self, indices: &[usize]) -> Problem {
        Problem {
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            vectors: indices.iter().map(|&i| self.vectors[i].clone()).collect(),
            n_features: self.n_features,
            bias: self.bias,
        }
    }
}

impl FromIterator<(i32, FeatureVector)> for Problem {
    fn from_iter<T: IntoIterator<Item = (i32, FeatureVector)>>(iter: T) -> Self {
        let mut problem = Problem::new();
        for (label, vector) in iter {
            problem.add(label, vector);
        }
        problem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(pairs: &[(usize, f64)]) -> FeatureVector {
        FeatureVector::new(pairs.to_vec()).unwrap()
    }

    fn sample_problem() -> Problem {
        Problem::from_parts(
            vec![1, -1, 1],
            vec![
                fv(&[(1, 0.5), (3, 1.0)]),
                fv(&[(2, 2.0)]),
                FeatureVector::empty(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_parts_mismatch() {
        let result = Problem::from_parts(vec![1, 2], vec![FeatureVector::empty()]);
        assert!(matches!(result, Err(SVMError::InvalidInput(_))));
    }

    #[test]
    fn test_accessors() {
        let problem = sample_problem();

        assert_eq!(problem.size(), 3);
        assert_eq!(problem.n_features(), 3);
        assert_eq!(problem.dimension(), 3);
        assert_eq!(problem.label_at(1), -1);
        assert_eq!(problem.vector_at(1).get(2), 2.0);
        assert_eq!(problem.bias(), None);
    }

    #[test]
    fn test_set_bias_appends_last_feature() {
        let mut problem = sample_problem();
        problem.set_bias(5.0);

        assert_eq!(problem.dimension(), 4);
        for vector in problem.vectors() {
            assert_eq!(vector.max_index(), Some(4));
            assert_eq!(vector.get(4), 5.0);
        }
        assert_eq!(problem.vector_at(2).nnz(), 1);
    }

    #[test]
    fn test_set_bias_replaces_value() {
        let mut problem = sample_problem();
        problem.set_bias(5.0);
        problem.set_bias(1.0);

        for vector in problem.vectors() {
            assert_eq!(vector.get(4), 1.0);
        }
        assert_eq!(problem.vector_at(0).nnz(), 3);
    }

    #[test]
    fn test_remove_bias_is_idempotent() {
        let original = sample_problem();
        let mut problem = original.clone();

        problem.set_bias(5.0);
        problem.set_bias(-1.0);
        assert_eq!(problem, original);

        problem.set_bias(-1.0);
        assert_eq!(problem, original);
    }

    #[test]
    fn test_add_with_larger_index_moves_bias() {
        let mut problem = sample_problem();
        problem.set_bias(2.0);
        problem.add(-1, fv(&[(6, 1.0)]));

        assert_eq!(problem.n_features(), 6);
        for vector in problem.vectors() {
            assert_eq!(vector.max_index(), Some(7));
            assert_eq!(vector.get(7), 2.0);
            assert_eq!(vector.get(4), 0.0);
        }
    }

    #[test]
    fn test_subset_keeps_universe() {
        let mut problem = sample_problem();
        problem.set_bias(1.0);
        let sub = problem.subset(&[2, 0]);

        assert_eq!(sub.labels(), &[1, 1]);
        assert_eq!(sub.n_features(), 3);
        assert_eq!(sub.bias(), Some(1.0));
        assert_eq!(sub.vector_at(1), problem.vector_at(0));
    }
}
