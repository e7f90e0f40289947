//! Random Forest - bootstrap-aggregated decision trees
//!
//! Tree `i` draws its bootstrap sample and feature subsets from its own RNG,
//! seeded from the forest seed and `i`. Trees can therefore be grown in any
//! order (or in parallel) and the fitted forest is identical for a given seed.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::logic::error::{ModelingError, PipelineResult};

use super::cv::Deadline;
use super::tree::{DecisionTree, TreeParams};

/// Features examined per split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    All,
    Fixed(usize),
}

impl MaxFeatures {
    pub fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Fixed(k) => k.min(n_features),
        };
        n.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
    n_features: usize,
}

/// Per-tree seed: spread consecutive indices across the seed space
fn tree_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

impl RandomForest {
    /// Fit on all rows of `x`. `y` holds class indices below `n_classes`.
    pub fn fit(
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        params: &ForestParams,
        deadline: Option<&Deadline>,
    ) -> PipelineResult<Self> {
        let n = x.nrows();
        if n == 0 {
            return Err(ModelingError::EmptyTrainingSet.into());
        }
        if params.n_estimators == 0 {
            return Err(ModelingError::InvalidConfig("n_estimators must be at least 1".into()).into());
        }

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            max_features: params.max_features.resolve(x.ncols()),
        };

        let trees = (0..params.n_estimators)
            .into_par_iter()
            .map(|i| {
                if let Some(d) = deadline {
                    d.check()?;
                }
                let mut rng = StdRng::seed_from_u64(tree_seed(params.seed, i));
                let samples: Vec<usize> = if params.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                Ok(DecisionTree::fit(x, y, samples, n_classes, &tree_params, &mut rng))
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        Ok(Self {
            trees,
            n_classes,
            n_features: x.ncols(),
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Mean class distribution across trees (rows x classes)
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut proba = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        for (r, row) in x.rows().into_iter().enumerate() {
            for tree in &self.trees {
                for (c, p) in tree.predict_proba_row(row).iter().enumerate() {
                    proba[[r, c]] += p;
                }
            }
        }
        if !self.trees.is_empty() {
            proba /= self.trees.len() as f64;
        }
        proba
    }

    /// Most probable class index per row; ties go to the lower index
    pub fn predict(&self, x: &Array2<f64>) -> Vec<usize> {
        self.predict_proba(x)
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (c, &p)| if p > best.1 { (c, p) } else { best })
                    .0
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params(seed: u64) -> ForestParams {
        ForestParams {
            n_estimators: 15,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed,
        }
    }

    fn toy() -> (Array2<f64>, Vec<usize>) {
        let x = array![
            [0.1, 5.0], [0.2, 4.0], [0.3, 6.0], [0.4, 5.5],
            [5.1, 1.0], [5.2, 0.5], [5.3, 1.5], [5.4, 0.2],
            [9.1, 9.0], [9.2, 9.5], [9.3, 8.5], [9.4, 9.2],
        ];
        let y = vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2];
        (x, y)
    }

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::Sqrt.resolve(49), 7);
        assert_eq!(MaxFeatures::Log2.resolve(8), 3);
        assert_eq!(MaxFeatures::All.resolve(5), 5);
        assert_eq!(MaxFeatures::Fixed(10).resolve(4), 4);
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
    }

    #[test]
    fn test_forest_learns_multiclass() {
        let (x, y) = toy();
        let forest = RandomForest::fit(&x, &y, 3, &params(42), None).unwrap();
        assert_eq!(forest.n_trees(), 15);

        let predicted = forest.predict(&x);
        let correct = predicted.iter().zip(&y).filter(|(p, t)| p == t).count();
        assert!(correct >= 11, "only {} of 12 correct", correct);
    }

    #[test]
    fn test_forest_is_deterministic() {
        let (x, y) = toy();
        let a = RandomForest::fit(&x, &y, 3, &params(7), None).unwrap();
        let b = RandomForest::fit(&x, &y, 3, &params(7), None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.predict_proba(&x), b.predict_proba(&x));
    }

    #[test]
    fn test_proba_rows_sum_to_one() {
        let (x, y) = toy();
        let forest = RandomForest::fit(&x, &y, 3, &params(1), None).unwrap();
        for row in forest.predict_proba(&x).rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        let x = Array2::<f64>::zeros((0, 2));
        let err = RandomForest::fit(&x, &[], 2, &params(1), None).unwrap_err();
        assert_eq!(err.kind(), "ModelingError");
    }
}
