//! k-fold Cross-Validation
//!
//! Folds come from a seeded shuffle, so the same (n, k, seed) always yields
//! the same assignment. Fold models share nothing mutable and are fitted on
//! the current rayon pool; the mean is taken only after every fold returned.

use std::time::{Duration, Instant};

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::logic::error::{ModelingError, PipelineError, PipelineResult};

use super::forest::{ForestParams, RandomForest};

/// Caller-imposed time limit
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    limit: Duration,
}

impl Deadline {
    /// Deadline `limit` from now
    pub fn after(limit: Duration) -> Self {
        Self {
            at: Instant::now() + limit,
            limit,
        }
    }

    pub fn check(&self) -> PipelineResult<()> {
        if Instant::now() >= self.at {
            return Err(PipelineError::Timeout { limit: self.limit });
        }
        Ok(())
    }
}

/// Per-fold accuracy scores and their mean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidation {
    pub folds: usize,
    pub fold_scores: Vec<f64>,
    pub mean: f64,
}

impl CrossValidation {
    pub fn from_scores(fold_scores: Vec<f64>) -> Self {
        let mean = if fold_scores.is_empty() {
            f64::NAN
        } else {
            fold_scores.iter().sum::<f64>() / fold_scores.len() as f64
        };
        Self {
            folds: fold_scores.len(),
            fold_scores,
            mean,
        }
    }

    pub fn std_dev(&self) -> f64 {
        if self.fold_scores.is_empty() {
            return f64::NAN;
        }
        let n = self.fold_scores.len() as f64;
        let variance = self
            .fold_scores
            .iter()
            .map(|s| (s - self.mean).powi(2))
            .sum::<f64>()
            / n;
        variance.sqrt()
    }
}

/// Split `0..n` into `k` disjoint folds of size `n / k` or `n / k + 1`.
///
/// Each fold's indices are sorted ascending.
pub fn kfold_indices(n: usize, k: usize, seed: u64) -> Result<Vec<Vec<usize>>, ModelingError> {
    if k < 2 || k > n {
        return Err(ModelingError::InvalidFolds { folds: k, samples: n });
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let base = n / k;
    let extra = n % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for f in 0..k {
        let size = base + usize::from(f < extra);
        let mut fold = order[start..start + size].to_vec();
        fold.sort_unstable();
        folds.push(fold);
        start += size;
    }
    Ok(folds)
}

/// Score `k` fold models, each trained without its fold and tested on it
pub fn cross_validate(
    x: &Array2<f64>,
    y: &[usize],
    n_classes: usize,
    params: &ForestParams,
    k: usize,
    deadline: Option<&Deadline>,
) -> PipelineResult<CrossValidation> {
    let folds = kfold_indices(x.nrows(), k, params.seed)?;

    let scores = folds
        .par_iter()
        .enumerate()
        .map(|(f, test)| {
            if let Some(d) = deadline {
                d.check()?;
            }

            let mut in_test = vec![false; x.nrows()];
            for &i in test {
                in_test[i] = true;
            }
            let train: Vec<usize> = (0..x.nrows()).filter(|&i| !in_test[i]).collect();

            let x_train = x.select(Axis(0), &train);
            let y_train: Vec<usize> = train.iter().map(|&i| y[i]).collect();
            let x_test = x.select(Axis(0), test);

            let model = RandomForest::fit(&x_train, &y_train, n_classes, params, deadline)?;
            let predicted = model.predict(&x_test);
            let correct = predicted
                .iter()
                .zip(test)
                .filter(|&(p, &i)| *p == y[i])
                .count();
            let score = correct as f64 / test.len() as f64;

            log::debug!("Fold {}/{}: accuracy {:.4}", f + 1, k, score);
            Ok(score)
        })
        .collect::<PipelineResult<Vec<f64>>>()?;

    Ok(CrossValidation::from_scores(scores))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kfold_partitions_all_indices() {
        let folds = kfold_indices(23, 5, 42).unwrap();
        assert_eq!(folds.len(), 5);

        let sizes: Vec<usize> = folds.iter().map(|f| f.len()).collect();
        assert_eq!(sizes, vec![5, 5, 5, 4, 4]);

        let mut all: Vec<usize> = folds.concat();
        all.sort_unstable();
        assert_eq!(all, (0..23).collect::<Vec<_>>());
    }

    #[test]
    fn test_kfold_deterministic_per_seed() {
        assert_eq!(kfold_indices(50, 5, 42).unwrap(), kfold_indices(50, 5, 42).unwrap());
        assert_ne!(kfold_indices(50, 5, 42).unwrap(), kfold_indices(50, 5, 43).unwrap());
    }

    #[test]
    fn test_kfold_rejects_bad_k() {
        assert_eq!(
            kfold_indices(10, 1, 0),
            Err(ModelingError::InvalidFolds { folds: 1, samples: 10 })
        );
        assert!(kfold_indices(3, 4, 0).is_err());
        assert!(kfold_indices(4, 4, 0).is_ok());
    }

    #[test]
    fn test_mean_is_mean_of_scores() {
        for scores in [vec![0.5, 1.0], vec![0.9, 0.8, 0.7, 1.0, 0.6], vec![0.25; 7]] {
            let expected = scores.iter().sum::<f64>() / scores.len() as f64;
            let cv = CrossValidation::from_scores(scores);
            assert!((cv.mean - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_expired_deadline_times_out() {
        let deadline = Deadline::after(Duration::ZERO);
        let err = deadline.check().unwrap_err();
        assert_eq!(err.kind(), "TimeoutError");
    }
}
