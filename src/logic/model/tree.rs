//! Decision Tree - CART classifier with Gini impurity
//!
//! Nodes live in a flat arena and are built with an explicit work stack, so
//! deep trees on large tables cannot overflow the call stack.

use ndarray::{Array2, ArrayView1};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features examined per split (already resolved to a count)
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        /// Class probabilities, indexed by class
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_classes: usize,
}

struct Task {
    samples: Vec<usize>,
    depth: usize,
    slot: usize,
}

struct SplitChoice {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    /// Grow a tree on the rows `samples` of `x` (repeats allowed, as in a bootstrap draw)
    pub fn fit<R: Rng>(
        x: &Array2<f64>,
        y: &[usize],
        samples: Vec<usize>,
        n_classes: usize,
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let mut nodes = vec![Node::Leaf {
            distribution: vec![0.0; n_classes],
        }];
        let mut stack = vec![Task {
            samples,
            depth: 0,
            slot: 0,
        }];

        while let Some(task) = stack.pop() {
            let counts = class_counts(y, &task.samples, n_classes);
            let n = task.samples.len();

            let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
            let too_small = n < params.min_samples_split;
            let too_deep = params.max_depth.map_or(false, |d| task.depth >= d);

            if pure || too_small || too_deep {
                nodes[task.slot] = leaf(&counts);
                continue;
            }

            let Some(split) = best_split(x, y, &task.samples, n_classes, params.max_features, rng) else {
                nodes[task.slot] = leaf(&counts);
                continue;
            };

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = task
                .samples
                .iter()
                .partition(|&&s| x[[s, split.feature]] <= split.threshold);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { distribution: Vec::new() });
            nodes.push(Node::Leaf { distribution: Vec::new() });
            nodes[task.slot] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            stack.push(Task {
                samples: right_samples,
                depth: task.depth + 1,
                slot: right,
            });
            stack.push(Task {
                samples: left_samples,
                depth: task.depth + 1,
                slot: left,
            });
        }

        Self { nodes, n_classes }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Class distribution of the leaf reached by `row`
    pub fn predict_proba_row(&self, row: ArrayView1<f64>) -> &[f64] {
        let mut current = 0;
        loop {
            match &self.nodes[current] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    current = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

fn class_counts(y: &[usize], samples: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &s in samples {
        counts[y[s]] += 1;
    }
    counts
}

fn leaf(counts: &[usize]) -> Node {
    let total: usize = counts.iter().sum();
    let distribution = counts
        .iter()
        .map(|&c| if total > 0 { c as f64 / total as f64 } else { 0.0 })
        .collect();
    Node::Leaf { distribution }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

/// Lowest weighted Gini split over a random subset of features
fn best_split<R: Rng>(
    x: &Array2<f64>,
    y: &[usize],
    samples: &[usize],
    n_classes: usize,
    max_features: usize,
    rng: &mut R,
) -> Option<SplitChoice> {
    let n_features = x.ncols();
    let n = samples.len();
    let mut best: Option<SplitChoice> = None;
    let mut values: Vec<(f64, usize)> = Vec::with_capacity(n);

    for feature in index::sample(rng, n_features, max_features.clamp(1, n_features)).iter() {
        values.clear();
        values.extend(samples.iter().map(|&s| (x[[s, feature]], y[s])));
        values.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left = vec![0usize; n_classes];
        let mut right = class_counts(y, samples, n_classes);

        for i in 0..n - 1 {
            let (value, class) = values[i];
            left[class] += 1;
            right[class] -= 1;

            let next = values[i + 1].0;
            if value == next {
                continue;
            }

            let n_left = i + 1;
            let n_right = n - n_left;
            let impurity = (n_left as f64 * gini(&left, n_left)
                + n_right as f64 * gini(&right, n_right))
                / n as f64;

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let mut threshold = value + (next - value) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some(SplitChoice {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
    }

    best
}
