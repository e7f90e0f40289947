//! Evaluation Metrics
//!
//! Accuracy, confusion matrix and per-class precision / recall / F1.
//! Label sets are the sorted union of true and predicted labels.
//! A ratio with a zero denominator is reported as 0.0.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Share of positions where `truth` and `predicted` agree (0.0 for empty input)
pub fn accuracy<T: PartialEq>(truth: &[T], predicted: &[T]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f64 / truth.len() as f64
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Rows are true classes, columns predicted classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn from_predictions(truth: &[String], predicted: &[String]) -> Self {
        let mut labels: Vec<String> = truth.iter().chain(predicted).cloned().collect();
        labels.sort();
        labels.dedup();

        let position: HashMap<&str, usize> = labels.iter().enumerate().map(|(i, l)| (l.as_str(), i)).collect();

        let mut counts = vec![vec![0; labels.len()]; labels.len()];
        for (t, p) in truth.iter().zip(predicted) {
            counts[position[t.as_str()]][position[p.as_str()]] += 1;
        }

        Self { labels, counts }
    }

    /// Sum of all cells (equals the number of evaluated rows)
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn get(&self, truth: &str, predicted: &str) -> Option<usize> {
        let t = self.labels.iter().position(|l| l == truth)?;
        let p = self.labels.iter().position(|l| l == predicted)?;
        Some(self.counts[t][p])
    }

    /// Precision, recall, F1 and support per label
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        let n = self.labels.len();
        (0..n)
            .map(|i| {
                let tp = self.counts[i][i];
                let support: usize = self.counts[i].iter().sum();
                let predicted: usize = (0..n).map(|r| self.counts[r][i]).sum();

                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                ClassMetrics {
                    label: self.labels[i].clone(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-class breakdown with macro and support-weighted averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub macro_avg: AveragedMetrics,
    pub weighted_avg: AveragedMetrics,
}

impl ClassificationReport {
    pub fn from_confusion(matrix: &ConfusionMatrix) -> Self {
        let classes = matrix.class_metrics();
        let n = classes.len().max(1) as f64;
        let total: usize = classes.iter().map(|c| c.support).sum();

        let macro_avg = AveragedMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n,
        };

        let weighted = |metric: fn(&ClassMetrics) -> f64| -> f64 {
            if total == 0 {
                return 0.0;
            }
            classes
                .iter()
                .map(|c| metric(c) * c.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = AveragedMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
        };

        Self {
            classes,
            macro_avg,
            weighted_avg,
        }
    }

    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[1, 2, 3, 4], &[1, 2, 0, 0]), 0.5);
        assert_eq!(accuracy::<u8>(&[], &[]), 0.0);
    }

    #[test]
    fn test_confusion_matrix_layout() {
        let truth = labels(&["attack", "attack", "benign", "benign", "benign"]);
        let predicted = labels(&["attack", "benign", "benign", "benign", "attack"]);
        let cm = ConfusionMatrix::from_predictions(&truth, &predicted);

        assert_eq!(cm.labels, labels(&["attack", "benign"]));
        assert_eq!(cm.counts, vec![vec![1, 1], vec![1, 2]]);
        assert_eq!(cm.total(), truth.len());
        assert_eq!(cm.get("benign", "attack"), Some(1));
    }

    #[test]
    fn test_confusion_includes_predicted_only_labels() {
        let truth = labels(&["a", "a", "m"]);
        let predicted = labels(&["a", "z", "a"]);
        let cm = ConfusionMatrix::from_predictions(&truth, &predicted);
        assert_eq!(cm.labels, labels(&["a", "m", "z"]));
        assert_eq!(cm.counts, vec![vec![1, 0, 1], vec![1, 0, 0], vec![0, 0, 0]]);
        assert_eq!(cm.total(), 3);
        assert_eq!(cm.get("m", "a"), Some(1));
        assert_eq!(cm.get("a", "z"), Some(1));
    }

    #[test]
    fn test_class_metrics() {
        let truth = labels(&["attack", "attack", "benign", "benign", "benign"]);
        let predicted = labels(&["attack", "benign", "benign", "benign", "attack"]);
        let report = ClassificationReport::from_confusion(&ConfusionMatrix::from_predictions(&truth, &predicted));

        let attack = report.class("attack").unwrap();
        assert_eq!(attack.support, 2);
        assert!((attack.precision - 0.5).abs() < 1e-12);
        assert!((attack.recall - 0.5).abs() < 1e-12);
        assert!((attack.f1 - 0.5).abs() < 1e-12);

        let benign = report.class("benign").unwrap();
        assert!((benign.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((benign.recall - 2.0 / 3.0).abs() < 1e-12);

        assert!((report.macro_avg.recall - (0.5 + 2.0 / 3.0) / 2.0).abs() < 1e-12);
        assert!((report.weighted_avg.recall - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_zero_division_is_zero() {
        let truth = labels(&["a", "a"]);
        let predicted = labels(&["a", "a"]);
        let mut cm = ConfusionMatrix::from_predictions(&truth, &predicted);
        cm.labels.push("b".to_string());
        cm.counts = vec![vec![2, 0], vec![0, 0]];

        let b = &cm.class_metrics()[1];
        assert_eq!((b.precision, b.recall, b.f1, b.support), (0.0, 0.0, 0.0, 0));
    }
}
