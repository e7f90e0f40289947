//! Composite join key and key canonicalization

use serde::{Deserialize, Serialize};

use crate::logic::error::{PipelineError, PipelineResult};

/// One key field: its column name in the flow table and in the ground truth table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub flow: String,
    pub truth: String,
}

impl KeyPair {
    pub fn new(flow: &str, truth: &str) -> Self {
        Self {
            flow: flow.to_string(),
            truth: truth.to_string(),
        }
    }
}

/// Ordered list of key pairs that jointly identify a flow
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeKey {
    pairs: Vec<KeyPair>,
}

impl CompositeKey {
    pub fn new(pairs: Vec<KeyPair>) -> Self {
        Self { pairs }
    }

    pub fn from_pairs<S: AsRef<str>>(pairs: &[(S, S)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(f, t)| KeyPair::new(f.as_ref(), t.as_ref()))
                .collect(),
        )
    }

    /// Parse `flow_col:truth_col,flow_col2:truth_col2`.
    ///
    /// An entry without both names would leave the two sides with different
    /// key column counts, so it fails the whole key.
    pub fn parse(raw: &str) -> PipelineResult<Self> {
        let mut pairs = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let pair = entry
                .split_once(':')
                .map(|(flow, truth)| (flow.trim(), truth.trim()))
                .filter(|(flow, truth)| !flow.is_empty() && !truth.is_empty());
            match pair {
                Some((flow, truth)) => pairs.push(KeyPair::new(flow, truth)),
                None => {
                    return Err(PipelineError::Join(format!(
                        "key entry '{}' does not name both a flow and a ground truth column",
                        entry
                    )))
                }
            }
        }
        let key = Self::new(pairs);
        key.validate()?;
        Ok(key)
    }

    pub fn pairs(&self) -> &[KeyPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.pairs.is_empty() {
            return Err(PipelineError::Join("composite key has no columns".to_string()));
        }
        Ok(())
    }
}

/// Canonical text form of a key value, applied identically to both sides.
///
/// Integral numbers collapse to their plain decimal form, so `"80"`, `"80.0"`,
/// `"+80"` and `"080"` all compare equal. Leading zeros are therefore not
/// significant: `"007"` and `"7"` collide. Other text is only trimmed and stays
/// case-sensitive (hex ports such as `0x000b` are kept as text).
pub fn canonicalize(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Ok(v) = trimmed.parse::<i64>() {
        return v.to_string();
    }

    if let Ok(v) = trimmed.parse::<f64>() {
        if v.is_finite() {
            if v.fract() == 0.0 && v.abs() < 9.007_199_254_740_992e15 {
                return (v as i64).to_string();
            }
            return v.to_string();
        }
    }

    trimmed.to_string()
}
