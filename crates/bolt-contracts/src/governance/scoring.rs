//! # Scoring
//!
//! Running averages over evaluations and invocations. Every update is O(1):
//! prior samples are never re-read.

use serde::{Deserialize, Serialize};

/// Fold `sample` into a mean of `count` previous samples.
///
/// `mean' = mean * n/(n+1) + x/(n+1)`
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn incremental_mean(mean: f64, count: u64, sample: f64) -> f64 {
    let n = count as f64;
    mean * (n / (n + 1.0)) + sample / (n + 1.0)
}

/// One evaluation left by an account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Evaluating account.
    pub addr: String,
    /// Score given.
    pub score: f64,
    /// Free-text comment.
    pub desc: String,
    /// Transaction timestamp.
    pub create_time: i64,
}

/// Invocation statistics of one caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InvokeRecord {
    /// Calling full service id.
    pub from: String,
    /// Number of invocations.
    pub invoke_count: u64,
    /// Number of failed invocations.
    pub fail_count: u64,
    /// Success rate in `[0, 1]`.
    pub success_rate: f64,
}

impl InvokeRecord {
    /// Empty record of `from`.
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            ..Self::default()
        }
    }

    /// Count one invocation.
    pub fn record(&mut self, success: bool) {
        self.success_rate = incremental_mean(self.success_rate, self.invoke_count, outcome(success));
        self.invoke_count += 1;
        if !success {
            self.fail_count += 1;
        }
    }
}

/// `1.0` for success, `0.0` otherwise.
#[must_use]
pub fn outcome(success: bool) -> f64 {
    if success {
        1.0
    } else {
        0.0
    }
}
