// src/evaluation/mod.rs - Pair based quality measures for match results

use log::debug;
use serde::Serialize;

use crate::clustering::ClusterIndex;
use crate::error::{ClusterError, ClusterResult};
use crate::task::ErTask;

/// Precision, recall and F-measure of a result against a gold standard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchQuality {
    pub fmeasure: f64,
    pub precision: f64,
    pub recall: f64,
}

/// Counts of true positive, false positive and false negative pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PairCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

pub fn pair_counts(result: &ClusterIndex, gold: &ClusterIndex) -> PairCounts {
    let mut counts = PairCounts::default();
    for (left, right) in result.pairs() {
        if gold.contains_pair(left, right) {
            counts.true_positives += 1;
        } else {
            counts.false_positives += 1;
        }
    }
    counts.false_negatives = gold
        .pairs()
        .filter(|(left, right)| !result.contains_pair(left, right))
        .count();
    counts
}

/// Compare the links of `result` with those of `gold`.
///
/// A result without any link has precision 1 and recall 0; an empty gold
/// standard scores 0 everywhere.
pub fn match_quality(result: &ClusterIndex, gold: &ClusterIndex) -> MatchQuality {
    if result.number_of_links() == 0 {
        return MatchQuality {
            fmeasure: 0.0,
            precision: 1.0,
            recall: 0.0,
        };
    }
    if gold.number_of_links() == 0 {
        return MatchQuality {
            fmeasure: 0.0,
            precision: 0.0,
            recall: 0.0,
        };
    }

    let counts = pair_counts(result, gold);
    debug!("Pair counts: {:?}", counts);
    let tp = counts.true_positives as f64;
    let precision = tp / (tp + counts.false_positives as f64);
    let recall = tp / (tp + counts.false_negatives as f64);
    let fmeasure = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };
    MatchQuality {
        fmeasure,
        precision,
        recall,
    }
}

/// Candidate pairs per entity for a blocking result.
pub fn pair_entity_ratio(blocks: &ClusterIndex, task: &ErTask) -> ClusterResult<f64> {
    if task.is_empty() {
        return Err(ClusterError::InvalidInput(
            "Pair/entity ratio of a task without entities".to_string(),
        ));
    }
    Ok(blocks.number_of_links() as f64 / task.len() as f64)
}
