//! Negative sampling and class-balance undersampling
//!
//! Both operations are seeded explicitly; the same inputs and seed always
//! produce the same rows in the same order.

use super::{FeatureTable, MappingRow, MappingTable};
use crate::alignment::Alignment;
use crate::error::{EvalError, EvalResult};
use ome_common::Seed;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Draws per requested negative before giving up on a source entity
const MAX_DRAWS: usize = 16;

/// Add synthetic negatives by corrupting the target of positive rows
///
/// For every positive row, up to `negatives_per_positive` new rows pair its
/// source with a target proposed by at least one tool for some other pair.
/// Added rows:
/// - have label 0 and no tool scores,
/// - are absent from both the reference and the input data,
/// - follow all input rows, which are returned unchanged.
///
/// `measures` must all be columns of `data`.
pub fn negative_sampling_target(
    measures: &[String],
    data: MappingTable,
    reference: &Alignment,
    negatives_per_positive: usize,
    seed: Seed,
) -> EvalResult<MappingTable> {
    if let Some(missing) = measures.iter().find(|m| data.column_index(m).is_none()) {
        return Err(EvalError::Schema(format!(
            "measure '{}' not present in dataset columns {:?}",
            missing,
            data.measures()
        )));
    }

    // Candidate targets, in first-seen order for reproducibility
    let mut seen_targets = HashSet::new();
    let target_pool: Vec<String> = data
        .rows()
        .iter()
        .filter(|row| row.is_proposed())
        .filter(|row| seen_targets.insert(row.target.as_str()))
        .map(|row| row.target.clone())
        .collect();

    let mut known: HashSet<(String, String)> = data
        .rows()
        .iter()
        .map(|row| (row.source.clone(), row.target.clone()))
        .chain(
            reference
                .cells
                .iter()
                .map(|c| (c.entity1.clone(), c.entity2.clone())),
        )
        .collect();

    let width = data.measures().len();
    let mut rng = seed.rng(0);
    let mut synthetic = Vec::new();

    if !target_pool.is_empty() {
        for row in data.rows().iter().filter(|row| row.label == 1) {
            for _ in 0..negatives_per_positive {
                for _ in 0..MAX_DRAWS {
                    let Some(target) = target_pool.choose(&mut rng) else {
                        break;
                    };
                    let key = (row.source.clone(), target.clone());
                    if known.insert(key) {
                        synthetic.push(MappingRow {
                            source: row.source.clone(),
                            target: target.clone(),
                            scores: vec![None; width],
                            ontologies: row.ontologies.clone(),
                            label: 0,
                        });
                        break;
                    }
                }
            }
        }
    }

    let positives = data.positives();
    let requested = positives * negatives_per_positive;
    if synthetic.len() < requested {
        debug!(
            "Negative sampling produced {} of {} requested rows",
            synthetic.len(),
            requested
        );
    }

    let mut table = data;
    for row in synthetic {
        table.push(row)?;
    }
    Ok(table)
}

/// Randomly drop majority-class rows until both classes are the same size
///
/// Kept rows retain their original relative order. A table with a single
/// class is returned unchanged.
pub fn random_undersample(table: &FeatureTable, seed: Seed) -> EvalResult<FeatureTable> {
    let (negatives, positives) = table.class_counts();
    if negatives == 0 || positives == 0 {
        warn!(
            "Undersampling skipped: training data has a single class ({} negatives, {} positives)",
            negatives, positives
        );
        return Ok(table.clone());
    }

    let minority_label = u8::from(positives < negatives);
    let target = negatives.min(positives);

    let mut majority: Vec<usize> = table
        .labels()
        .iter()
        .enumerate()
        .filter(|(_, &l)| l != minority_label)
        .map(|(i, _)| i)
        .collect();
    let mut rng = seed.rng(0);
    majority.shuffle(&mut rng);
    majority.truncate(target);

    let mut keep: Vec<usize> = table
        .labels()
        .iter()
        .enumerate()
        .filter(|(_, &l)| l == minority_label)
        .map(|(i, _)| i)
        .chain(majority)
        .collect();
    keep.sort_unstable();

    debug!(
        "Undersampled {} rows to {} ({} per class)",
        table.len(),
        keep.len(),
        target
    );
    Ok(table.take(&keep))
}
