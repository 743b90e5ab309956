//! Stratified k-fold splitting

use crate::error::{EvalError, EvalResult};

/// Train/test row indices of one fold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split rows into `k` folds preserving class proportions, without shuffling
///
/// Each class's rows are dealt to folds in order, in contiguous blocks whose
/// sizes differ by at most one. Remainders rotate across classes so the
/// leftover rows of the positive class go to the folds the negative class
/// left short, keeping fold sizes balanced.
///
/// # Errors
/// `k < 2`, or fewer rows than folds
pub fn stratified_k_fold(labels: &[usize], k: usize) -> EvalResult<Vec<Fold>> {
    if k < 2 {
        return Err(EvalError::Dataset(format!(
            "cross-validation needs at least 2 folds, got {}",
            k
        )));
    }
    if labels.len() < k {
        return Err(EvalError::Dataset(format!(
            "cannot split {} rows into {} folds",
            labels.len(),
            k
        )));
    }

    let mut assignment = vec![0usize; labels.len()];
    let mut offset = 0;
    for class in [0, 1] {
        let members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();
        let base = members.len() / k;
        let extra = members.len() % k;

        // Folds offset..offset+extra (mod k) receive one extra row
        let mut sizes = vec![base; k];
        for j in 0..extra {
            sizes[(offset + j) % k] += 1;
        }
        let mut cursor = 0;
        for (fold, &size) in sizes.iter().enumerate() {
            for &row in &members[cursor..cursor + size] {
                assignment[row] = fold;
            }
            cursor += size;
        }
        offset = (offset + extra) % k;
    }

    Ok((0..k)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&i| assignment[i] == fold);
            Fold { train, test }
        })
        .collect())
}
