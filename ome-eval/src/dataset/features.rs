//! Binary feature tables
//!
//! A feature table is a mapping table projected onto a fixed list of measure
//! columns, each thresholded into {0,1}, plus the label column.

use super::MappingTable;
use crate::benchmarks::LABEL_COLUMN;
use crate::error::{EvalError, EvalResult};
use ndarray::{Array1, Array2};

/// Thresholds confidence scores into 0/1 indicators
///
/// A value maps to 1 iff `lower < min(value, upper)`. Missing and NaN values
/// count as 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binarizer {
    pub lower: f64,
    pub upper: f64,
}

impl Binarizer {
    pub fn new(lower: f64, upper: f64) -> EvalResult<Self> {
        if !(lower.is_finite() && upper.is_finite()) || lower >= upper {
            return Err(EvalError::Dataset(format!(
                "invalid threshold range ({}, {})",
                lower, upper
            )));
        }
        Ok(Self { lower, upper })
    }

    pub fn apply(&self, value: Option<f64>) -> u8 {
        match value {
            Some(v) if !v.is_nan() => u8::from(v.min(self.upper) > self.lower),
            _ => 0,
        }
    }
}

/// Binarize `measures` of a mapping table
///
/// Every requested measure must be a column of `table`.
pub fn bin_features(
    table: &MappingTable,
    lower: f64,
    upper: f64,
    measures: &[String],
) -> EvalResult<FeatureTable> {
    let binarizer = Binarizer::new(lower, upper)?;

    let indices = measures
        .iter()
        .map(|measure| {
            table.column_index(measure).ok_or_else(|| {
                EvalError::Schema(format!(
                    "measure '{}' not present in dataset columns {:?}",
                    measure,
                    table.measures()
                ))
            })
        })
        .collect::<EvalResult<Vec<usize>>>()?;

    let values = table
        .rows()
        .iter()
        .map(|row| {
            indices
                .iter()
                .map(|&i| binarizer.apply(row.scores[i]))
                .collect()
        })
        .collect();

    FeatureTable::new(measures.to_vec(), values, table.labels())
}

/// Binary feature matrix with labels
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    values: Vec<Vec<u8>>,
    labels: Vec<u8>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>, values: Vec<Vec<u8>>, labels: Vec<u8>) -> EvalResult<Self> {
        if values.len() != labels.len() {
            return Err(EvalError::Dataset(format!(
                "{} feature rows but {} labels",
                values.len(),
                labels.len()
            )));
        }
        if let Some(row) = values.iter().find(|row| row.len() != columns.len()) {
            return Err(EvalError::Schema(format!(
                "row width {} does not match {} columns",
                row.len(),
                columns.len()
            )));
        }
        if values.iter().flatten().chain(labels.iter()).any(|&v| v > 1) {
            return Err(EvalError::Dataset("feature table values must be 0 or 1".to_string()));
        }
        Ok(Self {
            columns,
            values,
            labels,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Feature columns followed by `label`
    pub fn column_names_with_label(&self) -> Vec<String> {
        let mut names = self.columns.clone();
        names.push(LABEL_COLUMN.to_string());
        names
    }

    pub fn values(&self) -> &[Vec<u8>] {
        &self.values
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// (negatives, positives)
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.labels.iter().filter(|&&l| l == 1).count();
        (self.labels.len() - positives, positives)
    }

    /// Keep only `columns`, in the given order
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> EvalResult<FeatureTable> {
        let indices = columns
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.columns.iter().position(|c| c == name).ok_or_else(|| {
                    EvalError::Schema(format!(
                        "column '{}' not present in feature table {:?}",
                        name, self.columns
                    ))
                })
            })
            .collect::<EvalResult<Vec<usize>>>()?;

        Ok(FeatureTable {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            values: self
                .values
                .iter()
                .map(|row| indices.iter().map(|&i| row[i]).collect())
                .collect(),
            labels: self.labels.clone(),
        })
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> FeatureTable {
        let n = n.min(self.len());
        FeatureTable {
            columns: self.columns.clone(),
            values: self.values[..n].to_vec(),
            labels: self.labels[..n].to_vec(),
        }
    }

    /// Rows at `indices`, in that order
    pub fn take(&self, indices: &[usize]) -> FeatureTable {
        FeatureTable {
            columns: self.columns.clone(),
            values: indices.iter().map(|&i| self.values[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Stack tables with identical columns
    pub fn concat(tables: &[FeatureTable]) -> EvalResult<FeatureTable> {
        let first = tables
            .first()
            .ok_or_else(|| EvalError::Dataset("no tables to concatenate".to_string()))?;

        let mut values = Vec::with_capacity(tables.iter().map(FeatureTable::len).sum());
        let mut labels = Vec::with_capacity(values.capacity());
        for table in tables {
            if table.columns != first.columns {
                return Err(EvalError::Schema(format!(
                    "cannot combine feature tables with columns {:?} and {:?}",
                    first.columns, table.columns
                )));
            }
            values.extend(table.values.iter().cloned());
            labels.extend_from_slice(&table.labels);
        }

        Ok(FeatureTable {
            columns: first.columns.clone(),
            values,
            labels,
        })
    }

    /// Feature matrix for model fitting, one row per mapping
    pub fn records(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.values.len(), self.columns.len()), |(i, j)| {
            f64::from(self.values[i][j])
        })
    }

    /// Labels as class indices
    pub fn targets(&self) -> Array1<usize> {
        self.labels.iter().map(|&l| usize::from(l)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MappingRow;

    fn table() -> MappingTable {
        let mut table = MappingTable::new(vec![
            "measure_aml".into(),
            "measure_dome".into(),
            "measure_logmap".into(),
        ]);
        let rows = [
            (vec![Some(0.9), None, Some(0.0)], 1),
            (vec![None, Some(1.7), Some(f64::NAN)], 0),
            (vec![Some(-0.5), Some(0.01), None], 0),
        ];
        for (i, (scores, label)) in rows.into_iter().enumerate() {
            table
                .push(MappingRow {
                    source: format!("s{}", i),
                    target: format!("t{}", i),
                    scores,
                    ontologies: None,
                    label,
                })
                .unwrap();
        }
        table
    }

    #[test]
    fn test_binarizer_thresholds() {
        let b = Binarizer::new(0.0, 1.0).unwrap();
        assert_eq!(b.apply(None), 0);
        assert_eq!(b.apply(Some(0.0)), 0);
        assert_eq!(b.apply(Some(1e-9)), 1);
        assert_eq!(b.apply(Some(1.0)), 1);
        assert_eq!(b.apply(Some(3.0)), 1);
        assert_eq!(b.apply(Some(-1.0)), 0);
        assert_eq!(b.apply(Some(f64::NAN)), 0);
    }

    #[test]
    fn test_invalid_range() {
        assert!(Binarizer::new(1.0, 0.0).is_err());
    }

    #[test]
    fn test_bin_features_only_binary_values() {
        let measures: Vec<String> = table().measures().to_vec();
        let features = bin_features(&table(), 0.0, 1.0, &measures).unwrap();

        assert_eq!(
            features.values(),
            &[vec![1, 0, 0], vec![0, 1, 0], vec![0, 1, 0]]
        );
        assert!(features.values().iter().flatten().all(|&v| v <= 1));
        assert_eq!(features.labels(), &[1, 0, 0]);
    }

    #[test]
    fn test_bin_features_missing_column() {
        let err = bin_features(&table(), 0.0, 1.0, &["measure_agm".to_string()]).unwrap_err();
        assert!(matches!(err, EvalError::Schema(_)));
    }

    #[test]
    fn test_select_and_label_columns() {
        let measures: Vec<String> = table().measures().to_vec();
        let features = bin_features(&table(), 0.0, 1.0, &measures).unwrap();
        let selected = features.select(&["measure_logmap", "measure_aml"]).unwrap();

        assert_eq!(
            selected.column_names_with_label(),
            vec!["measure_logmap", "measure_aml", "label"]
        );
        assert_eq!(selected.values()[0], vec![0, 1]);
        assert!(features.select(&["measure_sanom"]).is_err());
    }

    #[test]
    fn test_concat_head_take() {
        let measures: Vec<String> = table().measures().to_vec();
        let features = bin_features(&table(), 0.0, 1.0, &measures).unwrap();
        let combined = FeatureTable::concat(&[features.clone(), features.clone()]).unwrap();

        assert_eq!(combined.len(), 6);
        assert_eq!(combined.class_counts(), (4, 2));
        assert_eq!(combined.head(2).labels(), &[1, 0]);
        assert_eq!(combined.head(100).len(), 6);
        assert_eq!(combined.take(&[3, 0]).labels(), &[1, 1]);

        let narrow = features.select(&["measure_aml"]).unwrap();
        assert!(FeatureTable::concat(&[features, narrow]).is_err());
    }

    #[test]
    fn test_records_and_targets() {
        let measures: Vec<String> = table().measures().to_vec();
        let features = bin_features(&table(), 0.0, 1.0, &measures).unwrap();
        assert_eq!(
            features.records(),
            ndarray::array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 0.0]]
        );
        assert_eq!(features.targets(), ndarray::array![1, 0, 0]);
    }
}
