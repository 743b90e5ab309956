//! Mapping tables and their CSV cache format
//!
//! A mapping table holds one row per candidate (source, target) pair with each
//! tool's confidence for that pair. CSV layout:
//!
//! ```text
//! source,target,measure_aml,...,measure_wiktionary[,ontologies],label
//! ```
//!
//! An empty measure cell means the tool did not propose the pair.

pub mod features;
pub mod loader;
pub mod sampling;

pub use features::{bin_features, Binarizer, FeatureTable};
pub use loader::{load_benchmark, merge_mappings};
pub use sampling::{negative_sampling_target, random_undersample};

use crate::alignment::{Alignment, Correspondence};
use crate::benchmarks::LABEL_COLUMN;
use crate::error::{codec_error, EvalError, EvalResult};
use ome_common::artifact::{sibling_with_suffix, write_atomic};
use ome_common::Artifact;
use std::path::{Path, PathBuf};

const SOURCE_COLUMN: &str = "source";
const TARGET_COLUMN: &str = "target";
const ONTOLOGIES_COLUMN: &str = "ontologies";

/// One candidate pair
#[derive(Debug, Clone, PartialEq)]
pub struct MappingRow {
    pub source: String,
    pub target: String,
    /// Confidence per measure column, `None` when the tool is silent
    pub scores: Vec<Option<f64>>,
    /// Ontology-pair tag (`cmt-edas`)
    pub ontologies: Option<String>,
    /// 1 when the pair is in the reference alignment
    pub label: u8,
}

impl MappingRow {
    /// True when at least one tool proposed this pair
    pub fn is_proposed(&self) -> bool {
        self.scores.iter().any(Option::is_some)
    }
}

/// Ordered collection of mapping rows over fixed measure columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MappingTable {
    measures: Vec<String>,
    rows: Vec<MappingRow>,
}

impl MappingTable {
    pub fn new(measures: Vec<String>) -> Self {
        Self {
            measures,
            rows: Vec::new(),
        }
    }

    pub fn measures(&self) -> &[String] {
        &self.measures
    }

    pub fn rows(&self) -> &[MappingRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row; its score count must match the measure columns
    pub fn push(&mut self, row: MappingRow) -> EvalResult<()> {
        if row.scores.len() != self.measures.len() {
            return Err(EvalError::Schema(format!(
                "row has {} scores, table has {} measure columns",
                row.scores.len(),
                self.measures.len()
            )));
        }
        if row.label > 1 {
            return Err(EvalError::Dataset(format!("label {} is not binary", row.label)));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn column_index(&self, measure: &str) -> Option<usize> {
        self.measures.iter().position(|m| m == measure)
    }

    /// Values of one measure column
    pub fn column(&self, measure: &str) -> EvalResult<Vec<Option<f64>>> {
        let index = self.column_index(measure).ok_or_else(|| {
            EvalError::Schema(format!("column '{}' not present in dataset", measure))
        })?;
        Ok(self.rows.iter().map(|row| row.scores[index]).collect())
    }

    pub fn labels(&self) -> Vec<u8> {
        self.rows.iter().map(|row| row.label).collect()
    }

    pub fn positives(&self) -> usize {
        self.rows.iter().filter(|row| row.label == 1).count()
    }

    /// Tag every row with its ontology pair
    pub fn set_ontologies(&mut self, tag: &str) {
        for row in &mut self.rows {
            row.ontologies = Some(tag.to_string());
        }
    }

    /// Replace missing confidences with `value`
    pub fn fill_missing(&mut self, value: f64) {
        for row in &mut self.rows {
            for score in &mut row.scores {
                if score.map_or(true, f64::is_nan) {
                    *score = Some(value);
                }
            }
        }
    }

    /// Stack tables with identical measure columns
    pub fn concat(tables: Vec<MappingTable>) -> EvalResult<MappingTable> {
        let mut iter = tables.into_iter();
        let mut combined = match iter.next() {
            Some(first) => first,
            None => return Ok(MappingTable::default()),
        };
        for table in iter {
            if table.measures != combined.measures {
                return Err(EvalError::Schema(format!(
                    "cannot concatenate tables with columns {:?} and {:?}",
                    combined.measures, table.measures
                )));
            }
            combined.rows.extend(table.rows);
        }
        Ok(combined)
    }

    /// Write the table as CSV
    pub fn write_csv(&self, path: &Path) -> EvalResult<()> {
        let with_ontologies = self.rows.iter().any(|row| row.ontologies.is_some());
        write_atomic(path, |file| -> EvalResult<()> {
            let mut writer = csv::Writer::from_writer(file);

            let mut header = vec![SOURCE_COLUMN.to_string(), TARGET_COLUMN.to_string()];
            header.extend(self.measures.iter().cloned());
            if with_ontologies {
                header.push(ONTOLOGIES_COLUMN.to_string());
            }
            header.push(LABEL_COLUMN.to_string());
            writer.write_record(&header)?;

            for row in &self.rows {
                let mut record = vec![row.source.clone(), row.target.clone()];
                record.extend(
                    row.scores
                        .iter()
                        .map(|score| score.map(|v| v.to_string()).unwrap_or_default()),
                );
                if with_ontologies {
                    record.push(row.ontologies.clone().unwrap_or_default());
                }
                record.push(row.label.to_string());
                writer.write_record(&record)?;
            }

            writer.flush()?;
            Ok(())
        })
    }

    /// Read a table written by [`MappingTable::write_csv`]
    pub fn read_csv(path: &Path) -> EvalResult<MappingTable> {
        if !path.is_file() {
            return Err(EvalError::missing_file(path));
        }
        let mut reader = csv::Reader::from_path(path)?;
        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        if header.len() < 3
            || header[0] != SOURCE_COLUMN
            || header[1] != TARGET_COLUMN
            || header[header.len() - 1] != LABEL_COLUMN
        {
            return Err(EvalError::Schema(format!(
                "{}: expected source,target,...,label header, found {:?}",
                path.display(),
                header
            )));
        }

        let middle = &header[2..header.len() - 1];
        let with_ontologies = middle.last().map(String::as_str) == Some(ONTOLOGIES_COLUMN);
        let measure_count = if with_ontologies {
            middle.len() - 1
        } else {
            middle.len()
        };
        let mut table = MappingTable::new(middle[..measure_count].to_vec());

        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let field = |i: usize| record.get(i).unwrap_or("");

            let mut scores = Vec::with_capacity(measure_count);
            for i in 0..measure_count {
                let raw = field(2 + i).trim();
                let score = if raw.is_empty() {
                    None
                } else {
                    Some(raw.parse::<f64>().map_err(|_| {
                        EvalError::Dataset(format!(
                            "{} row {}: invalid score '{}'",
                            path.display(),
                            line + 1,
                            raw
                        ))
                    })?)
                };
                scores.push(score);
            }

            let ontologies = if with_ontologies {
                Some(field(2 + measure_count).to_string()).filter(|s| !s.is_empty())
            } else {
                None
            };

            let raw_label = field(header.len() - 1).trim();
            let label = parse_label(raw_label).ok_or_else(|| {
                EvalError::Dataset(format!(
                    "{} row {}: invalid label '{}'",
                    path.display(),
                    line + 1,
                    raw_label
                ))
            })?;

            table.push(MappingRow {
                source: field(0).to_string(),
                target: field(1).to_string(),
                scores,
                ontologies,
                label,
            })?;
        }

        Ok(table)
    }
}

/// Accepts `0`/`1` as well as `0.0`/`1.0` and `True`/`False`
fn parse_label(raw: &str) -> Option<u8> {
    match raw {
        "1" | "1.0" | "True" | "true" => Some(1),
        "0" | "0.0" | "False" | "false" => Some(0),
        _ => None,
    }
}

/// Write a reference alignment as CSV (`entity1,entity2,measure,relation`)
pub fn write_reference_csv(alignment: &Alignment, path: &Path) -> EvalResult<()> {
    write_atomic(path, |file| -> EvalResult<()> {
        let mut writer = csv::Writer::from_writer(file);
        for cell in &alignment.cells {
            writer.serialize(cell)?;
        }
        // Header row for an empty alignment
        if alignment.is_empty() {
            writer.write_record(["entity1", "entity2", "measure", "relation"])?;
        }
        writer.flush()?;
        Ok(())
    })
}

/// Read a reference alignment CSV
pub fn read_reference_csv(path: &Path) -> EvalResult<Alignment> {
    if !path.is_file() {
        return Err(EvalError::missing_file(path));
    }
    let mut reader = csv::Reader::from_path(path)?;
    let cells = reader
        .deserialize::<Correspondence>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Alignment::from_cells(cells))
}

/// Merged tool data plus the reference it was labeled against
///
/// Cached as `<key>.csv` with a `<key>_ref.csv` companion.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkTables {
    pub data: MappingTable,
    pub reference: Alignment,
}

impl Artifact for BenchmarkTables {
    fn load(path: &Path) -> ome_common::Result<Self> {
        let data = MappingTable::read_csv(path).map_err(codec_error)?;
        let reference =
            read_reference_csv(&sibling_with_suffix(path, "_ref")).map_err(codec_error)?;
        Ok(Self { data, reference })
    }

    fn save(&self, path: &Path) -> ome_common::Result<()> {
        write_reference_csv(&self.reference, &sibling_with_suffix(path, "_ref"))
            .map_err(codec_error)?;
        self.data.write_csv(path).map_err(codec_error)?;
        Ok(())
    }

    fn companions(path: &Path) -> Vec<PathBuf> {
        vec![sibling_with_suffix(path, "_ref")]
    }
}
