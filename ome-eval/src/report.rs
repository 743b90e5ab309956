//! Result tables and their formatting
//!
//! **Purpose:** Hold the per-combination scores of an experiment and render a
//! CLI summary of the selected combinations. Tables persist as
//! [`ome_common::Json`] artifacts.

use crate::model::{describe, ParamSet};
use ome_common::config::SelectionMetric;
use ome_common::Seed;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Complete result table of one experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    /// Run metadata
    pub run: RunInfo,

    /// One row per (tag, classifier, combination)
    pub rows: Vec<ResultRow>,
}

/// Run metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: Uuid,

    /// Creation timestamp (RFC 3339)
    pub created_at: String,

    pub seed: Seed,
    pub cv_folds: usize,
    pub undersample: bool,
    pub selection_metric: SelectionMetric,
}

impl RunInfo {
    pub fn new(seed: Seed, cv_folds: usize, undersample: bool, metric: SelectionMetric) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created_at: chrono::Utc::now().to_rfc3339(),
            seed,
            cv_folds,
            undersample,
            selection_metric: metric,
        }
    }
}

/// Scores of one hyperparameter combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Split tag of the (train, test) combination
    pub tag: String,
    pub classifier: String,
    pub params: ParamSet,
    pub cv_accuracy: f64,
    pub cv_f1: f64,
    pub cv_f1_std: f64,
    /// Rank by mean CV selection score within (tag, classifier)
    pub rank: usize,
    pub test_accuracy: f64,
    pub test_precision: f64,
    pub test_recall: f64,
    pub test_f1: f64,
    /// Best combination of its (tag, classifier) group
    pub selected: bool,
    pub n_train: usize,
    pub n_test: usize,
    /// Wall time of the final refit on the whole training set
    pub fit_millis: u64,
    /// Why the combination could not be scored; its scores are then 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultTable {
    pub fn new(run: RunInfo) -> Self {
        Self {
            run,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows flagged as the selected combination, in table order
    pub fn selected_rows(&self) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter().filter(|r| r.selected)
    }

    /// Rows whose combination failed to fit
    pub fn failed_rows(&self) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter().filter(|r| r.error.is_some())
    }
}

/// CLI formatter for result tables
pub struct CliFormatter;

impl CliFormatter {
    /// Format experiment header
    ///
    /// Example: `Experiment largebio_anatomy: 108 combinations`
    pub fn format_header(name: &str, table: &ResultTable) -> String {
        format!("\nExperiment {}: {} combinations\n", name, table.len())
    }

    /// Selected combination per (tag, classifier), then any failures
    pub fn format_summary(table: &ResultTable) -> String {
        let mut output = String::new();

        output.push_str("┌─────┬────────────────────────────┬────────┬────────┬─────────┬────────┬────────┬─────────┐\n");
        output.push_str("│ Tag │ Classifier                 │ CV acc │ CV F1  │ Test acc│ Test P │ Test R │ Test F1 │\n");
        output.push_str("├─────┼────────────────────────────┼────────┼────────┼─────────┼────────┼────────┼─────────┤\n");

        for row in table.selected_rows() {
            output.push_str(&format!(
                "│ {:<3} │ {:<26} │ {:.4} │ {:.4} │ {:.4}  │ {:.4} │ {:.4} │ {:.4}  │\n",
                row.tag,
                row.classifier,
                row.cv_accuracy,
                row.cv_f1,
                row.test_accuracy,
                row.test_precision,
                row.test_recall,
                row.test_f1
            ));
        }

        output.push_str("└─────┴────────────────────────────┴────────┴────────┴─────────┴────────┴────────┴─────────┘\n");

        for row in table.selected_rows() {
            output.push_str(&format!("  {} best: {}\n", row.classifier, describe(&row.params)));
        }
        for row in table.failed_rows() {
            output.push_str(&format!(
                "  {} {} failed: {}\n",
                row.classifier,
                describe(&row.params),
                row.error.as_deref().unwrap_or_default()
            ));
        }

        output
    }
}
