//! Experiment orchestration
//!
//! **Purpose:** Wire dataset loading, feature preparation and
//! training/evaluation into the three published experiments. Every
//! expensive stage goes through the [`ArtifactStore`], so a rerun only
//! recomputes what is missing on disk.
//!
//! Stage order per experiment:
//! 1. Load (or compute and cache) the benchmark datasets
//! 2. Fill missing confidences with 0 and binarize on (0, 1)
//! 3. Project onto the experiment's feature columns
//! 4. Load (or compute and cache) the result table

use crate::alignment::Alignment;
use crate::benchmarks::{
    cf_measures, conf_lb_features, lb_measures, largebio_cache_key, ontology_pairs, Benchmark,
    DataLayout, ANATOMY_CACHE_KEY, CONFERENCE_CACHE_KEY, CONFERENCE_ONTOLOGIES, LARGEBIO_PAIRS,
};
use crate::dataset::{
    bin_features, load_benchmark, negative_sampling_target, BenchmarkTables, FeatureTable,
    MappingTable,
};
use crate::error::EvalResult;
use crate::evaluate::{default_classifiers, train_and_eval, ClassifierSpec, CrossTuple, TrainOptions};
use crate::report::ResultTable;
use ome_common::config::EvalSettings;
use ome_common::{ArtifactStore, Json, Seed};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Tag of the single train/test split in each experiment
const SPLIT_TAG: &str = "1";

/// Seed stream labels for negative sampling, one block per benchmark
const LARGEBIO_SAMPLING: u64 = 100;
const ANATOMY_SAMPLING: u64 = 200;
const CONFERENCE_SAMPLING: u64 = 300;

/// The published experiments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentId {
    /// Train on the three largebio pairs, test on anatomy, all largebio tools
    LargebioAnatomy,
    /// As above, restricted to tools shared with the conference track
    LbConferenceIntersection,
    /// Conference track, cross-validated, tested on the first rows
    ConferenceCv10,
}

impl ExperimentId {
    pub const ALL: [ExperimentId; 3] = [
        ExperimentId::LargebioAnatomy,
        ExperimentId::LbConferenceIntersection,
        ExperimentId::ConferenceCv10,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExperimentId::LargebioAnatomy => "largebio_anatomy",
            ExperimentId::LbConferenceIntersection => "lb_conference_inter",
            ExperimentId::ConferenceCv10 => "conference_cv10",
        }
    }

    /// Cache key of the experiment's result table
    pub fn result_key(&self) -> String {
        format!("{}_paper.json", self.name())
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Binarized largebio training tables and the anatomy test table
struct LargebioFeatures {
    train: Vec<FeatureTable>,
    anatomy: FeatureTable,
}

/// Evaluation pipeline bound to one data directory
pub struct Pipeline {
    settings: EvalSettings,
    store: ArtifactStore,
    layout: DataLayout,
    classifiers: Vec<ClassifierSpec>,
}

impl Pipeline {
    pub fn new(settings: EvalSettings) -> Self {
        let store = ArtifactStore::new(&settings.data_dir);
        let layout = DataLayout::new(&settings.data_dir);
        Self {
            settings,
            store,
            layout,
            classifiers: default_classifiers(),
        }
    }

    /// Replace the default classifier grids
    pub fn with_classifiers(mut self, classifiers: Vec<ClassifierSpec>) -> Self {
        self.classifiers = classifiers;
        self
    }

    pub fn settings(&self) -> &EvalSettings {
        &self.settings
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run experiments in order, returning each result table
    pub fn run(&self, experiments: &[ExperimentId]) -> EvalResult<Vec<(ExperimentId, ResultTable)>> {
        let mut results = Vec::with_capacity(experiments.len());
        for &id in experiments {
            results.push((id, self.run_experiment(id)?));
        }
        Ok(results)
    }

    /// Load or compute one experiment's result table
    pub fn run_experiment(&self, id: ExperimentId) -> EvalResult<ResultTable> {
        info!("Experiment {}", id);
        let table = self.store.get_or_compute(
            &id.result_key(),
            || -> EvalResult<Json<ResultTable>> {
                let tuples = self.cross_tuples(id)?;
                let table = train_and_eval(&tuples, &self.classifiers, &self.train_options())?;
                Ok(Json(table))
            },
        )?;
        Ok(table.into_inner())
    }

    fn train_options(&self) -> TrainOptions {
        TrainOptions {
            undersample: self.settings.undersample,
            cv_folds: self.settings.cv_folds,
            metric: self.settings.selection_metric,
            seed: self.settings.seed,
        }
    }

    /// Train/test combinations of an experiment
    pub fn cross_tuples(&self, id: ExperimentId) -> EvalResult<Vec<CrossTuple>> {
        match id {
            ExperimentId::LargebioAnatomy => {
                let features = self.largebio_features()?;
                Ok(vec![CrossTuple::new(
                    features.train,
                    vec![features.anatomy],
                    SPLIT_TAG,
                )])
            }
            ExperimentId::LbConferenceIntersection => {
                let features = self.largebio_features()?;
                let shared = conf_lb_features();
                let train = features
                    .train
                    .iter()
                    .map(|t| t.select(&shared))
                    .collect::<EvalResult<Vec<_>>>()?;
                let test = features.anatomy.select(&shared)?;
                Ok(vec![CrossTuple::new(train, vec![test], SPLIT_TAG)])
            }
            ExperimentId::ConferenceCv10 => {
                let conference = prepare_features(self.conference_dataset()?.data, &cf_measures())?;
                let holdout = conference.head(self.settings.holdout_rows);
                Ok(vec![CrossTuple::new(vec![conference], vec![holdout], SPLIT_TAG)])
            }
        }
    }

    fn largebio_features(&self) -> EvalResult<LargebioFeatures> {
        let measures = lb_measures();
        let train = LARGEBIO_PAIRS
            .iter()
            .map(|&(ont1, ont2)| -> EvalResult<FeatureTable> {
                prepare_features(self.largebio_dataset(ont1, ont2)?.data, &measures)
            })
            .collect::<EvalResult<Vec<_>>>()?;
        let anatomy = prepare_features(self.anatomy_dataset()?.data, &measures)?;
        Ok(LargebioFeatures { train, anatomy })
    }

    /// One largebio pair, cached as `df_largebio_<o1>_<o2>.csv`
    pub fn largebio_dataset(&self, ont1: &str, ont2: &str) -> EvalResult<BenchmarkTables> {
        let pair_index = LARGEBIO_PAIRS
            .iter()
            .position(|&p| p == (ont1, ont2))
            .unwrap_or(LARGEBIO_PAIRS.len()) as u64;
        let seed = self.settings.seed.derive(LARGEBIO_SAMPLING + pair_index);

        self.store.get_or_compute(&largebio_cache_key(ont1, ont2), || {
            self.build_dataset(
                Benchmark::LargeBio,
                &self.layout.largebio_results_dir(),
                &self.layout.largebio_reference(ont1, ont2),
                Some((ont1, ont2)),
                seed,
            )
        })
    }

    /// Anatomy track, cached as `df_an.csv`
    pub fn anatomy_dataset(&self) -> EvalResult<BenchmarkTables> {
        let seed = self.settings.seed.derive(ANATOMY_SAMPLING);
        self.store.get_or_compute(ANATOMY_CACHE_KEY, || {
            self.build_dataset(
                Benchmark::Anatomy,
                &self.layout.anatomy_results_dir(),
                &self.layout.anatomy_reference(),
                None,
                seed,
            )
        })
    }

    /// All conference pairs, tagged `<o1>-<o2>`, cached as `df_conference.csv`
    pub fn conference_dataset(&self) -> EvalResult<BenchmarkTables> {
        self.store.get_or_compute(CONFERENCE_CACHE_KEY, || -> EvalResult<BenchmarkTables> {
            let mut tables = Vec::new();
            let mut reference_cells = Vec::new();
            for (i, (ont1, ont2)) in ontology_pairs(&CONFERENCE_ONTOLOGIES).into_iter().enumerate() {
                let seed = self.settings.seed.derive(CONFERENCE_SAMPLING + i as u64);
                let mut pair = self.build_dataset(
                    Benchmark::Conference,
                    &self.layout.conference_results_dir(),
                    &self.layout.conference_reference(ont1, ont2),
                    Some((ont1, ont2)),
                    seed,
                )?;
                pair.data.set_ontologies(&format!("{}-{}", ont1, ont2));
                tables.push(pair.data);
                reference_cells.extend(pair.reference.cells);
            }
            Ok(BenchmarkTables {
                data: MappingTable::concat(tables)?,
                reference: Alignment::from_cells(reference_cells),
            })
        })
    }

    fn build_dataset(
        &self,
        benchmark: Benchmark,
        res_dir: &Path,
        ref_path: &Path,
        pair: Option<(&str, &str)>,
        seed: Seed,
    ) -> EvalResult<BenchmarkTables> {
        let (data, reference) = load_benchmark(benchmark, res_dir, ref_path, pair)?;
        let measures: Vec<String> = data.measures().to_vec();
        let data = negative_sampling_target(
            &measures,
            data,
            &reference,
            self.settings.negatives_per_positive,
            seed,
        )?;
        Ok(BenchmarkTables { data, reference })
    }
}

/// Fill missing confidences with 0, then binarize `measures` on (0, 1)
pub fn prepare_features(mut data: MappingTable, measures: &[String]) -> EvalResult<FeatureTable> {
    data.fill_missing(0.0);
    bin_features(&data, 0.0, 1.0, measures)
}
