//! ome-eval library interface
//!
//! Evaluates ontology matching tools by treating their mapping proposals as
//! binary features for a classifier that predicts reference membership.
//!
//! Stages:
//! - **Ingestion** ([`alignment`], [`dataset::loader`]): OAEI alignment RDF → mapping tables
//! - **Feature assembly** ([`dataset`]): labels, negative sampling, binarization
//! - **Training & selection** ([`model`], [`selection`], [`evaluate`]): grid search with CV
//! - **Persistence** ([`report`], [`pipeline`]): cached result tables

pub mod alignment;
pub mod benchmarks;
pub mod dataset;
pub mod error;
pub mod evaluate;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod selection;

pub use crate::error::{EvalError, EvalResult};
pub use crate::pipeline::{ExperimentId, Pipeline};
pub use crate::report::{ResultRow, ResultTable};
