//! Model selection
//!
//! Parameter grids, stratified folds, scores, and the cross-validated grid
//! search that ties them together.

pub mod folds;
pub mod grid;
pub mod metrics;
pub mod search;

pub use folds::{stratified_k_fold, Fold};
pub use grid::ParamGrid;
pub use metrics::Confusion;
pub use search::{CandidateResult, FoldScore, GridSearch, SearchOutcome};
