//! Benchmark loading: tool outputs + reference → labeled mapping table

use super::{MappingRow, MappingTable};
use crate::alignment::{parse_alignment, Alignment};
use crate::benchmarks::Benchmark;
use crate::error::EvalResult;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load one ontology pair of a benchmark
///
/// Parses the reference alignment and every registered tool's output for the
/// pair, then merges them into a labeled table. A missing reference or tool
/// file fails the whole load.
///
/// # Returns
/// (merged data rows, reference alignment)
pub fn load_benchmark(
    benchmark: Benchmark,
    res_dir: &Path,
    ref_path: &Path,
    pair: Option<(&str, &str)>,
) -> EvalResult<(MappingTable, Alignment)> {
    info!(
        "Loading {} alignments{}",
        benchmark.name(),
        pair.map(|(a, b)| format!(" for {}-{}", a, b))
            .unwrap_or_default()
    );

    let reference = parse_alignment(ref_path)?;
    if let Some((onto1, onto2)) = reference.ontologies() {
        debug!("Reference aligns {} with {}", onto1, onto2);
    }

    let mut tool_outputs = Vec::with_capacity(benchmark.tools().len());
    for tool in benchmark.tools() {
        let path = benchmark.tool_output_path(res_dir, tool, pair);
        let alignment = parse_alignment(&path)?;
        debug!("{}: {} mappings", tool.file_stem, alignment.len());
        if alignment.ontologies_differ(&reference) {
            warn!(
                "{}: aligns {:?} but the reference aligns {:?}",
                tool.file_stem,
                alignment.ontologies(),
                reference.ontologies()
            );
        }
        tool_outputs.push((tool.measure(), alignment));
    }

    let data = merge_mappings(&tool_outputs, &reference)?;
    info!(
        "{}: {} candidate pairs, {} in reference ({} reference mappings)",
        benchmark.name(),
        data.len(),
        data.positives(),
        reference.len()
    );

    Ok((data, reference))
}

/// Merge per-tool alignments into one row per distinct pair
///
/// Rows appear in first-seen order (tools in the given order, cells in file
/// order). A tool that proposes the same pair twice contributes its highest
/// confidence. Labels come from reference membership.
pub fn merge_mappings(
    tool_outputs: &[(String, Alignment)],
    reference: &Alignment,
) -> EvalResult<MappingTable> {
    let measures: Vec<String> = tool_outputs.iter().map(|(m, _)| m.clone()).collect();
    let width = measures.len();

    let mut rows: Vec<MappingRow> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for (tool_idx, (_, alignment)) in tool_outputs.iter().enumerate() {
        for cell in &alignment.cells {
            let key = (cell.entity1.clone(), cell.entity2.clone());
            let row_idx = *index.entry(key).or_insert_with(|| {
                rows.push(MappingRow {
                    source: cell.entity1.clone(),
                    target: cell.entity2.clone(),
                    scores: vec![None; width],
                    ontologies: None,
                    label: 0,
                });
                rows.len() - 1
            });

            let slot = &mut rows[row_idx].scores[tool_idx];
            *slot = Some(slot.map_or(cell.measure, |prev| prev.max(cell.measure)));
        }
    }

    let reference_pairs = reference.pair_index();
    let mut table = MappingTable::new(measures);
    for mut row in rows {
        row.label = u8::from(reference_pairs.contains(&row.source, &row.target));
        table.push(row)?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::Correspondence;

    fn alignment(cells: &[(&str, &str, f64)]) -> Alignment {
        Alignment::from_cells(
            cells
                .iter()
                .map(|(a, b, m)| Correspondence::new(*a, *b, *m))
                .collect(),
        )
    }

    #[test]
    fn test_merge_labels_and_order() {
        let reference = alignment(&[("s1", "t1", 1.0), ("s2", "t2", 1.0)]);
        let outputs = vec![
            (
                "measure_aml".to_string(),
                alignment(&[("s1", "t1", 0.9), ("s3", "t3", 0.4)]),
            ),
            (
                "measure_dome".to_string(),
                alignment(&[("s2", "t2", 0.8), ("s1", "t1", 0.7), ("s4", "t4", 0.3)]),
            ),
        ];

        let table = merge_mappings(&outputs, &reference).unwrap();

        let pairs: Vec<(&str, &str)> = table
            .rows()
            .iter()
            .map(|r| (r.source.as_str(), r.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("s1", "t1"), ("s3", "t3"), ("s2", "t2"), ("s4", "t4")]);
        assert_eq!(table.labels(), vec![1, 0, 1, 0]);
        assert_eq!(table.rows()[0].scores, vec![Some(0.9), Some(0.7)]);
        assert_eq!(table.rows()[1].scores, vec![Some(0.4), None]);
    }

    #[test]
    fn test_duplicate_proposal_keeps_max() {
        let reference = Alignment::default();
        let outputs = vec![(
            "measure_aml".to_string(),
            alignment(&[("s1", "t1", 0.2), ("s1", "t1", 0.6), ("s1", "t1", 0.5)]),
        )];

        let table = merge_mappings(&outputs, &reference).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].scores, vec![Some(0.6)]);
    }

    #[test]
    fn test_reference_only_pairs_are_not_rows() {
        let reference = alignment(&[("s9", "t9", 1.0)]);
        let outputs = vec![("measure_aml".to_string(), alignment(&[("s1", "t1", 1.0)]))];

        let table = merge_mappings(&outputs, &reference).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.positives(), 0);
    }
}
