//! Alignment Test Fixture Generator
//!
//! Writes OAEI alignment RDF files laid out the way each benchmark expects
//! them under a data directory.

use ome_eval::benchmarks::{
    Benchmark, DataLayout, CONFERENCE_TOOLS, LARGEBIO_PAIRS, LARGEBIO_TOOLS,
};
use std::fs;
use std::path::Path;

/// (entity1, entity2, measure)
pub type Cell = (String, String, f64);

/// Write an alignment file, creating parent directories
pub fn write_alignment(path: &Path, cells: &[Cell]) {
    let mut xml = String::from(
        "<?xml version='1.0' encoding='utf-8'?>\n\
         <rdf:RDF xmlns='http://knowledgeweb.semanticweb.org/heterogeneity/alignment'\n\
         \x20        xmlns:rdf='http://www.w3.org/1999/02/22-rdf-syntax-ns#'>\n\
         <Alignment>\n",
    );
    for (e1, e2, measure) in cells {
        xml.push_str(&format!(
            "  <map>\n    <Cell>\n      <entity1 rdf:resource='{}'/>\n      <entity2 rdf:resource='{}'/>\n      <measure rdf:datatype='xsd:float'>{}</measure>\n      <relation>=</relation>\n    </Cell>\n  </map>\n",
            e1, e2, measure
        ));
    }
    xml.push_str("</Alignment>\n</rdf:RDF>\n");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture dir");
    }
    fs::write(path, xml).expect("write fixture");
}

/// Entity pair `k` of an ontology pair
pub fn entities(ont1: &str, ont2: &str, k: usize) -> (String, String) {
    (
        format!("http://{}#E{}", ont1, k),
        format!("http://{}#E{}", ont2, k),
    )
}

/// Cells for entity pairs `ks`, all with the same measure
pub fn cells(ont1: &str, ont2: &str, ks: &[usize], measure: f64) -> Vec<Cell> {
    ks.iter()
        .map(|&k| {
            let (a, b) = entities(ont1, ont2, k);
            (a, b, measure)
        })
        .collect()
}

/// Pairs 0..3 are in the reference; most tools find them. Pairs 3..6 are
/// false proposals made by a single tool each.
fn tool_cells(tool_index: usize, ont1: &str, ont2: &str) -> Vec<Cell> {
    let mut proposed = Vec::new();
    if tool_index % 3 != 2 {
        proposed.extend(cells(ont1, ont2, &[0, 1, 2], 0.9));
    }
    if tool_index < 3 {
        proposed.extend(cells(ont1, ont2, &[tool_index + 3], 0.6));
    }
    proposed
}

/// Tool outputs and reference for one per-pair benchmark ontology pair
fn write_pair(benchmark: Benchmark, res_dir: &Path, ref_path: &Path, ont1: &str, ont2: &str) {
    for (i, tool) in benchmark.tools().iter().enumerate() {
        let path = benchmark.tool_output_path(res_dir, tool, Some((ont1, ont2)));
        write_alignment(&path, &tool_cells(i, ont1, ont2));
    }
    write_alignment(ref_path, &cells(ont1, ont2, &[0, 1, 2], 1.0));
}

/// The three largebio pairs plus the anatomy track
pub fn write_largebio_and_anatomy(layout: &DataLayout) {
    for (ont1, ont2) in LARGEBIO_PAIRS {
        write_pair(
            Benchmark::LargeBio,
            &layout.largebio_results_dir(),
            &layout.largebio_reference(ont1, ont2),
            ont1,
            ont2,
        );
    }
    write_anatomy(layout);
}

/// Anatomy: two true pairs found by every tool, three false pairs found
/// only by AML
pub fn write_anatomy(layout: &DataLayout) {
    let res_dir = layout.anatomy_results_dir();
    for tool in LARGEBIO_TOOLS.iter() {
        let mut proposed = cells("mouse", "human", &[0, 1], 0.95);
        if tool.name == "aml" {
            proposed.extend(cells("mouse", "human", &[2, 3, 4], 0.4));
        }
        let path = Benchmark::Anatomy.tool_output_path(&res_dir, tool, None);
        write_alignment(&path, &proposed);
    }
    write_alignment(
        &layout.anatomy_reference(),
        &cells("mouse", "human", &[0, 1], 1.0),
    );
}

/// All 21 conference pairs
pub fn write_conference(layout: &DataLayout, ontologies: &[&str]) {
    assert_eq!(CONFERENCE_TOOLS.len(), 9);
    for (ont1, ont2) in ome_eval::benchmarks::ontology_pairs(ontologies) {
        write_pair(
            Benchmark::Conference,
            &layout.conference_results_dir(),
            &layout.conference_reference(ont1, ont2),
            ont1,
            ont2,
        );
    }
}
