//! Benchmark registry: tools, ontology pairs and file conventions
//!
//! All paths are relative to the data directory. Tool output files follow
//! OAEI naming: `<ToolStem>-<ont1>-<ont2>.rdf` for pairwise tracks and
//! `<ToolStem>.rdf` for single-pair tracks.

use std::path::{Path, PathBuf};

/// Prefix of every tool confidence column
pub const MEASURE_PREFIX: &str = "measure_";

/// Name of the label column in CSV files and feature tables
pub const LABEL_COLUMN: &str = "label";

/// A matching system that produced alignments for a benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tool {
    /// Short name used in column names
    pub name: &'static str,
    /// File name stem of the tool's output files
    pub file_stem: &'static str,
}

impl Tool {
    pub const fn new(name: &'static str, file_stem: &'static str) -> Self {
        Self { name, file_stem }
    }

    /// Confidence column name (`measure_<name>`)
    pub fn measure(&self) -> String {
        format!("{}{}", MEASURE_PREFIX, self.name)
    }
}

/// Systems evaluated on largebio and anatomy (OAEI 2019)
pub const LARGEBIO_TOOLS: [Tool; 9] = [
    Tool::new("agm", "AGM"),
    Tool::new("aml", "AML"),
    Tool::new("dome", "DOME"),
    Tool::new("fcamap", "FCAMap-KG"),
    Tool::new("logmap", "LogMap"),
    Tool::new("logmapbio", "LogMapBio"),
    Tool::new("logmaplt", "LogMapLt"),
    Tool::new("pomap++", "POMAP++"),
    Tool::new("wiktionary", "Wiktionary"),
];

/// Systems evaluated on the conference track (OAEI 2019)
pub const CONFERENCE_TOOLS: [Tool; 9] = [
    Tool::new("alin", "ALIN"),
    Tool::new("aml", "AML"),
    Tool::new("dome", "DOME"),
    Tool::new("lily", "Lily"),
    Tool::new("logmap", "LogMap"),
    Tool::new("logmaplt", "LogMapLt"),
    Tool::new("ontmat1", "ONTMAT1"),
    Tool::new("sanom", "SANOM"),
    Tool::new("wiktionary", "Wiktionary"),
];

/// Tools present in both the largebio and conference tracks
pub const LB_CONFERENCE_INTERSECTION: [&str; 5] = ["aml", "dome", "logmap", "logmaplt", "wiktionary"];

/// Largebio ontology pairs
pub const LARGEBIO_PAIRS: [(&str, &str); 3] = [("fma", "nci"), ("fma", "snomed"), ("snomed", "nci")];

/// Conference ontologies with reference alignments
pub const CONFERENCE_ONTOLOGIES: [&str; 7] =
    ["cmt", "conference", "confOf", "edas", "ekaw", "iasted", "sigkdd"];

/// Measure column names for a tool list
pub fn measures(tools: &[Tool]) -> Vec<String> {
    tools.iter().map(Tool::measure).collect()
}

/// Largebio/anatomy measure columns
pub fn lb_measures() -> Vec<String> {
    measures(&LARGEBIO_TOOLS)
}

/// Conference measure columns
pub fn cf_measures() -> Vec<String> {
    measures(&CONFERENCE_TOOLS)
}

/// Measure columns shared by largebio and conference
pub fn conf_lb_features() -> Vec<String> {
    LB_CONFERENCE_INTERSECTION
        .iter()
        .map(|name| format!("{}{}", MEASURE_PREFIX, name))
        .collect()
}

/// All unordered pairs in list order (`itertools.combinations(_, 2)` order)
pub fn ontology_pairs<'a>(ontologies: &[&'a str]) -> Vec<(&'a str, &'a str)> {
    let mut pairs = Vec::new();
    for (i, first) in ontologies.iter().enumerate() {
        for second in &ontologies[i + 1..] {
            pairs.push((*first, *second));
        }
    }
    pairs
}

/// How a benchmark names its tool output files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// `<ToolStem>-<ont1>-<ont2>.rdf`
    PerPair,
    /// `<ToolStem>.rdf`
    Single,
}

/// Benchmark families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Benchmark {
    LargeBio,
    Anatomy,
    Conference,
}

impl Benchmark {
    pub fn name(&self) -> &'static str {
        match self {
            Benchmark::LargeBio => "largebio",
            Benchmark::Anatomy => "anatomy",
            Benchmark::Conference => "conference",
        }
    }

    pub fn tools(&self) -> &'static [Tool] {
        match self {
            Benchmark::LargeBio | Benchmark::Anatomy => &LARGEBIO_TOOLS,
            Benchmark::Conference => &CONFERENCE_TOOLS,
        }
    }

    pub fn layout(&self) -> OutputLayout {
        match self {
            Benchmark::LargeBio | Benchmark::Conference => OutputLayout::PerPair,
            Benchmark::Anatomy => OutputLayout::Single,
        }
    }

    /// Path of one tool's output file
    pub fn tool_output_path(&self, res_dir: &Path, tool: &Tool, pair: Option<(&str, &str)>) -> PathBuf {
        match (self.layout(), pair) {
            (OutputLayout::PerPair, Some((ont1, ont2))) => {
                res_dir.join(format!("{}-{}-{}.rdf", tool.file_stem, ont1, ont2))
            }
            _ => res_dir.join(format!("{}.rdf", tool.file_stem)),
        }
    }
}

/// Input and cache locations under the data directory
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn largebio_results_dir(&self) -> PathBuf {
        self.root.join("largebio-results-2019")
    }

    pub fn largebio_reference(&self, ont1: &str, ont2: &str) -> PathBuf {
        self.root
            .join("oaei2019_umls_flagged_reference")
            .join(format!("oaei_{}_{}_mappings_with_flagged_repairs.rdf", ont1, ont2))
    }

    pub fn anatomy_results_dir(&self) -> PathBuf {
        self.root.join("anatomy-2019")
    }

    pub fn anatomy_reference(&self) -> PathBuf {
        self.root.join("anatomy-2019-results").join("reference.rdf")
    }

    pub fn conference_results_dir(&self) -> PathBuf {
        self.root.join("conference-data")
    }

    pub fn conference_reference(&self, ont1: &str, ont2: &str) -> PathBuf {
        self.root
            .join("conference-ref-data")
            .join(format!("{}-{}.rdf", ont1, ont2))
    }
}

/// Cache key of a largebio pair dataset
pub fn largebio_cache_key(ont1: &str, ont2: &str) -> String {
    format!("df_largebio_{}_{}.csv", ont1, ont2)
}

pub const ANATOMY_CACHE_KEY: &str = "df_an.csv";
pub const CONFERENCE_CACHE_KEY: &str = "df_conference.csv";
