//! Shared definitions for the heap benchmark tools: CLI arguments and the
//! catalog of recognized heap variants, benchmarks and road-network locations.

use facet::Facet;
use facet_args as args;
use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Arguments for `heap-bench`.
#[derive(Facet, Debug, Default)]
pub struct AnalyzeArgs {
    /// Directory holding the `benchmark_output_*` logs (default: current directory)
    #[facet(args::positional, default)]
    pub dir: Option<String>,

    /// Directory to write RESULTS.md, charts and summary.json into (default: graphs)
    #[facet(args::named, default)]
    pub out: Option<String>,

    /// JSON variant catalog replacing the built-in one
    #[facet(args::named, default)]
    pub variants: Option<String>,

    /// Ratio log to analyze, one `(num/den)` observation per line
    #[facet(args::named, default)]
    pub ratios: Option<String>,

    /// Instruction trace measured from rank 0 up to max-rank
    #[facet(args::named, default)]
    pub up: Option<String>,

    /// Instruction trace measured from max-rank down to rank 0
    #[facet(args::named, default)]
    pub down: Option<String>,

    /// Skip SVG chart generation
    #[facet(args::named)]
    pub no_svg: bool,

    /// Skip summary.json generation
    #[facet(args::named)]
    pub no_json: bool,
}

/// Chart marker drawn for every point of a variant's series.
#[derive(Facet, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[facet(rename_all = "kebab-case")]
pub enum Marker {
    Square,
    Circle,
    TriangleDown,
    TriangleUp,
    Diamond,
}

/// One recognized heap implementation.
#[derive(Facet, Debug, Clone, PartialEq)]
pub struct VariantDef {
    /// Identifier used as the first `_` segment of log record names, e.g. `hhb`
    pub key: String,
    /// Legend / axis label, e.g. "Hollow Heap (Optimized)"
    pub label: String,
    pub marker: Marker,
    /// Column header used in comparison tables
    pub short: String,
}

impl VariantDef {
    fn new(key: &str, label: &str, marker: Marker, short: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            marker,
            short: short.to_string(),
        }
    }
}

/// On-disk shape of a catalog file.
///
/// Omitted lists fall back to the defaults; an explicit empty list stays empty.
#[derive(Facet, Debug)]
pub struct CatalogFile {
    pub variants: Vec<VariantDef>,
    #[facet(default)]
    pub benchmarks: Option<Vec<String>>,
    #[facet(default)]
    pub locations: Option<Vec<String>>,
    #[facet(default)]
    pub chart_only: Option<Vec<String>>,
}

/// Ordered catalog of variants, benchmarks and locations.
///
/// The variant order is the enumeration order used everywhere downstream:
/// chart legends, table columns, and the choice of reference variant for
/// ratios (the first variant present at a given key).
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    variants: Vec<VariantDef>,
    benchmarks: Vec<String>,
    locations: Vec<String>,
    chart_only: Vec<String>,
}

const DEFAULT_BENCHMARKS: &[&str] = &[
    "sort",
    "compression",
    "assorted",
    "dijkstra_sparse",
    "dijkstra_dense",
    "prim_sparse",
    "prim_dense",
];

const DEFAULT_LOCATIONS: &[&str] = &["nyc", "bay", "rome"];

const DEFAULT_CHART_ONLY: &[&str] = &["assorted"];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            variants: vec![
                VariantDef::new("hhb", "Hollow Heap (Optimized)", Marker::Square, "hhb_opt"),
                VariantDef::new("uhhb", "Hollow Heap (Direct)", Marker::Circle, "hhb_dir"),
                VariantDef::new("fhb", "Fibonacci Heap", Marker::TriangleDown, "fhb"),
                VariantDef::new("phb", "Pairing Heap", Marker::TriangleUp, "phb"),
            ],
            benchmarks: owned(DEFAULT_BENCHMARKS),
            locations: owned(DEFAULT_LOCATIONS),
            chart_only: owned(DEFAULT_CHART_ONLY),
        }
    }
}

impl Catalog {
    /// Build a catalog from a parsed file, filling omitted lists with defaults.
    pub fn from_file(file: CatalogFile) -> Self {
        let or_default =
            |list: Option<Vec<String>>, default: &[&str]| list.unwrap_or_else(|| owned(default));
        Self {
            variants: file.variants,
            benchmarks: or_default(file.benchmarks, DEFAULT_BENCHMARKS),
            locations: or_default(file.locations, DEFAULT_LOCATIONS),
            chart_only: or_default(file.chart_only, DEFAULT_CHART_ONLY),
        }
    }

    /// Build a catalog with the given variant keys (label and short name = key).
    pub fn with_keys(keys: &[&str]) -> Self {
        let markers = [
            Marker::Square,
            Marker::Circle,
            Marker::TriangleDown,
            Marker::TriangleUp,
            Marker::Diamond,
        ];
        Self {
            variants: keys
                .iter()
                .enumerate()
                .map(|(i, k)| VariantDef::new(k, k, markers[i % markers.len()], k))
                .collect(),
            ..Self::default()
        }
    }

    pub fn variants(&self) -> &[VariantDef] {
        &self.variants
    }

    /// Variant keys in enumeration order.
    pub fn order(&self) -> Vec<&str> {
        self.variants.iter().map(|v| v.key.as_str()).collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.variants.iter().any(|v| v.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&VariantDef> {
        self.variants.iter().find(|v| v.key == key)
    }

    pub fn benchmarks(&self) -> &[String] {
        &self.benchmarks
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Whether a benchmark gets a comparison table (some are charted only).
    pub fn has_table(&self, benchmark: &str) -> bool {
        !self.chart_only.iter().any(|b| b == benchmark)
    }
}

/// Graph benchmarks (`dijkstra_sparse`, `prim_dense`, ...) are sized by edge
/// count; their x axis is |V| = size / 8.
pub fn is_graph_benchmark(benchmark: &str) -> bool {
    benchmark.contains('_')
}

/// Errors raised while loading a catalog file.
#[derive(Error, Debug, Diagnostic)]
pub enum CatalogError {
    #[error("could not read variant catalog {}", path.display())]
    #[diagnostic(code(heap_bench::catalog::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid variant catalog {}: {message}", path.display())]
    #[diagnostic(
        code(heap_bench::catalog::parse),
        help("expected {{\"variants\": [{{\"key\", \"label\", \"marker\", \"short\"}}]}}")
    )]
    Parse { path: PathBuf, message: String },

    #[error("variant catalog {} lists no variants", path.display())]
    #[diagnostic(code(heap_bench::catalog::empty))]
    Empty { path: PathBuf },
}

/// Load a catalog from a JSON file.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: CatalogFile = facet_json::from_str(&content).map_err(|e| CatalogError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if file.variants.is_empty() {
        return Err(CatalogError::Empty {
            path: path.to_path_buf(),
        });
    }
    tracing::debug!(
        path = %path.display(),
        variants = file.variants.len(),
        "loaded variant catalog"
    );
    Ok(Catalog::from_file(file))
}
