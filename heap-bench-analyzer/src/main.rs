//! `heap-bench`: turn heap benchmark logs into comparison tables, charts and a JSON summary.

use std::path::{Path, PathBuf};

use facet_args as args;
use heap_bench_analyzer::{
    AnalyzeError, Inputs, JsonSink, MarkdownSink, ReportSink, SvgSink, analyze, emit,
};
use heap_bench_defs::{AnalyzeArgs as Args, Catalog, load_catalog};
use miette::Report;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

/// Format a file path as a clickable terminal hyperlink.
fn file_hyperlink(path: &Path) -> String {
    let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let url = format!("file://{}", absolute.display());
    let text = path.display().to_string();
    format!("\x1b]8;;{url}\x07{text}\x1b]8;;\x07")
}

/// Log to stderr, filtered by `HEAP_BENCH_LOG` (default: warnings only).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("HEAP_BENCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn inputs(args: &Args) -> Result<Inputs, AnalyzeError> {
    let catalog = match &args.variants {
        Some(path) => load_catalog(Path::new(path))?,
        None => Catalog::default(),
    };

    let traces = match (&args.up, &args.down) {
        (Some(up), Some(down)) => Some((PathBuf::from(up), PathBuf::from(down))),
        (None, None) => None,
        _ => {
            return Err(AnalyzeError::Usage(
                "--up and --down must be given together".to_string(),
            ));
        }
    };

    Ok(Inputs {
        dir: PathBuf::from(args.dir.as_deref().unwrap_or(".")),
        catalog,
        ratios: args.ratios.as_ref().map(PathBuf::from),
        traces,
    })
}

fn run(args: &Args) -> Result<Vec<PathBuf>, AnalyzeError> {
    let inputs = inputs(args)?;

    println!("📝 Analyzing logs in {}", inputs.dir.display().bold());
    let analysis = analyze(&inputs)?;
    println!(
        "   {} benchmarks, {} road-network charts, {} instruction traces",
        analysis.general.len(),
        analysis.roads.len(),
        analysis.traces.len()
    );
    if let Some(freq) = &analysis.ratios {
        println!(
            "   {} ratios ({} discarded with a zero denominator)",
            freq.accepted(),
            freq.discarded()
        );
    }

    let out_dir = PathBuf::from(args.out.as_deref().unwrap_or("graphs"));
    let mut sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(MarkdownSink::new(&out_dir))];
    if !args.no_svg {
        sinks.push(Box::new(SvgSink::new(&out_dir)));
    }
    if !args.no_json {
        let generated_at = chrono::Utc::now().to_rfc3339();
        sinks.push(Box::new(JsonSink::new(&out_dir, generated_at)));
    }

    let mut written = Vec::new();
    for sink in &mut sinks {
        written.extend(emit(&analysis, sink.as_mut())?);
    }
    Ok(written)
}

fn main() {
    let args: Args = match args::from_std_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            std::process::exit(1);
        }
    };

    init_tracing();

    match run(&args) {
        Ok(written) => {
            println!();
            println!("{}", format!("✅ Wrote {} files", written.len()).green().bold());
            for path in &written {
                println!("   {}", file_hyperlink(path));
            }
        }
        Err(e) => {
            eprintln!();
            eprintln!("{}", "❌ Analysis failed".red().bold());
            eprintln!("{:?}", Report::new(e));
            std::process::exit(1);
        }
    }
}
