//! Prediction scoring CLI
//!
//! # Usage
//!
//! ```bash
//! # Score a prediction file against a benchmark
//! annoteval score --ontology go.obo.gz --benchmark bpo_truth.tsv.gz \
//!     --predictions team1.tsv.gz --mode full --namespace bp
//!
//! # Predictions keyed by UniProt accession
//! annoteval score ... --accession-map uniprot_ac_to_id.map.gz --benchmark-map sp_species.map.gz
//!
//! # Pre-build the ancestor caches for all namespaces
//! annoteval build-cache --ontology go.obo.gz --cache-dir ./ancestor-cache
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use annoteval::{
    AccessionMapper, EvalConfig, EvalResult, Evaluation, EvaluationMode, Evaluator, GroundTruth,
    Namespace, OntologyGraph, Predictions,
};

/// Score Gene Ontology function predictions against a benchmark
#[derive(Parser, Debug)]
#[command(name = "annoteval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ancestor cache directory (overrides the configuration)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Number of worker threads (overrides the configuration)
    #[arg(short, long, global = true)]
    parallel: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the precision/recall curve of a prediction file
    Score {
        /// OBO vocabulary (plain or .gz)
        #[arg(long)]
        ontology: PathBuf,

        /// Two-column benchmark file: protein, term
        #[arg(long)]
        benchmark: PathBuf,

        /// Three-column prediction file: protein, term, confidence
        #[arg(long)]
        predictions: PathBuf,

        /// Evaluation mode: full or partial
        #[arg(long, default_value = "full")]
        mode: String,

        /// Namespace: bp, mf, cc or the full name
        #[arg(long)]
        namespace: String,

        /// Accession → entry name table (three columns)
        #[arg(long, requires = "benchmark_map")]
        accession_map: Option<PathBuf>,

        /// Benchmark target → entry name table (two columns)
        #[arg(long, requires = "accession_map")]
        benchmark_map: Option<PathBuf>,
    },

    /// Build missing ancestor caches for every namespace
    BuildCache {
        /// OBO vocabulary (plain or .gz)
        #[arg(long)]
        ontology: PathBuf,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> EvalResult<()> {
    let mut config = match &cli.config {
        Some(path) => EvalConfig::from_file(path)?,
        None => EvalConfig::default(),
    };
    if let Some(dir) = cli.cache_dir {
        config = config.with_cache_dir(dir);
    }
    if let Some(workers) = cli.parallel {
        config = config.with_parallelism(workers.max(1));
    }

    match cli.command {
        Commands::Score {
            ontology,
            benchmark,
            predictions,
            mode,
            namespace,
            accession_map,
            benchmark_map,
        } => {
            // Reject bad selectors before touching any file.
            let mode: EvaluationMode = mode.parse()?;
            let namespace: Namespace = namespace.parse()?;

            let start = Instant::now();
            let graph = OntologyGraph::load_path(&ontology, config.ontology)?;
            let evaluator = Evaluator::new(Arc::new(graph), &config)?;

            let truth = GroundTruth::load_path(&benchmark)?;
            let mut preds =
                Predictions::load_path(&predictions)?.retain_namespace(evaluator.graph(), namespace);
            if let (Some(accessions), Some(targets)) = (accession_map, benchmark_map) {
                preds = AccessionMapper::load_paths(&accessions, &targets)?.remap(preds);
            }

            let result = evaluator.evaluate(&preds, mode, namespace, &truth)?;
            print_results(&result);
            tracing::info!(elapsed_s = start.elapsed().as_secs_f64(), "done");
        }
        Commands::BuildCache { ontology } => {
            let graph = OntologyGraph::load_path(&ontology, config.ontology)?;
            let evaluator = Evaluator::new(Arc::new(graph), &config)?;
            let built = evaluator.prepare_cache(&Namespace::ALL)?;

            for namespace in Namespace::ALL {
                let status = if built.contains(&namespace) {
                    "built"
                } else {
                    "cached"
                };
                println!(
                    "{}\t{}\t{}",
                    namespace,
                    status,
                    evaluator.cache().path_for(namespace).display()
                );
            }
        }
    }

    Ok(())
}

fn print_results(result: &Evaluation) {
    println!("# namespace: {}", result.namespace);
    println!("# mode: {}", result.mode);
    println!("# benchmark proteins: {}", result.n_benchmark);
    println!("# predicted proteins: {}", result.n_predicted);
    print!("{}", result.curve.to_tsv());
    if let Some(best) = result.curve.best() {
        println!(
            "# Fmax: {:.6} (threshold {:.2}, precision {:.6}, recall {:.6})",
            best.f1, best.threshold, best.precision, best.recall
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    const SCORE: [&str; 10] = [
        "annoteval",
        "score",
        "--ontology",
        "go.obo",
        "--benchmark",
        "b.tsv",
        "--predictions",
        "p.tsv",
        "--namespace",
        "bp",
    ];

    fn score_with(extra: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(SCORE.iter().chain(extra).copied())
    }

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_score_defaults() {
        let cli = score_with(&[]).unwrap();
        match cli.command {
            Commands::Score {
                mode,
                accession_map,
                benchmark_map,
                ..
            } => {
                assert_eq!(mode, "full");
                assert!(accession_map.is_none());
                assert!(benchmark_map.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_mapping_tables_come_in_pairs() {
        let err = score_with(&["--accession-map", "a.map"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let err = score_with(&["--benchmark-map", "s.map"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let cli = score_with(&["--accession-map", "a.map", "--benchmark-map", "s.map"]).unwrap();
        match cli.command {
            Commands::Score {
                accession_map,
                benchmark_map,
                ..
            } => {
                assert_eq!(accession_map, Some(PathBuf::from("a.map")));
                assert_eq!(benchmark_map, Some(PathBuf::from("s.map")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "annoteval",
            "build-cache",
            "--ontology",
            "go.obo",
            "--cache-dir",
            "cache",
            "-p",
            "4",
        ])
        .unwrap();
        assert_eq!(cli.cache_dir, Some(PathBuf::from("cache")));
        assert_eq!(cli.parallel, Some(4));
        assert!(matches!(cli.command, Commands::BuildCache { .. }));
    }

    #[test]
    fn test_score_requires_namespace() {
        let err = Cli::try_parse_from(SCORE[..8].iter().copied()).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
