//! End-to-end tests for the scoring pipeline
//!
//! OBO text → graph → ancestor closure (cached) → propagation → curve,
//! driven through the public API against the fixtures in `tests/fixtures`.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use annoteval::annotations::{common_proteins, prediction_matrix, truth_matrix};
use annoteval::matrix::from_rows;
use annoteval::metrics::{threshold, N_THRESHOLDS};
use annoteval::{
    precision_recall_curve, propagate, AncestorClosure, BoolMatrix, ClosureCache, EvalConfig,
    EvalError, EvaluationMode, Evaluator, GroundTruth, LoadOptions, Namespace, OntologyGraph,
    Predictions, ScoreMatrix,
};
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::arr2;
use serde::Serialize;

// ============================================================================
// Test Helpers
// ============================================================================

const TOL: f64 = 1e-9;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn mini_graph(options: LoadOptions) -> OntologyGraph {
    OntologyGraph::load_path(&fixture("mini.obo"), options).expect("fixture vocabulary")
}

fn evaluator(graph: OntologyGraph, cache_dir: &Path) -> Evaluator {
    let config = EvalConfig::default()
        .with_cache_dir(cache_dir)
        .with_parallelism(2);
    Evaluator::new(Arc::new(graph), &config).expect("evaluator")
}

fn fixture_inputs(graph: &OntologyGraph) -> (GroundTruth, Predictions) {
    let truth = GroundTruth::load_path(&fixture("benchmark.tsv")).unwrap();
    let preds = Predictions::load_path(&fixture("predictions.tsv"))
        .unwrap()
        .retain_namespace(graph, Namespace::BiologicalProcess);
    (truth, preds)
}

fn col(graph: &OntologyGraph, id: &str) -> usize {
    graph
        .index_of(Namespace::BiologicalProcess, id)
        .unwrap_or_else(|| panic!("{} not in biological_process", id))
}

// ============================================================================
// Vocabulary
// ============================================================================

#[test]
fn test_fixture_layout() {
    let go = mini_graph(LoadOptions::default());

    // The obsolete term is gone; the Typedef block never becomes a term.
    assert_eq!(go.len(), 8);
    assert!(go.term("GO:0000005").is_none());
    assert!(go.term("part_of").is_none());

    assert_eq!(go.count(Namespace::BiologicalProcess), 5);
    assert_eq!(go.count(Namespace::MolecularFunction), 2);
    assert_eq!(go.count(Namespace::CellularComponent), 1);

    // First-seen order within each namespace
    assert_eq!(col(&go, "GO:0008150"), 0);
    assert_eq!(col(&go, "GO:0000001"), 1);
    assert_eq!(col(&go, "GO:0000004"), 4);
    assert_eq!(go.index_of(Namespace::MolecularFunction, "GO:0000010"), Some(1));
    assert_eq!(go.index_of(Namespace::MolecularFunction, "GO:0000001"), None);

    let signaling = go.term("GO:0000004").unwrap();
    assert_eq!(signaling.name.as_deref(), Some("signaling"));
    // The obsolete child registered no edge.
    assert!(signaling.is_leaf());
}

#[test]
fn test_relation_mode_controls_part_of() {
    let with_part_of = mini_graph(LoadOptions::default());
    let is_a_only = mini_graph(LoadOptions::is_a_only());

    let ancestors = |go: &OntologyGraph| -> Vec<String> {
        let tid = go.resolve("GO:0000003").unwrap();
        let mut ids: Vec<String> = go
            .ancestor_set(tid)
            .into_iter()
            .map(|t| go.get(t).id.clone())
            .collect();
        ids.sort();
        ids
    };

    assert_eq!(
        ancestors(&with_part_of),
        vec!["GO:0000001", "GO:0000002", "GO:0000004", "GO:0008150"]
    );
    assert_eq!(
        ancestors(&is_a_only),
        vec!["GO:0000001", "GO:0000002", "GO:0008150"]
    );

    // `regulates` is never followed, even in relation-aware mode.
    let term = with_part_of.term("GO:0000003").unwrap();
    assert_eq!(term.part_of, vec!["GO:0000004"]);
}

#[test]
fn test_alt_id_aliasing() {
    let plain = mini_graph(LoadOptions::default());
    assert_eq!(plain.index_of(Namespace::BiologicalProcess, "GO:0000020"), None);

    let aliased = mini_graph(LoadOptions::default().with_alt_ids(true));
    assert_eq!(
        aliased.index_of(Namespace::BiologicalProcess, "GO:0000020"),
        aliased.index_of(Namespace::BiologicalProcess, "GO:0000002")
    );
    // Aliases do not add terms.
    assert_eq!(aliased.len(), plain.len());
}

#[test]
fn test_ancestor_paths_end_at_root() {
    let go = mini_graph(LoadOptions::default());
    let mut paths = go.get_ancestors("GO:0000003");
    paths.sort();

    assert_eq!(
        paths,
        vec![
            vec!["GO:0000003", "GO:0000002", "GO:0000001", "GO:0008150"],
            vec!["GO:0000003", "GO:0000004", "GO:0008150"],
        ]
    );
    assert_eq!(go.get_ancestors("GO:0008150"), vec![vec!["GO:0008150"]]);
}

#[test]
fn test_malformed_vocabulary_fails_fast() {
    let err = OntologyGraph::load(
        "[Term]\nid: GO:1\nnamespace: biological_process\n\n[Term\nid: GO:2\n",
        LoadOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, EvalError::MalformedSource { line: 5, .. }));

    // Empty input is zero terms, not an error.
    let empty = OntologyGraph::load("", LoadOptions::default()).unwrap();
    assert!(empty.is_empty());
}

// ============================================================================
// Closure and cache
// ============================================================================

#[test]
fn test_closure_excludes_self_and_roots() {
    let go = mini_graph(LoadOptions::default());
    let closure = AncestorClosure::build(&go, Namespace::BiologicalProcess);
    let dense = closure.to_dense();
    let root = col(&go, "GO:0008150");

    for (i, row) in dense.iter().enumerate() {
        assert!(!row[i], "term {} is its own ancestor", i);
        assert!(!row[root], "root listed as ancestor of {}", i);
    }

    let leaf = col(&go, "GO:0000003");
    let mut expected = vec![
        col(&go, "GO:0000001") as u32,
        col(&go, "GO:0000002") as u32,
        col(&go, "GO:0000004") as u32,
    ];
    expected.sort_unstable();
    assert_eq!(closure.ancestors_of(leaf), expected.as_slice());
}

#[test]
fn test_cache_built_once_and_reused() {
    let dir = tempfile::tempdir().unwrap();
    let go = mini_graph(LoadOptions::default());

    let cache = ClosureCache::new(dir.path());
    let built = cache.ensure_cached(&go, &Namespace::ALL).unwrap();
    assert_eq!(built, Namespace::ALL.to_vec());
    for ns in Namespace::ALL {
        assert!(cache.path_for(ns).exists());
    }

    // Second pass is a no-op.
    assert!(cache.ensure_cached(&go, &Namespace::ALL).unwrap().is_empty());

    let loaded = cache.load(Namespace::BiologicalProcess).unwrap().unwrap();
    assert_eq!(loaded, AncestorClosure::build(&go, Namespace::BiologicalProcess));
}

#[test]
fn test_stale_cache_is_used_as_is() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ClosureCache::new(dir.path());

    let is_a_only = mini_graph(LoadOptions::is_a_only());
    cache.ensure_cached(&is_a_only, &[Namespace::BiologicalProcess]).unwrap();

    // A graph with part-of edges finds the existing file and keeps it.
    let with_part_of = mini_graph(LoadOptions::default());
    let eval = evaluator(with_part_of, dir.path());
    let closure = eval.closure(Namespace::BiologicalProcess).unwrap();
    assert_eq!(
        closure,
        AncestorClosure::build(&is_a_only, Namespace::BiologicalProcess)
    );
}

/// Same field layout as a `<namespace>.anc` record
#[derive(Serialize)]
struct RawCacheFile {
    magic: [u8; 4],
    version: u32,
    namespace: String,
    closure: RawClosure,
}

#[derive(Serialize)]
struct RawClosure {
    namespace: Namespace,
    offsets: Vec<usize>,
    ancestors: Vec<u32>,
}

#[test]
fn test_inconsistent_cache_fails_scoring() {
    let dir = tempfile::tempdir().unwrap();
    let go = mini_graph(LoadOptions::default());
    let (truth, preds) = fixture_inputs(&go);
    let eval = evaluator(go, dir.path());

    // Decodes cleanly, but the last term points at column 9 of 5.
    let record = RawCacheFile {
        magic: *b"GOAC",
        version: 1,
        namespace: "biological_process".to_string(),
        closure: RawClosure {
            namespace: Namespace::BiologicalProcess,
            offsets: vec![0, 0, 0, 0, 0, 1],
            ancestors: vec![9],
        },
    };
    let path = eval.cache().path_for(Namespace::BiologicalProcess);
    let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    bincode::serialize_into(&mut encoder, &record).unwrap();
    encoder.finish().unwrap().flush().unwrap();

    let err = eval
        .all_scores(&preds, "full", Namespace::BiologicalProcess, &truth)
        .unwrap_err();
    assert!(matches!(err, EvalError::Cache(_)), "got {:?}", err);
}

// ============================================================================
// Propagation and curve on the three-term chain
// ============================================================================

/// A (root) ← B ← C
fn chain() -> OntologyGraph {
    OntologyGraph::load(
        "[Term]\nid: GO:0008150\nnamespace: biological_process\n\n\
         [Term]\nid: GO:B\nnamespace: biological_process\nis_a: GO:0008150\n\n\
         [Term]\nid: GO:C\nnamespace: biological_process\nis_a: GO:B\n",
        LoadOptions::default(),
    )
    .unwrap()
}

#[test]
fn test_chain_truth_propagation() {
    let go = chain();
    let closure = AncestorClosure::build(&go, Namespace::BiologicalProcess);

    let mut truth = BoolMatrix::default((1, 3));
    truth[[0, 2]] = true;
    propagate(&mut truth, &closure).unwrap();

    // The root column is never reached through the closure.
    assert_eq!(truth, arr2(&[[false, true, true]]));
}

#[test]
fn test_chain_scores_perfectly_at_half() {
    let go = chain();
    let closure = AncestorClosure::build(&go, Namespace::BiologicalProcess);

    let mut truth = BoolMatrix::default((1, 3));
    truth[[0, 2]] = true;
    let mut pred = ScoreMatrix::zeros((1, 3));
    pred[[0, 2]] = 0.9;

    propagate(&mut truth, &closure).unwrap();
    propagate(&mut pred, &closure).unwrap();
    assert_eq!(pred, arr2(&[[0.0, 0.9, 0.9]]));

    let curve = precision_recall_curve(&truth, &pred, 1).unwrap();
    let p = curve.points()[50];
    assert!((p.threshold - 0.5).abs() < TOL);
    assert!((p.precision - 1.0).abs() < TOL);
    assert!((p.recall - 1.0).abs() < TOL);
    assert!((p.f1 - 1.0).abs() < TOL);
}

#[test]
fn test_empty_prediction_row_counts_against_recall() {
    let truth = arr2(&[[false, true, true], [false, true, false]]);
    let pred = arr2(&[[0.0, 0.9, 0.9], [0.0, 0.0, 0.0]]);

    let curve = precision_recall_curve(&truth, &pred, 2).unwrap();
    let p = curve.points()[50];
    // Only the first row retrieved anything.
    assert!((p.precision - 1.0).abs() < TOL);
    // The empty row still divides recall.
    assert!((p.recall - 0.5).abs() < TOL);
}

#[test]
fn test_curve_has_101_increasing_thresholds() {
    let truth: BoolMatrix = from_rows(2, vec![vec![true, false]]).unwrap();
    let pred: ScoreMatrix = from_rows(2, vec![vec![0.3, 0.7]]).unwrap();
    let curve = precision_recall_curve(&truth, &pred, 1).unwrap();

    assert_eq!(curve.points().len(), N_THRESHOLDS);
    for (i, point) in curve.points().iter().enumerate() {
        assert!((point.threshold - i as f64 / 100.0).abs() < 1e-12);
        assert!((point.threshold - threshold(i)).abs() < 1e-12);
    }
    assert!(curve
        .points()
        .windows(2)
        .all(|w| w[0].threshold < w[1].threshold));
}

#[test]
fn test_recall_at_zero_matches_hand_count() {
    let truth: BoolMatrix = from_rows(
        3,
        vec![
            vec![true, false, false],
            vec![false, false, false],
            vec![false, true, true],
            vec![false, false, true],
        ],
    )
    .unwrap();
    let pred: ScoreMatrix = from_rows(
        3,
        vec![
            vec![0.0, 0.2, 0.0],
            vec![0.5, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
            vec![0.1, 0.1, 0.1],
        ],
    )
    .unwrap();
    let baseline = 5;

    // At t = 0 every column is retrieved, so each row with a true term
    // has at least one true positive.
    let hand_count = (0..truth.nrows())
        .filter(|&r| {
            truth
                .row(r)
                .iter()
                .zip(pred.row(r))
                .any(|(&t, &p)| t && p >= 0.0)
        })
        .count();
    assert_eq!(hand_count, 3);

    let curve = precision_recall_curve(&truth, &pred, baseline).unwrap();
    let recall = curve.points()[0].recall;
    assert!((recall - hand_count as f64 / baseline as f64).abs() < 1e-9);
}

// ============================================================================
// Full pipeline on the fixtures
// ============================================================================

#[test]
fn test_fixture_matrices() {
    let go = mini_graph(LoadOptions::default());
    let (truth, preds) = fixture_inputs(&go);

    let common = common_proteins(&go, Namespace::BiologicalProcess, &truth, &preds);
    let t = truth_matrix(&go, Namespace::BiologicalProcess, &truth, &common);
    let p = prediction_matrix(&go, Namespace::BiologicalProcess, &preds, &t.proteins);

    // P3 is molecular function only; P4 got no prediction.
    assert_eq!(t.n_benchmark, 3);
    assert_eq!(t.proteins, vec!["P1", "P2"]);
    assert_eq!(p.n_predicted, 2);

    // The obsolete prediction for P2 was dropped.
    assert_eq!(p.matrix.row(1).iter().filter(|&&v| v > 0.0).count(), 1);
}

#[test]
fn test_full_mode_fixture_scores() {
    let dir = tempfile::tempdir().unwrap();
    let go = mini_graph(LoadOptions::default());
    let (truth, preds) = fixture_inputs(&go);
    let eval = evaluator(go, dir.path());

    let result = eval
        .all_scores(&preds, "full", Namespace::BiologicalProcess, &truth)
        .unwrap();
    assert_eq!(result.mode, EvaluationMode::Full);
    assert_eq!(result.n_benchmark, 3);
    assert_eq!(result.n_proteins, 2);

    let points = result.curve.points();

    // t = 0: both rows retrieve all five columns.
    // P1 hits 4 of 4 relevant, P2 hits 1 of 1.
    assert!((points[0].precision - 0.5).abs() < 1e-6);
    assert!((points[0].recall - 2.0 / 3.0).abs() < 1e-6);

    // t = 0.5: P1 is perfect, P2 retrieves two wrong terms.
    assert!((points[50].precision - 0.5).abs() < 1e-6);
    assert!((points[50].recall - 1.0 / 3.0).abs() < 1e-6);

    // t = 0.7: P2 retrieves nothing and leaves the precision average.
    assert!((points[70].precision - 1.0).abs() < 1e-6);
    assert!((points[70].recall - 1.0 / 3.0).abs() < 1e-6);
    assert!((points[70].f1 - 0.5).abs() < 1e-6);

    // Above every confidence nothing is retrieved.
    assert_eq!(points[90].precision, 0.0);
    assert_eq!(points[90].recall, 0.0);

    let best = result.curve.best().unwrap();
    assert_eq!(best.threshold, 0.0);
    assert!((result.f1_max() - 4.0 / 7.0).abs() < 1e-6);
    assert!(eval.cache().contains(Namespace::BiologicalProcess));
}

#[test]
fn test_partial_mode_uses_predicted_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let go = mini_graph(LoadOptions::default());
    let (truth, preds) = fixture_inputs(&go);
    let eval = evaluator(go, dir.path());

    let result = eval
        .all_scores(&preds, "partial", Namespace::BiologicalProcess, &truth)
        .unwrap();
    assert_eq!(result.mode, EvaluationMode::Partial);
    assert!((result.curve.points()[70].recall - 0.5).abs() < 1e-6);

    let fmax = eval
        .f1max_score(&preds, "partial", Namespace::BiologicalProcess, &truth)
        .unwrap();
    assert!((fmax - result.f1_max()).abs() < TOL);
}

#[test]
fn test_invalid_mode_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let go = mini_graph(LoadOptions::default());
    let (truth, preds) = fixture_inputs(&go);
    let eval = evaluator(go, dir.path());

    let err = eval
        .all_scores(&preds, "strict", Namespace::BiologicalProcess, &truth)
        .unwrap_err();
    assert!(matches!(err, EvalError::InvalidMode(ref m) if m == "strict"));
    assert!(!eval.cache().contains(Namespace::BiologicalProcess));
}

#[test]
fn test_no_overlap_scores_zero() {
    let dir = tempfile::tempdir().unwrap();
    let go = mini_graph(LoadOptions::default());
    let (truth, _) = fixture_inputs(&go);
    let eval = evaluator(go, dir.path());

    let mut preds = Predictions::new();
    preds.insert("UNKNOWN", "GO:0000001", 0.9);

    let result = eval
        .all_scores(&preds, "full", Namespace::BiologicalProcess, &truth)
        .unwrap();
    assert_eq!(result.n_proteins, 0);
    assert_eq!(result.curve.points().len(), N_THRESHOLDS);
    assert_eq!(result.f1_max(), 0.0);
}

#[test]
fn test_curve_tsv_output() {
    let dir = tempfile::tempdir().unwrap();
    let go = mini_graph(LoadOptions::default());
    let (truth, preds) = fixture_inputs(&go);
    let eval = evaluator(go, dir.path());

    let tsv = eval
        .all_scores(&preds, "full", Namespace::BiologicalProcess, &truth)
        .unwrap()
        .curve
        .to_tsv();
    let lines: Vec<&str> = tsv.lines().collect();
    assert_eq!(lines.len(), N_THRESHOLDS + 1);
    assert_eq!(lines[0], "threshold\tf1\tprecision\trecall");
    assert!(lines[1].starts_with("0.00\t"));
    assert!(lines[N_THRESHOLDS].starts_with("1.00\t"));
}
