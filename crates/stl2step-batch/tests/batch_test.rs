//! Batch scenarios against an in-memory converter.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use stl2step_batch::{
    BatchLayout, BatchOptions, BatchProcessor, BatchReport, BatchReporter, FileStatus,
    NullReporter,
};
use stl2step_core::{
    AppError, AppResult, ConversionOutcome, ConversionRequest, MeshConverter, SolidStrategy,
};

/// Writes a small solid file, unless the input name contains `broken`
/// (error) or `partial` (writes then errors). Inputs named `vanish*` are
/// consumed by the conversion itself.
#[derive(Debug, Default)]
struct FakeConverter;

#[async_trait]
impl MeshConverter for FakeConverter {
    fn backend_name(&self) -> &str {
        "fake"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn convert(&self, request: &ConversionRequest) -> AppResult<ConversionOutcome> {
        let name = request
            .input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if name.contains("partial") {
            tokio::fs::write(&request.output_path, b"ISO-10303-21;").await?;
            return Err(AppError::conversion("Shape export failed"));
        }
        if name.contains("broken") {
            return Err(AppError::conversion("Mesh is not a closed surface"));
        }
        if name.contains("slow") {
            return Err(AppError::timeout("FreeCAD timed out after 600s"));
        }

        if name.starts_with("vanish") {
            tokio::fs::remove_file(&request.input_path).await?;
        }

        let body = b"ISO-10303-21;\nEND-ISO-10303-21;\n";
        tokio::fs::write(&request.output_path, body).await?;
        Ok(ConversionOutcome {
            output_path: request.output_path.clone(),
            output_bytes: body.len() as u64,
            strategy: SolidStrategy::Direct,
            duration: Duration::from_millis(3),
        })
    }
}

#[derive(Debug, Default)]
struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    fn push(&self, event: String) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl BatchReporter for RecordingReporter {
    fn discovered(&self, _input_dir: &Path, files: &[String]) {
        self.push(format!("discovered {}", files.len()));
    }

    fn converting(&self, input_name: &str) {
        self.push(format!("converting {input_name}"));
    }

    fn converted(&self, _input_name: &str, output_name: &str, _outcome: &ConversionOutcome) {
        self.push(format!("created {output_name}"));
    }

    fn conversion_failed(&self, input_name: &str, error: &AppError) {
        self.push(format!("error {input_name}: {}", error.message));
    }

    fn removed(&self, input_name: &str) {
        self.push(format!("removed {input_name}"));
    }

    fn removal_failed(&self, input_name: &str, _error: &std::io::Error) {
        self.push(format!("warning {input_name}"));
    }

    fn finished(&self, report: &BatchReport) {
        self.push(format!(
            "finished {} ok / {} failed",
            report.successful(),
            report.failed()
        ));
    }
}

fn processor(root: &Path, options: BatchOptions) -> BatchProcessor {
    let layout = BatchLayout::new(root.join("stl_files"), root.join("step_files"), "stl", "step");
    BatchProcessor::new(layout, Arc::new(FakeConverter), options)
}

fn seed(root: &Path, names: &[&str]) {
    let dir = root.join("stl_files");
    std::fs::create_dir_all(&dir).expect("mkdir");
    for name in names {
        std::fs::write(dir.join(name), b"solid m\nendsolid m\n").expect("write");
    }
}

#[tokio::test]
async fn test_empty_batch() {
    let temp = tempfile::tempdir().expect("tempdir");
    let reporter = RecordingReporter::default();

    let report = processor(temp.path(), BatchOptions::default())
        .run(&reporter)
        .await
        .expect("run");

    assert_eq!(report.discovered, 0);
    assert_eq!(report.successful(), 0);
    assert_eq!(report.failed(), 0);
    assert!(report.removed.is_empty());
    assert_eq!(reporter.events(), vec!["discovered 0"]);

    // Setup still created both directories
    assert!(temp.path().join("stl_files").is_dir());
    assert!(temp.path().join("step_files").is_dir());
}

#[tokio::test]
async fn test_success_replaces_source_with_output() {
    let temp = tempfile::tempdir().expect("tempdir");
    seed(temp.path(), &["cube.stl"]);
    let reporter = RecordingReporter::default();

    let report = processor(temp.path(), BatchOptions::default())
        .run(&reporter)
        .await
        .expect("run");

    assert_eq!(report.successful(), 1);
    assert!(temp.path().join("step_files/cube.step").is_file());
    assert!(!temp.path().join("stl_files/cube.stl").exists());
    assert_eq!(report.removed, vec!["cube.stl"]);
    assert_eq!(
        reporter.events(),
        vec![
            "discovered 1",
            "converting cube.stl",
            "created cube.step",
            "removed cube.stl",
            "finished 1 ok / 0 failed",
        ]
    );
}

#[tokio::test]
async fn test_failure_keeps_source_and_creates_no_output() {
    let temp = tempfile::tempdir().expect("tempdir");
    seed(temp.path(), &["broken.stl"]);
    let reporter = RecordingReporter::default();

    let report = processor(temp.path(), BatchOptions::default())
        .run(&reporter)
        .await
        .expect("run");

    assert_eq!(report.failed(), 1);
    assert_eq!(report.successful(), 0);
    assert!(temp.path().join("stl_files/broken.stl").is_file());
    assert!(!temp.path().join("step_files/broken.step").exists());
    assert!(
        reporter
            .events()
            .contains(&"error broken.stl: Mesh is not a closed surface".to_string())
    );
    match &report.outcomes[0].status {
        FileStatus::Failed { error } => assert_eq!(error, "Mesh is not a closed surface"),
        other => panic!("unexpected status: {:?}", other),
    }
}

#[tokio::test]
async fn test_partial_output_is_discarded() {
    let temp = tempfile::tempdir().expect("tempdir");
    seed(temp.path(), &["partial.stl"]);

    let report = processor(temp.path(), BatchOptions::default())
        .run(&NullReporter)
        .await
        .expect("run");

    assert_eq!(report.failed(), 1);
    assert!(!temp.path().join("step_files/partial.step").exists());
}

#[tokio::test]
async fn test_existing_output_survives_failure() {
    let temp = tempfile::tempdir().expect("tempdir");
    seed(temp.path(), &["partial.stl"]);
    let out = temp.path().join("step_files");
    std::fs::create_dir_all(&out).expect("mkdir");
    std::fs::write(out.join("partial.step"), b"previous run").expect("write");

    processor(temp.path(), BatchOptions::default())
        .run(&NullReporter)
        .await
        .expect("run");

    assert!(out.join("partial.step").exists());
}

#[tokio::test]
async fn test_mixed_batch_counts_add_up() {
    let temp = tempfile::tempdir().expect("tempdir");
    seed(
        temp.path(),
        &["cube.stl", "sphere.STL", "broken.stl", "slow.stl", "readme.txt"],
    );
    let reporter = RecordingReporter::default();

    let report = processor(temp.path(), BatchOptions::default())
        .run(&reporter)
        .await
        .expect("run");

    assert_eq!(report.discovered, 4);
    assert_eq!(report.successful(), 2);
    assert_eq!(report.failed(), 2);
    assert_eq!(report.successful() + report.failed(), report.discovered);

    let names: Vec<_> = report.outcomes.iter().map(|o| o.input_name.as_str()).collect();
    assert_eq!(names, vec!["broken.stl", "cube.stl", "slow.stl", "sphere.STL"]);

    assert!(temp.path().join("step_files/sphere.step").is_file());
    assert!(temp.path().join("stl_files/readme.txt").is_file());
    assert!(temp.path().join("stl_files/slow.stl").is_file());

    assert_eq!(report.metrics.attempted, 4);
    assert_eq!(report.metrics.timed_out, 1);
    assert_eq!(report.metrics.sources_removed, 2);

    // Removals happen after every conversion has been attempted
    let events = reporter.events();
    let last_convert = events
        .iter()
        .rposition(|e| e.starts_with("converting"))
        .expect("converting event");
    let first_remove = events
        .iter()
        .position(|e| e.starts_with("removed"))
        .expect("removed event");
    assert!(first_remove > last_convert);
}

#[tokio::test]
async fn test_keep_sources() {
    let temp = tempfile::tempdir().expect("tempdir");
    seed(temp.path(), &["cube.stl"]);

    let options = BatchOptions {
        delete_sources: false,
        ..BatchOptions::default()
    };
    let report = processor(temp.path(), options)
        .run(&NullReporter)
        .await
        .expect("run");

    assert_eq!(report.successful(), 1);
    assert!(report.removed.is_empty());
    assert!(temp.path().join("stl_files/cube.stl").is_file());
    assert!(temp.path().join("step_files/cube.step").is_file());
}

#[tokio::test]
async fn test_second_run_retries_only_failures() {
    let temp = tempfile::tempdir().expect("tempdir");
    seed(temp.path(), &["cube.stl", "broken.stl"]);
    let proc = processor(temp.path(), BatchOptions::default());

    let first = proc.run(&NullReporter).await.expect("first");
    assert_eq!(first.discovered, 2);

    let second = proc.run(&NullReporter).await.expect("second");
    assert_eq!(second.discovered, 1);
    assert_eq!(second.outcomes[0].input_name, "broken.stl");

    // Counters describe the second run only
    assert_eq!(second.metrics.attempted, 1);
    assert_eq!(second.metrics.succeeded, 0);
    assert_eq!(second.metrics.failed, 1);
    assert_eq!(second.metrics.sources_removed, 0);
}

#[tokio::test]
async fn test_removal_failure_is_a_warning_only() {
    let temp = tempfile::tempdir().expect("tempdir");
    seed(temp.path(), &["vanish.stl"]);
    let reporter = RecordingReporter::default();

    let report = processor(temp.path(), BatchOptions::default())
        .run(&reporter)
        .await
        .expect("run");

    assert_eq!(report.successful(), 1);
    assert_eq!(report.failed(), 0);
    assert!(report.removed.is_empty());
    assert_eq!(report.removal_failures.len(), 1);
    assert_eq!(report.removal_failures[0].input_name, "vanish.stl");
    assert_eq!(report.metrics.removal_failures, 1);
    assert!(temp.path().join("step_files/vanish.step").is_file());
    assert_eq!(
        reporter.events(),
        vec![
            "discovered 1",
            "converting vanish.stl",
            "created vanish.step",
            "warning vanish.stl",
            "finished 1 ok / 0 failed",
        ]
    );
}
