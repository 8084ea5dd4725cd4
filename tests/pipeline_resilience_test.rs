mod common;

use std::sync::Arc;

use common::{Corpus, record_document, scan_dir, scan_files};
use parking_lot::Mutex;
use xml_shape::{
    EventCallback, FailurePolicy, FileStatus, PipelineConfig, PipelineEvent, ShapeError,
    ShapeScanner, render_schema,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_one_corrupt_file_among_hundred() {
    let mut corpus = Corpus::new();
    let valid: Vec<_> = (0..100)
        .map(|i| corpus.add(&format!("ok/{:03}.xml", i), &record_document(i)))
        .collect();
    let corrupt = corpus.add("ok/050-corrupt.xml", "<export><record id=\"x\"></export>");

    let mut with_corrupt = valid.clone();
    with_corrupt.insert(50, corrupt.clone());

    let clean = scan_files(valid, 4, 2).await;
    let dirty = scan_files(with_corrupt, 4, 2).await;

    assert_eq!(clean.documents, 100);
    assert_eq!(dirty.documents, 100);
    assert_eq!(clean.elements.snapshot(100), dirty.elements.snapshot(100));
    assert_eq!(
        render_schema(&clean.elements, clean.documents).unwrap(),
        render_schema(&dirty.elements, dirty.documents).unwrap()
    );

    assert_eq!(dirty.report.total_files, 101);
    assert_eq!(dirty.report.failed_files, 1);
    assert_eq!(dirty.report.skipped.len(), 1);
    assert_eq!(dirty.report.skipped[0].path, corrupt);
    assert!(dirty.report.skipped[0].status.is_failed());
    assert!(!dirty.report.aborted);
}

#[tokio::test]
async fn test_unreadable_inputs_do_not_stop_the_run() {
    let mut corpus = Corpus::new();
    let mut files = vec![
        corpus.add("a.xml", "<root><a/></root>"),
        corpus.add("truncated.xml", "<root><a>"),
        corpus.add("stray-end.xml", "</root>"),
        corpus.add("blank.xml", ""),
        corpus.add("b.xml", "<root><b/></root>"),
    ];
    files.insert(2, corpus.path().join("does-not-exist.xml"));

    let results = scan_files(files, 3, 0).await;

    assert_eq!(results.documents, 2);
    assert_eq!(results.report.parsed_files, 2);
    assert_eq!(results.report.empty_files, 1);
    assert_eq!(results.report.failed_files, 3);
    assert_eq!(
        render_schema(&results.elements, results.documents).unwrap(),
        concat!(
            "\n<root _count=\"2\">",
            "\n  <a _count=\"1\" _optional=\"true\" />",
            "\n  <b _count=\"1\" _optional=\"true\" />",
            "\n</root>\n",
        )
    );
}

#[tokio::test]
async fn test_fail_fast_aborts_and_keeps_partial_results() {
    let mut corpus = Corpus::new();
    corpus.add("000.xml", "<root>");
    for i in 1..300 {
        corpus.add(&format!("{:03}.xml", i), "<root><a/></root>");
    }

    let config = PipelineConfig::with_pipe_size(1, 0).with_failure_policy(FailurePolicy::FailFast);
    let results = scan_dir(corpus.path(), config).await;

    assert!(results.report.aborted);
    assert_eq!(results.report.failed_files, 1);
    assert!(results.report.unprocessed_files > 0);
    assert_eq!(results.documents, results.report.parsed_files);
    assert!(results.documents < 299);
    match results.report.ensure_complete() {
        Err(ShapeError::Aborted { file, .. }) => assert!(file.ends_with("000.xml")),
        other => panic!("Expected Aborted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_skips_never_trigger_fail_fast() {
    let mut corpus = Corpus::new();
    corpus.add("0-empty.xml", "<?xml version=\"1.0\"?>");
    corpus.add("1-other.xml", "<other/>");
    for i in 2..20 {
        corpus.add(&format!("{}-rec.xml", i), "<wrap><rec/></wrap>");
    }

    let config = PipelineConfig::with_pipe_size(2, 0)
        .with_root_tag(Some("rec".to_string()))
        .with_failure_policy(FailurePolicy::FailFast);
    let results = scan_dir(corpus.path(), config).await;

    assert!(!results.report.aborted);
    assert_eq!(results.documents, 18);
    assert_eq!(results.report.empty_files, 1);
    assert_eq!(results.report.unmatched_files, 1);
    assert!(matches!(
        results.report.skipped.iter().find(|o| o.path.ends_with("1-other.xml")).map(|o| &o.status),
        Some(FileStatus::Unmatched { root_tag }) if root_tag == "rec"
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_progress_events_cover_every_file() {
    let mut corpus = Corpus::new();
    for i in 0..40 {
        corpus.add(&format!("{}.xml", i), &record_document(i));
    }
    corpus.add("bad.xml", "<export>");

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let callback: EventCallback = Arc::new(move |event: &PipelineEvent| {
        sink.lock().push(event.clone());
    });

    let results = ShapeScanner::new(PipelineConfig::with_pipe_size(4, 1))
        .scan_files(corpus.files().to_vec(), Some(callback))
        .await
        .unwrap();

    let events = events.lock();
    assert_eq!(events.len(), 41);
    assert!(events.iter().all(|e| e.total == 41));
    assert_eq!(events.iter().map(|e| e.completed).max(), Some(41));
    assert_eq!(
        events.iter().filter(|e| e.outcome.status.is_failed()).count(),
        results.report.failed_files
    );
}
