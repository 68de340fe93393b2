//! End-to-end walks over local buckets.

use crate::common::{Collector, TestBucket, generate_records};
use async_trait::async_trait;
use bw_error::WalkError;
use bw_query::{QueryMode, QuerySet};
use bw_reader_jsonl::DecoderConfig;
use bw_source::{SourceConfig, open_source};
use bw_traits::{FnCallback, RecordCallback, RecordResult};
use bw_types::{Compression, FormatStyle, InvalidRecordPolicy};
use bw_walker::{ExcludeFilter, WalkOptions, WalkTarget, walk_all, walk_uri};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

fn put_records(bucket: &TestBucket, name: &str, n: usize) -> Vec<String> {
    let records = generate_records(name, n);
    let lines: Vec<&str> = records.iter().map(String::as_str).collect();
    bucket.put(name, &lines);
    records
}

fn default_exclude() -> Arc<ExcludeFilter> {
    Arc::new(ExcludeFilter::new(&["index*"]).unwrap())
}

#[tokio::test]
async fn test_every_record_in_object_order() {
    let bucket = TestBucket::new();
    let expected: Vec<(String, Vec<String>)> = ["a.jsonl", "b/b.jsonl", "c/d/c.jsonl"]
        .iter()
        .map(|name| (name.to_string(), put_records(&bucket, name, 200)))
        .collect();

    let collector = Arc::new(Collector::new());
    let options = WalkOptions::new(bucket.uri(), collector.clone()).with_workers(3);

    let stats = walk_uri(&CancellationToken::new(), &options, &SourceConfig::default())
        .await
        .unwrap();

    assert_eq!(stats.objects_listed, 3);
    assert_eq!(stats.objects_opened, 3);
    assert_eq!(stats.records_read, 600);
    assert_eq!(stats.records_delivered, 600);
    assert!(!stats.cancelled);
    assert_eq!(collector.error_count(), 0);

    for (name, records) in &expected {
        assert_eq!(&collector.bodies_of(name), records, "order of {name}");
    }
}

#[tokio::test]
async fn test_open_objects_bounded_by_workers() {
    let bucket = TestBucket::new();
    for i in 0..16 {
        put_records(&bucket, &format!("part-{i:02}.jsonl"), 50);
    }

    let collector = Arc::new(Collector::new());
    let options = WalkOptions::new(bucket.uri(), collector.clone()).with_workers(4);

    let stats = walk_uri(&CancellationToken::new(), &options, &SourceConfig::default())
        .await
        .unwrap();

    assert_eq!(stats.objects_opened, 16);
    assert!(stats.peak_open >= 1);
    assert!(stats.peak_open <= 4, "peak_open = {}", stats.peak_open);
    assert_eq!(collector.records().len(), 800);
}

#[tokio::test]
async fn test_latlong_query_selects_records_with_coordinates() {
    let bucket = TestBucket::new();
    bucket.put(
        "items.jsonl",
        &[
            r#"{"id":1,"latlong":"38.88,-77.03"}"#,
            r#"{"id":2,"title":"no coordinates"}"#,
            r#"{"id":3,"latlong":"40.71,-74.00"}"#,
        ],
    );

    let collector = Arc::new(Collector::new());
    let options = WalkOptions::new(bucket.uri(), collector.clone())
        .with_query_set(QuerySet::parse(&["latlong=.*"], QueryMode::All).unwrap());

    let stats = walk_uri(&CancellationToken::new(), &options, &SourceConfig::default())
        .await
        .unwrap();

    assert_eq!(
        collector.bodies(),
        vec![
            r#"{"id":1,"latlong":"38.88,-77.03"}"#,
            r#"{"id":3,"latlong":"40.71,-74.00"}"#,
        ]
    );
    let indexes: Vec<u64> = collector.records().iter().map(|r| r.index()).collect();
    assert_eq!(indexes, vec![0, 2]);
    assert_eq!(stats.records_read, 3);
    assert_eq!(stats.records_matched, 2);
}

#[tokio::test]
async fn test_query_modes() {
    let bucket = TestBucket::new();
    bucket.put(
        "items.jsonl",
        &[
            r#"{"title":"Map of Boston","date":"1890"}"#,
            r#"{"title":"Map of Salem","date":"1920"}"#,
            r#"{"title":"Letter","date":"1890"}"#,
        ],
    );
    let queries = ["title=^Map", "date=^18"];

    for (mode, expected) in [(QueryMode::All, 1), (QueryMode::Any, 3)] {
        let collector = Arc::new(Collector::new());
        let options = WalkOptions::new(bucket.uri(), collector.clone())
            .with_query_set(QuerySet::parse(&queries, mode).unwrap());
        walk_uri(&CancellationToken::new(), &options, &SourceConfig::default())
            .await
            .unwrap();
        assert_eq!(collector.records().len(), expected, "mode {mode:?}");
    }

    // An empty query set matches everything
    let collector = Arc::new(Collector::new());
    let options = WalkOptions::new(bucket.uri(), collector.clone())
        .with_query_set(QuerySet::parse::<&str>(&[], QueryMode::All).unwrap());
    walk_uri(&CancellationToken::new(), &options, &SourceConfig::default())
        .await
        .unwrap();
    assert_eq!(collector.records().len(), 3);
}

#[tokio::test]
async fn test_excluded_index_object_never_opened() {
    let bucket = TestBucket::new();
    put_records(&bucket, "data/0.jsonl", 5);
    bucket.put_raw("data/index.txt", b"not json at all\n");

    let collector = Arc::new(Collector::new());
    let options = WalkOptions::new(bucket.uri(), collector.clone())
        .with_object_filter(default_exclude())
        .with_decoder(DecoderConfig::new().with_validation(true));

    let stats = walk_uri(&CancellationToken::new(), &options, &SourceConfig::default())
        .await
        .unwrap();

    assert_eq!(stats.objects_listed, 2);
    assert_eq!(stats.objects_filtered, 1);
    assert_eq!(stats.objects_opened, 1);
    assert_eq!(collector.error_count(), 0);
    assert!(
        collector
            .records()
            .iter()
            .all(|r| r.source_object() == "data/0.jsonl")
    );
}

#[tokio::test]
async fn test_formatted_records_reparse_equal() {
    let originals = [
        r#"{"z":1,"a":{"y":[1,2,{"q":null}],"b":"text"}}"#,
        r#"{"name":"café","n":-3.5e2,"t":true}"#,
        r#"[{"b":1,"a":2},"x"]"#,
    ];
    let bucket = TestBucket::new();
    bucket.put("items.jsonl", &originals);

    for style in [FormatStyle::Compact, FormatStyle::Pretty] {
        let collector = Arc::new(Collector::new());
        let options = WalkOptions::new(bucket.uri(), collector.clone())
            .with_decoder(DecoderConfig::new().with_format(style));
        walk_uri(&CancellationToken::new(), &options, &SourceConfig::default())
            .await
            .unwrap();

        let bodies = collector.bodies();
        assert_eq!(bodies.len(), originals.len());
        for (body, original) in bodies.iter().zip(originals) {
            let reparsed: serde_json::Value = serde_json::from_str(body).unwrap();
            let expected: serde_json::Value = serde_json::from_str(original).unwrap();
            assert_eq!(reparsed, expected);
        }
    }
}

#[tokio::test]
async fn test_gzip_bucket() {
    let bucket = TestBucket::new();
    bucket.put_gzip("a.jsonl.gz", &[r#"{"a":1}"#, r#"{"a":2}"#]);
    bucket.put_gzip("b.jsonl.gz", &[r#"{"b":1}"#]);

    let collector = Arc::new(Collector::new());
    let options = WalkOptions::new(bucket.uri(), collector.clone())
        .with_decoder(DecoderConfig::new().with_compression(Compression::Gzip));

    let stats = walk_uri(&CancellationToken::new(), &options, &SourceConfig::default())
        .await
        .unwrap();

    assert_eq!(stats.records_delivered, 3);
    assert_eq!(collector.bodies_of("a.jsonl.gz"), vec![r#"{"a":1}"#, r#"{"a":2}"#]);
}

#[tokio::test]
async fn test_blank_lines_and_unterminated_final_record() {
    let bucket = TestBucket::new();
    bucket.put_raw("a.jsonl", b"{\"a\":1}\n\n   \n\t{\"a\":2}  \n{\"a\":3}");

    let collector = Arc::new(Collector::new());
    let options = WalkOptions::new(bucket.uri(), collector.clone());
    walk_uri(&CancellationToken::new(), &options, &SourceConfig::default())
        .await
        .unwrap();

    assert_eq!(collector.bodies(), vec![r#"{"a":1}"#, r#"{"a":2}"#, r#"{"a":3}"#]);
    let indexes: Vec<u64> = collector.records().iter().map(|r| r.index()).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_invalid_record_policies() {
    let bucket = TestBucket::new();
    bucket.put("a.jsonl", &[r#"{"a":1}"#, "{broken", r#"{"a":3}"#]);
    let decoder = DecoderConfig::new().with_validation(true);

    // Report: the error reaches the callback, decoding continues
    let collector = Arc::new(Collector::new());
    let options = WalkOptions::new(bucket.uri(), collector.clone()).with_decoder(decoder.clone());
    let stats = walk_uri(&CancellationToken::new(), &options, &SourceConfig::default())
        .await
        .unwrap();
    assert_eq!(collector.bodies(), vec![r#"{"a":1}"#, r#"{"a":3}"#]);
    assert_eq!(collector.error_objects(), vec!["a.jsonl"]);
    assert_eq!(stats.records_invalid, 1);

    // Skip: dropped silently
    let collector = Arc::new(Collector::new());
    let options = WalkOptions::new(bucket.uri(), collector.clone())
        .with_decoder(decoder.clone())
        .with_invalid_records(InvalidRecordPolicy::Skip);
    let stats = walk_uri(&CancellationToken::new(), &options, &SourceConfig::default())
        .await
        .unwrap();
    assert_eq!(collector.records().len(), 2);
    assert_eq!(collector.error_count(), 0);
    assert_eq!(stats.records_skipped, 1);

    // Abort: the walk fails, naming the object
    let collector = Arc::new(Collector::new());
    let options = WalkOptions::new(bucket.uri(), collector.clone())
        .with_decoder(decoder)
        .with_invalid_records(InvalidRecordPolicy::Abort);
    let err = walk_uri(&CancellationToken::new(), &options, &SourceConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, WalkError::Aborted { .. }));
    assert_eq!(err.object(), Some("a.jsonl"));
}

/// Fails on its second invocation.
struct FailSecond {
    calls: AtomicUsize,
    seen: Collector,
}

#[async_trait]
impl RecordCallback for FailSecond {
    async fn on_record(&self, item: RecordResult) -> bw_error::Result<()> {
        self.seen.on_record(item).await?;
        if self.calls.fetch_add(1, Ordering::SeqCst) == 1 {
            return Err(WalkError::Config("sink closed".to_string()));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_callback_error_stops_walk() {
    let bucket = TestBucket::new();
    for i in 0..5 {
        put_records(&bucket, &format!("{i}.jsonl"), 10);
    }

    let callback = Arc::new(FailSecond {
        calls: AtomicUsize::new(0),
        seen: Collector::new(),
    });
    let options = WalkOptions::new(bucket.uri(), callback.clone()).with_workers(1);

    let err = walk_uri(&CancellationToken::new(), &options, &SourceConfig::default())
        .await
        .unwrap_err();

    match &err {
        WalkError::Aborted { uri, source, .. } => {
            assert_eq!(uri, &bucket.uri());
            assert!(matches!(**source, WalkError::Config(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(callback.calls.load(Ordering::SeqCst), 2);

    let records = callback.seen.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].source_object(), records[1].source_object());
    assert_eq!(err.object(), Some(records[0].source_object()));
}

#[tokio::test]
async fn test_cancellation_stops_new_objects() {
    let bucket = TestBucket::new();
    for i in 0..20 {
        put_records(&bucket, &format!("{i:02}.jsonl"), 100);
    }

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let callback = Arc::new(FnCallback::new(move |_item: RecordResult| {
        trigger.cancel();
        Ok(())
    }));
    let options = WalkOptions::new(bucket.uri(), callback).with_workers(2);

    let stats = walk_uri(&cancel, &options, &SourceConfig::default())
        .await
        .unwrap();

    assert!(stats.cancelled);
    assert!(stats.objects_opened <= 2, "opened {}", stats.objects_opened);
    assert!(stats.records_delivered < 2000);
}

#[tokio::test]
async fn test_missing_bucket_is_fatal() {
    let collector = Arc::new(Collector::new());
    let options = WalkOptions::new("file:///nonexistent/bucketwalk/bucket", collector.clone());

    let err = walk_uri(&CancellationToken::new(), &options, &SourceConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, WalkError::Aborted { .. }));
    assert!(collector.records().is_empty());
}

#[tokio::test]
async fn test_walk_all_prefixes() {
    let bucket = TestBucket::new();
    put_records(&bucket, "2020/a.jsonl", 3);
    put_records(&bucket, "2021/b.jsonl", 4);
    put_records(&bucket, "2022/c.jsonl", 5);

    let (source, base_prefix) = open_source(&bucket.uri(), &SourceConfig::default())
        .await
        .unwrap();
    let targets: Vec<WalkTarget> = ["2020", "2021"]
        .iter()
        .map(|p| WalkTarget::under(&bucket.uri(), &base_prefix, p))
        .collect();

    let collector = Arc::new(Collector::new());
    let options = WalkOptions::new(bucket.uri(), collector.clone());
    let stats = walk_all(&CancellationToken::new(), &options, source.clone(), &targets)
        .await
        .unwrap();
    bw_traits::ObjectSource::close(source.as_ref()).await.unwrap();

    assert_eq!(stats.objects_opened, 2);
    assert_eq!(stats.records_delivered, 7);
    assert!(collector.bodies_of("2022/c.jsonl").is_empty());
    assert_eq!(collector.bodies_of("2021/b.jsonl").len(), 4);
    assert!(source.is_closed());
}
