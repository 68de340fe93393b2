//! Walks over an S3-compatible endpoint (LocalStack).
//!
//! The bucket named by `BW_TEST_BUCKET` must already exist.

use crate::common::{Collector, generate_records};
use bw_source::SourceConfig;
use bw_walker::{WalkOptions, walk_uri};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const REGION: &str = "us-east-1";

struct LocalStackContext {
    endpoint: String,
    bucket: String,
}

impl LocalStackContext {
    fn from_env() -> Option<Self> {
        Some(Self {
            endpoint: std::env::var("LOCALSTACK_ENDPOINT").ok()?,
            bucket: std::env::var("BW_TEST_BUCKET").ok()?,
        })
    }

    fn store(&self) -> impl ObjectStore {
        AmazonS3Builder::new()
            .with_bucket_name(&self.bucket)
            .with_region(REGION)
            .with_endpoint(&self.endpoint)
            .with_allow_http(true)
            .with_access_key_id("test")
            .with_secret_access_key("test")
            .build()
            .unwrap()
    }

    fn source_config(&self) -> SourceConfig {
        SourceConfig::new(REGION)
            .with_endpoint(&self.endpoint)
            .with_credentials("test", "test", None)
    }
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_walk_s3_prefix() {
    let Some(ctx) = LocalStackContext::from_env() else {
        eprintln!("LOCALSTACK_ENDPOINT or BW_TEST_BUCKET not set, skipping test");
        return;
    };

    let store = ctx.store();
    for i in 0..3 {
        let name = format!("walk-test/{i}.jsonl");
        let body = generate_records(&name, 25).join("\n");
        store
            .put(&ObjectPath::from(name.as_str()), PutPayload::from(body))
            .await
            .unwrap();
    }
    store
        .put(&ObjectPath::from("elsewhere/x.jsonl"), PutPayload::from("{}\n"))
        .await
        .unwrap();

    let collector = Arc::new(Collector::new());
    let uri = format!("s3://{}/walk-test", ctx.bucket);
    let options = WalkOptions::new(uri, collector.clone()).with_workers(2);

    let stats = walk_uri(&CancellationToken::new(), &options, &ctx.source_config())
        .await
        .unwrap();

    assert_eq!(stats.objects_opened, 3);
    assert_eq!(stats.records_delivered, 75);
    assert_eq!(collector.error_count(), 0);
    assert_eq!(
        collector.bodies_of("walk-test/1.jsonl"),
        generate_records("walk-test/1.jsonl", 25)
    );
}
