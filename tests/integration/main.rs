//! Integration tests for bucketwalk.
//!
//! Most tests walk temporary local buckets and need no setup. The S3 tests
//! require LocalStack and are marked `#[ignore]`.
//!
//! ## Running the S3 tests
//!
//! 1. Start LocalStack and create a bucket:
//!    ```bash
//!    docker run -d -p 4566:4566 localstack/localstack
//!    aws --endpoint-url http://localhost:4566 s3 mb s3://bw-test
//!    ```
//!
//! 2. Run the ignored tests:
//!    ```bash
//!    LOCALSTACK_ENDPOINT=http://localhost:4566 BW_TEST_BUCKET=bw-test \
//!      cargo test -p integration-tests -- --ignored
//!    ```

mod common;
mod s3_test;
mod walk_test;
