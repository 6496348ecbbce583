//! Remote service seams
//!
//! The object store and the function service are the pipeline's two external
//! collaborators. They sit behind traits so the pipeline can be exercised
//! against in-memory fakes; the AWS-backed implementations live in
//! [`crate::aws`].

use async_trait::async_trait;

use crate::config::Architecture;
use crate::Result;

/// Stores the packaged archive under a bucket/key pair
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Put the whole body under `key` in `bucket`, overwriting any previous
    /// object at that key
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;
}

/// Repoints a named function at an uploaded archive
#[async_trait]
pub trait FunctionService: Send + Sync {
    /// Make `bucket`/`key` the function's live code for `architecture`, as a
    /// direct, immediately-effective code swap
    async fn update_function_code(
        &self,
        function_name: &str,
        bucket: &str,
        key: &str,
        architecture: Architecture,
    ) -> Result<()>;
}
