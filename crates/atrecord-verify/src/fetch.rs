//! # Record Fetching
//!
//! The orchestrator's only outside dependency: given a repository DID,
//! collection and record key, obtain the CAR container the host serves for
//! that record (commit, MST path, record block). Implementations decide
//! the transport; the orchestrator never retries and imposes no timeout of
//! its own. Dropping the verification future cancels the fetch.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use atrecord_core::{Did, Nsid, RecordKey};
use serde::Serialize;
use thiserror::Error;

/// Identifies the record whose container is requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRequest {
    pub did: Did,
    pub collection: Nsid,
    pub rkey: RecordKey,
}

/// Why a container could not be obtained.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The host has no such repository or record.
    #[error("not found: {0}")]
    NotFound(String),

    /// The host could not be reached or answered with an error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Local I/O failure in a file-backed fetcher.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of record containers.
///
/// Implementations must be `Send + Sync` so one fetcher can serve many
/// concurrent verifications.
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    /// Fetch the CAR bytes for `request`.
    async fn fetch_record_car(&self, request: &RecordRequest) -> Result<Vec<u8>, FetchError>;
}

#[async_trait]
impl<T: RecordFetcher + ?Sized> RecordFetcher for Arc<T> {
    async fn fetch_record_car(&self, request: &RecordRequest) -> Result<Vec<u8>, FetchError> {
        (**self).fetch_record_car(request).await
    }
}

#[async_trait]
impl<T: RecordFetcher + ?Sized> RecordFetcher for Box<T> {
    async fn fetch_record_car(&self, request: &RecordRequest) -> Result<Vec<u8>, FetchError> {
        (**self).fetch_record_car(request).await
    }
}

/// Adapts an async closure into a [`RecordFetcher`].
pub struct FnFetcher<F> {
    f: F,
}

/// Wrap `f` as a fetcher. The closure receives an owned copy of the
/// request.
pub fn fetcher_fn<F, Fut>(f: F) -> FnFetcher<F>
where
    F: Fn(RecordRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>, FetchError>> + Send + 'static,
{
    FnFetcher { f }
}

#[async_trait]
impl<F, Fut> RecordFetcher for FnFetcher<F>
where
    F: Fn(RecordRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>, FetchError>> + Send + 'static,
{
    async fn fetch_record_car(&self, request: &RecordRequest) -> Result<Vec<u8>, FetchError> {
        (self.f)(request.clone()).await
    }
}
