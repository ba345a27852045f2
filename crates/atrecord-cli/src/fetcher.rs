//! # Local Container Fetcher
//!
//! Serves record containers from disk: either one CAR file for every
//! request, or a directory holding one repository CAR per account named
//! `<did>.car` with `:` replaced by `_`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use atrecord_verify::{FetchError, RecordFetcher, RecordRequest};

/// Where containers are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarSource {
    File(PathBuf),
    Directory(PathBuf),
}

/// A [`RecordFetcher`] backed by the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFetcher {
    source: CarSource,
}

impl LocalFetcher {
    pub fn new(source: CarSource) -> Self {
        Self { source }
    }

    /// The file that would answer `request`.
    pub fn path_for(&self, request: &RecordRequest) -> PathBuf {
        match &self.source {
            CarSource::File(path) => path.clone(),
            CarSource::Directory(dir) => dir.join(car_file_name(request.did.as_str())),
        }
    }
}

fn car_file_name(did: &str) -> String {
    format!("{}.car", did.replace(':', "_"))
}

#[async_trait]
impl RecordFetcher for LocalFetcher {
    async fn fetch_record_car(&self, request: &RecordRequest) -> Result<Vec<u8>, FetchError> {
        let path = self.path_for(request);
        tracing::debug!(path = %path.display(), did = %request.did, "reading container");
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FetchError::NotFound(display(&path))),
            Err(e) => Err(e.into()),
        }
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrecord_core::{Did, Nsid, RecordKey};

    fn request(did: &str) -> RecordRequest {
        RecordRequest {
            did: Did::new(did).unwrap(),
            collection: Nsid::new("app.bsky.feed.post").unwrap(),
            rkey: RecordKey::new("3kabc").unwrap(),
        }
    }

    #[test]
    fn test_directory_layout() {
        let fetcher = LocalFetcher::new(CarSource::Directory(PathBuf::from("/repos")));
        assert_eq!(
            fetcher.path_for(&request("did:plc:abc123")),
            PathBuf::from("/repos/did_plc_abc123.car")
        );
        assert_eq!(
            fetcher.path_for(&request("did:web:example.com")),
            PathBuf::from("/repos/did_web_example.com.car")
        );
    }

    #[tokio::test]
    async fn test_file_source_serves_every_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo.car");
        std::fs::write(&path, b"car bytes").unwrap();
        let fetcher = LocalFetcher::new(CarSource::File(path));
        for did in ["did:plc:a", "did:plc:b"] {
            assert_eq!(fetcher.fetch_record_car(&request(did)).await.unwrap(), b"car bytes");
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = LocalFetcher::new(CarSource::Directory(dir.path().to_path_buf()));
        let err = fetcher.fetch_record_car(&request("did:plc:nobody")).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound(p) if p.ends_with("did_plc_nobody.car")));
    }
}
