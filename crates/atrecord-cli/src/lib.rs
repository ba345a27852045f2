//! # atrecord-cli — Record Verification Command Line
//!
//! Provides the `atrecord` binary on top of the verification crates.
//!
//! ## Subcommands
//!
//! - `atrecord verify`: Check a claimed record against a repository container.
//! - `atrecord inspect`: Print a container's roots, commit and tree entries.
//! - `atrecord extract`: Cut a single-record proof container out of a full
//!   repository container.
//!
//! ```bash
//! atrecord verify --uri at://did:plc:abc/app.bsky.feed.post/3k2a \
//!     --cid bafyrei... --record post.json --did-doc did.json --car repo.car
//! atrecord inspect repo.car
//! atrecord extract repo.car --key app.bsky.feed.post/3k2a --out proof.car
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; verification logic lives in the library
//!   crates.
//! - Handlers return an exit code; errors are reported once by `main`.

pub mod extract;
pub mod fetcher;
pub mod inspect;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};
use atrecord_verify::VerifyConfig;

/// Load the verification config: the YAML file when given, defaults
/// otherwise, then `ATRECORD_*` environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<VerifyConfig> {
    let config = match path {
        Some(p) => VerifyConfig::from_file(p)
            .with_context(|| format!("failed to load config: {}", p.display()))?,
        None => VerifyConfig::default(),
    };
    config
        .with_env_overrides()
        .context("invalid ATRECORD_* environment override")
}

/// Read a file, naming it in the error.
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
pub(crate) mod testutil {
    use atrecord_core::{Did, DidDocument, Value, VerificationMethod};
    use atrecord_crypto::{KeyAlgorithm, SigningKeypair};
    use atrecord_repo::Repository;

    pub const DID: &str = "did:plc:clitestaccount";

    pub fn post(i: usize) -> Value {
        Value::map([
            ("$type", Value::from("app.bsky.feed.post")),
            ("text", Value::from(format!("cli post {i}"))),
        ])
    }

    pub fn key(i: usize) -> String {
        format!("app.bsky.feed.post/3kcli{i:03}")
    }

    pub fn repo() -> (Repository, DidDocument) {
        let kp = SigningKeypair::from_seed(KeyAlgorithm::P256, &[9u8; 32]).unwrap();
        let repo = Repository::create(
            Did::new(DID).unwrap(),
            (0..10).map(|i| (key(i), post(i))),
            "3kzzclitest22",
            &kp,
        )
        .unwrap();
        let doc = DidDocument {
            id: DID.to_string(),
            also_known_as: vec![],
            verification_method: vec![VerificationMethod {
                id: format!("{DID}#atproto"),
                method_type: "Multikey".into(),
                controller: DID.into(),
                public_key_multibase: Some(kp.public_key().to_multikey()),
            }],
            service: vec![],
        };
        (repo, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_defaults() {
        let config = VerifyConfig::default().with_overrides(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config, VerifyConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atrecord.yaml");
        std::fs::write(&path, "max_car_bytes: 4096\naccept_legacy_key_types: true\n").unwrap();
        let config = VerifyConfig::from_file(&path).unwrap();
        assert_eq!(config.max_car_bytes, 4096);
        assert!(config.accept_legacy_key_types);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/atrecord.yaml"))).unwrap_err();
        assert!(format!("{err:#}").contains("failed to load config"));
    }

    #[test]
    fn test_read_file_names_path() {
        let err = read_file(Path::new("/nonexistent/file.car")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/file.car"));
    }
}
