//! # Extract Subcommand
//!
//! Cuts the proof for one record out of a full repository container: the
//! commit, the tree nodes on the path to the key and the record block.
//! The output is what a host returns for a single-record sync request.

use std::path::PathBuf;

use anyhow::{Context, Result};
use atrecord_repo::Repository;
use atrecord_verify::VerifyConfig;
use clap::Args;

use crate::read_file;

/// Arguments for `atrecord extract`.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Full repository CAR file.
    pub car: PathBuf,

    /// Tree key of the record (`<collection>/<rkey>`).
    #[arg(long)]
    pub key: String,

    /// Where to write the proof container.
    #[arg(long)]
    pub out: PathBuf,
}

/// Execute the extract subcommand. A key absent from the tree still
/// produces a proof of absence.
pub fn run_extract(args: &ExtractArgs, config: &VerifyConfig) -> Result<u8> {
    let bytes = read_file(&args.car)?;
    let repo = Repository::from_car(&bytes, config.car_limits())
        .with_context(|| format!("not a repository CAR: {}", args.car.display()))?;
    let proof = repo
        .record_proof_car(&args.key)
        .with_context(|| format!("failed to build proof for {}", args.key))?;
    std::fs::write(&args.out, &proof)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    match repo.get(&args.key)? {
        Some(cid) => println!("{}  {cid}", args.key),
        None => println!("{}  (absent)", args.key),
    }
    println!("wrote {} bytes to {}", proof.len(), args.out.display());
    tracing::info!(key = %args.key, bytes = proof.len(), "proof extracted");
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use atrecord_repo::read_car;

    #[test]
    fn test_extract_present_and_absent_keys() {
        let (repo, _) = testutil::repo();
        let dir = tempfile::tempdir().unwrap();
        let car = dir.path().join("repo.car");
        std::fs::write(&car, repo.to_car().unwrap()).unwrap();

        for key in [testutil::key(3), "app.bsky.feed.post/zzzz".to_string()] {
            let out = dir.path().join("proof.car");
            let args = ExtractArgs {
                car: car.clone(),
                key: key.clone(),
                out: out.clone(),
            };
            assert_eq!(run_extract(&args, &VerifyConfig::default()).unwrap(), 0);
            let proof = read_car(&std::fs::read(&out).unwrap()).unwrap();
            assert_eq!(proof.roots(), std::slice::from_ref(repo.root()));
            assert!(proof.blocks.len() < repo.blocks().len());
        }
    }

    #[test]
    fn test_extract_rejects_non_repository() {
        let dir = tempfile::tempdir().unwrap();
        let car = dir.path().join("repo.car");
        std::fs::write(&car, b"nope").unwrap();
        let args = ExtractArgs {
            car,
            key: testutil::key(0),
            out: dir.path().join("proof.car"),
        };
        assert!(run_extract(&args, &VerifyConfig::default()).is_err());
    }
}
