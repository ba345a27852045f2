//! # Inspect Subcommand
//!
//! Prints what a CAR container holds: its roots, the commit at the root
//! and every tree entry reachable from the commit.

use std::path::PathBuf;

use anyhow::{Context, Result};
use atrecord_repo::{read_car_with_limits, Car, Commit, MstWalker};
use atrecord_verify::VerifyConfig;
use clap::Args;
use serde_json::json;

use crate::read_file;

/// Arguments for `atrecord inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// CAR file to inspect.
    pub car: PathBuf,

    /// Print as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the inspect subcommand. Exits `2` when the tree cannot be
/// walked completely.
pub fn run_inspect(args: &InspectArgs, config: &VerifyConfig) -> Result<u8> {
    let bytes = read_file(&args.car)?;
    let car = read_car_with_limits(&bytes, config.car_limits())
        .with_context(|| format!("failed to read CAR: {}", args.car.display()))?;

    let commit = match car.roots() {
        [root] => Some(car.blocks.read_block(root, Commit::from_value)),
        _ => None,
    };
    let mut entries = Vec::new();
    let mut walk_error = None;
    if let Some(Ok(commit)) = &commit {
        for item in MstWalker::new(&car.blocks, commit.data().clone()) {
            match item {
                Ok(entry) => entries.push(entry),
                Err(e) => walk_error = Some(e.to_string()),
            }
        }
    }

    if args.json {
        let commit_json = match &commit {
            Some(Ok(c)) => json!({
                "did": c.did().as_str(),
                "version": c.version(),
                "rev": c.rev(),
                "data": c.data().to_string(),
                "prev": c.prev().map(ToString::to_string),
            }),
            Some(Err(e)) => json!({ "error": e.to_string() }),
            None => serde_json::Value::Null,
        };
        let out = json!({
            "roots": car.roots().iter().map(ToString::to_string).collect::<Vec<_>>(),
            "blocks": car.blocks.len(),
            "commit": commit_json,
            "entries": entries
                .iter()
                .map(|(k, v)| json!({ "key": k, "cid": v.to_string() }))
                .collect::<Vec<_>>(),
            "walk_error": walk_error,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_text(&car, commit.as_ref(), &entries, walk_error.as_deref());
    }
    Ok(if walk_error.is_some() { 2 } else { 0 })
}

fn print_text(
    car: &Car,
    commit: Option<&Result<Commit, atrecord_repo::BlockError>>,
    entries: &[(String, atrecord_core::Cid)],
    walk_error: Option<&str>,
) {
    println!("roots:  {}", car.roots().len());
    for root in car.roots() {
        println!("  {root}");
    }
    println!("blocks: {}", car.blocks.len());
    match commit {
        Some(Ok(c)) => {
            println!("commit:");
            println!("  did:     {}", c.did());
            println!("  version: {}", c.version());
            println!("  rev:     {}", c.rev().unwrap_or("-"));
            println!("  data:    {}", c.data());
        }
        Some(Err(e)) => println!("commit: unreadable ({e})"),
        None => println!("commit: none (container does not have exactly one root)"),
    }
    if !entries.is_empty() {
        println!("entries: {}", entries.len());
        for (key, cid) in entries {
            println!("  {key}  {cid}");
        }
    }
    if let Some(e) = walk_error {
        println!("tree walk stopped: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    fn write(bytes: &[u8]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo.car");
        std::fs::write(&path, bytes).unwrap();
        (dir, path)
    }

    #[test]
    fn test_inspect_full_repository() {
        let (repo, _) = testutil::repo();
        let (_dir, car) = write(&repo.to_car().unwrap());
        for json in [false, true] {
            let args = InspectArgs { car: car.clone(), json };
            assert_eq!(run_inspect(&args, &VerifyConfig::default()).unwrap(), 0);
        }
    }

    #[test]
    fn test_inspect_missing_tree_stops_walk() {
        let (repo, _) = testutil::repo();
        let root = repo.root();
        let commit = repo.blocks().get(root).unwrap();
        let bytes = atrecord_repo::write_car(std::slice::from_ref(root), [(root, commit)]).unwrap();
        let (_dir, car) = write(&bytes);
        let args = InspectArgs { car, json: false };
        assert_eq!(run_inspect(&args, &VerifyConfig::default()).unwrap(), 2);
    }

    #[test]
    fn test_inspect_garbage_is_error() {
        let (_dir, car) = write(b"garbage");
        let args = InspectArgs { car, json: true };
        assert!(run_inspect(&args, &VerifyConfig::default()).is_err());
    }
}
