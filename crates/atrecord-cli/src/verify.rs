//! # Verify Subcommand
//!
//! Verifies a claimed record read from local JSON files against a
//! container served by a [`LocalFetcher`].
//!
//! Exit codes: `0` when the record verifies, `2` when findings were
//! recorded. Unreadable inputs are errors and exit `1`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use atrecord_core::{DidDocument, Value};
use atrecord_verify::{VerificationResult, Verifier, VerifyConfig};
use clap::{ArgGroup, Args};

use crate::fetcher::{CarSource, LocalFetcher};
use crate::read_file;

/// Exit code when the record does not verify.
pub const EXIT_INVALID: u8 = 2;

/// Arguments for `atrecord verify`.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["car", "car_dir"])))]
pub struct VerifyArgs {
    /// AT-URI of the record (`at://<did-or-handle>/<collection>/<rkey>`).
    #[arg(long)]
    pub uri: String,

    /// Claimed CID of the record.
    #[arg(long)]
    pub cid: String,

    /// JSON file holding the claimed record value.
    #[arg(long)]
    pub record: PathBuf,

    /// JSON file holding the owner's resolved DID document.
    #[arg(long)]
    pub did_doc: PathBuf,

    /// CAR file served for the record.
    #[arg(long)]
    pub car: Option<PathBuf>,

    /// Directory of repository CARs named `<did>.car` (`:` as `_`).
    #[arg(long)]
    pub car_dir: Option<PathBuf>,

    /// Print the findings as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the verify subcommand.
pub fn run_verify(args: &VerifyArgs, config: &VerifyConfig) -> Result<u8> {
    let value = read_record(&args.record)?;
    let doc: DidDocument = serde_json::from_slice(&read_file(&args.did_doc)?)
        .with_context(|| format!("invalid DID document: {}", args.did_doc.display()))?;
    let source = match (&args.car, &args.car_dir) {
        (Some(file), _) => CarSource::File(file.clone()),
        (None, Some(dir)) => CarSource::Directory(dir.clone()),
        (None, None) => anyhow::bail!("one of --car or --car-dir is required"),
    };
    let fetcher = LocalFetcher::new(source);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let result = runtime.block_on(Verifier::new(config.clone()).verify(
        &args.uri, &args.cid, &value, &doc, &fetcher,
    ));

    print_result(&result, args.json)?;
    Ok(if result.is_valid() { 0 } else { EXIT_INVALID })
}

fn read_record(path: &Path) -> Result<Value> {
    let json: serde_json::Value = serde_json::from_slice(&read_file(path)?)
        .with_context(|| format!("record is not JSON: {}", path.display()))?;
    Value::from_json(&json).with_context(|| format!("invalid record value: {}", path.display()))
}

fn print_result(result: &VerificationResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    if result.is_valid() {
        println!("OK: record verified");
    } else {
        println!("FAILED: {} finding(s)", result.findings.len());
        for finding in &result.findings {
            println!("  {finding}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    struct Files {
        _dir: tempfile::TempDir,
        args: VerifyArgs,
    }

    fn files(record: Value, tamper: impl FnOnce(&mut Vec<u8>)) -> Files {
        let (repo, doc) = testutil::repo();
        let dir = tempfile::tempdir().unwrap();
        let record_path = dir.path().join("record.json");
        let doc_path = dir.path().join("did.json");
        let car_path = dir.path().join("repo.car");
        std::fs::write(&record_path, serde_json::to_vec(&record.to_json()).unwrap()).unwrap();
        std::fs::write(&doc_path, serde_json::to_vec(&doc).unwrap()).unwrap();
        let mut car = repo.to_car().unwrap();
        tamper(&mut car);
        std::fs::write(&car_path, car).unwrap();
        let cid = atrecord_core::CanonicalBytes::new(&record).unwrap().cid().to_string();
        let args = VerifyArgs {
            uri: format!("at://{}/{}", testutil::DID, testutil::key(4)),
            cid,
            record: record_path,
            did_doc: doc_path,
            car: Some(car_path),
            car_dir: None,
            json: false,
        };
        Files { _dir: dir, args }
    }

    #[test]
    fn test_verify_valid_record() {
        let f = files(testutil::post(4), |_| {});
        assert_eq!(run_verify(&f.args, &VerifyConfig::default()).unwrap(), 0);
    }

    #[test]
    fn test_verify_reports_findings() {
        let f = files(testutil::post(5), |_| {});
        assert_eq!(run_verify(&f.args, &VerifyConfig::default()).unwrap(), EXIT_INVALID);
    }

    #[test]
    fn test_verify_truncated_container() {
        let f = files(testutil::post(4), |car| car.truncate(car.len() / 2));
        assert_eq!(run_verify(&f.args, &VerifyConfig::default()).unwrap(), EXIT_INVALID);
    }

    #[test]
    fn test_verify_from_directory() {
        let mut f = files(testutil::post(4), |_| {});
        let car = f.args.car.take().unwrap();
        let dir = car.parent().unwrap().to_path_buf();
        std::fs::rename(&car, dir.join("did_plc_clitestaccount.car")).unwrap();
        f.args.car_dir = Some(dir);
        assert_eq!(run_verify(&f.args, &VerifyConfig::default()).unwrap(), 0);
    }

    #[test]
    fn test_unreadable_record_is_error() {
        let mut f = files(testutil::post(4), |_| {});
        std::fs::write(&f.args.record, b"{not json").unwrap();
        assert!(run_verify(&f.args, &VerifyConfig::default()).is_err());
        f.args.record = PathBuf::from("/nonexistent/record.json");
        assert!(run_verify(&f.args, &VerifyConfig::default()).is_err());
    }
}
