//! # Verification Orchestrator
//!
//! Checks a claimed record `{uri, cid, value}` against the repository its
//! host serves, given the owner's resolved DID document:
//!
//! 1. the claimed CID parses;
//! 2. the claimed value hashes to the claimed CID;
//! 3. the URI parses (else stop);
//! 4. the URI names the document's subject;
//! 5. the document yields a signing key (else stop);
//! 6. the host's container is fetched and parsed (else stop);
//! 7. the container has one root and some blocks (else stop);
//! 8. the root is a commit (else stop);
//! 9. the commit names the document's subject;
//! 10. the commit signature verifies;
//! 11. the record's key is in the commit's tree (else stop);
//! 12. the record block is present (else stop);
//! 13. the record block equals the canonical claimed value.
//!
//! Independent problems accumulate; a problem that leaves nothing to check
//! further ends the run. The result is valid only when no finding was
//! recorded.
//!
//! ## Security Invariant
//!
//! Nothing supplied by the caller or the host is trusted. Every comparison
//! is over canonical bytes or binary CIDs, never over string forms, and the
//! signature is checked over the canonical re-encoding of the decoded
//! commit rather than over bytes as received.

use std::str::FromStr;

use atrecord_core::{AtUri, CanonicalBytes, Cid, Did, DidDocument, Value};
use atrecord_crypto::{extract_signing_key, KeyExtractionError};
use atrecord_repo::{mst, read_car_with_limits, BlockError, Commit};
use tracing::{debug, info, instrument, warn};

use crate::config::VerifyConfig;
use crate::fetch::{RecordFetcher, RecordRequest};
use crate::finding::{Finding, FindingKind, VerificationResult};

/// Verify a claimed record with the default configuration.
pub async fn verify_record<F>(
    uri: &str,
    cid: &str,
    value: &Value,
    did_document: &DidDocument,
    fetcher: &F,
) -> VerificationResult
where
    F: RecordFetcher + ?Sized,
{
    Verifier::default()
        .verify(uri, cid, value, did_document, fetcher)
        .await
}

/// Runs verifications under one configuration.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: VerifyConfig,
}

/// Findings recorded so far. Whether a finding ends verification is
/// decided by [`FindingKind::is_terminal`] alone.
#[derive(Default)]
struct Findings {
    list: Vec<Finding>,
}

impl Findings {
    /// Record `finding`. Returns `None` when its kind ends verification, so
    /// callers propagate with `?`.
    fn record(&mut self, finding: Finding) -> Option<()> {
        let terminal = finding.kind.is_terminal();
        warn!(
            kind = %finding.kind,
            terminal,
            detail = finding.detail.as_deref().unwrap_or(""),
            "{}",
            finding.message
        );
        self.list.push(finding);
        (!terminal).then_some(())
    }

    /// Unwrap the output of a step that has nothing to hand on when it
    /// fails. Only terminal kinds may be reported this way.
    fn require<T>(&mut self, step: Result<T, Finding>) -> Option<T> {
        match step {
            Ok(value) => Some(value),
            Err(finding) => {
                debug_assert!(
                    finding.kind.is_terminal(),
                    "{} reported by a step without output",
                    finding.kind
                );
                self.record(finding);
                None
            }
        }
    }

    fn finish(self) -> VerificationResult {
        let result = VerificationResult {
            findings: self.list,
        };
        info!(
            valid = result.is_valid(),
            findings = result.findings.len(),
            "verification finished"
        );
        result
    }
}

impl Verifier {
    pub fn new(config: VerifyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Run every check and collect the findings.
    #[instrument(skip_all, fields(uri = %uri, claimed_cid = %cid, did = %did_document.id))]
    pub async fn verify<F>(
        &self,
        uri: &str,
        cid: &str,
        value: &Value,
        did_document: &DidDocument,
        fetcher: &F,
    ) -> VerificationResult
    where
        F: RecordFetcher + ?Sized,
    {
        let mut findings = Findings::default();
        if self
            .run(uri, cid, value, did_document, fetcher, &mut findings)
            .await
            .is_none()
        {
            debug!("verification stopped early");
        }
        findings.finish()
    }

    async fn run<F>(
        &self,
        uri: &str,
        cid: &str,
        value: &Value,
        did_document: &DidDocument,
        fetcher: &F,
        findings: &mut Findings,
    ) -> Option<()>
    where
        F: RecordFetcher + ?Sized,
    {
        debug!("parsing claimed CID");
        let claimed_cid = match Cid::from_str(cid) {
            Ok(c) => Some(c),
            Err(e) => {
                findings.record(
                    Finding::new(FindingKind::InvalidCid, format!("claimed CID {cid:?} is malformed"))
                        .with_detail(e),
                )?;
                None
            }
        };

        debug!("encoding claimed value");
        let claimed_bytes = match CanonicalBytes::new(value) {
            Ok(b) => Some(b),
            Err(e) => {
                findings.record(
                    Finding::new(
                        FindingKind::UnencodableRecord,
                        "claimed value has no canonical encoding",
                    )
                    .with_detail(e),
                )?;
                None
            }
        };
        if let (Some(claimed), Some(bytes)) = (&claimed_cid, &claimed_bytes) {
            let computed = bytes.cid();
            if &computed != claimed {
                findings.record(Finding::new(
                    FindingKind::ContentMismatch,
                    format!("claimed CID {claimed} but the value hashes to {computed}"),
                ))?;
            }
        }

        debug!("parsing AT-URI");
        let uri = findings.require(AtUri::parse(uri).map_err(|e| {
            Finding::new(FindingKind::InvalidUri, format!("{uri:?} is not a record URI"))
                .with_detail(e)
        }))?;

        if !names_subject(&uri, did_document) {
            findings.record(Finding::new(
                FindingKind::RepoMismatch,
                format!(
                    "URI repository {} is not the DID document subject {}",
                    uri.repo(),
                    did_document.id
                ),
            ))?;
        }

        debug!("extracting signing key");
        let key = findings.require(
            extract_signing_key(did_document, self.config.key_policy()).map_err(|e| match e {
                KeyExtractionError::NoVerificationMaterial { .. } => Finding::new(
                    FindingKind::NoVerificationMaterial,
                    "DID document carries no signing key",
                )
                .with_detail(e),
                _ => Finding::new(
                    FindingKind::KeyExtractionFailed,
                    "DID document signing key is unusable",
                )
                .with_detail(e),
            }),
        )?;
        debug!(key = %key, "signing key selected");

        let repo_did = findings.require(
            Did::new(did_document.id.as_str())
                .ok()
                .or_else(|| uri.repo_did())
                .ok_or_else(|| {
                    Finding::new(FindingKind::CarReadFailed, "no repository DID to fetch from")
                }),
        )?;
        let request = RecordRequest {
            did: repo_did,
            collection: uri.collection().clone(),
            rkey: uri.rkey().clone(),
        };

        debug!("fetching record container");
        let car_bytes = findings.require(fetcher.fetch_record_car(&request).await.map_err(|e| {
            Finding::new(FindingKind::CarReadFailed, "record container fetch failed").with_detail(e)
        }))?;
        let car = findings.require(
            read_car_with_limits(&car_bytes, self.config.car_limits()).map_err(|e| {
                Finding::new(FindingKind::CarReadFailed, "record container is unreadable")
                    .with_detail(e)
            }),
        )?;
        debug!(
            bytes = car_bytes.len(),
            blocks = car.blocks.len(),
            "container read"
        );

        let root = findings.require(match car.roots() {
            [root] => Ok(root),
            roots => Err(Finding::new(
                FindingKind::RootCountError,
                format!("container has {} roots, expected exactly one", roots.len()),
            )),
        })?;
        if car.blocks.is_empty() {
            findings.record(Finding::new(
                FindingKind::EmptyContainer,
                "container holds no blocks",
            ))?;
        }

        debug!(root = %root, "decoding commit");
        let commit = findings.require(car.blocks.read_block(root, Commit::from_value).map_err(
            |e| {
                let message = match &e {
                    BlockError::NotFound(_) => "container root block is missing",
                    _ => "container root is not a valid commit",
                };
                Finding::new(FindingKind::InvalidCommit, message).with_detail(e)
            },
        ))?;

        if commit.did().as_str() != did_document.id {
            findings.record(Finding::new(
                FindingKind::CommitDidMismatch,
                format!(
                    "commit is for {} but the DID document is for {}",
                    commit.did(),
                    did_document.id
                ),
            ))?;
        }

        debug!("verifying commit signature");
        match commit.verify(&key) {
            Ok(true) => {}
            Ok(false) => findings.record(Finding::new(
                FindingKind::SignatureInvalid,
                format!("commit signature does not verify against {key}"),
            ))?,
            Err(e) => findings.record(
                Finding::new(
                    FindingKind::SignatureInvalid,
                    "unsigned commit cannot be canonically encoded",
                )
                .with_detail(e),
            )?,
        }

        let mst_key = uri.mst_key();
        debug!(key = %mst_key, data = %commit.data(), "searching MST");
        let leaf_cid = findings.require(match mst::find(&car.blocks, commit.data(), &mst_key) {
            Ok(Some(c)) => Ok(c),
            Ok(None) => Err(Finding::new(
                FindingKind::RecordNotFound,
                format!("{mst_key} is not in the repository tree"),
            )),
            Err(e) => Err(Finding::new(
                FindingKind::RecordNotFound,
                format!("{mst_key} could not be located in the repository tree"),
            )
            .with_detail(e)),
        })?;

        let leaf = findings.require(car.blocks.get(&leaf_cid).ok_or_else(|| {
            Finding::new(
                FindingKind::LeafBlockMissing,
                format!("record block {leaf_cid} is not in the container"),
            )
        }))?;

        match &claimed_bytes {
            Some(claimed) if leaf != claimed.as_bytes() => {
                findings.record(Finding::new(
                    FindingKind::RecordContentDiffers,
                    format!("served record {leaf_cid} differs from the claimed value"),
                ))?;
            }
            Some(_) => {}
            None => debug!("claimed value unencodable, skipping content comparison"),
        }
        Some(())
    }
}

/// The URI authority is the document's DID, or a handle the document
/// claims through `alsoKnownAs`.
fn names_subject(uri: &AtUri, doc: &DidDocument) -> bool {
    match uri.repo_did() {
        Some(did) => did.as_str() == doc.id,
        None => doc.handles().any(|h| h.eq_ignore_ascii_case(uri.repo())),
    }
}
