//! # atrecord-verify — Record Verification
//!
//! Answers one question: is this record, as claimed, really in the signed
//! repository of the account that owns it?
//!
//! The entry point is [`verify_record`] (or [`Verifier::verify`] with a
//! custom [`VerifyConfig`]). It takes the claimed `{uri, cid, value}`, the
//! owner's resolved DID document and a [`RecordFetcher`], and returns a
//! [`VerificationResult`] listing every [`Finding`]. An empty list is the
//! only success.
//!
//! ## Crate Policy
//!
//! - Verification never returns an error and never panics on hostile
//!   input. Lower-layer errors become findings.
//! - One fetch per verification, no retries, no shared mutable state.

pub mod config;
pub mod fetch;
pub mod finding;
pub mod verifier;

pub use config::{ConfigError, VerifyConfig};
pub use fetch::{fetcher_fn, FetchError, FnFetcher, RecordFetcher, RecordRequest};
pub use finding::{Finding, FindingCategory, FindingKind, VerificationResult};
pub use verifier::{verify_record, Verifier};
