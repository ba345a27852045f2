//! # Signed Commits
//!
//! The root block of a repository container is a commit:
//!
//! ```text
//! { did, version, data: link(MST root), rev, prev: link | null, sig: bytes }
//! ```
//!
//! ## Security Invariant
//!
//! The signed message is the canonical DAG-CBOR encoding of the commit map
//! with only `sig` removed. Every other field, including any this crate
//! does not interpret, is kept verbatim so that it stays covered by the
//! signature check.

use std::collections::BTreeMap;

use atrecord_core::{CanonicalBytes, Cid, Did, Value};
use atrecord_crypto::{verify_signature, PublicKey, SigningKeypair};

use crate::error::CommitError;

/// Current commit format version.
pub const COMMIT_VERSION: i64 = 3;
/// Oldest commit format version still accepted.
pub const MIN_COMMIT_VERSION: i64 = 2;

const SIG_FIELD: &str = "sig";

/// A decoded repository commit.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    did: Did,
    version: i64,
    data: Cid,
    rev: Option<String>,
    prev: Option<Cid>,
    sig: Vec<u8>,
    unsigned: BTreeMap<String, Value>,
}

impl Commit {
    /// Interpret a decoded root block as a commit.
    pub fn from_value(value: Value) -> Result<Self, CommitError> {
        let mut unsigned = match value {
            Value::Map(m) => m,
            other => return Err(CommitError::NotAMap(other.kind())),
        };
        let sig = match unsigned.remove(SIG_FIELD) {
            Some(Value::Bytes(b)) => b,
            Some(other) => return Err(wrong_type(SIG_FIELD, "bytes", &other)),
            None => return Err(CommitError::MissingField(SIG_FIELD)),
        };

        let version = match required(&unsigned, "version")? {
            Value::Integer(v) => *v,
            other => return Err(wrong_type("version", "integer", other)),
        };
        if !(MIN_COMMIT_VERSION..=COMMIT_VERSION).contains(&version) {
            return Err(CommitError::UnsupportedVersion(version));
        }
        let did = match required(&unsigned, "did")? {
            Value::String(s) => Did::new(s.as_str())?,
            other => return Err(wrong_type("did", "string", other)),
        };
        let data = match required(&unsigned, "data")? {
            Value::Link(c) => c.clone(),
            other => return Err(wrong_type("data", "link", other)),
        };
        let rev = match unsigned.get("rev") {
            Some(Value::String(s)) => Some(s.clone()),
            None if version < COMMIT_VERSION => None,
            None => return Err(CommitError::MissingField("rev")),
            Some(other) => return Err(wrong_type("rev", "string", other)),
        };
        let prev = match unsigned.get("prev") {
            Some(Value::Link(c)) => Some(c.clone()),
            Some(Value::Null) | None => None,
            Some(other) => return Err(wrong_type("prev", "link or null", other)),
        };

        Ok(Self {
            did,
            version,
            data,
            rev,
            prev,
            sig,
            unsigned,
        })
    }

    /// Build and sign a version-3 commit.
    pub fn create(
        did: Did,
        data: Cid,
        rev: impl Into<String>,
        prev: Option<Cid>,
        key: &SigningKeypair,
    ) -> Result<Self, CommitError> {
        let rev = rev.into();
        let unsigned: BTreeMap<String, Value> = [
            ("did", Value::from(did.as_str())),
            ("version", Value::Integer(COMMIT_VERSION)),
            ("data", Value::Link(data.clone())),
            ("rev", Value::from(rev.as_str())),
            ("prev", prev.clone().map_or(Value::Null, Value::Link)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let message = CanonicalBytes::new(&Value::Map(unsigned.clone()))?;
        let sig = key.sign(&message).to_vec();
        Ok(Self {
            did,
            version: COMMIT_VERSION,
            data,
            rev: Some(rev),
            prev,
            sig,
            unsigned,
        })
    }

    pub fn did(&self) -> &Did {
        &self.did
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    /// CID of the MST root.
    pub fn data(&self) -> &Cid {
        &self.data
    }

    pub fn rev(&self) -> Option<&str> {
        self.rev.as_deref()
    }

    pub fn prev(&self) -> Option<&Cid> {
        self.prev.as_ref()
    }

    pub fn sig(&self) -> &[u8] {
        &self.sig
    }

    /// Canonical bytes of the commit without `sig`: the signed message.
    pub fn unsigned_bytes(&self) -> Result<CanonicalBytes, CommitError> {
        Ok(CanonicalBytes::new(&Value::Map(self.unsigned.clone()))?)
    }

    /// Check `sig` against `key`.
    pub fn verify(&self, key: &PublicKey) -> Result<bool, CommitError> {
        Ok(verify_signature(key, &self.sig, &self.unsigned_bytes()?))
    }

    /// The full commit map, `sig` included.
    pub fn to_value(&self) -> Value {
        let mut map = self.unsigned.clone();
        map.insert(SIG_FIELD.to_string(), Value::Bytes(self.sig.clone()));
        Value::Map(map)
    }

    /// Replace the signature. Used to build deliberately broken fixtures.
    pub fn with_sig(mut self, sig: Vec<u8>) -> Self {
        self.sig = sig;
        self
    }
}

fn required<'v>(
    map: &'v BTreeMap<String, Value>,
    field: &'static str,
) -> Result<&'v Value, CommitError> {
    map.get(field).ok_or(CommitError::MissingField(field))
}

fn wrong_type(field: &'static str, expected: &'static str, found: &Value) -> CommitError {
    CommitError::WrongType {
        field,
        expected,
        found: found.kind(),
    }
}
