//! # Repository Identity Newtypes
//!
//! Newtype wrappers for the identifiers that address a record: the
//! repository's DID, the collection NSID, the record key, and the AT-URI
//! that combines them. You cannot pass a `RecordKey` where an `Nsid` is
//! expected.
//!
//! ## Security Invariant
//!
//! Each type is validated at construction and exposes no mutable access,
//! so a value of the type is always syntactically well formed. The MST key
//! for a record is derived only from a parsed `AtUri`, never from raw
//! string concatenation of caller input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

const MAX_DID_LEN: usize = 2048;
const MAX_NSID_LEN: usize = 317;
const MAX_RKEY_LEN: usize = 512;
const MAX_HANDLE_LEN: usize = 253;

macro_rules! impl_validating_deserialize {
    ($ty:ty) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                <$ty>::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// DID
// ---------------------------------------------------------------------------

/// Decentralized Identifier: `did:<method>:<method-specific-id>`.
///
/// The method is lower-case ASCII letters; the identifier is ASCII
/// alphanumerics plus `.` `_` `:` `%` `-`, and must not end in `:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Did(String);

impl_validating_deserialize!(Did);

impl Did {
    /// Create a DID from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDid`] if the string does not match
    /// `did:method:identifier`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if Self::is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(ValidationError::InvalidDid(s))
        }
    }

    fn is_valid(s: &str) -> bool {
        if s.len() > MAX_DID_LEN {
            return false;
        }
        let Some(rest) = s.strip_prefix("did:") else {
            return false;
        };
        let Some((method, id)) = rest.split_once(':') else {
            return false;
        };
        !method.is_empty()
            && method.bytes().all(|b| b.is_ascii_lowercase())
            && !id.is_empty()
            && !id.ends_with(':')
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"._:%-".contains(&b))
    }

    /// Access the DID string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The DID method, e.g. `plc` or `web`.
    pub fn method(&self) -> &str {
        self.0[4..].split(':').next().unwrap_or_default()
    }

    /// Everything after `did:<method>:`.
    pub fn method_specific_id(&self) -> &str {
        let rest = &self.0[4..];
        rest.split_once(':').map_or("", |(_, id)| id)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// NSID
// ---------------------------------------------------------------------------

/// Namespaced identifier naming a collection, e.g. `app.bsky.feed.post`.
///
/// At least three dot-separated segments. Domain segments are ASCII
/// alphanumerics and hyphens, not starting or ending with a hyphen; the
/// final name segment is ASCII letters and digits, starting with a letter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Nsid(String);

impl_validating_deserialize!(Nsid);

impl Nsid {
    /// Create an NSID from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidNsid`] on syntax violations.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if Self::is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(ValidationError::InvalidNsid(s))
        }
    }

    fn is_valid(s: &str) -> bool {
        if s.is_empty() || s.len() > MAX_NSID_LEN {
            return false;
        }
        let segments: Vec<&str> = s.split('.').collect();
        if segments.len() < 3 {
            return false;
        }
        let (name, domain) = match segments.split_last() {
            Some(parts) => parts,
            None => return false,
        };
        let domain_ok = domain.iter().all(|seg| is_domain_label(seg));
        let name_ok = name.len() <= 63
            && name.starts_with(|c: char| c.is_ascii_alphabetic())
            && name.bytes().all(|b| b.is_ascii_alphanumeric());
        domain_ok && name_ok && !domain[0].starts_with(|c: char| c.is_ascii_digit())
    }

    /// Access the NSID string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_domain_label(seg: &str) -> bool {
    !seg.is_empty()
        && seg.len() <= 63
        && !seg.starts_with('-')
        && !seg.ends_with('-')
        && seg.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

// ---------------------------------------------------------------------------
// Record key
// ---------------------------------------------------------------------------

/// Record key within a collection, e.g. a TID like `3jui7kd54zh2y`.
///
/// 1–512 characters from `A-Za-z0-9._:~-`, excluding `.` and `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordKey(String);

impl_validating_deserialize!(RecordKey);

impl RecordKey {
    /// Create a record key from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRecordKey`] on syntax violations.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let valid = !s.is_empty()
            && s.len() <= MAX_RKEY_LEN
            && s != "."
            && s != ".."
            && s
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"._:~-".contains(&b));
        if valid {
            Ok(Self(s))
        } else {
            Err(ValidationError::InvalidRecordKey(s))
        }
    }

    /// Access the record key string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// AT-URI
// ---------------------------------------------------------------------------

/// A record address: `at://{repo}/{collection}/{rkey}`.
///
/// The repo authority is either a DID or a handle. Query strings and
/// fragments are rejected since they do not name a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtUri {
    repo: String,
    collection: Nsid,
    rkey: RecordKey,
}

impl AtUri {
    /// Parse an AT-URI naming a single record.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAtUri`] when the scheme, authority,
    /// collection or record key is missing or malformed.
    pub fn parse(uri: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidAtUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };
        let rest = uri
            .strip_prefix("at://")
            .ok_or_else(|| invalid("missing at:// scheme"))?;
        if rest.contains(['?', '#']) {
            return Err(invalid("query and fragment are not allowed"));
        }
        let mut parts = rest.split('/');
        let repo = parts.next().unwrap_or_default();
        let collection = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid("missing collection"))?;
        let rkey = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid("missing record key"))?;
        if parts.next().is_some() {
            return Err(invalid("too many path segments"));
        }

        if repo.starts_with("did:") {
            Did::new(repo).map_err(|e| invalid(&e.to_string()))?;
        } else if !is_handle(repo) {
            return Err(invalid(&ValidationError::InvalidHandle(repo.to_string()).to_string()));
        }
        let collection = Nsid::new(collection).map_err(|e| invalid(&e.to_string()))?;
        let rkey = RecordKey::new(rkey).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            repo: repo.to_string(),
            collection,
            rkey,
        })
    }

    /// The repository authority exactly as written (DID or handle).
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// The authority as a DID, if it is one.
    pub fn repo_did(&self) -> Option<Did> {
        Did::new(self.repo.clone()).ok()
    }

    pub fn collection(&self) -> &Nsid {
        &self.collection
    }

    pub fn rkey(&self) -> &RecordKey {
        &self.rkey
    }

    /// The MST key under which the record is stored: `{collection}/{rkey}`.
    pub fn mst_key(&self) -> String {
        format!("{}/{}", self.collection, self.rkey)
    }
}

impl fmt::Display for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at://{}/{}/{}", self.repo, self.collection, self.rkey)
    }
}

impl FromStr for AtUri {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_handle(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_HANDLE_LEN {
        return false;
    }
    let labels: Vec<&str> = s.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| is_domain_label(l))
        && labels
            .last()
            .is_some_and(|tld| tld.starts_with(|c: char| c.is_ascii_alphabetic()))
}
