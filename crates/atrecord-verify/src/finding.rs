//! # Findings
//!
//! Every problem the orchestrator detects becomes a [`Finding`]. Lower
//! layers report typed errors; the orchestrator converts each into a
//! finding with the error's `Display` text attached as `detail`, so callers
//! only ever see findings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad class of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    /// Caller- or host-supplied data that does not parse.
    MalformedInput,
    /// Two pieces of data that should agree do not.
    Mismatch,
    /// Something required is absent.
    MissingData,
    /// A signature does not verify.
    Cryptographic,
    /// The container could not be obtained or read.
    Transport,
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingKind {
    /// The claimed CID string does not parse.
    InvalidCid,
    /// The claimed value cannot be canonically encoded.
    UnencodableRecord,
    /// The claimed value does not hash to the claimed CID.
    ContentMismatch,
    /// The AT-URI does not parse.
    InvalidUri,
    /// The URI's repository is not the DID document's subject.
    RepoMismatch,
    /// The DID document has no key material.
    NoVerificationMaterial,
    /// The DID document's key material is unusable.
    KeyExtractionFailed,
    /// The container could not be fetched or parsed.
    CarReadFailed,
    /// The container does not have exactly one root.
    RootCountError,
    /// The container holds no blocks.
    EmptyContainer,
    /// The root block is not a well-formed commit.
    InvalidCommit,
    /// The commit names a different DID than the document.
    CommitDidMismatch,
    /// The commit signature does not verify.
    SignatureInvalid,
    /// The record's key is not in the tree.
    RecordNotFound,
    /// The tree points at a record block the container lacks.
    LeafBlockMissing,
    /// The served record bytes differ from the claimed value.
    RecordContentDiffers,
}

impl FindingKind {
    pub fn category(self) -> FindingCategory {
        match self {
            Self::InvalidCid | Self::UnencodableRecord | Self::InvalidUri | Self::InvalidCommit => {
                FindingCategory::MalformedInput
            }
            Self::ContentMismatch
            | Self::RepoMismatch
            | Self::CommitDidMismatch
            | Self::RecordContentDiffers => FindingCategory::Mismatch,
            Self::NoVerificationMaterial
            | Self::KeyExtractionFailed
            | Self::RecordNotFound
            | Self::LeafBlockMissing
            | Self::EmptyContainer
            | Self::RootCountError => FindingCategory::MissingData,
            Self::SignatureInvalid => FindingCategory::Cryptographic,
            Self::CarReadFailed => FindingCategory::Transport,
        }
    }

    /// True if verification stops after recording this kind.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::InvalidUri
                | Self::NoVerificationMaterial
                | Self::KeyExtractionFailed
                | Self::CarReadFailed
                | Self::RootCountError
                | Self::EmptyContainer
                | Self::InvalidCommit
                | Self::RecordNotFound
                | Self::LeafBlockMissing
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidCid => "InvalidCid",
            Self::UnencodableRecord => "UnencodableRecord",
            Self::ContentMismatch => "ContentMismatch",
            Self::InvalidUri => "InvalidUri",
            Self::RepoMismatch => "RepoMismatch",
            Self::NoVerificationMaterial => "NoVerificationMaterial",
            Self::KeyExtractionFailed => "KeyExtractionFailed",
            Self::CarReadFailed => "CarReadFailed",
            Self::RootCountError => "RootCountError",
            Self::EmptyContainer => "EmptyContainer",
            Self::InvalidCommit => "InvalidCommit",
            Self::CommitDidMismatch => "CommitDidMismatch",
            Self::SignatureInvalid => "SignatureInvalid",
            Self::RecordNotFound => "RecordNotFound",
            Self::LeafBlockMissing => "LeafBlockMissing",
            Self::RecordContentDiffers => "RecordContentDiffers",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    /// Human-readable summary.
    pub message: String,
    /// Underlying error text, when the finding came from one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Finding {
    pub fn new(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    /// Attach the `Display` text of the cause.
    pub fn with_detail(mut self, cause: impl fmt::Display) -> Self {
        self.detail = Some(cause.to_string());
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Outcome of verifying one record. Valid exactly when `findings` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub findings: Vec<Finding>,
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        self.findings.is_empty()
    }

    /// Kinds in the order they were recorded.
    pub fn kinds(&self) -> Vec<FindingKind> {
        self.findings.iter().map(|f| f.kind).collect()
    }

    pub fn has(&self, kind: FindingKind) -> bool {
        self.findings.iter().any(|f| f.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_and_without_detail() {
        let f = Finding::new(FindingKind::InvalidCid, "claimed CID is malformed");
        assert_eq!(f.to_string(), "InvalidCid: claimed CID is malformed");
        let f = f.with_detail("empty CID");
        assert_eq!(f.to_string(), "InvalidCid: claimed CID is malformed (empty CID)");
    }

    #[test]
    fn test_serde_shape() {
        let result = VerificationResult {
            findings: vec![Finding::new(FindingKind::SignatureInvalid, "bad sig")],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"findings": [{"kind": "SignatureInvalid", "message": "bad sig"}]})
        );
        let back: VerificationResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_categories_and_terminal_kinds() {
        assert_eq!(FindingKind::CarReadFailed.category(), FindingCategory::Transport);
        assert_eq!(FindingKind::SignatureInvalid.category(), FindingCategory::Cryptographic);
        assert_eq!(FindingKind::RootCountError.category(), FindingCategory::MissingData);
        assert!(FindingKind::InvalidUri.is_terminal());
        assert!(!FindingKind::InvalidCid.is_terminal());
        assert!(!FindingKind::SignatureInvalid.is_terminal());
        assert!(!FindingKind::RecordContentDiffers.is_terminal());
    }

    #[test]
    fn test_empty_result_is_valid() {
        let mut result = VerificationResult::default();
        assert!(result.is_valid());
        result
            .findings
            .push(Finding::new(FindingKind::RepoMismatch, "x"));
        assert!(!result.is_valid());
        assert!(result.has(FindingKind::RepoMismatch));
        assert_eq!(result.kinds(), vec![FindingKind::RepoMismatch]);
    }
}
