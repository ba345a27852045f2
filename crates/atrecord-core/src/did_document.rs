//! # DID Documents
//!
//! The resolved identity record for a repository owner. Documents are
//! produced by an external resolver and handed to the verifier read-only;
//! this module only describes their shape.

use serde::{Deserialize, Serialize};

/// Fragment of the verification method holding the repository signing key.
pub const ATPROTO_KEY_FRAGMENT: &str = "#atproto";

/// A resolved DID document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    /// The DID this document describes.
    pub id: String,
    /// Alias URIs, typically `at://<handle>`.
    #[serde(default)]
    pub also_known_as: Vec<String>,
    /// Public-key material.
    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,
    /// Service endpoints (e.g. the PDS).
    #[serde(default)]
    pub service: Vec<Service>,
}

/// One entry of `verificationMethod`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Method id; either absolute (`did:plc:…#atproto`) or a bare fragment.
    pub id: String,
    /// Method type, e.g. `Multikey`.
    #[serde(rename = "type")]
    pub method_type: String,
    /// Controlling DID.
    #[serde(default)]
    pub controller: String,
    /// Multibase-encoded key material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
}

impl VerificationMethod {
    /// True if this method's id ends with `fragment` (e.g. `#atproto`).
    pub fn has_fragment(&self, fragment: &str) -> bool {
        self.id.ends_with(fragment)
    }
}

/// One entry of `service`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: serde_json::Value,
}

impl DidDocument {
    /// Verification methods ordered for key selection: `#atproto` first,
    /// then the rest in document order.
    pub fn signing_key_candidates(&self) -> impl Iterator<Item = &VerificationMethod> {
        let preferred = self
            .verification_method
            .iter()
            .filter(|m| m.has_fragment(ATPROTO_KEY_FRAGMENT));
        let others = self
            .verification_method
            .iter()
            .filter(|m| !m.has_fragment(ATPROTO_KEY_FRAGMENT));
        preferred.chain(others)
    }

    /// Handles claimed through `at://` aliases.
    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.also_known_as
            .iter()
            .filter_map(|aka| aka.strip_prefix("at://"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLC_DOC: &str = r##"{
        "@context": ["https://www.w3.org/ns/did/v1"],
        "id": "did:plc:ewvi7nxzyoun6zhxrhs64oiz",
        "alsoKnownAs": ["at://atproto.com"],
        "verificationMethod": [
            {
                "id": "did:plc:ewvi7nxzyoun6zhxrhs64oiz#other",
                "type": "Multikey",
                "controller": "did:plc:ewvi7nxzyoun6zhxrhs64oiz",
                "publicKeyMultibase": "zDnaeh9v2RmcMo13Du2d6pjUf5bZwtauYxj3n9dYjw4EZUAR7"
            },
            {
                "id": "did:plc:ewvi7nxzyoun6zhxrhs64oiz#atproto",
                "type": "Multikey",
                "controller": "did:plc:ewvi7nxzyoun6zhxrhs64oiz",
                "publicKeyMultibase": "zQ3shunBKsXixLxKtC5qeSG9E4J5RkGN57im31pcTzbNQnm5w"
            }
        ],
        "service": [
            {
                "id": "#atproto_pds",
                "type": "AtprotoPersonalDataServer",
                "serviceEndpoint": "https://enoki.us-east.host.bsky.network"
            }
        ]
    }"##;

    #[test]
    fn test_parse_plc_document() {
        let doc: DidDocument = serde_json::from_str(PLC_DOC).unwrap();
        assert_eq!(doc.id, "did:plc:ewvi7nxzyoun6zhxrhs64oiz");
        assert_eq!(doc.verification_method.len(), 2);
        assert_eq!(doc.service[0].service_type, "AtprotoPersonalDataServer");
        assert_eq!(doc.handles().collect::<Vec<_>>(), vec!["atproto.com"]);
    }

    #[test]
    fn test_atproto_key_preferred() {
        let doc: DidDocument = serde_json::from_str(PLC_DOC).unwrap();
        let first = doc.signing_key_candidates().next().unwrap();
        assert!(first.id.ends_with("#atproto"));
        assert_eq!(doc.signing_key_candidates().count(), 2);
    }

    #[test]
    fn test_missing_optional_fields() {
        let doc: DidDocument = serde_json::from_str(r#"{"id": "did:web:example.com"}"#).unwrap();
        assert!(doc.verification_method.is_empty());
        assert_eq!(doc.signing_key_candidates().count(), 0);
    }
}
