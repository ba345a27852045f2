//! Shared fixtures: a signed repository, a matching DID document and
//! fetchers that serve fixed container bytes.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use atrecord_core::{CanonicalBytes, Did, DidDocument, Value, VerificationMethod};
use atrecord_crypto::{KeyAlgorithm, PublicKey, SigningKeypair};
use atrecord_repo::Repository;
use atrecord_verify::{fetcher_fn, FetchError, RecordFetcher, RecordRequest};

pub const DID: &str = "did:plc:ewvi7nxzyoun6zhxrhs64oiz";
pub const HANDLE: &str = "alice.example.com";
pub const COLLECTION: &str = "app.bsky.feed.post";
pub const RECORD_COUNT: usize = 40;

pub struct Fixture {
    pub keypair: SigningKeypair,
    pub repo: Repository,
    pub doc: DidDocument,
}

pub fn rkey(i: usize) -> String {
    format!("3kpost{i:04}")
}

pub fn key(i: usize) -> String {
    format!("{COLLECTION}/{}", rkey(i))
}

pub fn post(i: usize) -> Value {
    Value::map([
        ("$type", Value::from(COLLECTION)),
        ("text", Value::from(format!("post number {i}"))),
        ("createdAt", Value::from("2024-05-01T12:00:00.000Z")),
        ("langs", Value::List(vec![Value::from("en")])),
    ])
}

pub fn cid_of(value: &Value) -> String {
    CanonicalBytes::new(value).unwrap().cid().to_string()
}

/// A DID document whose `#atproto` method holds `key` as a Multikey.
pub fn did_document(key: &PublicKey) -> DidDocument {
    DidDocument {
        id: DID.to_string(),
        also_known_as: vec![format!("at://{HANDLE}")],
        verification_method: vec![VerificationMethod {
            id: format!("{DID}#atproto"),
            method_type: "Multikey".to_string(),
            controller: DID.to_string(),
            public_key_multibase: Some(key.to_multikey()),
        }],
        service: vec![],
    }
}

impl Fixture {
    pub fn new(algorithm: KeyAlgorithm) -> Self {
        let keypair = SigningKeypair::from_seed(algorithm, &[0x42; 32]).unwrap();
        let records = (0..RECORD_COUNT).map(|i| (key(i), post(i)));
        let repo =
            Repository::create(Did::new(DID).unwrap(), records, "3kzzfixture22", &keypair).unwrap();
        let doc = did_document(&keypair.public_key());
        Self { keypair, repo, doc }
    }

    pub fn uri(&self, i: usize) -> String {
        format!("at://{DID}/{COLLECTION}/{}", rkey(i))
    }

    pub fn proof_car(&self, i: usize) -> Vec<u8> {
        self.repo.record_proof_car(&key(i)).unwrap()
    }
}

/// A fetcher that serves `car` for every request.
pub fn serve(car: Vec<u8>) -> impl RecordFetcher {
    fetcher_fn(move |_| {
        let car = car.clone();
        async move { Ok(car) }
    })
}

/// A fetcher that serves `car` and records each request it receives.
pub fn recording(car: Vec<u8>) -> (impl RecordFetcher, Arc<Mutex<Vec<RecordRequest>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let fetcher = fetcher_fn(move |req: RecordRequest| {
        log.lock().unwrap().push(req);
        let car = car.clone();
        async move { Ok(car) }
    });
    (fetcher, seen)
}

/// A fetcher that always fails.
pub fn failing() -> impl RecordFetcher {
    fetcher_fn(|req: RecordRequest| async move {
        Err(FetchError::NotFound(format!("{}/{}", req.collection, req.rkey)))
    })
}
