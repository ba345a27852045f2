//! # atrecord-repo — Repository Structures
//!
//! The data structures a host returns when asked for a record:
//!
//! - **Block store** ([`BlockStore`]): CID-addressed raw blocks with
//!   shape-checked reads.
//! - **CAR v1** ([`car`]): lazy, strictly bounds-checked container reader
//!   with per-block digest verification, and a writer.
//! - **Commits** ([`Commit`]): the signed root of a repository.
//! - **Merkle Search Tree** ([`mst`]): in-order walker, key-directed
//!   lookup that works on partial proofs, and a deterministic builder.
//! - **Repositories** ([`Repository`]): commit plus blocks, with full and
//!   single-record container export.
//!
//! ## Crate Policy
//!
//! - Depends on `atrecord-core` and `atrecord-crypto` internally.
//! - Every structure read from a container is treated as hostile: no
//!   panics, no unbounded allocation from declared lengths, no unbounded
//!   traversal.

pub mod blockstore;
pub mod car;
pub mod commit;
pub mod error;
pub mod mst;
pub mod repository;

pub use blockstore::BlockStore;
pub use car::{
    read_car, read_car_with_limits, write_car, write_store, Car, CarHeader, CarLimits, CarReader,
};
pub use commit::Commit;
pub use error::{BlockError, CarError, CommitError, MstError, RepoError};
pub use mst::{find, MstBuilder, MstWalker};
pub use repository::Repository;
