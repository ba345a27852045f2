//! # Repositories
//!
//! A signed commit plus the blocks it reaches, as carried by a CAR
//! container: the commit is the container's single root, its `data` field
//! points at the MST root, and MST values point at record blocks.
//!
//! Besides loading, a repository can produce the partial containers a host
//! serves for a single-record read: the commit, the MST nodes on the path
//! to the record's key, and the record block itself.

use atrecord_core::{Cid, Did, Value};
use atrecord_crypto::SigningKeypair;

use crate::blockstore::BlockStore;
use crate::car::{read_car_with_limits, write_car, CarLimits};
use crate::commit::Commit;
use crate::error::{CommitError, MstError, RepoError};
use crate::mst::{self, MstBuilder, MstWalker};

/// A commit together with the blocks it references.
#[derive(Debug, Clone)]
pub struct Repository {
    root: Cid,
    commit: Commit,
    blocks: BlockStore,
}

impl Repository {
    /// Load from a CAR container that has exactly one root, the commit.
    pub fn from_car(bytes: &[u8], limits: CarLimits) -> Result<Self, RepoError> {
        let car = read_car_with_limits(bytes, limits)?;
        let [root] = car.roots() else {
            return Err(RepoError::RootCount(car.roots().len()));
        };
        let root = root.clone();
        let commit = car.blocks.read_block(&root, Commit::from_value)?;
        Ok(Self {
            root,
            commit,
            blocks: car.blocks,
        })
    }

    /// Store `commit` alongside `blocks` and make it the root.
    pub fn assemble(commit: Commit, mut blocks: BlockStore) -> Result<Self, RepoError> {
        let root = blocks
            .put(&commit.to_value())
            .map_err(CommitError::from)?;
        Ok(Self {
            root,
            commit,
            blocks,
        })
    }

    /// Build and sign a fresh repository holding `records` keyed by MST key
    /// (`{collection}/{rkey}`).
    pub fn create<I, K>(
        did: Did,
        records: I,
        rev: &str,
        key: &SigningKeypair,
    ) -> Result<Self, RepoError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut blocks = BlockStore::new();
        let mut builder = MstBuilder::new();
        for (k, record) in records {
            let cid = blocks.put(&record).map_err(MstError::from)?;
            builder.insert(k, cid)?;
        }
        let data = builder.build(&mut blocks)?;
        let commit = Commit::create(did, data, rev, None, key)?;
        Self::assemble(commit, blocks)
    }

    /// CID of the commit block.
    pub fn root(&self) -> &Cid {
        &self.root
    }

    pub fn commit(&self) -> &Commit {
        &self.commit
    }

    pub fn blocks(&self) -> &BlockStore {
        &self.blocks
    }

    /// In-order walk of every `(key, record CID)` pair.
    pub fn entries(&self) -> MstWalker<'_> {
        MstWalker::new(&self.blocks, self.commit.data().clone())
    }

    /// Look up the record CID stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<Cid>, RepoError> {
        Ok(mst::find(&self.blocks, self.commit.data(), key)?)
    }

    /// Look up and decode the record stored under `key`.
    pub fn get_record(&self, key: &str) -> Result<Option<(Cid, Value)>, RepoError> {
        match self.get(key)? {
            Some(cid) => {
                let value = self.blocks.read_value(&cid)?;
                Ok(Some((cid, value)))
            }
            None => Ok(None),
        }
    }

    /// The whole repository as a CAR, commit block first.
    pub fn to_car(&self) -> Result<Vec<u8>, RepoError> {
        let mut rest: Vec<_> = self
            .blocks
            .iter()
            .filter(|(cid, _)| *cid != &self.root)
            .collect();
        rest.sort_by(|a, b| a.0.cmp(b.0));
        let commit_bytes = self.blocks.get_required(&self.root)?;
        let blocks = std::iter::once((&self.root, commit_bytes)).chain(rest);
        Ok(write_car(std::slice::from_ref(&self.root), blocks)?)
    }

    /// A partial CAR proving the presence (or absence) of `key`: the
    /// commit, the MST nodes on the lookup path, and the record block when
    /// present.
    pub fn record_proof_car(&self, key: &str) -> Result<Vec<u8>, RepoError> {
        let (value, path) = mst::find_with_path(&self.blocks, self.commit.data(), key)?;
        let mut cids = vec![self.root.clone()];
        cids.extend(path);
        cids.extend(value);
        let blocks = cids
            .iter()
            .map(|cid| -> Result<(&Cid, &[u8]), RepoError> {
                Ok((cid, self.blocks.get_required(cid)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(write_car(std::slice::from_ref(&self.root), blocks)?)
    }
}
