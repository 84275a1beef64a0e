//! LMDB implementation of ProposalLogStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use vigil_store::{ProposalLogStore, StoreError};
use vigil_types::{ProposalLog, Timestamp};

use crate::codec::{decode, encode, prefix_key, proposal_key};
use crate::LmdbError;

pub struct LmdbProposalLogStore {
    pub(crate) env: Arc<Env>,
    pub(crate) proposals_db: Database<Bytes, Bytes>,
}

impl ProposalLogStore for LmdbProposalLogStore {
    fn upsert_proposal_log(
        &self,
        network: &str,
        proposal_id: u64,
        title: &str,
        now: Timestamp,
    ) -> Result<ProposalLog, StoreError> {
        let key = proposal_key(network, proposal_id);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existing = self
            .proposals_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .map(|b| b.to_vec());

        let row = match existing {
            Some(bytes) => {
                let mut row: ProposalLog = decode(&bytes)?;
                if row.title == title {
                    return Ok(row);
                }
                row.title = title.to_string();
                row
            }
            None => ProposalLog::new(network, proposal_id, title, now),
        };

        let val = encode(&row)?;
        self.proposals_db
            .put(&mut wtxn, &key, &val)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(row)
    }

    fn update_vote_option(
        &self,
        network: &str,
        proposal_id: u64,
        vote_option: &str,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let key = proposal_key(network, proposal_id);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existing = self
            .proposals_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .map(|b| b.to_vec())
            .ok_or_else(|| StoreError::NotFound(format!("proposal {proposal_id} on {network}")))?;
        let mut row: ProposalLog = decode(&existing)?;
        row.vote_option = vote_option.to_string();
        row.updated_at = now;
        let val = encode(&row)?;
        self.proposals_db
            .put(&mut wtxn, &key, &val)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_proposal_log(
        &self,
        network: &str,
        proposal_id: u64,
    ) -> Result<Option<ProposalLog>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .proposals_db
            .get(&rtxn, &proposal_key(network, proposal_id))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn list_proposal_logs(
        &self,
        network: Option<&str>,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<ProposalLog>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut results = Vec::new();
        let mut push = |val: &[u8]| -> Result<(), StoreError> {
            let row: ProposalLog = decode(val)?;
            if row.updated_at >= from && row.updated_at <= to {
                results.push(row);
            }
            Ok(())
        };

        match network {
            Some(network) => {
                let prefix = prefix_key(&[network.as_bytes()]);
                let iter = self
                    .proposals_db
                    .prefix_iter(&rtxn, &prefix)
                    .map_err(LmdbError::from)?;
                for entry in iter {
                    let (_, val) = entry.map_err(LmdbError::from)?;
                    push(val)?;
                }
            }
            None => {
                let iter = self.proposals_db.iter(&rtxn).map_err(LmdbError::from)?;
                for entry in iter {
                    let (_, val) = entry.map_err(LmdbError::from)?;
                    push(val)?;
                }
            }
        }
        Ok(results)
    }
}
