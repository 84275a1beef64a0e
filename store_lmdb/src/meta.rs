use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use vigil_store::{MetaStore, StoreError};

use crate::LmdbError;

const SCHEMA_VERSION: &[u8] = b"schema_version";

pub struct LmdbMetaStore {
    pub(crate) env: Arc<Env>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbMetaStore {
    fn read_u32(&self, key: &[u8]) -> Result<Option<u32>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let Some(raw) = self.meta_db.get(&rtxn, key).map_err(LmdbError::from)? else {
            return Ok(None);
        };
        let raw: [u8; 4] = raw.try_into().map_err(|_| {
            StoreError::Corruption(format!(
                "{} is {} bytes, expected 4",
                String::from_utf8_lossy(key),
                raw.len()
            ))
        })?;
        Ok(Some(u32::from_le_bytes(raw)))
    }

    fn write_u32(&self, key: &[u8], value: u32) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, key, &value.to_le_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

impl MetaStore for LmdbMetaStore {
    fn get_schema_version(&self) -> Result<u32, StoreError> {
        Ok(self.read_u32(SCHEMA_VERSION)?.unwrap_or(0))
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.write_u32(SCHEMA_VERSION, version)
    }
}
