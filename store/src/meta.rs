//! Singleton values kept alongside the data, such as the schema version.

use crate::StoreError;

pub trait MetaStore {
    /// Schema version the data was written with; 0 for a fresh database.
    fn get_schema_version(&self) -> Result<u32, StoreError>;

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError>;
}
