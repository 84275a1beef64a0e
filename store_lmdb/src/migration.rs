//! Schema versioning for the LMDB environment.

use vigil_store::MetaStore;

use crate::LmdbError;

/// Schema written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Steps indexed by the version they start from.
const STEPS: &[&str] = &[
    // 0 -> 1: validators, keys, proposal_logs, rewards and meta databases.
    "initial layout",
];

pub struct Migrator;

impl Migrator {
    /// Bring the stored schema up to [`CURRENT_SCHEMA_VERSION`].
    ///
    /// A fresh environment reports version 0. A version above the current
    /// one was written by a newer build and is refused rather than read.
    pub fn run(meta: &impl MetaStore) -> Result<(), LmdbError> {
        let stored = meta.get_schema_version()?;
        if stored > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::Schema(format!(
                "stored version {stored} is newer than supported {CURRENT_SCHEMA_VERSION}"
            )));
        }
        if stored == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = stored, "schema current");
            return Ok(());
        }

        for from in stored..CURRENT_SCHEMA_VERSION {
            let step = STEPS
                .get(from as usize)
                .ok_or_else(|| LmdbError::Schema(format!("no step from version {from}")))?;
            tracing::info!(from, to = from + 1, step, "migrating schema");
            meta.set_schema_version(from + 1)?;
        }
        Ok(())
    }
}
