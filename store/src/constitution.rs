//! Constitution storage trait.

use crate::StoreError;
use polity_types::{AmendmentNumber, Timestamp};
use serde::{Deserialize, Serialize};

/// One amendment of the constitution.
///
/// Amendments are never deleted; a repealed amendment stays on record as deprecated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendmentRecord {
    pub number: AmendmentNumber,
    pub text: String,
    pub deprecated: bool,
    pub has_been_challenged: bool,
    pub ratified_at: Timestamp,
}

pub trait ConstitutionStore {
    fn get_amendment(&self, number: AmendmentNumber) -> Result<AmendmentRecord, StoreError>;
    fn put_amendment(&self, amendment: &AmendmentRecord) -> Result<(), StoreError>;
    /// All amendments in number order.
    fn list_amendments(&self) -> Result<Vec<AmendmentRecord>, StoreError>;
}
