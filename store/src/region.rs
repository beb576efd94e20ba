//! Recognized voter regions.

use crate::StoreError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub name: String,
    pub is_recognized: bool,
}

pub trait RegionStore {
    fn put_region(&self, region: &RegionRecord) -> Result<(), StoreError>;
    fn list_regions(&self) -> Result<Vec<RegionRecord>, StoreError>;

    /// Whether voters may register at `name`.
    fn is_recognized_region(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self
            .list_regions()?
            .iter()
            .any(|r| r.name == name && r.is_recognized))
    }
}
