//! Consti engine: ratification, repeal and challenge marking.

use crate::document::ConstiDocument;
use crate::error::ConstiError;
use polity_store::{AmendmentRecord, ConstitutionStore, StoreError};
use polity_types::{AmendmentNumber, Timestamp};

#[derive(Clone, Copy, Debug, Default)]
pub struct ConstiEngine;

impl ConstiEngine {
    /// Add a new amendment under the next number (one past the highest ever
    /// used, starting at 1).
    pub fn ratify<S: ConstitutionStore + ?Sized>(
        &self,
        store: &S,
        text: &str,
        now: Timestamp,
    ) -> Result<AmendmentRecord, ConstiError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ConstiError::EmptyText);
        }
        let number = store
            .list_amendments()?
            .iter()
            .map(|a| a.number)
            .max()
            .map(|n| n.next())
            .unwrap_or(AmendmentNumber::new(1));
        let record = AmendmentRecord {
            number,
            text: text.to_string(),
            deprecated: false,
            has_been_challenged: false,
            ratified_at: now,
        };
        store.put_amendment(&record)?;
        tracing::info!(amendment = %number, "amendment ratified");
        Ok(record)
    }

    /// Strike an amendment. The record stays, marked deprecated.
    pub fn repeal<S: ConstitutionStore + ?Sized>(
        &self,
        store: &S,
        number: AmendmentNumber,
    ) -> Result<AmendmentRecord, ConstiError> {
        let mut record = self.get(store, number)?;
        if record.deprecated {
            return Err(ConstiError::AlreadyRepealed(number));
        }
        record.deprecated = true;
        store.put_amendment(&record)?;
        tracing::info!(amendment = %number, "amendment repealed");
        Ok(record)
    }

    /// Record that an amendment is being challenged. Only amendments in
    /// force can be challenged, and only once.
    pub fn mark_challenged<S: ConstitutionStore + ?Sized>(
        &self,
        store: &S,
        number: AmendmentNumber,
    ) -> Result<AmendmentRecord, ConstiError> {
        let mut record = self.get(store, number)?;
        if record.deprecated {
            return Err(ConstiError::AlreadyRepealed(number));
        }
        if record.has_been_challenged {
            return Err(ConstiError::AlreadyChallenged(number));
        }
        record.has_been_challenged = true;
        store.put_amendment(&record)?;
        Ok(record)
    }

    pub fn get<S: ConstitutionStore + ?Sized>(
        &self,
        store: &S,
        number: AmendmentNumber,
    ) -> Result<AmendmentRecord, ConstiError> {
        match store.get_amendment(number) {
            Ok(record) => Ok(record),
            Err(StoreError::NotFound(_)) => Err(ConstiError::AmendmentNotFound(number)),
            Err(e) => Err(e.into()),
        }
    }

    /// The constitution as currently in force.
    pub fn active<S: ConstitutionStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<ConstiDocument, ConstiError> {
        Ok(ConstiDocument::from_amendments(store.list_amendments()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polity_store::MemoryStore;

    #[test]
    fn numbers_start_at_one_and_are_never_reused() {
        let store = MemoryStore::new();
        let engine = ConstiEngine;
        let first = engine.ratify(&store, "no hats indoors", Timestamp::new(1)).unwrap();
        assert_eq!(first.number, AmendmentNumber::new(1));
        engine.repeal(&store, first.number).unwrap();
        let second = engine.ratify(&store, "hats mandatory", Timestamp::new(2)).unwrap();
        assert_eq!(second.number, AmendmentNumber::new(2));
    }

    #[test]
    fn active_view_skips_repealed_amendments() {
        let store = MemoryStore::new();
        let engine = ConstiEngine;
        engine.ratify(&store, "one", Timestamp::new(1)).unwrap();
        engine.ratify(&store, "two", Timestamp::new(2)).unwrap();
        engine.repeal(&store, AmendmentNumber::new(1)).unwrap();

        let doc = engine.active(&store).unwrap();
        assert_eq!(doc.articles.len(), 1);
        assert_eq!(doc.articles[0].text, "two");
        assert_eq!(doc.to_string(), "amendment #2: two\n");
    }

    #[test]
    fn repeal_twice_is_rejected() {
        let store = MemoryStore::new();
        let engine = ConstiEngine;
        let a = engine.ratify(&store, "one", Timestamp::new(1)).unwrap();
        engine.repeal(&store, a.number).unwrap();
        assert!(matches!(
            engine.repeal(&store, a.number),
            Err(ConstiError::AlreadyRepealed(_))
        ));
    }

    #[test]
    fn amendments_can_be_challenged_once() {
        let store = MemoryStore::new();
        let engine = ConstiEngine;
        let a = engine.ratify(&store, "one", Timestamp::new(1)).unwrap();
        engine.mark_challenged(&store, a.number).unwrap();
        assert!(matches!(
            engine.mark_challenged(&store, a.number),
            Err(ConstiError::AlreadyChallenged(_))
        ));
        assert!(matches!(
            engine.mark_challenged(&store, AmendmentNumber::new(9)),
            Err(ConstiError::AmendmentNotFound(_))
        ));
    }

    #[test]
    fn blank_text_is_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            ConstiEngine.ratify(&store, "   ", Timestamp::new(1)),
            Err(ConstiError::EmptyText)
        ));
    }
}
