//! The constitution as currently in force.

use polity_store::AmendmentRecord;
use polity_types::{AmendmentNumber, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every amendment still in force, in number order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstiDocument {
    pub articles: Vec<Article>,
}

/// One amendment in force.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub number: AmendmentNumber,
    pub text: String,
    pub ratified_at: Timestamp,
    /// Already put before the judiciary once; it cannot be challenged again.
    pub challenged: bool,
}

impl ConstiDocument {
    /// Build the document from stored amendments, skipping deprecated ones.
    pub fn from_amendments(mut amendments: Vec<AmendmentRecord>) -> Self {
        amendments.sort_by_key(|a| a.number);
        let articles = amendments
            .into_iter()
            .filter(|a| !a.deprecated)
            .map(|a| Article {
                number: a.number,
                text: a.text,
                ratified_at: a.ratified_at,
                challenged: a.has_been_challenged,
            })
            .collect();
        Self { articles }
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn get(&self, number: AmendmentNumber) -> Option<&Article> {
        self.articles.iter().find(|a| a.number == number)
    }
}

impl fmt::Display for ConstiDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for article in &self.articles {
            writeln!(f, "{}: {}", article.number, article.text)?;
        }
        Ok(())
    }
}
