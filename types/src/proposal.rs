//! Proposal kinds and what each one does when it passes.

use crate::ids::AmendmentNumber;
use crate::vote::RiggingMode;
use serde::{Deserialize, Serialize};

/// What a proposal asks the community to do.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProposalKind {
    /// Dissolve the government. Always rigged to fail.
    Dissolve,
    /// Add an amendment with the given text to the constitution.
    AddAmendment { text: String },
    /// Strike an existing amendment from the constitution.
    RepealAmendment { number: AmendmentNumber },
    /// Enact a free-form resolution, posted to the agenda.
    Resolution { text: String },
}

/// The effect of a passed proposal, applied by the resolution dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Enactment {
    Nothing,
    Ratify { text: String },
    Repeal { number: AmendmentNumber },
    PostToAgenda { text: String },
}

impl ProposalKind {
    /// Rigging applied to every proposal of this kind at submission.
    pub fn default_rigging(&self) -> RiggingMode {
        match self {
            Self::Dissolve => RiggingMode::MustFail,
            Self::AddAmendment { .. } | Self::RepealAmendment { .. } | Self::Resolution { .. } => {
                RiggingMode::None
            }
        }
    }

    /// What happens once this proposal has passed.
    pub fn enactment(&self) -> Enactment {
        match self {
            Self::Dissolve => Enactment::Nothing,
            Self::AddAmendment { text } => Enactment::Ratify { text: text.clone() },
            Self::RepealAmendment { number } => Enactment::Repeal { number: *number },
            Self::Resolution { text } => Enactment::PostToAgenda { text: text.clone() },
        }
    }

    /// Short machine name, used in logs.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Dissolve => "dissolve",
            Self::AddAmendment { .. } => "add_amend",
            Self::RepealAmendment { .. } => "sub_amend",
            Self::Resolution { .. } => "add_resolution",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dissolve_is_rigged_to_fail_and_enacts_nothing() {
        let kind = ProposalKind::Dissolve;
        assert_eq!(kind.default_rigging(), RiggingMode::MustFail);
        assert_eq!(kind.enactment(), Enactment::Nothing);
    }

    #[test]
    fn repeal_enacts_against_its_amendment() {
        let kind = ProposalKind::RepealAmendment {
            number: AmendmentNumber::new(4),
        };
        assert_eq!(kind.default_rigging(), RiggingMode::None);
        assert_eq!(
            kind.enactment(),
            Enactment::Repeal {
                number: AmendmentNumber::new(4)
            }
        );
    }

    #[test]
    fn kinds_serialize_with_a_tag() {
        let kind = ProposalKind::Resolution {
            text: "more hotdogs".into(),
        };
        let json = serde_json::to_string(&kind).unwrap();
        assert!(json.contains("\"kind\":\"resolution\""));
        let back: ProposalKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }
}
