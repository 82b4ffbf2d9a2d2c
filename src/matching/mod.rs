//! Candidate matching engine
//!
//! - `selector`: picks at most three candidates for a criterion
//! - `ledger`: records like/dislike judgments and detects mutual likes
//! - `notifier`: tells both sides of a mutual like about each other

pub mod ledger;
pub mod notifier;
pub mod selector;

use serde::{Deserialize, Serialize};

pub use ledger::{record_judgment, ChoiceLedger, Judgment};
pub use notifier::{notify_mutual_match, MatchDelivery, MatchSender};
pub use selector::{exclusion_set, find_candidates, select_candidates, CandidateFilter, MAX_CANDIDATES};

/// Strategy used to filter the candidate pool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criterion {
    Location,
    Status,
    Interests,
    LocationInterests,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::Location,
        Criterion::Status,
        Criterion::Interests,
        Criterion::LocationInterests,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Location => "location",
            Criterion::Status => "status",
            Criterion::Interests => "interests",
            Criterion::LocationInterests => "location_interests",
        }
    }

    /// Parse a criterion tag; unknown tags yield `None`
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == tag)
    }
}

/// Direction-specific judgment of one user about another
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Like,
    Dislike,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Like => "LIKE",
            Decision::Dislike => "DISLIKE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LIKE" => Some(Decision::Like),
            "DISLIKE" => Some(Decision::Dislike),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criterion_tags() {
        for criterion in Criterion::ALL {
            assert_eq!(Criterion::parse(criterion.as_str()), Some(criterion));
        }
        assert_eq!(Criterion::parse("age"), None);
        assert_eq!(Criterion::parse(""), None);
    }

    #[test]
    fn test_decision_parse() {
        assert_eq!(Decision::parse("LIKE"), Some(Decision::Like));
        assert_eq!(Decision::parse("DISLIKE"), Some(Decision::Dislike));
        assert_eq!(Decision::parse("like"), None);
    }
}
