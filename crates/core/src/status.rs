//! Review lifecycle status for inventory items.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Workflow state of an inspected item.
///
/// The set is closed: any other value is rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    AwaitingReview,
    InReview,
    NeedsAttention,
    Cleared,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::AwaitingReview,
        ItemStatus::InReview,
        ItemStatus::NeedsAttention,
        ItemStatus::Cleared,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::AwaitingReview => "awaiting_review",
            ItemStatus::InReview => "in_review",
            ItemStatus::NeedsAttention => "needs_attention",
            ItemStatus::Cleared => "cleared",
        }
    }

    /// Validate a raw status string.
    ///
    /// Input is trimmed first; an absent or blank value falls back to the
    /// default `awaiting_review`. Anything outside the fixed set is a
    /// validation error.
    pub fn ensure_valid(value: Option<&str>) -> DomainResult<ItemStatus> {
        let candidate = value.map(str::trim).unwrap_or("");
        if candidate.is_empty() {
            return Ok(ItemStatus::AwaitingReview);
        }
        candidate.parse()
    }
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::AwaitingReview
    }
}

impl core::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ItemStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "awaiting_review" => Ok(ItemStatus::AwaitingReview),
            "in_review" => Ok(ItemStatus::InReview),
            "needs_attention" => Ok(ItemStatus::NeedsAttention),
            "cleared" => Ok(ItemStatus::Cleared),
            other => Err(DomainError::validation(format!(
                "status '{other}' is not allowed"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn all_members_round_trip_through_their_string_form() {
        for status in ItemStatus::ALL {
            assert_eq!(status.as_str().parse::<ItemStatus>().unwrap(), status);
        }
    }

    #[test]
    fn parsing_trims_surrounding_whitespace() {
        assert_eq!(
            "  in_review  ".parse::<ItemStatus>().unwrap(),
            ItemStatus::InReview
        );
    }

    #[test]
    fn ensure_valid_defaults_absent_and_blank_to_awaiting_review() {
        assert_eq!(
            ItemStatus::ensure_valid(None).unwrap(),
            ItemStatus::AwaitingReview
        );
        assert_eq!(
            ItemStatus::ensure_valid(Some("   ")).unwrap(),
            ItemStatus::AwaitingReview
        );
    }

    #[test]
    fn ensure_valid_rejects_unknown_status() {
        let err = ItemStatus::ensure_valid(Some("bogus")).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn arbitrary_non_member_strings_are_rejected(s in "\\PC*") {
            let trimmed = s.trim();
            let is_member = ItemStatus::ALL.iter().any(|v| v.as_str() == trimmed);
            prop_assume!(!trimmed.is_empty() && !is_member);
            prop_assert!(s.parse::<ItemStatus>().is_err());
        }
    }
}
