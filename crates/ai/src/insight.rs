use serde::Serialize;

use partscope_core::ItemStatus;

/// Read-only view of one record, as much as the heuristic needs.
///
/// Callers build this from their storage representation; the heuristic
/// never sees (or touches) the stored record itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSnapshot {
    pub item_id: String,
    pub name: String,
    pub status: ItemStatus,
    pub owner: String,
    pub score: Option<f64>,
}

/// Urgency bucket attached to a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Elevated,
    High,
    Critical,
}

/// Derived, non-persisted recommendation for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub item_id: String,
    pub name: String,
    pub current_status: ItemStatus,
    pub recommended_status: ItemStatus,
    pub priority: Priority,
    pub owner_hint: Option<String>,
    pub confidence: Option<f64>,
    pub summary: &'static str,
    pub suggested_note: &'static str,
}

/// Defect probability at or above which a lot is quarantined outright.
const SCORE_CRITICAL: f64 = 0.85;
/// Lower bound of the rework band.
const SCORE_HIGH: f64 = 0.65;
/// Lower bound of the keep-under-observation band.
const SCORE_BORDERLINE: f64 = 0.45;

/// Derive heuristic guidance for an inventory record from its model score.
///
/// Pure: same snapshot in, same insight out. Bands are closed on their
/// lower bound, so 0.85 is critical and 0.45 is borderline.
pub fn build_insight(item: &ItemSnapshot) -> Insight {
    let (recommended_status, priority, default_hint, summary, suggested_note) = match item.score {
        None => (
            ItemStatus::AwaitingReview,
            Priority::Low,
            Some("Quality"),
            "No prediction data available; prompt the lab to classify this image.",
            "Item has not been classified yet. Schedule inspection.",
        ),
        Some(score) if score >= SCORE_CRITICAL => (
            ItemStatus::NeedsAttention,
            Priority::Critical,
            Some("Reliability"),
            "Model flags this component as highly likely defective. Quarantine the lot immediately.",
            "Hold shipment, escalate to reliability engineering, and initiate tear-down analysis.",
        ),
        Some(score) if score >= SCORE_HIGH => (
            ItemStatus::NeedsAttention,
            Priority::High,
            Some("Maintenance"),
            "Elevated defect probability; prioritize rework and secondary inspection.",
            "Route to maintenance for rework and request ultrasonic verification.",
        ),
        Some(score) if score >= SCORE_BORDERLINE => (
            ItemStatus::InReview,
            Priority::Elevated,
            None,
            "Borderline reading; keep under observation and sample additional units.",
            "Add to the monitoring queue and capture more samples from the same batch.",
        ),
        Some(_) => (
            ItemStatus::Cleared,
            Priority::Low,
            Some("Quality"),
            "Low likelihood of defect; release after visual confirmation.",
            "Log QA spot check and release to assembly if no manual defects are found.",
        ),
    };

    let owner_hint = if item.owner.is_empty() {
        default_hint.map(str::to_string)
    } else {
        Some(item.owner.clone())
    };

    Insight {
        item_id: item.item_id.clone(),
        name: item.name.clone(),
        current_status: item.status,
        recommended_status,
        priority,
        owner_hint,
        confidence: item.score.map(|s| (s * 1000.0).round() / 1000.0),
        summary,
        suggested_note,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(score: Option<f64>) -> ItemSnapshot {
        ItemSnapshot {
            item_id: "item-1".to_string(),
            name: "Impeller".to_string(),
            status: ItemStatus::AwaitingReview,
            owner: String::new(),
            score,
        }
    }

    #[test]
    fn unclassified_item_waits_for_review() {
        let insight = build_insight(&snapshot(None));
        assert_eq!(insight.recommended_status, ItemStatus::AwaitingReview);
        assert_eq!(insight.priority, Priority::Low);
        assert_eq!(insight.owner_hint.as_deref(), Some("Quality"));
        assert_eq!(insight.confidence, None);
    }

    #[test]
    fn critical_band_is_closed_at_0_85() {
        let insight = build_insight(&snapshot(Some(0.85)));
        assert_eq!(insight.recommended_status, ItemStatus::NeedsAttention);
        assert_eq!(insight.priority, Priority::Critical);
        assert_eq!(insight.owner_hint.as_deref(), Some("Reliability"));
    }

    #[test]
    fn high_band_is_closed_at_0_65() {
        let insight = build_insight(&snapshot(Some(0.65)));
        assert_eq!(insight.recommended_status, ItemStatus::NeedsAttention);
        assert_eq!(insight.priority, Priority::High);
        assert_eq!(insight.owner_hint.as_deref(), Some("Maintenance"));
    }

    #[test]
    fn borderline_band_is_closed_at_0_45_with_no_owner_hint() {
        let insight = build_insight(&snapshot(Some(0.45)));
        assert_eq!(insight.recommended_status, ItemStatus::InReview);
        assert_eq!(insight.priority, Priority::Elevated);
        assert_eq!(insight.owner_hint, None);
    }

    #[test]
    fn low_scores_clear_the_item() {
        let insight = build_insight(&snapshot(Some(0.12)));
        assert_eq!(insight.recommended_status, ItemStatus::Cleared);
        assert_eq!(insight.priority, Priority::Low);
        assert_eq!(insight.owner_hint.as_deref(), Some("Quality"));
    }

    #[test]
    fn assigned_owner_is_echoed_instead_of_the_hint() {
        let mut item = snapshot(Some(0.95));
        item.owner = "Priya".to_string();
        let insight = build_insight(&item);
        assert_eq!(insight.owner_hint.as_deref(), Some("Priya"));
    }

    #[test]
    fn confidence_is_rounded_to_three_decimals() {
        let insight = build_insight(&snapshot(Some(0.123456)));
        assert_eq!(insight.confidence, Some(0.123));
    }

    #[test]
    fn insight_does_not_change_the_snapshot() {
        let item = snapshot(Some(0.7));
        let before = item.clone();
        let _ = build_insight(&item);
        assert_eq!(item, before);
    }
}
