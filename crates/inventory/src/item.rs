use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use partscope_core::{DomainResult, ItemId, ItemStatus};

/// Model verdict for one record.
///
/// Score and label travel together: a record either has both or neither,
/// so the pair is modelled as one optional value on [`InventoryItem`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Probability of the "defect" class, in [0, 1].
    pub score: f64,
    /// Predicted class: 1 means defect, 0 means no defect.
    pub label: u8,
}

impl Classification {
    pub fn new(score: f64, label: u8) -> Self {
        Self { score, label }
    }

    /// Workflow status implied by the predicted label.
    pub fn derived_status(&self) -> ItemStatus {
        if self.label == 1 {
            ItemStatus::NeedsAttention
        } else {
            ItemStatus::Cleared
        }
    }
}

/// One inspected physical item with classification and workflow metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub status: ItemStatus,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    /// Relative reference to the stored image bytes, e.g.
    /// `/inventory/images/<id>.png`. Immutable after creation.
    pub image_path: String,
    pub notes: String,
    pub classification: Option<Classification>,
}

impl InventoryItem {
    pub fn score(&self) -> Option<f64> {
        self.classification.as_ref().map(|c| c.score)
    }

    pub fn label(&self) -> Option<u8> {
        self.classification.as_ref().map(|c| c.label)
    }

    /// Record a model verdict, deriving the workflow status from the label.
    ///
    /// Overwrites any prior status, including one set by hand; an explicit
    /// later update may override it again (last writer wins).
    pub fn apply_classification(&mut self, outcome: Classification) {
        self.status = outcome.derived_status();
        self.classification = Some(outcome);
    }
}

/// Caller-supplied fields for a new record; everything optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemDraft {
    pub name: Option<String>,
    pub status: Option<String>,
    pub owner: Option<String>,
    pub notes: Option<String>,
}

impl ItemDraft {
    /// Build the record to persist, applying upload defaults.
    ///
    /// A blank name falls back to `"Item"`; the status is validated against
    /// the fixed set (blank means the default `awaiting_review`).
    pub fn into_item(
        self,
        id: ItemId,
        image_path: String,
        created_at: DateTime<Utc>,
    ) -> DomainResult<InventoryItem> {
        let status = ItemStatus::ensure_valid(self.status.as_deref())?;
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Item".to_string());

        Ok(InventoryItem {
            id,
            name,
            status,
            owner: self.owner.unwrap_or_default(),
            created_at,
            image_path,
            notes: self.notes.unwrap_or_default(),
            classification: None,
        })
    }
}

/// Explicit optional-field update for a record.
///
/// Each updatable attribute is an optional value; absent fields leave the
/// record untouched. Construct through [`ItemPatch::from_fields`] so the
/// status is validated before anything is mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    name: Option<String>,
    status: Option<ItemStatus>,
    owner: Option<String>,
    notes: Option<String>,
    append_notes: bool,
}

impl ItemPatch {
    /// Normalize and validate raw update fields.
    ///
    /// - `name`: trimmed; blank after trim keeps the prior value.
    /// - `status`: trimmed and validated; blank after trim counts as not
    ///   supplied.
    /// - `owner`: trimmed; blank is accepted (clears the owner).
    /// - `notes`: trimmed; replaces, or appends on a new line when
    ///   `append_notes` is set and the record already has notes.
    pub fn from_fields(
        name: Option<String>,
        status: Option<String>,
        owner: Option<String>,
        notes: Option<String>,
        append_notes: bool,
    ) -> DomainResult<Self> {
        let status = match status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(candidate) => Some(candidate.parse::<ItemStatus>()?),
        };

        Ok(Self {
            name: name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            status,
            owner: owner.map(|o| o.trim().to_string()),
            notes: notes.map(|n| n.trim().to_string()),
            append_notes,
        })
    }

    /// Patch that sets an already-validated status.
    pub fn with_status(status: ItemStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Patch that appends a diagnostic note, keeping whatever is there.
    pub fn appended_note(text: impl Into<String>) -> Self {
        Self {
            notes: Some(text.into()),
            append_notes: true,
            ..Self::default()
        }
    }

    /// True when applying the patch cannot change any field.
    pub fn is_noop(&self) -> bool {
        self.name.is_none() && self.status.is_none() && self.owner.is_none() && self.notes.is_none()
    }

    /// Merge the supplied fields into the record.
    pub fn apply(&self, item: &mut InventoryItem) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(owner) = &self.owner {
            item.owner = owner.clone();
        }
        if let Some(notes) = &self.notes {
            if self.append_notes && !item.notes.is_empty() {
                if !notes.is_empty() {
                    item.notes = format!("{}\n{}", item.notes, notes);
                }
            } else {
                item.notes = notes.clone();
            }
        }
    }
}
