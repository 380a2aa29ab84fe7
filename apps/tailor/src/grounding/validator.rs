//! Fidelity validation: checks a candidate record against ground truth.
//!
//! Ground truth comes in two shapes sharing one contract:
//! - `RecordGroundTruth`: another structured record, exact normalized-set membership.
//! - `TextGroundTruth`: freeform profile prose, substring of the normalized text.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::grounding::entities::{extract_entities, normalize, normalize_project, EntitySet};
use crate::models::resume::{ResumeRecord, Section};

/// Which factual slot of an entry an entity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Organization,
    Position,
    Project,
}

impl EntityKind {
    fn label(self) -> &'static str {
        match self {
            EntityKind::Organization => "organization",
            EntityKind::Position => "position",
            EntityKind::Project => "project",
        }
    }
}

/// A factual source a candidate must not exceed.
pub trait GroundTruth: Send + Sync {
    /// Whether an already-normalized entity is traceable to this source.
    fn contains(&self, kind: EntityKind, normalized: &str) -> bool;

    /// Maximum number of entries a candidate section may carry, if known.
    fn entry_limit(&self, section: Section) -> Option<usize>;

    /// The source as prompt text for the rewrite call.
    fn prompt_text(&self) -> &str;
}

/// Ground truth backed by the base resume record.
pub struct RecordGroundTruth {
    entities: EntitySet,
    experience_len: usize,
    projects_len: usize,
    source_text: String,
}

impl RecordGroundTruth {
    /// `source_text` is the record as it was loaded (YAML), used verbatim in prompts.
    pub fn new(record: &ResumeRecord, source_text: impl Into<String>) -> Self {
        Self {
            entities: extract_entities(Some(record)),
            experience_len: record.experience.len(),
            projects_len: record.projects.len(),
            source_text: source_text.into(),
        }
    }
}

impl GroundTruth for RecordGroundTruth {
    fn contains(&self, kind: EntityKind, normalized: &str) -> bool {
        let set = match kind {
            EntityKind::Organization => &self.entities.organizations,
            EntityKind::Position => &self.entities.positions,
            EntityKind::Project => &self.entities.projects,
        };
        set.contains(normalized)
    }

    fn entry_limit(&self, section: Section) -> Option<usize> {
        Some(match section {
            Section::Experience => self.experience_len,
            Section::Projects => self.projects_len,
        })
    }

    fn prompt_text(&self) -> &str {
        &self.source_text
    }
}

/// Ground truth backed by freeform profile prose.
pub struct TextGroundTruth {
    raw: String,
    normalized: String,
    limits: Option<(usize, usize)>,
}

impl TextGroundTruth {
    pub fn new(text: impl Into<String>) -> Self {
        let raw = text.into();
        let normalized = normalize(&raw);
        Self {
            raw,
            normalized,
            limits: None,
        }
    }

    /// Caps candidate section sizes at those of `record`.
    pub fn with_entry_limits(mut self, record: &ResumeRecord) -> Self {
        self.limits = Some((record.experience.len(), record.projects.len()));
        self
    }
}

impl GroundTruth for TextGroundTruth {
    fn contains(&self, _kind: EntityKind, normalized: &str) -> bool {
        self.normalized.contains(normalized)
    }

    fn entry_limit(&self, section: Section) -> Option<usize> {
        self.limits.map(|(experience, projects)| match section {
            Section::Experience => experience,
            Section::Projects => projects,
        })
    }

    fn prompt_text(&self) -> &str {
        &self.raw
    }
}

/// Outcome of validating one candidate record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationDetail {
    pub is_valid: bool,
    pub violations: Vec<String>,
    pub total_entities: usize,
    pub violating_entities: usize,
    /// Deduplicated, experience before projects, then by index.
    pub entries_to_rewrite: Vec<(Section, usize)>,
}

/// Validates every experience and project entry of `candidate` in order.
///
/// Pure: identical inputs yield an identical detail, wording and ordering included.
pub fn validate(candidate: &ResumeRecord, truth: &dyn GroundTruth) -> ValidationDetail {
    let mut violations = Vec::new();
    let mut total_entities = 0;
    let mut violating_entities = 0;
    let mut flagged = BTreeSet::new();

    for section in Section::ALL {
        let entries = candidate.entries(section);
        let limit = truth.entry_limit(section);

        for (index, entry) in entries.iter().enumerate() {
            let slots: Vec<(EntityKind, &str, String)> = match section {
                Section::Experience => vec![
                    (
                        EntityKind::Organization,
                        entry.organization.as_str(),
                        normalize(&entry.organization),
                    ),
                    (
                        EntityKind::Position,
                        entry.position.as_str(),
                        normalize(&entry.position),
                    ),
                ],
                Section::Projects => vec![(
                    EntityKind::Project,
                    entry.position.as_str(),
                    normalize_project(&entry.position),
                )],
            };

            let mut entry_slots = 0;
            let mut entry_violations = 0;
            for (kind, original, normalized) in slots {
                if normalized.is_empty() {
                    continue;
                }
                entry_slots += 1;
                if !truth.contains(kind, &normalized) {
                    entry_violations += 1;
                    violations.push(format!(
                        "{section}[{index}]: {} {:?} not found in ground truth",
                        kind.label(),
                        original.trim()
                    ));
                }
            }

            let overflow = limit.is_some_and(|limit| index >= limit);
            if overflow && entry_violations == 0 {
                // A phantom entry counts as one violating slot of its own.
                entry_violations = 1;
                entry_slots = entry_slots.max(1);
            }

            total_entities += entry_slots;
            violating_entities += entry_violations;
            if entry_violations > 0 {
                flagged.insert((section, index));
            }
        }

        if let Some(limit) = limit {
            if entries.len() > limit {
                violations.push(format!(
                    "{section} has {} entries but ground truth has {limit}",
                    entries.len()
                ));
            }
        }
    }

    ValidationDetail {
        is_valid: violations.is_empty(),
        violations,
        total_entities,
        violating_entities,
        entries_to_rewrite: flagged.into_iter().collect(),
    }
}
