use std::fmt;

use serde::{Deserialize, Serialize};

/// The canonical resume content loaded from `resume_content.yaml`.
///
/// Every field defaults so that a partial mapping (for example a rewrite reply
/// carrying only `experience`) still deserializes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub skills: Vec<SkillGroup>,
    #[serde(default)]
    pub experience: Vec<Entry>,
    #[serde(default)]
    pub projects: Vec<Entry>,
}

impl ResumeRecord {
    pub fn entries(&self, section: Section) -> &[Entry] {
        match section {
            Section::Experience => &self.experience,
            Section::Projects => &self.projects,
        }
    }

    pub fn entries_mut(&mut self, section: Section) -> &mut Vec<Entry> {
        match section {
            Section::Experience => &mut self.experience,
            Section::Projects => &mut self.projects,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.trim().is_empty()
            && self.skills.is_empty()
            && self.experience.is_empty()
            && self.projects.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGroup {
    pub category: String,
    pub items: SkillItems,
}

/// Skill items are written either as one comma-separated line or as a YAML list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SkillItems {
    Text(String),
    List(Vec<String>),
}

impl SkillItems {
    pub fn joined(&self) -> String {
        match self {
            SkillItems::Text(text) => text.clone(),
            SkillItems::List(items) => items.join(", "),
        }
    }
}

/// A dated experience or project entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub bullets: Vec<String>,
    /// Position already contains LaTeX markup and must not be escaped again.
    #[serde(default, skip_serializing_if = "is_false")]
    pub raw_position: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// The two entry-bearing sections the fact guard inspects.
/// Ordering is experience before projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Experience,
    Projects,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::Experience, Section::Projects];

    pub fn key(self) -> &'static str {
        match self {
            Section::Experience => "experience",
            Section::Projects => "projects",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
