//! Entity extraction: the factual identifiers the fact guard compares.
//!
//! An entity is a normalized organization, role title, or project name.
//! Two entities are equal only when their normalized strings are equal.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::resume::ResumeRecord;

/// `\href{target}` / `\url{target}`: the link target is not part of the name.
static LINK_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\(?:href|url)\{[^}]*\}").expect("link target pattern is valid")
});

/// `(https://...)` or `(www....)` fragments trailing a project name.
static PAREN_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*(?:https?://|www\.)[^)]*\)").expect("paren url pattern is valid")
});

/// `\textbf`, `\emph*`, ... command tokens.
static COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\[A-Za-z]+\*?").expect("command pattern is valid"));

static MARKUP_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[{}\[\]\\]").expect("markup char pattern is valid"));

/// Lowercases and collapses all whitespace runs to single spaces.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Removes markup commands, brackets and parenthesized links, then normalizes.
/// Used for project positions, which may carry pre-escaped LaTeX.
pub fn normalize_project(text: &str) -> String {
    let text = LINK_TARGET.replace_all(text, " ");
    let text = PAREN_URL.replace_all(&text, " ");
    let text = COMMAND.replace_all(&text, " ");
    let text = MARKUP_CHARS.replace_all(&text, " ");
    normalize(&text)
}

/// Normalized entity sets extracted from one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySet {
    pub organizations: BTreeSet<String>,
    pub positions: BTreeSet<String>,
    pub projects: BTreeSet<String>,
}

impl EntitySet {
    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty() && self.positions.is_empty() && self.projects.is_empty()
    }
}

/// Pulls organizations and positions from experience entries and project names
/// from project entries. Blank fields are skipped; `None` yields empty sets.
pub fn extract_entities(record: Option<&ResumeRecord>) -> EntitySet {
    let mut entities = EntitySet::default();
    let Some(record) = record else {
        return entities;
    };

    for entry in &record.experience {
        let organization = normalize(&entry.organization);
        if !organization.is_empty() {
            entities.organizations.insert(organization);
        }
        let position = normalize(&entry.position);
        if !position.is_empty() {
            entities.positions.insert(position);
        }
    }

    for entry in &record.projects {
        let project = normalize_project(&entry.position);
        if !project.is_empty() {
            entities.projects.insert(project);
        }
    }

    entities
}
