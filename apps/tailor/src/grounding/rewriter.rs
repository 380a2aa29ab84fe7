//! Targeted rewrite with one narrow correction call covering only the flagged entries.
//!
//! The candidate is never mutated: accepted corrections are merged into a copy.
//! Re-validation of the merged record is the orchestrator's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::generation::extract::{extract_block, parse_structured, ExtractError, REWRITE_KEYS};
use crate::generation::prompts::{build_rewrite_prompt, rewrite_system};
use crate::grounding::validator::GroundTruth;
use crate::llm_client::{LlmError, TextGenerator};
use crate::models::resume::{Entry, ResumeRecord, Section};

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("rewrite call failed: {0}")]
    Transport(#[from] LlmError),

    #[error("rewrite reply could not be parsed: {0}")]
    Parse(#[from] ExtractError),

    #[error("could not serialize entries for rewrite: {0}")]
    Request(#[from] serde_yaml::Error),
}

/// The minimal structured block sent to and expected back from the rewrite call.
/// Only sections with flagged entries appear.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RewriteBlock {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    experience: Vec<Entry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    projects: Vec<Entry>,
}

impl RewriteBlock {
    fn section(&self, section: Section) -> &[Entry] {
        match section {
            Section::Experience => &self.experience,
            Section::Projects => &self.projects,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut Vec<Entry> {
        match section {
            Section::Experience => &mut self.experience,
            Section::Projects => &mut self.projects,
        }
    }
}

/// Flagged indices of one section that exist in the candidate, in order.
fn indices_for(targets: &[(Section, usize)], section: Section, candidate: &ResumeRecord) -> Vec<usize> {
    let len = candidate.entries(section).len();
    let mut indices: Vec<usize> = targets
        .iter()
        .filter(|(s, i)| *s == section && *i < len)
        .map(|(_, i)| *i)
        .collect();
    indices.sort_unstable();
    indices.dedup();
    indices
}

/// Asks the model to correct only the `targets` entries of `candidate` against
/// `truth`, then merges the corrections positionally into a new record.
///
/// A corrected-entry count that differs from the requested count is logged;
/// unmatched slots keep their original content.
pub async fn rewrite_entries(
    generator: &dyn TextGenerator,
    truth: &dyn GroundTruth,
    candidate: &ResumeRecord,
    targets: &[(Section, usize)],
    violations: &[String],
) -> Result<ResumeRecord, RewriteError> {
    let mut request = RewriteBlock::default();
    let mut requested: Vec<(Section, Vec<usize>)> = Vec::new();
    for section in Section::ALL {
        let indices = indices_for(targets, section, candidate);
        if indices.is_empty() {
            continue;
        }
        let entries = candidate.entries(section);
        request
            .section_mut(section)
            .extend(indices.iter().map(|&i| entries[i].clone()));
        requested.push((section, indices));
    }

    if requested.is_empty() {
        return Ok(candidate.clone());
    }

    let entries_yaml = serde_yaml::to_string(&request)?;
    let prompt = build_rewrite_prompt(truth.prompt_text(), &entries_yaml, violations);
    info!(
        "Requesting targeted rewrite of {} entr(y/ies)",
        requested.iter().map(|(_, i)| i.len()).sum::<usize>()
    );

    let reply = generator.complete(&prompt, &rewrite_system()).await?;
    let block = extract_block(&reply, REWRITE_KEYS);
    let corrected: RewriteBlock = parse_structured(&block)?;

    let mut merged = candidate.clone();
    for (section, indices) in requested {
        let replacements = corrected.section(section);
        if replacements.len() != indices.len() {
            warn!(
                "Rewrite returned {} {} entr(y/ies), expected {}; merging positionally",
                replacements.len(),
                section,
                indices.len()
            );
        }
        let entries = merged.entries_mut(section);
        for (&index, replacement) in indices.iter().zip(replacements) {
            entries[index] = replacement.clone();
        }
    }

    Ok(merged)
}
