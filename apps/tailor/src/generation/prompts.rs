// Prompt templates for the tailoring and targeted-rewrite calls.
// Placeholders are filled with `str::replace` before sending.

use crate::llm_client::prompts::{NO_FABRICATION_INSTRUCTION, YAML_ONLY_INSTRUCTION};

/// Tailoring system directive. Replace `{no_fabrication}` and `{yaml_only}`.
const TAILOR_SYSTEM_TEMPLATE: &str = "You are a resume tailor. {no_fabrication} \
    {yaml_only} Use keys: summary, skills, experience, projects, with the same structure as \
    the input (skills as a list of {category, items}; experience and projects as lists of \
    {position, organization, date, location, bullets}). Preserve raw_position: true for \
    project entries that need LaTeX in the position field.";

/// Rewrite system directive: a narrower correction-only instruction.
const REWRITE_SYSTEM_TEMPLATE: &str = "You are correcting factual errors in resume entries. \
    Fix ONLY organization names, position titles, and project names that are not supported by \
    the ground truth, replacing them with the matching facts from the ground truth. \
    Keep every other field and the entry structure unchanged. Do not add sections or entries. \
    Return only the keys you were given (experience and/or projects), in the same order, \
    with the same number of entries. {yaml_only}";

/// Replace: {base_yaml}, {profile_block}, {job_description}
pub const TAILOR_PROMPT_TEMPLATE: &str = r#"Base resume content (YAML):
```yaml
{base_yaml}
```
{profile_block}
Job description:
```
{job_description}
```

Produce tailored resume YAML that matches the job description while using ONLY the facts above. Output nothing but the YAML (you may wrap it in a ```yaml ... ``` code block)."#;

/// Replace: {base_yaml}, {profile_block}
pub const POLISH_PROMPT_TEMPLATE: &str = r#"Base resume content (YAML):
```yaml
{base_yaml}
```
{profile_block}
Produce a polished version of this resume YAML. Use ONLY the facts above; do not add any new information. Output nothing but the YAML (you may wrap it in a ```yaml ... ``` code block)."#;

/// Replace: {profile}
const PROFILE_BLOCK_TEMPLATE: &str = r#"
Profile (the factual source every organization, title and project must come from):
```
{profile}
```
"#;

/// Replace: {ground_truth}, {entries_yaml}, {violations}
pub const REWRITE_PROMPT_TEMPLATE: &str = r#"Ground truth:
```
{ground_truth}
```

These entries contain facts that are not in the ground truth:
{violations}

Entries to correct (YAML):
```yaml
{entries_yaml}
```

Return the corrected entries as YAML with the same keys, order and entry count."#;

pub fn tailor_system() -> String {
    TAILOR_SYSTEM_TEMPLATE
        .replace("{no_fabrication}", NO_FABRICATION_INSTRUCTION)
        .replace("{yaml_only}", YAML_ONLY_INSTRUCTION)
}

pub fn rewrite_system() -> String {
    REWRITE_SYSTEM_TEMPLATE.replace("{yaml_only}", YAML_ONLY_INSTRUCTION)
}

/// Builds the tailoring prompt; without a job description the model only polishes.
pub fn build_tailor_prompt(
    base_yaml: &str,
    profile: Option<&str>,
    job_description: Option<&str>,
) -> String {
    let profile_block = profile
        .map(|p| PROFILE_BLOCK_TEMPLATE.replace("{profile}", p.trim()))
        .unwrap_or_default();

    match job_description {
        Some(jd) => TAILOR_PROMPT_TEMPLATE
            .replace("{base_yaml}", base_yaml.trim_end())
            .replace("{profile_block}", &profile_block)
            .replace("{job_description}", jd.trim()),
        None => POLISH_PROMPT_TEMPLATE
            .replace("{base_yaml}", base_yaml.trim_end())
            .replace("{profile_block}", &profile_block),
    }
}

pub fn build_rewrite_prompt(ground_truth: &str, entries_yaml: &str, violations: &[String]) -> String {
    let violations = violations
        .iter()
        .map(|v| format!("- {v}"))
        .collect::<Vec<_>>()
        .join("\n");
    REWRITE_PROMPT_TEMPLATE
        .replace("{ground_truth}", ground_truth.trim())
        .replace("{violations}", &violations)
        .replace("{entries_yaml}", entries_yaml.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tailor_prompt_includes_job_description() {
        let prompt = build_tailor_prompt("summary: hi\n", None, Some("Rust engineer wanted"));
        assert!(prompt.contains("summary: hi"));
        assert!(prompt.contains("Rust engineer wanted"));
        assert!(!prompt.contains("Profile ("));
        assert!(!prompt.contains("{base_yaml}"));
        assert!(!prompt.contains("{profile_block}"));
    }

    #[test]
    fn test_polish_prompt_without_job_description() {
        let prompt = build_tailor_prompt("summary: hi\n", Some("Engineer at Acme"), None);
        assert!(prompt.contains("polished version"));
        assert!(prompt.contains("Engineer at Acme"));
        assert!(!prompt.contains("Job description"));
    }

    #[test]
    fn test_system_directives_are_filled() {
        assert!(tailor_system().contains("Do not invent job titles"));
        assert!(!tailor_system().contains("{no_fabrication}"));
        assert!(!rewrite_system().contains("{yaml_only}"));
    }

    #[test]
    fn test_rewrite_prompt_lists_violations() {
        let prompt = build_rewrite_prompt(
            "experience: []",
            "experience:\n- position: CTO\n",
            &["experience[0]: position \"CTO\" not found in ground truth".to_string()],
        );
        assert!(prompt.contains("- experience[0]: position \"CTO\""));
        assert!(prompt.contains("position: CTO"));
    }
}
