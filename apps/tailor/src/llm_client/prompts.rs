// Shared prompt fragments.
// Each flow that calls the model defines its own prompts.rs alongside it;
// this file holds the cross-cutting pieces.

/// The no-fabrication rule every tailoring and rewrite directive carries.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    Your output must contain ONLY information that appears in the user's profile/content. \
    Do not invent job titles, companies, dates, technologies, projects, or achievements. \
    You may rephrase, reorder, and emphasize; you may not add new facts.";

/// Output-format rule shared by every YAML-producing call.
pub const YAML_ONLY_INSTRUCTION: &str = "\
    Output valid YAML only. You may wrap it in a ```yaml ... ``` code block. \
    Do NOT include explanations or apologies.";
