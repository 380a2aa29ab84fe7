// Tailoring flow: job description loading, prompt building, reply extraction,
// and the orchestrator that ties them to the fact guard.
// All model calls go through llm_client; nothing here talks HTTP to a model directly.

pub mod extract;
pub mod jd_source;
pub mod orchestrator;
pub mod prompts;
