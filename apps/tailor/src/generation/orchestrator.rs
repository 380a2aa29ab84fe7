//! Tailoring orchestrator. Drives one run end to end.
//!
//! Flow: START → GENERATED → VALIDATED → {ACCEPTED, REWRITING} → {ACCEPTED, ABORTED}
//!
//! Every failure path lands in ABORTED, which emits the original base content
//! unchanged. A run never returns a record that has not passed the tolerance check.
//! Runs are sequential and stateless: at most one generation call and one rewrite call.

use std::fmt;

use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::generation::extract::{extract_block, parse_structured, RECORD_KEYS};
use crate::generation::prompts::{build_tailor_prompt, tailor_system};
use crate::grounding::{
    evaluate, rewrite_entries, validate, Decision, GroundTruth, RecordGroundTruth,
    TextGroundTruth, Tolerance, ValidationDetail,
};
use crate::llm_client::TextGenerator;
use crate::models::resume::ResumeRecord;

/// Settings resolved once at startup and passed in explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct TailorSettings {
    pub tolerance: Tolerance,
}

/// Inputs for one run. The base record is ground truth and is never mutated.
#[derive(Debug, Clone, Copy)]
pub struct TailorRequest<'a> {
    /// The base content exactly as loaded; emitted verbatim on fallback.
    pub base_yaml: &'a str,
    pub base: &'a ResumeRecord,
    /// Freeform profile text. When present, it is the ground truth for entities.
    pub profile: Option<&'a str>,
    pub job_description: Option<&'a str>,
}

/// Where a run gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    EmptyBase,
    JobDescription,
    Generation,
    Parse,
    Rewrite,
    Revalidation,
    Serialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::EmptyBase => "empty base content",
            Stage::JobDescription => "job description loading",
            Stage::Generation => "generation call",
            Stage::Parse => "reply parsing",
            Stage::Rewrite => "targeted rewrite",
            Stage::Revalidation => "re-validation after rewrite",
            Stage::Serialize => "serialization",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TailorOutcome {
    Accepted {
        record: ResumeRecord,
        yaml: String,
        detail: ValidationDetail,
        rewritten: bool,
    },
    Aborted {
        stage: Stage,
        reason: String,
        /// The untouched base content.
        yaml: String,
    },
}

impl TailorOutcome {
    /// The YAML to emit: tailored content when accepted, base content otherwise.
    pub fn yaml(&self) -> &str {
        match self {
            TailorOutcome::Accepted { yaml, .. } | TailorOutcome::Aborted { yaml, .. } => yaml,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, TailorOutcome::Accepted { .. })
    }

    /// The record to render: tailored when accepted, else the base.
    pub fn record<'a>(&'a self, base: &'a ResumeRecord) -> &'a ResumeRecord {
        match self {
            TailorOutcome::Accepted { record, .. } => record,
            TailorOutcome::Aborted { .. } => base,
        }
    }
}

pub struct Orchestrator<'a> {
    generator: &'a dyn TextGenerator,
    settings: TailorSettings,
}

impl<'a> Orchestrator<'a> {
    pub fn new(generator: &'a dyn TextGenerator, settings: TailorSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub async fn run(&self, request: TailorRequest<'_>) -> TailorOutcome {
        let span = info_span!("tailor", run_id = %Uuid::new_v4());
        self.run_inner(request).instrument(span).await
    }

    async fn run_inner(&self, request: TailorRequest<'_>) -> TailorOutcome {
        if request.base.is_empty() {
            warn!("Base content is empty; returning as-is");
            return TailorOutcome::Aborted {
                stage: Stage::EmptyBase,
                reason: "base content is empty".to_string(),
                yaml: request.base_yaml.to_string(),
            };
        }

        let truth: Box<dyn GroundTruth> = match request.profile {
            Some(profile) => {
                Box::new(TextGroundTruth::new(profile).with_entry_limits(request.base))
            }
            None => Box::new(RecordGroundTruth::new(request.base, request.base_yaml)),
        };
        let tolerance = self.settings.tolerance;

        // START → GENERATED
        let prompt =
            build_tailor_prompt(request.base_yaml, request.profile, request.job_description);
        let reply = match self.generator.complete(&prompt, &tailor_system()).await {
            Ok(reply) => reply,
            Err(e) => return abort(&request, Stage::Generation, e.to_string()),
        };
        debug!("Generation reply received ({} chars)", reply.len());

        // GENERATED → VALIDATED
        let candidate: ResumeRecord = match parse_structured(&extract_block(&reply, RECORD_KEYS)) {
            Ok(candidate) => candidate,
            Err(e) => return abort(&request, Stage::Parse, e.to_string()),
        };
        let detail = validate(&candidate, truth.as_ref());

        let decision = evaluate(&detail, tolerance);
        if let Decision::Accept { error_rate } = decision {
            info!("Tailored content accepted (fact error rate {error_rate:.3})");
            return accept(&request, candidate, detail, false);
        }

        // VALIDATED → REWRITING
        warn!(
            "Tailored content introduced new facts (error rate {:.3} > tolerance {:.3}): {:?}",
            decision.error_rate(),
            tolerance.value(),
            detail.violations
        );
        let merged = match rewrite_entries(
            self.generator,
            truth.as_ref(),
            &candidate,
            &detail.entries_to_rewrite,
            &detail.violations,
        )
        .await
        {
            Ok(merged) => merged,
            Err(e) => return abort(&request, Stage::Rewrite, e.to_string()),
        };

        // REWRITING → {ACCEPTED, ABORTED}
        let revalidated = validate(&merged, truth.as_ref());
        match evaluate(&revalidated, tolerance) {
            Decision::Accept { error_rate } => {
                if revalidated.violating_entities > 0 {
                    warn!(
                        "Accepting rewritten content with {} residual violation(s) (error rate {error_rate:.3})",
                        revalidated.violating_entities
                    );
                } else {
                    info!("Rewritten content accepted with no violations");
                }
                accept(&request, merged, revalidated, true)
            }
            Decision::RewriteRequired { error_rate } => abort(
                &request,
                Stage::Revalidation,
                format!(
                    "error rate {error_rate:.3} still exceeds tolerance {:.3}: {:?}",
                    tolerance.value(),
                    revalidated.violations
                ),
            ),
        }
    }
}

fn accept(
    request: &TailorRequest<'_>,
    record: ResumeRecord,
    detail: ValidationDetail,
    rewritten: bool,
) -> TailorOutcome {
    match serde_yaml::to_string(&record) {
        Ok(yaml) => TailorOutcome::Accepted {
            record,
            yaml,
            detail,
            rewritten,
        },
        Err(e) => abort(request, Stage::Serialize, e.to_string()),
    }
}

fn abort(request: &TailorRequest<'_>, stage: Stage, reason: String) -> TailorOutcome {
    error!("Tailoring failed at {stage} ({reason}); using base content");
    TailorOutcome::Aborted {
        stage,
        reason,
        yaml: request.base_yaml.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::grounding::policy::error_rate;
    use crate::llm_client::scripted::ScriptedGenerator;
    use crate::llm_client::LlmError;
    use crate::models::resume::Section;

    const BASE_YAML: &str = r#"summary: Backend engineer with five years of Rust.
skills:
  - category: Languages
    items: Rust, Go
experience:
  - position: Software Engineer
    organization: Acme
    date: 2019 -- 2021
    location: Remote
    bullets:
      - Built a billing pipeline
  - position: Senior Engineer
    organization: Globex
    date: 2021 -- Present
    location: Berlin
    bullets:
      - Led the storage team
projects:
  - position: \textbf{Tailor}
    raw_position: true
    date: "2024"
    bullets:
      - Resume tailoring CLI
"#;

    fn base() -> ResumeRecord {
        serde_yaml::from_str(BASE_YAML).unwrap()
    }

    fn fenced(record: &ResumeRecord) -> String {
        format!(
            "Here is your tailored resume:\n```yaml\n{}```\n",
            serde_yaml::to_string(record).unwrap()
        )
    }

    fn request<'a>(base: &'a ResumeRecord) -> TailorRequest<'a> {
        TailorRequest {
            base_yaml: BASE_YAML,
            base,
            profile: None,
            job_description: Some("Rust platform engineer"),
        }
    }

    fn settings(tolerance: f64) -> TailorSettings {
        TailorSettings {
            tolerance: Tolerance::new(tolerance),
        }
    }

    #[tokio::test]
    async fn test_faithful_reply_is_accepted() {
        let base = base();
        let mut tailored = base.clone();
        tailored.summary = "Rust engineer focused on platform work.".to_string();
        let generator = ScriptedGenerator::replying(&fenced(&tailored));

        let outcome = Orchestrator::new(&generator, settings(0.2))
            .run(request(&base))
            .await;

        match outcome {
            TailorOutcome::Accepted {
                record,
                detail,
                rewritten,
                yaml,
            } => {
                assert_eq!(record, tailored);
                assert!(!rewritten);
                assert_eq!(detail.violating_entities, 0);
                assert_eq!(error_rate(&detail), 0.0);
                assert_eq!(serde_yaml::from_str::<ResumeRecord>(&yaml).unwrap(), tailored);
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
        assert_eq!(generator.calls().len(), 1);
        assert!(generator.calls()[0].0.contains("Rust platform engineer"));
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_base() {
        let base = base();
        let generator =
            ScriptedGenerator::new(vec![Err(LlmError::Timeout(Duration::from_secs(120)))]);

        let outcome = Orchestrator::new(&generator, settings(0.2))
            .run(request(&base))
            .await;

        assert_eq!(outcome.yaml(), BASE_YAML);
        match outcome {
            TailorOutcome::Aborted { stage, reason, .. } => {
                assert_eq!(stage, Stage::Generation);
                assert!(reason.contains("timed out"));
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparsable_reply_falls_back() {
        let base = base();
        let generator = ScriptedGenerator::replying("```yaml\nsummary: [broken\n```");

        let outcome = Orchestrator::new(&generator, settings(0.2))
            .run(request(&base))
            .await;

        assert!(matches!(
            outcome,
            TailorOutcome::Aborted {
                stage: Stage::Parse,
                ..
            }
        ));
        assert_eq!(outcome.yaml(), BASE_YAML);
        assert_eq!(outcome.record(&base), &base);
    }

    #[tokio::test]
    async fn test_violation_within_tolerance_is_accepted_without_rewrite() {
        let base = base();
        let mut tailored = base.clone();
        tailored.experience[1].organization = "Initech".to_string();
        tailored.experience[1].position = "Staff Engineer".to_string();
        let generator = ScriptedGenerator::replying(&fenced(&tailored));

        let outcome = Orchestrator::new(&generator, settings(0.5))
            .run(request(&base))
            .await;

        match outcome {
            TailorOutcome::Accepted {
                detail, rewritten, ..
            } => {
                assert!(!rewritten);
                assert_eq!(detail.violating_entities, 2);
                assert_eq!(detail.total_entities, 5);
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
        assert_eq!(generator.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_successful_rewrite_is_accepted() {
        let base = base();
        let mut tailored = base.clone();
        tailored.experience[1].organization = "Initech".to_string();
        tailored.experience[1].position = "Staff Engineer".to_string();
        tailored.experience[0].bullets = vec!["Built a Rust billing pipeline".to_string()];
        let rewrite_reply = "```yaml\nexperience:\n- position: Senior Engineer\n  organization: Globex\n  date: 2021 -- Present\n  bullets:\n  - Led the storage team\n```";
        let generator = ScriptedGenerator::new(vec![
            Ok(fenced(&tailored)),
            Ok(rewrite_reply.to_string()),
        ]);

        let outcome = Orchestrator::new(&generator, settings(0.2))
            .run(request(&base))
            .await;

        let initial = validate(&tailored, &RecordGroundTruth::new(&base, BASE_YAML));
        assert_eq!(initial.entries_to_rewrite, vec![(Section::Experience, 1)]);

        match outcome {
            TailorOutcome::Accepted {
                record,
                detail,
                rewritten,
                ..
            } => {
                assert!(rewritten);
                assert!(detail.violating_entities <= initial.violating_entities);
                assert_eq!(detail.violating_entities, 0);
                assert_eq!(record.experience[1].organization, "Globex");
                assert_eq!(
                    record.experience[0].bullets,
                    vec!["Built a Rust billing pipeline".to_string()]
                );
            }
            other => panic!("expected acceptance, got {other:?}"),
        }

        let calls = generator.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].1.contains("correcting factual errors"));
        assert!(calls[1].0.contains("Initech"));
    }

    #[tokio::test]
    async fn test_rewrite_that_keeps_fabrications_falls_back() {
        let base = base();
        let mut tailored = base.clone();
        tailored.experience[1].organization = "Initech".to_string();
        tailored.experience[1].position = "Staff Engineer".to_string();
        let rewrite_reply =
            "experience:\n- position: Staff Engineer\n  organization: Initech\n";
        let generator = ScriptedGenerator::new(vec![
            Ok(fenced(&tailored)),
            Ok(rewrite_reply.to_string()),
        ]);

        let outcome = Orchestrator::new(&generator, settings(0.2))
            .run(request(&base))
            .await;

        assert!(matches!(
            outcome,
            TailorOutcome::Aborted {
                stage: Stage::Revalidation,
                ..
            }
        ));
        assert_eq!(outcome.yaml(), BASE_YAML);
    }

    #[tokio::test]
    async fn test_failed_rewrite_call_falls_back() {
        let base = base();
        let mut tailored = base.clone();
        tailored.projects[0].position = "Invented Startup".to_string();
        tailored.experience[0].organization = "Hooli".to_string();
        let generator = ScriptedGenerator::new(vec![
            Ok(fenced(&tailored)),
            Err(LlmError::Api {
                status: 500,
                message: "overloaded".to_string(),
            }),
        ]);

        let outcome = Orchestrator::new(&generator, settings(0.2))
            .run(request(&base))
            .await;

        match outcome {
            TailorOutcome::Aborted { stage, reason, yaml } => {
                assert_eq!(stage, Stage::Rewrite);
                assert!(reason.contains("overloaded"));
                assert_eq!(yaml, BASE_YAML);
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_profile_text_is_ground_truth() {
        let base = base();
        let mut tailored = base.clone();
        tailored.experience[0].organization = "Acme Corp".to_string();
        let generator = ScriptedGenerator::replying(&fenced(&tailored));
        let profile = "Software Engineer at Acme Corp (2019-2021). Senior Engineer at Globex. \
                       Built Tailor, a resume CLI.";

        let outcome = Orchestrator::new(&generator, settings(0.0))
            .run(TailorRequest {
                profile: Some(profile),
                ..request(&base)
            })
            .await;

        assert!(outcome.is_accepted());
        assert!(generator.calls()[0].0.contains("Acme Corp (2019-2021)"));
    }

    #[tokio::test]
    async fn test_empty_base_skips_generation() {
        let empty = ResumeRecord::default();
        let generator = ScriptedGenerator::default();

        let outcome = Orchestrator::new(&generator, settings(0.2))
            .run(TailorRequest {
                base_yaml: "",
                base: &empty,
                profile: None,
                job_description: None,
            })
            .await;

        assert!(matches!(
            outcome,
            TailorOutcome::Aborted {
                stage: Stage::EmptyBase,
                ..
            }
        ));
        assert!(generator.calls().is_empty());
    }
}
