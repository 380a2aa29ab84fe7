// Fact-fidelity guard.
// Extracts entities, validates candidates against ground truth, applies the
// error-rate tolerance, and drives the one-shot targeted rewrite.

pub mod entities;
pub mod policy;
pub mod rewriter;
pub mod validator;

pub use policy::{evaluate, Decision, Tolerance};
pub use rewriter::rewrite_entries;
pub use validator::{validate, GroundTruth, RecordGroundTruth, TextGroundTruth, ValidationDetail};
