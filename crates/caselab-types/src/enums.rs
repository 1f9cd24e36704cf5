//! Enumeration types shared by case content and learner progress.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Decision point kinds
// ---------------------------------------------------------------------------

/// How a learner answers a decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DecisionPointType {
    /// Free-text response with a justification.
    Text,
    /// Pick one of the authored options, then justify it.
    MultipleChoice,
    /// Converse with a persona before committing to a decision.
    RolePlay,
}

// ---------------------------------------------------------------------------
// Role-play transcript
// ---------------------------------------------------------------------------

/// Who spoke a role-play turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum TranscriptRole {
    /// The learner.
    User,
    /// The persona, voiced by the role-play model.
    Ai,
}

// ---------------------------------------------------------------------------
// Progress event log
// ---------------------------------------------------------------------------

/// Kind of entry in the progress event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum ProgressEvent {
    /// A learner submitted a decision.
    DecisionCompleted,
}
