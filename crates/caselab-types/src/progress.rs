//! Learner progress through a case study.
//!
//! [`CaseStudyState`] is the stage payload the session store mutates and
//! the persistence sync ships to the state resource. Decisions are
//! append-only: a correction is a new [`UserDecision`] for the same
//! decision point, never an edit of an existing one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ProgressEvent, TranscriptRole};
use crate::ids::DecisionPointId;

/// A single turn of a role-play conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RolePlayTurn {
    /// Who spoke.
    pub role: TranscriptRole,
    /// What was said.
    pub message: String,
    /// When it was said.
    pub timestamp: DateTime<Utc>,
}

/// A learner's response to one decision point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct UserDecision {
    /// The decision point answered. Not validated against case content.
    pub decision_point_id: DecisionPointId,
    /// Chosen option for multiple-choice decision points.
    #[serde(default)]
    pub selected_option: Option<String>,
    /// The learner's reasoning.
    #[serde(default)]
    pub justification: String,
    /// Conversation held before deciding, for role-play decision points.
    #[serde(default)]
    pub role_play_transcript: Option<Vec<RolePlayTurn>>,
}

impl UserDecision {
    /// A free-text decision with no selected option or transcript.
    pub fn text(decision_point_id: impl Into<DecisionPointId>, justification: &str) -> Self {
        Self {
            decision_point_id: decision_point_id.into(),
            selected_option: None,
            justification: justification.to_owned(),
            role_play_transcript: None,
        }
    }
}

/// Progress through the decision points of one case study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CaseStudyState {
    /// Index of the next decision point to present. Equal to the number
    /// of decision points once the case is finished.
    pub current_decision_point: usize,
    /// Decisions in completion order.
    pub decisions: Vec<UserDecision>,
    /// When the learner started the case.
    pub started_at: DateTime<Utc>,
    /// When the state last changed. Never moves backwards.
    pub last_updated: DateTime<Utc>,
}

impl CaseStudyState {
    /// Empty progress starting at `now`.
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            current_decision_point: 0,
            decisions: Vec::new(),
            started_at: now,
            last_updated: now,
        }
    }
}

/// One entry of the append-only progress event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct EventLogEntry {
    /// What happened.
    pub event: ProgressEvent,
    /// The decision point involved.
    pub decision_point_id: DecisionPointId,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Position of the decision in [`CaseStudyState::decisions`].
    pub index: usize,
}
