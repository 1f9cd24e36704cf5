//! Wire format of the state resource.
//!
//! The state resource stores an arbitrary mapping of stage id to stage
//! payload. Decision-point case studies use a single stage,
//! [`DECISION_POINTS_STAGE`], whose payload is a serialized
//! [`CaseStudyState`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::progress::{CaseStudyState, EventLogEntry};

/// Stage id under which decision-point progress is stored.
pub const DECISION_POINTS_STAGE: &str = "decision_points";

/// Full snapshot exchanged with the state resource (`GET`/`PUT`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct StateSnapshot {
    /// Stage payloads keyed by stage id.
    #[serde(default)]
    pub stage_states: BTreeMap<String, serde_json::Value>,
    /// Stage the learner is currently in.
    #[serde(default)]
    pub current_stage_id: String,
    /// Append-only progress log.
    #[serde(default)]
    pub event_log: Vec<EventLogEntry>,
}

impl StateSnapshot {
    /// Decode the decision-point stage payload.
    ///
    /// Returns `Ok(None)` if the snapshot has no decision-point stage.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the payload is present but malformed.
    pub fn case_study_state(&self) -> Result<Option<CaseStudyState>, serde_json::Error> {
        self.stage_states
            .get(DECISION_POINTS_STAGE)
            .map(|payload| CaseStudyState::deserialize(payload))
            .transpose()
    }
}
