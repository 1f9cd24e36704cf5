//! In-memory state store for one simulation session.
//!
//! [`StateStore`] holds the authoritative progress of the active session:
//! the decision-point stage payload, the current stage pointer, and the
//! append-only event log. It performs no I/O and never rejects input.
//! Stage payloads it does not understand (stages other than
//! [`DECISION_POINTS_STAGE`]) are carried through untouched so that a
//! write-back never drops them.

use std::collections::BTreeMap;

use caselab_types::{
    CaseStructure, CaseStudyState, DECISION_POINTS_STAGE, DecisionPoint, EventLogEntry,
    ProgressEvent, StateSnapshot, UserDecision,
};
use chrono::{DateTime, Utc};

/// Authoritative in-memory progress of one case study.
#[derive(Debug, Clone, PartialEq)]
pub struct StateStore {
    state: CaseStudyState,
    current_stage_id: String,
    event_log: Vec<EventLogEntry>,
    other_stages: BTreeMap<String, serde_json::Value>,
}

impl StateStore {
    /// Empty progress, started at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: CaseStudyState::new(now),
            current_stage_id: DECISION_POINTS_STAGE.to_owned(),
            event_log: Vec::new(),
            other_stages: BTreeMap::new(),
        }
    }

    /// Rebuild a store from a snapshot loaded from the state resource.
    ///
    /// A snapshot without a decision-point stage yields empty progress
    /// started at `now`; its other stages and event log are kept.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the decision-point stage payload is
    /// malformed.
    pub fn from_snapshot(
        snapshot: StateSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        let state = snapshot
            .case_study_state()?
            .unwrap_or_else(|| CaseStudyState::new(now));

        let StateSnapshot {
            mut stage_states,
            current_stage_id,
            event_log,
        } = snapshot;
        stage_states.remove(DECISION_POINTS_STAGE);

        let current_stage_id = if current_stage_id.is_empty() {
            DECISION_POINTS_STAGE.to_owned()
        } else {
            current_stage_id
        };

        Ok(Self {
            state,
            current_stage_id,
            event_log,
            other_stages: stage_states,
        })
    }

    /// Record a completed decision at the current time.
    ///
    /// See [`StateStore::record_decision_at`].
    pub fn record_decision(&mut self, decision: UserDecision) -> usize {
        self.record_decision_at(decision, Utc::now())
    }

    /// Record a completed decision observed at `now`.
    ///
    /// Appends the decision, advances the decision point pointer by one,
    /// logs a `DECISION_COMPLETED` event, and bumps `last_updated`
    /// (never backwards, even if `now` is behind it). Returns the index of
    /// the recorded decision.
    pub fn record_decision_at(&mut self, decision: UserDecision, now: DateTime<Utc>) -> usize {
        let index = self.state.decisions.len();

        self.event_log.push(EventLogEntry {
            event: ProgressEvent::DecisionCompleted,
            decision_point_id: decision.decision_point_id.clone(),
            timestamp: now,
            index,
        });
        self.state.decisions.push(decision);
        self.state.current_decision_point = self.state.current_decision_point.saturating_add(1);
        self.state.last_updated = self.state.last_updated.max(now);

        tracing::debug!(
            index,
            current_decision_point = self.state.current_decision_point,
            "Recorded decision"
        );
        index
    }

    /// Copy of the current state in wire form.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the progress cannot be encoded. No
    /// snapshot is produced in that case, so a stage is never written as
    /// `null` over stored progress.
    pub fn snapshot(&self) -> Result<StateSnapshot, serde_json::Error> {
        let payload = serde_json::to_value(&self.state)?;
        let mut stage_states = self.other_stages.clone();
        stage_states.insert(DECISION_POINTS_STAGE.to_owned(), payload);

        Ok(StateSnapshot {
            stage_states,
            current_stage_id: self.current_stage_id.clone(),
            event_log: self.event_log.clone(),
        })
    }

    /// The decision-point progress.
    pub const fn state(&self) -> &CaseStudyState {
        &self.state
    }

    /// The progress event log, oldest first.
    pub fn event_log(&self) -> &[EventLogEntry] {
        &self.event_log
    }

    /// The stage the learner is in.
    pub fn current_stage_id(&self) -> &str {
        &self.current_stage_id
    }

    /// The next decision point to present, or `None` once every decision
    /// point of `case` has been answered.
    pub fn current_decision_point<'a>(&self, case: &'a CaseStructure) -> Option<&'a DecisionPoint> {
        case.decision_point(self.state.current_decision_point)
    }

    /// Whether every decision point of `case` has been answered.
    pub fn is_complete(&self, case: &CaseStructure) -> bool {
        self.state.current_decision_point >= case.len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use caselab_types::{CaseStudyId, DecisionPointId, DecisionPointType};
    use chrono::Duration;

    use super::*;

    fn case_with(ids: &[&str]) -> CaseStructure {
        let decision_points = ids
            .iter()
            .zip(1_u32..)
            .map(|(id, order)| DecisionPoint {
                id: DecisionPointId::from(*id),
                order,
                kind: DecisionPointType::Text,
                prompt: String::new(),
                options: Vec::new(),
                requires_persona: None,
                rubric_mapping: BTreeSet::new(),
            })
            .collect();
        CaseStructure {
            id: CaseStudyId::from("case"),
            title: String::from("Case"),
            decision_points,
            personas: Vec::new(),
        }
    }

    #[test]
    fn first_decision_advances_pointer_and_logs_event() {
        let now = Utc::now();
        let mut store = StateStore::new(now);
        assert_eq!(store.state().current_decision_point, 0);
        assert!(store.state().decisions.is_empty());

        let index = store.record_decision_at(UserDecision::text("dp1", "Raise prices."), now);

        assert_eq!(index, 0);
        assert_eq!(store.state().current_decision_point, 1);
        assert_eq!(store.state().decisions.len(), 1);
        assert_eq!(store.state().decisions[0].decision_point_id.as_str(), "dp1");
        assert_eq!(store.event_log().len(), 1);
        assert_eq!(store.event_log()[0].event, ProgressEvent::DecisionCompleted);
        assert_eq!(store.event_log()[0].decision_point_id.as_str(), "dp1");
        assert_eq!(store.event_log()[0].index, 0);
    }

    #[test]
    fn every_decision_advances_by_exactly_one() {
        let start = Utc::now();
        let mut store = StateStore::new(start);

        for n in 0..25_usize {
            let before_len = store.state().decisions.len();
            let before_pointer = store.state().current_decision_point;
            // Re-answering the same decision point still appends.
            let id = if n % 3 == 0 { "dp1" } else { "dp2" };
            store.record_decision_at(UserDecision::text(id, "again"), start);
            assert_eq!(store.state().decisions.len(), before_len + 1);
            assert_eq!(store.state().current_decision_point, before_pointer + 1);
        }
        assert_eq!(store.event_log().len(), 25);
    }

    #[test]
    fn last_updated_never_moves_backwards() {
        let start = Utc::now();
        let mut store = StateStore::new(start);

        let later = start + Duration::seconds(30);
        store.record_decision_at(UserDecision::text("dp1", "a"), later);
        assert_eq!(store.state().last_updated, later);

        // A clock that jumps backwards must not rewind the timestamp.
        store.record_decision_at(UserDecision::text("dp2", "b"), start);
        assert_eq!(store.state().last_updated, later);
        assert_eq!(store.state().started_at, start);
    }

    #[test]
    fn snapshot_round_trips_through_from_snapshot() {
        let now = Utc::now();
        let mut store = StateStore::new(now);
        store.record_decision_at(UserDecision::text("dp1", "a"), now);
        store.record_decision_at(UserDecision::text("dp2", "b"), now);

        let snapshot = store.snapshot().unwrap_or_default();
        assert_eq!(snapshot.current_stage_id, DECISION_POINTS_STAGE);
        assert_eq!(snapshot.event_log.len(), 2);

        let restored = StateStore::from_snapshot(snapshot.clone(), Utc::now());
        assert!(restored.is_ok());
        let restored = restored.unwrap_or_else(|_| StateStore::new(now));
        assert_eq!(restored, store);
        assert_eq!(restored.snapshot().ok(), Some(snapshot));
    }

    #[test]
    fn snapshot_is_a_copy() {
        let now = Utc::now();
        let mut store = StateStore::new(now);
        let before = store.snapshot().unwrap_or_default();
        store.record_decision_at(UserDecision::text("dp1", "a"), now);
        assert_ne!(Some(before.clone()), store.snapshot().ok());
        assert!(before.event_log.is_empty());
    }

    #[test]
    fn unknown_stages_survive_a_round_trip() {
        let mut snapshot = StateSnapshot::default();
        snapshot
            .stage_states
            .insert("briefing".to_owned(), serde_json::json!({"read": true}));
        snapshot.current_stage_id = "briefing".to_owned();

        let now = Utc::now();
        let store = StateStore::from_snapshot(snapshot, now).unwrap_or_else(|_| StateStore::new(now));
        assert_eq!(store.current_stage_id(), "briefing");
        assert_eq!(store.state().current_decision_point, 0);

        let written = store.snapshot().unwrap_or_default();
        assert_eq!(written.stage_states.get("briefing"), Some(&serde_json::json!({"read": true})));
        assert!(written.stage_states.contains_key(DECISION_POINTS_STAGE));
    }

    #[test]
    fn decision_stage_carries_the_progress() {
        let now = Utc::now();
        let mut store = StateStore::new(now);
        store.record_decision_at(UserDecision::text("dp1", "a"), now);

        let snapshot = store.snapshot();
        assert!(snapshot.is_ok(), "{snapshot:?}");
        let snapshot = snapshot.unwrap_or_default();
        let stage = snapshot.stage_states.get(DECISION_POINTS_STAGE);
        assert!(stage.is_some_and(|payload| !payload.is_null()));
        assert_eq!(snapshot.case_study_state().ok().flatten().as_ref(), Some(store.state()));
    }

    #[test]
    fn malformed_stage_is_rejected() {
        let mut snapshot = StateSnapshot::default();
        snapshot
            .stage_states
            .insert(DECISION_POINTS_STAGE.to_owned(), serde_json::json!("garbage"));
        assert!(StateStore::from_snapshot(snapshot, Utc::now()).is_err());
    }

    #[test]
    fn completion_tracks_case_length() {
        let case = case_with(&["dp1", "dp2"]);
        let now = Utc::now();
        let mut store = StateStore::new(now);

        assert_eq!(store.current_decision_point(&case).map(|dp| dp.id.as_str()), Some("dp1"));
        assert!(!store.is_complete(&case));

        store.record_decision_at(UserDecision::text("dp1", "a"), now);
        assert_eq!(store.current_decision_point(&case).map(|dp| dp.id.as_str()), Some("dp2"));

        store.record_decision_at(UserDecision::text("dp2", "b"), now);
        assert!(store.current_decision_point(&case).is_none());
        assert!(store.is_complete(&case));
    }
}
