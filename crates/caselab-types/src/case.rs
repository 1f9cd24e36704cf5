//! Static case content: decision points, personas, and the case structure.
//!
//! Everything here is authored ahead of time and read-only at runtime.
//! A session never mutates case content; it only looks things up by id
//! or by position.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::DecisionPointType;
use crate::ids::{CaseStudyId, CompetencyId, DecisionPointId, PersonaId};

/// One scripted prompt within a case study requiring a learner response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct DecisionPoint {
    /// Authored identifier, unique within the case.
    pub id: DecisionPointId,
    /// Position in the case (ascending).
    pub order: u32,
    /// How the learner answers.
    #[serde(rename = "type")]
    pub kind: DecisionPointType,
    /// Prompt shown to the learner.
    #[serde(default)]
    pub prompt: String,
    /// Choices for `multiple_choice` decision points.
    #[serde(default)]
    pub options: Vec<String>,
    /// Persona the learner talks to in a `role_play` decision point.
    #[serde(default)]
    pub requires_persona: Option<PersonaId>,
    /// Competencies this decision point is evaluated against.
    #[serde(default)]
    pub rubric_mapping: BTreeSet<CompetencyId>,
}

/// A scripted counterpart used in role-play decision points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Persona {
    /// Authored identifier.
    pub id: PersonaId,
    /// Display name.
    pub name: String,
    /// Job title or position in the scenario.
    pub role: String,
    /// What the persona wants out of the conversation.
    #[serde(default)]
    pub motivations: String,
    /// Blind spots and leanings the learner can probe.
    #[serde(default)]
    pub biases: String,
    /// What the persona knows and may reveal.
    #[serde(default)]
    pub knowledge: String,
}

/// The static structure of a case study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CaseStructure {
    /// Authored identifier.
    pub id: CaseStudyId,
    /// Display title.
    pub title: String,
    /// Decision points. Authoring order is not trusted; see
    /// [`CaseStructure::sorted`].
    pub decision_points: Vec<DecisionPoint>,
    /// Personas referenced by role-play decision points.
    #[serde(default)]
    pub personas: Vec<Persona>,
}

impl CaseStructure {
    /// Return the structure with decision points sorted by `order`.
    ///
    /// Sorting is stable, so ties keep their authored order.
    #[must_use]
    pub fn sorted(mut self) -> Self {
        self.decision_points.sort_by_key(|dp| dp.order);
        self
    }

    /// Number of decision points in the case.
    pub fn len(&self) -> usize {
        self.decision_points.len()
    }

    /// Whether the case has no decision points at all.
    pub fn is_empty(&self) -> bool {
        self.decision_points.is_empty()
    }

    /// Decision point at the given position, if any.
    pub fn decision_point(&self, index: usize) -> Option<&DecisionPoint> {
        self.decision_points.get(index)
    }

    /// Look up a persona by id.
    pub fn persona(&self, id: &PersonaId) -> Option<&Persona> {
        self.personas.iter().find(|p| &p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, order: u32) -> DecisionPoint {
        DecisionPoint {
            id: DecisionPointId::from(id),
            order,
            kind: DecisionPointType::Text,
            prompt: String::new(),
            options: Vec::new(),
            requires_persona: None,
            rubric_mapping: BTreeSet::new(),
        }
    }

    #[test]
    fn sorted_orders_decision_points() {
        let case = CaseStructure {
            id: CaseStudyId::from("pricing"),
            title: String::from("Pricing"),
            decision_points: vec![point("dp3", 3), point("dp1", 1), point("dp2", 2)],
            personas: Vec::new(),
        }
        .sorted();

        let ids: Vec<&str> = case.decision_points.iter().map(|dp| dp.id.as_str()).collect();
        assert_eq!(ids, vec!["dp1", "dp2", "dp3"]);
        assert_eq!(case.decision_point(0).map(|dp| dp.order), Some(1));
        assert!(case.decision_point(3).is_none());
    }

    #[test]
    fn decision_point_parses_camel_case_content() {
        let json = serde_json::json!({
            "id": "dp2",
            "order": 2,
            "type": "role_play",
            "prompt": "Talk to the CFO.",
            "requiresPersona": "cfo",
            "rubricMapping": ["stakeholder_management", "negotiation"]
        });
        let dp: DecisionPoint = serde_json::from_value(json).unwrap_or_else(|_| point("bad", 0));
        assert_eq!(dp.kind, DecisionPointType::RolePlay);
        assert_eq!(dp.requires_persona, Some(PersonaId::from("cfo")));
        assert_eq!(dp.rubric_mapping.len(), 2);
        assert!(dp.options.is_empty());
    }

    #[test]
    fn persona_lookup_by_id() {
        let case = CaseStructure {
            id: CaseStudyId::from("merger"),
            title: String::from("Merger"),
            decision_points: Vec::new(),
            personas: vec![Persona {
                id: PersonaId::from("cfo"),
                name: String::from("Dana Ruiz"),
                role: String::from("CFO"),
                motivations: String::new(),
                biases: String::new(),
                knowledge: String::new(),
            }],
        };
        assert_eq!(
            case.persona(&PersonaId::from("cfo")).map(|p| p.name.as_str()),
            Some("Dana Ruiz")
        );
        assert!(case.persona(&PersonaId::from("ceo")).is_none());
        assert!(case.is_empty());
    }
}
