//! Case study files.
//!
//! A case file is the YAML form of a [`CaseStructure`]. Decision points
//! are sorted by `order` on load, and cross references are checked so a
//! broken file fails before the learner starts.

use std::collections::BTreeSet;
use std::path::Path;

use caselab_types::{CaseStructure, DecisionPointType};

use crate::error::PlayerError;

/// Read and validate a case file.
pub fn load_case(path: &Path) -> Result<CaseStructure, PlayerError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| PlayerError::CaseFile(format!("failed to read {}: {e}", path.display())))?;
    parse_case(&contents)
}

/// Parse and validate case YAML.
pub fn parse_case(yaml: &str) -> Result<CaseStructure, PlayerError> {
    let case: CaseStructure = serde_yml::from_str(yaml)
        .map_err(|e| PlayerError::CaseFile(format!("failed to parse case YAML: {e}")))?;
    let case = case.sorted();
    validate(&case)?;
    Ok(case)
}

fn validate(case: &CaseStructure) -> Result<(), PlayerError> {
    if case.is_empty() {
        return Err(PlayerError::CaseFile(format!(
            "case {} has no decision points",
            case.id
        )));
    }

    let mut seen = BTreeSet::new();
    for dp in &case.decision_points {
        if !seen.insert(&dp.id) {
            return Err(PlayerError::CaseFile(format!(
                "duplicate decision point id {}",
                dp.id
            )));
        }

        match dp.kind {
            DecisionPointType::MultipleChoice if dp.options.is_empty() => {
                return Err(PlayerError::CaseFile(format!(
                    "multiple choice decision point {} has no options",
                    dp.id
                )));
            }
            DecisionPointType::RolePlay => {
                let known = dp
                    .requires_persona
                    .as_ref()
                    .is_some_and(|persona| case.persona(persona).is_some());
                if !known {
                    return Err(PlayerError::CaseFile(format!(
                        "role play decision point {} needs a known persona",
                        dp.id
                    )));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASE: &str = r#"
id: budget-crisis
title: "The Budget Crisis"
personas:
  - id: cfo
    name: "Dana Whitfield"
    role: "Chief Financial Officer"
    motivations: "Protect the quarter"
decisionPoints:
  - id: dp2
    order: 2
    type: role_play
    prompt: "Talk the CFO through your plan."
    requiresPersona: cfo
  - id: dp1
    order: 1
    type: multiple_choice
    prompt: "Where do you cut?"
    options: ["Marketing", "R&D", "Nowhere"]
    rubricMapping: [prioritization]
  - id: dp3
    order: 3
    type: text
    prompt: "Write the memo."
"#;

    #[test]
    fn parses_and_sorts() {
        let case = parse_case(CASE);
        assert!(case.is_ok(), "{case:?}");
        let Ok(case) = case else { return };

        let ids: Vec<&str> = case.decision_points.iter().map(|dp| dp.id.as_str()).collect();
        assert_eq!(ids, vec!["dp1", "dp2", "dp3"]);
        assert_eq!(case.personas.len(), 1);
        assert_eq!(
            case.decision_point(0).map(|dp| dp.options.len()),
            Some(3)
        );
    }

    #[test]
    fn unknown_persona_is_rejected() {
        let yaml = CASE.replace("requiresPersona: cfo", "requiresPersona: ceo");
        assert!(matches!(parse_case(&yaml), Err(PlayerError::CaseFile(_))));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let yaml = CASE.replace("id: dp3", "id: dp1");
        assert!(matches!(parse_case(&yaml), Err(PlayerError::CaseFile(_))));
    }

    #[test]
    fn empty_case_is_rejected() {
        let yaml = "id: empty\ntitle: Empty\ndecisionPoints: []\n";
        assert!(matches!(parse_case(yaml), Err(PlayerError::CaseFile(_))));
    }

    #[test]
    fn demo_case_file_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("demos")
            .join("budget-crisis.yaml");
        if path.exists() {
            let case = load_case(&path);
            assert!(case.is_ok(), "Failed to load demo case: {case:?}");
        }
    }
}
