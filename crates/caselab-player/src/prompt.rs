//! Terminal text rendering via `minijinja`.
//!
//! The built-in templates under `templates/` are compiled into the binary.
//! When a templates directory is configured, any `<name>.j2` found there
//! replaces the built-in template of the same name, so authors can restyle
//! the player without recompiling.

use std::path::Path;

use caselab_types::{CaseStructure, DecisionPoint, Persona, UserDecision};
use minijinja::Environment;

use crate::error::PlayerError;

/// Built-in templates, by name.
const BUILTIN_TEMPLATES: [(&str, &str); 3] = [
    ("decision_point", include_str!("../templates/decision_point.j2")),
    ("persona", include_str!("../templates/persona.j2")),
    ("summary", include_str!("../templates/summary.j2")),
];

/// Renders decision points, persona briefings and the closing summary.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Create an engine, loading overrides from `templates_dir` if given.
    pub fn new(templates_dir: Option<&str>) -> Result<Self, PlayerError> {
        let mut env = Environment::new();

        for (name, builtin) in BUILTIN_TEMPLATES {
            let source = match templates_dir {
                Some(dir) => load_override(dir, name)?.unwrap_or_else(|| builtin.to_owned()),
                None => builtin.to_owned(),
            };
            env.add_template_owned(name, source)
                .map_err(|e| PlayerError::Template(format!("failed to add {name} template: {e}")))?;
        }

        Ok(Self { env })
    }

    /// Text shown before the learner answers a decision point.
    pub fn render_decision_point(
        &self,
        case: &CaseStructure,
        index: usize,
        decision_point: &DecisionPoint,
    ) -> Result<String, PlayerError> {
        let context = serde_json::json!({
            "title": case.title,
            "position": index.saturating_add(1),
            "total": case.len(),
            "decision_point": decision_point,
        });
        self.render("decision_point", &context)
    }

    /// Briefing shown before a role-play conversation.
    pub fn render_persona(&self, persona: &Persona) -> Result<String, PlayerError> {
        self.render("persona", &serde_json::json!({ "persona": persona }))
    }

    /// Recap of every decision once the case is complete.
    pub fn render_summary(
        &self,
        case: &CaseStructure,
        decisions: &[UserDecision],
    ) -> Result<String, PlayerError> {
        let context = serde_json::json!({
            "title": case.title,
            "decisions": decisions,
        });
        self.render("summary", &context)
    }

    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String, PlayerError> {
        self.env
            .get_template(name)
            .map_err(|e| PlayerError::Template(format!("missing {name} template: {e}")))?
            .render(context)
            .map_err(|e| PlayerError::Template(format!("{name} render failed: {e}")))
    }
}

/// Read `<dir>/<name>.j2` if it exists.
fn load_override(dir: &str, name: &str) -> Result<Option<String>, PlayerError> {
    let path = Path::new(dir).join(format!("{name}.j2"));
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read_to_string(&path)
        .map(Some)
        .map_err(|e| PlayerError::Template(format!("failed to read {}: {e}", path.display())))
}
