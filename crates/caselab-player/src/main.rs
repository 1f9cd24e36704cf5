//! Terminal player for Caselab case studies.
//!
//! Plays a case file decision by decision, recording each answer in a
//! [`SimulationSession`]. Progress is autosaved to the state resource
//! after every quiet idle window, and saved once more when the case is
//! finished or input ends, so the learner can resume later with the same
//! simulation id.
//!
//! ```text
//! caselab-player <case-file.yaml> [simulation-id]
//! ```
//!
//! Without a simulation id a new simulation is created and its id printed.

mod case_file;
mod config;
mod console;
mod error;
mod prompt;

use std::path::PathBuf;
use std::sync::Arc;

use caselab_core::{HttpStateClient, SaveOutcome, SimulationSession};
use caselab_types::{CaseStructure, SimulationId};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::PlayerConfig;
use crate::console::{Console, collect_decision};
use crate::error::PlayerError;
use crate::prompt::PromptEngine;

/// Application entry point.
///
/// Logs go to stderr so they do not interleave with the case text.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let (case_path, resume_id) = parse_args(std::env::args().skip(1))?;
    let config = PlayerConfig::from_env()?;
    info!(
        endpoint_url = config.endpoint_url,
        idle_window_ms = config.idle_window.as_millis(),
        read_stale_after_ms = config.read_stale_after.as_millis(),
        "configuration loaded"
    );

    let case = case_file::load_case(&case_path)?;
    let prompts = PromptEngine::new(config.templates_dir.as_deref())?;
    let client = Arc::new(HttpStateClient::new(
        &config.endpoint_url,
        config.user.clone(),
        config.read_stale_after,
    ));

    let mut console = Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());

    let simulation_id = match resume_id {
        Some(id) => id,
        None => {
            let created = client.create_simulation(&case.id).await?;
            console
                .say(&format!(
                    "Started simulation {} (pass it again to resume).",
                    created.simulation_id
                ))
                .await?;
            created.simulation_id
        }
    };

    let session = SimulationSession::open(simulation_id, client, config.idle_window).await?;
    let completed = play(&session, &case, &prompts, &mut console).await?;

    let decisions = session.state().await.decisions;
    let outcome = session.finish().await;
    if outcome == SaveOutcome::Failed {
        warn!(%simulation_id, "Final save failed; progress since the last autosave is lost");
        console
            .say("Could not save your latest progress. Check the connection and resume.")
            .await?;
    }

    if completed {
        console.say(&prompts.render_summary(&case, &decisions)?).await?;
    } else {
        console
            .say(&format!("Progress saved. Resume with simulation {simulation_id}."))
            .await?;
    }
    Ok(())
}

/// Split the command line into the case file and optional simulation id.
fn parse_args(
    mut args: impl Iterator<Item = String>,
) -> Result<(PathBuf, Option<SimulationId>), PlayerError> {
    let case_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| PlayerError::Usage(String::from("missing case file")))?;
    let resume_id = args
        .next()
        .map(|raw| {
            raw.parse::<SimulationId>()
                .map_err(|e| PlayerError::Usage(format!("invalid simulation id {raw}: {e}")))
        })
        .transpose()?;
    if let Some(extra) = args.next() {
        return Err(PlayerError::Usage(format!("unexpected argument {extra}")));
    }
    Ok((case_path, resume_id))
}

/// Present decision points from the session's current position until the
/// case is complete or input ends. Returns whether the case was completed.
async fn play<E, R, W>(
    session: &SimulationSession<E>,
    case: &CaseStructure,
    prompts: &PromptEngine,
    console: &mut Console<R, W>,
) -> Result<bool, PlayerError>
where
    E: caselab_core::StateEndpoint,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let (index, next) = session
            .inspect(|store| {
                (
                    store.state().current_decision_point,
                    store.current_decision_point(case).cloned(),
                )
            })
            .await;
        let Some(decision_point) = next else {
            return Ok(true);
        };

        console
            .say(&prompts.render_decision_point(case, index, &decision_point)?)
            .await?;

        let briefing = match decision_point
            .requires_persona
            .as_ref()
            .and_then(|id| case.persona(id))
        {
            Some(persona) => Some((persona, prompts.render_persona(persona)?)),
            None => None,
        };

        let Some(decision) = collect_decision(console, &decision_point, briefing).await? else {
            return Ok(false);
        };
        let recorded = session.record_decision(decision).await;
        info!(
            simulation_id = %session.simulation_id(),
            decision_point_id = %decision_point.id,
            index = recorded,
            "Decision recorded"
        );
    }
}
