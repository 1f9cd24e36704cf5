//! Line-oriented terminal interaction.
//!
//! [`Console`] is generic over the reader and writer so the decision flow
//! can be driven from byte buffers in tests. Every read returns `None` at
//! end of input, which the caller treats as the learner walking away.

use caselab_types::{
    DecisionPoint, DecisionPointType, Persona, RolePlayTurn, TranscriptRole, UserDecision,
};
use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::error::PlayerError;

/// A prompt-and-answer terminal.
pub struct Console<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Wrap a reader and writer.
    pub fn new(input: R, out: W) -> Self {
        Self {
            lines: input.lines(),
            out,
        }
    }

    /// Write a block of text followed by a newline.
    pub async fn say(&mut self, text: &str) -> Result<(), PlayerError> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        Ok(())
    }

    /// Show `label` and read one trimmed line.
    pub async fn ask(&mut self, label: &str) -> Result<Option<String>, PlayerError> {
        self.out.write_all(label.as_bytes()).await?;
        self.out.write_all(b"> ").await?;
        self.out.flush().await?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_owned()))
    }

    /// The writer, for inspection once the conversation is over.
    pub fn into_output(self) -> W {
        self.out
    }
}

/// Collect the learner's answer to one decision point.
///
/// Returns `Ok(None)` if input ends before the decision is complete.
pub async fn collect_decision<R, W>(
    console: &mut Console<R, W>,
    decision_point: &DecisionPoint,
    persona_briefing: Option<(&Persona, String)>,
) -> Result<Option<UserDecision>, PlayerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut decision = UserDecision::text(decision_point.id.clone(), "");

    match decision_point.kind {
        DecisionPointType::MultipleChoice => {
            let Some(choice) = choose_option(console, &decision_point.options).await? else {
                return Ok(None);
            };
            decision.selected_option = Some(choice);
        }
        DecisionPointType::RolePlay => {
            if let Some((persona, briefing)) = persona_briefing {
                console.say(&briefing).await?;
                let Some(transcript) = converse(console, persona).await? else {
                    return Ok(None);
                };
                decision.role_play_transcript = Some(transcript);
            }
        }
        DecisionPointType::Text => {}
    }

    let Some(justification) = console.ask("Your reasoning").await? else {
        return Ok(None);
    };
    decision.justification = justification;
    Ok(Some(decision))
}

/// Ask until the learner picks a listed option by number.
async fn choose_option<R, W>(
    console: &mut Console<R, W>,
    options: &[String],
) -> Result<Option<String>, PlayerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let label = format!("Choose 1-{}", options.len());
    loop {
        let Some(answer) = console.ask(&label).await? else {
            return Ok(None);
        };
        let picked = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| options.get(i));
        match picked {
            Some(option) => return Ok(Some(option.clone())),
            None => console.say(&format!("'{answer}' is not one of the options.")).await?,
        }
    }
}

/// Record the learner's side of a conversation until an empty line.
async fn converse<R, W>(
    console: &mut Console<R, W>,
    persona: &Persona,
) -> Result<Option<Vec<RolePlayTurn>>, PlayerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut transcript = Vec::new();
    loop {
        let Some(line) = console.ask("You").await? else {
            return Ok(None);
        };
        if line.is_empty() {
            tracing::debug!(persona = %persona.id, turns = transcript.len(), "Conversation ended");
            return Ok(Some(transcript));
        }
        transcript.push(RolePlayTurn {
            role: TranscriptRole::User,
            message: line,
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use caselab_types::{DecisionPointId, PersonaId};

    use super::*;

    fn point(kind: DecisionPointType) -> DecisionPoint {
        DecisionPoint {
            id: DecisionPointId::from("dp1"),
            order: 1,
            kind,
            prompt: String::from("What now?"),
            options: vec![String::from("Cut"), String::from("Hold")],
            requires_persona: Some(PersonaId::from("cfo")),
            rubric_mapping: BTreeSet::new(),
        }
    }

    fn persona() -> Persona {
        Persona {
            id: PersonaId::from("cfo"),
            name: String::from("Dana"),
            role: String::from("CFO"),
            motivations: String::new(),
            biases: String::new(),
            knowledge: String::new(),
        }
    }

    #[tokio::test]
    async fn text_decision_reads_justification() {
        let mut console = Console::new(&b"  Because it is cheaper  \n"[..], Vec::new());
        let decision = collect_decision(&mut console, &point(DecisionPointType::Text), None).await;

        let Ok(Some(decision)) = decision else {
            assert!(matches!(decision, Ok(Some(_))), "{decision:?}");
            return;
        };
        assert_eq!(decision.justification, "Because it is cheaper");
        assert!(decision.selected_option.is_none());
        assert!(decision.role_play_transcript.is_none());
    }

    #[tokio::test]
    async fn multiple_choice_retries_invalid_answers() {
        let input = b"0\nthree\n2\nSafer for now\n";
        let mut console = Console::new(&input[..], Vec::new());
        let decision =
            collect_decision(&mut console, &point(DecisionPointType::MultipleChoice), None).await;

        let Ok(Some(decision)) = decision else {
            assert!(matches!(decision, Ok(Some(_))), "{decision:?}");
            return;
        };
        assert_eq!(decision.selected_option.as_deref(), Some("Hold"));
        assert_eq!(decision.justification, "Safer for now");

        let output = String::from_utf8(console.into_output()).unwrap_or_default();
        assert!(output.contains("'0' is not one of the options."));
        assert!(output.contains("'three' is not one of the options."));
    }

    #[tokio::test]
    async fn role_play_records_user_turns() {
        let input = b"Can we talk budgets?\nI need your support.\n\nShe agreed\n";
        let mut console = Console::new(&input[..], Vec::new());
        let persona = persona();
        let decision = collect_decision(
            &mut console,
            &point(DecisionPointType::RolePlay),
            Some((&persona, String::from("Briefing"))),
        )
        .await;

        let Ok(Some(decision)) = decision else {
            assert!(matches!(decision, Ok(Some(_))), "{decision:?}");
            return;
        };
        let transcript = decision.role_play_transcript.unwrap_or_default();
        assert_eq!(transcript.len(), 2);
        assert!(transcript.iter().all(|turn| turn.role == TranscriptRole::User));
        assert_eq!(
            transcript.first().map(|t| t.message.as_str()),
            Some("Can we talk budgets?")
        );
        assert_eq!(decision.justification, "She agreed");
    }

    #[tokio::test]
    async fn end_of_input_abandons_decision() {
        let mut console = Console::new(&b"1\n"[..], Vec::new());
        let decision =
            collect_decision(&mut console, &point(DecisionPointType::MultipleChoice), None).await;
        assert!(matches!(decision, Ok(None)));
    }
}
