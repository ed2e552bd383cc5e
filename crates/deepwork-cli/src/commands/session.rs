use clap::Subcommand;
use deepwork_core::TransitionEvent;
use uuid::Uuid;

use crate::common::open_engine;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Create a planned session
    New {
        /// Session title
        #[arg(long)]
        title: String,
        /// What this session is meant to accomplish
        #[arg(long)]
        goal: String,
        /// Scheduled duration in minutes
        #[arg(long)]
        minutes: u64,
    },
    /// Start a planned session
    Start { id: Uuid },
    /// Pause an active session
    Pause {
        id: Uuid,
        /// Why the session is being interrupted
        #[arg(long)]
        reason: String,
    },
    /// Resume a paused session
    Resume { id: Uuid },
    /// Complete an active or paused session
    Complete { id: Uuid },
    /// Print a session as JSON
    Show { id: Uuid },
}

pub async fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;

    let view = match action {
        SessionAction::New {
            title,
            goal,
            minutes,
        } => engine.create(title, goal, minutes).await?,
        SessionAction::Start { id } => engine.transition(id, TransitionEvent::Start).await?,
        SessionAction::Pause { id, reason } => {
            engine
                .transition(id, TransitionEvent::Pause { reason })
                .await?
        }
        SessionAction::Resume { id } => engine.transition(id, TransitionEvent::Resume).await?,
        SessionAction::Complete { id } => engine.transition(id, TransitionEvent::Complete).await?,
        SessionAction::Show { id } => engine.get(id).await?,
    };

    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
