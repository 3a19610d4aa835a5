//! Session diagnostics as JSONL, one event per line.
//!
//! Write-only: nothing in the app reads these back, and invites are
//! never reconstructed from disk. Shared with the timer tasks, so the
//! file handle sits behind a mutex.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::model::{Invite, JoinOutcome, User};

pub struct Transcript {
    pub path: PathBuf,
    session_id: String,
    file: Mutex<File>,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    session_id: &'a str,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl Transcript {
    pub fn new(path: &Path, session_id: &str) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            session_id: session_id.to_string(),
            file: Mutex::new(file),
        })
    }

    pub fn log(&self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let event = Event {
            ts: Utc::now(),
            session_id: &self.session_id,
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }

    pub fn login(&self, user: &User) -> Result<()> {
        self.log(
            "login",
            serde_json::json!({ "user_id": user.id, "handle": user.handle }),
        )
    }

    pub fn invite_created(&self, invite: &Invite) -> Result<()> {
        self.log(
            "invite_created",
            serde_json::json!({
                "invite_id": invite.id,
                "activity": invite.activity,
                "creator_id": invite.creator.id,
                "expires_at": invite.expires_at,
            }),
        )
    }

    pub fn invite_joined(&self, invite_id: &str, user_id: &str, outcome: JoinOutcome) -> Result<()> {
        let outcome = match outcome {
            JoinOutcome::Joined => "joined",
            JoinOutcome::AlreadyIn => "already_in",
            JoinOutcome::NotFound => "not_found",
        };
        self.log(
            "invite_joined",
            serde_json::json!({
                "invite_id": invite_id,
                "user_id": user_id,
                "outcome": outcome,
            }),
        )
    }

    /// Log a simulated arrival injected by the background timer.
    pub fn simulated_arrival(&self, invite: &Invite) -> Result<()> {
        self.log(
            "simulated_arrival",
            serde_json::json!({
                "invite_id": invite.id,
                "activity": invite.activity,
                "creator_id": invite.creator.id,
            }),
        )
    }

    /// Log an expiry sweep that removed at least one invite.
    pub fn pruned(&self, removed: usize) -> Result<()> {
        self.log("pruned", serde_json::json!({ "removed": removed }))
    }
}

/// Transcript directory, created on demand.
pub fn transcripts_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".whosdown")
        .join("sessions")
}
