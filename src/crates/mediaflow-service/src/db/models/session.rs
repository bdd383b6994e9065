//! Session row model for database persistence
//!
//! A session is stored as a single row: the folded `state` and the
//! `events` log are both JSON-encoded columns, mirroring how the teacher
//! serializes a whole `Checkpoint` into one column rather than normalizing
//! channel values into their own tables.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::models::batch::parse_timestamp;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRow {
    pub id: String,
    pub canvas_id: String,
    pub user_id: String,
    pub created_at: String,
    pub last_active_at: String,
    pub state: String,
    pub events: String,
    pub deleted: bool,
}

impl SessionRow {
    pub fn from_session(session: &mediaflow_sessions::Session) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: session.id.clone(),
            canvas_id: session.canvas_id.clone(),
            user_id: session.user_id.clone(),
            created_at: session.created_at.to_rfc3339(),
            last_active_at: session.last_active_at.to_rfc3339(),
            state: serde_json::to_string(&session.state)?,
            events: serde_json::to_string(&session.events)?,
            deleted: session.deleted,
        })
    }

    pub fn into_session(self) -> Result<mediaflow_sessions::Session, serde_json::Error> {
        Ok(mediaflow_sessions::Session {
            id: self.id,
            canvas_id: self.canvas_id,
            user_id: self.user_id,
            created_at: parse_timestamp(&self.created_at),
            last_active_at: parse_timestamp(&self.last_active_at),
            state: serde_json::from_str(&self.state)?,
            events: serde_json::from_str(&self.events)?,
            deleted: self.deleted,
        })
    }
}
