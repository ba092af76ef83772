use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Opaque per-process session identifier stamped on every talk this client creates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Talk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub speaker_name: String,
    pub speaker_bio: String,
    /// Absent for talks created without a session id, e.g. outside this client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Talk {
    /// Builds a not-yet-persisted talk from a completed draft.
    pub fn from_draft(draft: &Draft, client_id: ClientId) -> Self {
        Self {
            id: None,
            name: draft.name.clone(),
            description: draft.description.clone(),
            speaker_name: draft.speaker_name.clone(),
            speaker_bio: draft.speaker_bio.clone(),
            client_id: Some(client_id),
            created_at: None,
        }
    }

    pub fn is_from(&self, client_id: &ClientId) -> bool {
        self.client_id.as_ref() == Some(client_id)
    }
}

/// Mutation payload for `createTalk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTalkInput {
    pub name: String,
    pub description: String,
    pub speaker_bio: String,
    pub speaker_name: String,
    pub client_id: ClientId,
}

impl CreateTalkInput {
    /// Payload for creating `talk` on behalf of the session `client_id`.
    pub fn new(talk: &Talk, client_id: ClientId) -> Self {
        Self {
            name: talk.name.clone(),
            description: talk.description.clone(),
            speaker_bio: talk.speaker_bio.clone(),
            speaker_name: talk.speaker_name.clone(),
            client_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub name: String,
    pub description: String,
    pub speaker_name: String,
    pub speaker_bio: String,
}

impl Draft {
    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::Name => &self.name,
            DraftField::Description => &self.description,
            DraftField::SpeakerName => &self.speaker_name,
            DraftField::SpeakerBio => &self.speaker_bio,
        }
    }

    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        let slot = match field {
            DraftField::Name => &mut self.name,
            DraftField::Description => &mut self.description,
            DraftField::SpeakerName => &mut self.speaker_name,
            DraftField::SpeakerBio => &mut self.speaker_bio,
        };
        *slot = value.into();
    }

    /// True once every field holds non-empty text.
    pub fn is_complete(&self) -> bool {
        DraftField::ALL
            .iter()
            .all(|field| !self.get(*field).is_empty())
    }

    pub fn is_empty(&self) -> bool {
        DraftField::ALL.iter().all(|field| self.get(*field).is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    Name,
    Description,
    SpeakerName,
    SpeakerBio,
}

impl DraftField {
    pub const ALL: [DraftField; 4] = [
        DraftField::Name,
        DraftField::Description,
        DraftField::SpeakerName,
        DraftField::SpeakerBio,
    ];

    /// Form input name, matching the GraphQL field name.
    pub fn input_name(self) -> &'static str {
        match self {
            DraftField::Name => "name",
            DraftField::Description => "description",
            DraftField::SpeakerName => "speakerName",
            DraftField::SpeakerBio => "speakerBio",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.input_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown draft field '{0}' (expected name, description, speakerName or speakerBio)")]
pub struct UnknownDraftField(pub String);

impl FromStr for DraftField {
    type Err = UnknownDraftField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(DraftField::Name),
            "description" => Ok(DraftField::Description),
            "speakerName" | "speaker_name" => Ok(DraftField::SpeakerName),
            "speakerBio" | "speaker_bio" => Ok(DraftField::SpeakerBio),
            other => Err(UnknownDraftField(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
