//! Local talk list and draft state.
//!
//! Every transition here is synchronous and runs to completion; the async
//! plumbing around it lives in [`crate::TalkBoard`].

use shared::domain::{ClientId, Draft, DraftField, Talk};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Appended,
    /// The pushed talk was created by this session and is already shown.
    EchoSuppressed,
}

#[derive(Debug, Clone)]
pub struct TalkListReconciler {
    client_id: ClientId,
    talks: Vec<Talk>,
    draft: Draft,
}

impl TalkListReconciler {
    pub fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            talks: Vec::new(),
            draft: Draft::default(),
        }
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn talks(&self) -> &[Talk] {
        &self.talks
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn replace_talks(&mut self, talks: Vec<Talk>) {
        self.talks = talks;
    }

    pub fn set_draft_field(&mut self, field: DraftField, value: impl Into<String>) {
        self.draft.set(field, value);
    }

    pub fn clear_draft(&mut self) {
        self.draft = Draft::default();
    }

    pub fn append_talk(&mut self, talk: Talk) {
        self.talks.push(talk);
    }

    /// Optimistically appends the draft as a new talk and clears the draft.
    ///
    /// Returns the appended talk so the caller can send it to the backend, or
    /// `None` if any draft field is still empty, in which case nothing changes.
    pub fn submit_draft(&mut self) -> Option<Talk> {
        if !self.draft.is_complete() {
            return None;
        }
        let talk = Talk::from_draft(&self.draft, self.client_id.clone());
        self.append_talk(talk.clone());
        self.clear_draft();
        Some(talk)
    }

    pub fn receive_pushed(&mut self, talk: Talk) -> PushOutcome {
        if talk.is_from(&self.client_id) {
            return PushOutcome::EchoSuppressed;
        }
        self.append_talk(talk);
        PushOutcome::Appended
    }
}

#[cfg(test)]
#[path = "tests/reconciler_tests.rs"]
mod tests;
