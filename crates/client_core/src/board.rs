use std::sync::Arc;

use anyhow::{Context, Result};
use shared::domain::{ClientId, CreateTalkInput, Draft, DraftField, Talk};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    reconciler::{PushOutcome, TalkListReconciler},
    TalkMutation, TalkQuery, TalkSubscriber, TalkSubscription,
};

/// Outcome of background work, queued for the board's owner to apply.
#[derive(Debug)]
pub enum BoardEvent {
    FetchCompleted(Result<Vec<Talk>>),
    TalkPushed(Talk),
    PushFailed(anyhow::Error),
    PushClosed,
    CreateCompleted {
        input: CreateTalkInput,
        result: Result<Talk>,
    },
}

/// What applying one [`BoardEvent`] did to local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    TalksReplaced { count: usize },
    FetchFailed,
    TalkAppended,
    EchoSuppressed,
    TalkCreated,
    /// The optimistic entry stays in the list.
    CreateFailed,
    PushChannelFailed,
    PushChannelClosed,
}

impl Applied {
    pub fn changed_talks(self) -> bool {
        matches!(self, Applied::TalksReplaced { .. } | Applied::TalkAppended)
    }
}

struct ActiveSubscription {
    // Dropping the sender also stops the forwarder, which then closes the channel.
    shutdown: oneshot::Sender<()>,
    forwarder: JoinHandle<()>,
}

/// Owns the talk list and serializes every state change onto the caller's task.
///
/// Requests and push events run in spawned tasks and report back through an
/// inbox; nothing touches the reconciler until [`TalkBoard::next_event`] or
/// [`TalkBoard::drain_ready`] applies their results.
pub struct TalkBoard {
    reconciler: TalkListReconciler,
    query: Arc<dyn TalkQuery>,
    mutation: Arc<dyn TalkMutation>,
    subscriber: Arc<dyn TalkSubscriber>,
    inbox_tx: mpsc::UnboundedSender<BoardEvent>,
    inbox_rx: mpsc::UnboundedReceiver<BoardEvent>,
    subscription: Option<ActiveSubscription>,
}

impl TalkBoard {
    pub fn new(
        client_id: ClientId,
        query: Arc<dyn TalkQuery>,
        mutation: Arc<dyn TalkMutation>,
        subscriber: Arc<dyn TalkSubscriber>,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            reconciler: TalkListReconciler::new(client_id),
            query,
            mutation,
            subscriber,
            inbox_tx,
            inbox_rx,
            subscription: None,
        }
    }

    pub fn client_id(&self) -> &ClientId {
        self.reconciler.client_id()
    }

    pub fn talks(&self) -> &[Talk] {
        self.reconciler.talks()
    }

    pub fn draft(&self) -> &Draft {
        self.reconciler.draft()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Starts the full-list fetch. The result replaces the list once applied.
    pub fn initialize(&self) {
        let query = Arc::clone(&self.query);
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let result = query.list_talks().await;
            let _ = inbox.send(BoardEvent::FetchCompleted(result));
        });
    }

    /// Opens the "talk created" push channel, replacing any channel already open.
    pub async fn subscribe(&mut self) -> Result<()> {
        self.teardown().await;

        let subscription = self
            .subscriber
            .subscribe_created()
            .await
            .context("failed to open talk subscription")?;
        let (shutdown, shutdown_rx) = oneshot::channel();
        let forwarder = tokio::spawn(forward_pushes(
            subscription,
            shutdown_rx,
            self.inbox_tx.clone(),
        ));
        self.subscription = Some(ActiveSubscription {
            shutdown,
            forwarder,
        });
        info!(client_id = %self.client_id(), "talk subscription opened");
        Ok(())
    }

    /// Closes the push channel if one is open. Safe to call repeatedly.
    pub async fn teardown(&mut self) {
        let Some(active) = self.subscription.take() else {
            return;
        };
        let _ = active.shutdown.send(());
        if let Err(err) = active.forwarder.await {
            warn!("talk subscription forwarder ended abnormally: {err}");
        }
        info!("talk subscription closed");
    }

    pub fn set_draft_field(&mut self, field: DraftField, value: impl Into<String>) {
        self.reconciler.set_draft_field(field, value);
    }

    /// Appends the draft optimistically and sends the creation request.
    ///
    /// Returns `None` without side effects when the draft is incomplete.
    pub fn submit_draft(&mut self) -> Option<Talk> {
        let talk = self.reconciler.submit_draft()?;
        let input = CreateTalkInput::new(&talk, self.client_id().clone());
        let mutation = Arc::clone(&self.mutation);
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let result = mutation.create_talk(input.clone()).await;
            let _ = inbox.send(BoardEvent::CreateCompleted { input, result });
        });
        Some(talk)
    }

    /// Waits for the next background outcome and applies it.
    pub async fn next_event(&mut self) -> Option<Applied> {
        let event = self.inbox_rx.recv().await?;
        Some(self.apply(event))
    }

    /// Applies every outcome already queued, without waiting.
    pub fn drain_ready(&mut self) -> Vec<Applied> {
        let mut applied = Vec::new();
        while let Ok(event) = self.inbox_rx.try_recv() {
            applied.push(self.apply(event));
        }
        applied
    }

    fn apply(&mut self, event: BoardEvent) -> Applied {
        match event {
            BoardEvent::FetchCompleted(Ok(talks)) => {
                let count = talks.len();
                info!(count, "fetched talks from API");
                self.reconciler.replace_talks(talks);
                Applied::TalksReplaced { count }
            }
            BoardEvent::FetchCompleted(Err(err)) => {
                warn!("error fetching talks: {err:#}");
                Applied::FetchFailed
            }
            BoardEvent::TalkPushed(talk) => {
                let name = talk.name.clone();
                match self.reconciler.receive_pushed(talk) {
                    PushOutcome::Appended => {
                        debug!(talk = %name, "appended pushed talk");
                        Applied::TalkAppended
                    }
                    PushOutcome::EchoSuppressed => {
                        debug!(talk = %name, "ignoring self-originated talk event");
                        Applied::EchoSuppressed
                    }
                }
            }
            BoardEvent::PushFailed(err) => {
                warn!("talk subscription error: {err:#}");
                Applied::PushChannelFailed
            }
            BoardEvent::PushClosed => {
                info!("talk subscription ended by server");
                Applied::PushChannelClosed
            }
            BoardEvent::CreateCompleted { input, result } => match result {
                Ok(created) => {
                    info!(talk = %input.name, id = ?created.id, "talk created");
                    Applied::TalkCreated
                }
                Err(err) => {
                    warn!(talk = %input.name, "error creating talk: {err:#}");
                    Applied::CreateFailed
                }
            },
        }
    }
}

async fn forward_pushes(
    mut subscription: Box<dyn TalkSubscription>,
    mut shutdown: oneshot::Receiver<()>,
    inbox: mpsc::UnboundedSender<BoardEvent>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            item = subscription.next_talk() => match item {
                Some(Ok(talk)) => {
                    if inbox.send(BoardEvent::TalkPushed(talk)).is_err() {
                        break;
                    }
                }
                Some(Err(err)) => {
                    let _ = inbox.send(BoardEvent::PushFailed(err));
                }
                None => {
                    let _ = inbox.send(BoardEvent::PushClosed);
                    break;
                }
            },
        }
    }

    if let Err(err) = subscription.close().await {
        warn!("failed to close talk subscription: {err:#}");
    }
}

#[cfg(test)]
#[path = "tests/board_tests.rs"]
mod tests;
