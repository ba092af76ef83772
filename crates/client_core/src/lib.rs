use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::domain::{CreateTalkInput, Talk};

mod board;
pub mod error;
pub mod graphql;
pub mod realtime;
mod reconciler;

pub use board::{Applied, BoardEvent, TalkBoard};
pub use graphql::{Credential, GraphqlClient};
pub use realtime::{WsTalkSubscriber, WsTalkSubscription};
pub use reconciler::{PushOutcome, TalkListReconciler};

/// Full-list query collaborator.
#[async_trait]
pub trait TalkQuery: Send + Sync {
    async fn list_talks(&self) -> Result<Vec<Talk>>;
}

/// Creation mutation collaborator. The returned echo is informational only.
#[async_trait]
pub trait TalkMutation: Send + Sync {
    async fn create_talk(&self, input: CreateTalkInput) -> Result<Talk>;
}

/// Opens "talk created" push channels.
#[async_trait]
pub trait TalkSubscriber: Send + Sync {
    async fn subscribe_created(&self) -> Result<Box<dyn TalkSubscription>>;
}

/// A live push channel. `None` from `next_talk` means the channel has ended.
#[async_trait]
pub trait TalkSubscription: Send {
    async fn next_talk(&mut self) -> Option<Result<Talk>>;
    /// Releases the channel. Calling it again after the first time is a no-op.
    async fn close(&mut self) -> Result<()>;
}

pub struct MissingTalkQuery;

#[async_trait]
impl TalkQuery for MissingTalkQuery {
    async fn list_talks(&self) -> Result<Vec<Talk>> {
        Err(anyhow!("talk query backend is unavailable"))
    }
}

pub struct MissingTalkMutation;

#[async_trait]
impl TalkMutation for MissingTalkMutation {
    async fn create_talk(&self, _input: CreateTalkInput) -> Result<Talk> {
        Err(anyhow!("talk mutation backend is unavailable"))
    }
}

pub struct MissingTalkSubscriber;

#[async_trait]
impl TalkSubscriber for MissingTalkSubscriber {
    async fn subscribe_created(&self) -> Result<Box<dyn TalkSubscription>> {
        Err(anyhow!("talk subscription backend is unavailable"))
    }
}
