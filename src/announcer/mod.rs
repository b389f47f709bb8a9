#[cfg(test)]
use mockall::automock;
use {
    crate::kernel::entities::{
        BidderId,
        ExternalRef,
    },
    async_trait::async_trait,
    std::fmt::Debug,
};

pub mod telegram;

#[derive(Debug, thiserror::Error)]
pub enum AnnouncerError {
    #[error("announcer request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("announcer rejected the call: {0}")]
    Rejected(String),
}

impl AnnouncerError {
    /// Network-level failures are worth another attempt; an explicit
    /// rejection (bad message id, kicked bot) is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnnouncerError::Request(_))
    }
}

/// The externally visible side of an auction: a published card that can be
/// edited or removed, and direct best-effort notes to participants. No
/// delivery receipt is assumed anywhere; callers log failures and move on,
/// relying on the reconciler to repair drift in the published cards.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Announcer: Debug + Send + Sync + 'static {
    async fn publish(&self, content: &str) -> Result<ExternalRef, AnnouncerError>;
    async fn update(&self, external_ref: ExternalRef, content: &str)
        -> Result<(), AnnouncerError>;
    async fn delete(&self, external_ref: ExternalRef) -> Result<(), AnnouncerError>;
    async fn notify(&self, recipient: BidderId, content: &str) -> Result<(), AnnouncerError>;
}
