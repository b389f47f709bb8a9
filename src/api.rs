use crate::kernel::entities::{
    format_money,
    Money,
};

/// The error surface exposed to the command/UI layer. Validation
/// rejections carry a specific reason and are never retried;
/// `TemporarilyUnavailable` is the only retryable classification and is
/// what transient storage contention degrades to once the retry budget is
/// exhausted.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The auction does not exist
    #[error("auction not found")]
    AuctionNotFound,
    /// The auction is already ended or deleted
    #[error("auction is no longer active")]
    AuctionNotActive,
    /// The bidder is unknown or has not confirmed the rules
    #[error("bidder is not a confirmed participant")]
    BidderNotConfirmed,
    /// The amount does not reach current price plus step
    #[error("bid is below the minimum of {}", format_money(*minimum))]
    BidTooLow { minimum: Money },
    /// The bidder already holds the leading bid
    #[error("bidder already holds the leading bid")]
    AlreadyLeading,
    /// There is no bid to cancel
    #[error("auction has no bids")]
    NoBids,
    /// Transient storage failure after retries
    #[error("storage is temporarily unavailable")]
    TemporarilyUnavailable,
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::TemporarilyUnavailable)
    }

    /// Message suitable for showing to the end user. Transient failures
    /// deliberately surface as a generic "try again".
    pub fn user_message(&self) -> String {
        match self {
            ApiError::AuctionNotFound | ApiError::AuctionNotActive => {
                "Auction not found or already ended".to_string()
            }
            ApiError::BidderNotConfirmed => {
                "You have not confirmed the rules yet".to_string()
            }
            ApiError::BidTooLow { minimum } => {
                format!("Minimum bid is {}", format_money(*minimum))
            }
            ApiError::AlreadyLeading => "You are already leading this auction".to_string(),
            ApiError::NoBids => "There are no bids on this auction".to_string(),
            ApiError::TemporarilyUnavailable => {
                "Something went wrong, please try again".to_string()
            }
        }
    }
}
