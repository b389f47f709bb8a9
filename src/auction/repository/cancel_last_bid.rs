use {
    super::{
        models::CancelledBid,
        Repository,
    },
    crate::{
        api::ApiError,
        kernel::entities::AuctionId,
    },
    std::time::Duration,
};

impl Repository {
    #[tracing::instrument(name = "cancel_last_bid_repo", skip_all, fields(auction_id = auction_id))]
    pub async fn cancel_last_bid(
        &self,
        auction_id: AuctionId,
        bid_timeout: Duration,
    ) -> Result<CancelledBid, ApiError> {
        self.db.cancel_last_bid(auction_id, bid_timeout).await
    }
}
