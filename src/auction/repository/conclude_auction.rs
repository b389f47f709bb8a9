use {
    super::{
        models::ClosedAuction,
        Repository,
    },
    crate::{
        api::ApiError,
        kernel::entities::AuctionId,
    },
};

impl Repository {
    #[tracing::instrument(name = "conclude_auction_repo", skip_all, fields(auction_id = auction_id))]
    pub async fn conclude_auction(
        &self,
        auction_id: AuctionId,
    ) -> Result<Option<ClosedAuction>, ApiError> {
        self.db.conclude_auction(auction_id).await
    }
}
