use {
    super::{
        entities,
        Repository,
    },
    crate::{
        api::ApiError,
        kernel::entities::AuctionId,
    },
};

impl Repository {
    #[tracing::instrument(name = "delete_auction_repo", skip_all, fields(auction_id = auction_id))]
    pub async fn delete_auction_cascade(
        &self,
        auction_id: AuctionId,
    ) -> Result<entities::Auction, ApiError> {
        self.db.delete_auction_cascade(auction_id).await
    }
}
