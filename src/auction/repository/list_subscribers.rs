use {
    super::Repository,
    crate::{
        api::ApiError,
        kernel::entities::{
            AuctionId,
            BidderId,
        },
    },
};

impl Repository {
    pub async fn list_subscribers(
        &self,
        auction_id: AuctionId,
    ) -> Result<Vec<BidderId>, ApiError> {
        self.db.list_subscribers(auction_id).await
    }
}
