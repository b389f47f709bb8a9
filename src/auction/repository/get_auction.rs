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
    pub async fn get_auction(&self, auction_id: AuctionId) -> Result<entities::Auction, ApiError> {
        self.db.get_auction(auction_id).await
    }
}
