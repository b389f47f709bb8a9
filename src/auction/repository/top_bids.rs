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
    pub async fn top_bids(
        &self,
        auction_id: AuctionId,
        limit: i64,
    ) -> Result<Vec<entities::LeaderboardEntry>, ApiError> {
        self.db.top_bids(auction_id, limit).await
    }
}
