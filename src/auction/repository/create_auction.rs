use {
    super::{
        entities,
        Repository,
    },
    crate::api::ApiError,
};

impl Repository {
    #[tracing::instrument(name = "create_auction_repo", skip_all)]
    pub async fn create_auction(
        &self,
        auction: &entities::Auction,
    ) -> Result<entities::Auction, ApiError> {
        self.db.add_auction(auction).await
    }
}
