use {
    super::{
        models::PlaceBidCommit,
        Repository,
    },
    crate::{
        api::ApiError,
        kernel::entities::{
            AuctionId,
            BidderId,
            Money,
        },
    },
    std::time::Duration,
};

impl Repository {
    #[tracing::instrument(
        name = "place_bid_repo",
        skip_all,
        fields(auction_id = auction_id, bidder_id = bidder_id, amount = amount)
    )]
    pub async fn place_bid(
        &self,
        auction_id: AuctionId,
        bidder_id: BidderId,
        amount: Money,
        bid_timeout: Duration,
    ) -> Result<PlaceBidCommit, ApiError> {
        self.db
            .place_bid(auction_id, bidder_id, amount, bid_timeout)
            .await
    }
}
