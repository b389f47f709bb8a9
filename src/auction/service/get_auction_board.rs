use {
    super::Service,
    crate::{
        api::ApiError,
        auction::entities::{
            Auction,
            LeaderboardEntry,
        },
        kernel::entities::AuctionId,
    },
};

const BOARD_SIZE: i64 = 10;

pub struct GetAuctionBoardInput {
    pub auction_id: AuctionId,
}

/// Read-only snapshot of an auction and its top bids.
#[derive(Clone, Debug)]
pub struct AuctionBoard {
    pub auction:     Auction,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub total_bids:  i64,
}

impl Service {
    #[tracing::instrument(skip_all, fields(auction_id = input.auction_id))]
    pub async fn get_auction_board(
        &self,
        input: GetAuctionBoardInput,
    ) -> Result<AuctionBoard, ApiError> {
        let auction = self.repo.get_auction(input.auction_id).await?;
        let leaderboard = self.repo.top_bids(input.auction_id, BOARD_SIZE).await?;
        let total_bids = self.repo.count_bids(input.auction_id).await?;
        Ok(AuctionBoard {
            auction,
            leaderboard,
            total_bids,
        })
    }
}
