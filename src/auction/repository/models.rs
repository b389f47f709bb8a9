#[cfg(test)]
use mockall::automock;
use {
    super::entities,
    crate::{
        api::ApiError,
        kernel::{
            db::DB,
            entities::{
                AuctionId,
                BidderId,
                ExternalRef,
                Money,
            },
        },
    },
    async_trait::async_trait,
    sqlx::FromRow,
    std::{
        fmt::Debug,
        time::Duration,
    },
    time::OffsetDateTime,
    tracing::instrument,
};

#[derive(Clone, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "auction_status", rename_all = "lowercase")]
pub enum AuctionStatus {
    Active,
    Ended,
    Deleted,
}

impl From<AuctionStatus> for entities::AuctionStatus {
    fn from(status: AuctionStatus) -> Self {
        match status {
            AuctionStatus::Active => entities::AuctionStatus::Active,
            AuctionStatus::Ended => entities::AuctionStatus::Ended,
            AuctionStatus::Deleted => entities::AuctionStatus::Deleted,
        }
    }
}

impl From<entities::AuctionStatus> for AuctionStatus {
    fn from(status: entities::AuctionStatus) -> Self {
        match status {
            entities::AuctionStatus::Active => AuctionStatus::Active,
            entities::AuctionStatus::Ended => AuctionStatus::Ended,
            entities::AuctionStatus::Deleted => AuctionStatus::Deleted,
        }
    }
}

#[derive(Clone, Debug, FromRow)]
pub struct AuctionRow {
    pub id:            i64,
    pub title:         String,
    pub description:   Option<String>,
    pub status:        AuctionStatus,
    pub start_price:   i64,
    pub step_price:    i64,
    pub current_price: i64,
    pub winner_id:     Option<i64>,
    pub external_ref:  Option<i64>,
    pub created_at:    OffsetDateTime,
    pub last_bid_time: OffsetDateTime,
    pub ends_at:       OffsetDateTime,
    pub ended_at:      Option<OffsetDateTime>,
}

impl From<AuctionRow> for entities::Auction {
    fn from(row: AuctionRow) -> Self {
        Self {
            id:            row.id,
            title:         row.title,
            description:   row.description,
            status:        row.status.into(),
            start_price:   row.start_price,
            step_price:    row.step_price,
            current_price: row.current_price,
            winner_id:     row.winner_id,
            external_ref:  row.external_ref,
            created_at:    row.created_at,
            last_bid_time: row.last_bid_time,
            ends_at:       row.ends_at,
            ended_at:      row.ended_at,
        }
    }
}

#[derive(Clone, Debug, FromRow)]
pub struct BidRow {
    pub id:         i64,
    pub auction_id: i64,
    pub bidder_id:  i64,
    pub amount:     i64,
    pub created_at: OffsetDateTime,
}

impl From<BidRow> for entities::Bid {
    fn from(row: BidRow) -> Self {
        Self {
            id:         row.id,
            auction_id: row.auction_id,
            bidder_id:  row.bidder_id,
            amount:     row.amount,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone, Debug, FromRow)]
pub struct BidderRow {
    pub id:           i64,
    pub display_name: String,
    pub confirmed:    bool,
}

impl From<BidderRow> for entities::Bidder {
    fn from(row: BidderRow) -> Self {
        Self {
            id:           row.id,
            display_name: row.display_name,
            confirmed:    row.confirmed,
        }
    }
}

#[derive(Clone, Debug, FromRow)]
pub struct LeaderboardRow {
    pub id:          i64,
    pub auction_id:  i64,
    pub bidder_id:   i64,
    pub amount:      i64,
    pub created_at:  OffsetDateTime,
    pub bidder_name: String,
}

impl From<LeaderboardRow> for entities::LeaderboardEntry {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            bid:         entities::Bid {
                id:         row.id,
                auction_id: row.auction_id,
                bidder_id:  row.bidder_id,
                amount:     row.amount,
                created_at: row.created_at,
            },
            bidder_name: row.bidder_name,
        }
    }
}

/// Result of a committed bid. `outbid` is the leading bid the new one
/// superseded, kept for the outbid notification.
#[derive(Clone, Debug)]
pub struct PlaceBidCommit {
    pub bid:     entities::Bid,
    pub auction: entities::Auction,
    pub outbid:  Option<entities::Bid>,
}

#[derive(Clone, Debug)]
pub struct ClosedAuction {
    pub auction: entities::Auction,
    pub winner:  Option<entities::Bid>,
}

#[derive(Clone, Debug)]
pub struct CancelledBid {
    pub auction: entities::Auction,
    pub removed: entities::Bid,
}

fn store_unavailable(err: sqlx::Error) -> ApiError {
    tracing::warn!(error = ?err, "storage error");
    ApiError::TemporarilyUnavailable
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Debug + Send + Sync + 'static {
    async fn add_auction(&self, auction: &entities::Auction)
        -> Result<entities::Auction, ApiError>;
    async fn get_auction(&self, auction_id: AuctionId) -> Result<entities::Auction, ApiError>;
    async fn list_active(
        &self,
        deadline_before: Option<OffsetDateTime>,
    ) -> Result<Vec<entities::Auction>, ApiError>;
    async fn place_bid(
        &self,
        auction_id: AuctionId,
        bidder_id: BidderId,
        amount: Money,
        bid_timeout: Duration,
    ) -> Result<PlaceBidCommit, ApiError>;
    async fn conclude_auction(
        &self,
        auction_id: AuctionId,
    ) -> Result<Option<ClosedAuction>, ApiError>;
    async fn cancel_last_bid(
        &self,
        auction_id: AuctionId,
        bid_timeout: Duration,
    ) -> Result<CancelledBid, ApiError>;
    async fn delete_auction_cascade(
        &self,
        auction_id: AuctionId,
    ) -> Result<entities::Auction, ApiError>;
    async fn top_bids(
        &self,
        auction_id: AuctionId,
        limit: i64,
    ) -> Result<Vec<entities::LeaderboardEntry>, ApiError>;
    async fn count_bids(&self, auction_id: AuctionId) -> Result<i64, ApiError>;
    async fn set_external_ref(
        &self,
        auction_id: AuctionId,
        external_ref: ExternalRef,
    ) -> Result<(), ApiError>;
    async fn list_subscribers(&self, auction_id: AuctionId) -> Result<Vec<BidderId>, ApiError>;
}

#[async_trait]
impl Database for DB {
    #[instrument(name = "db_add_auction", skip_all)]
    async fn add_auction(
        &self,
        auction: &entities::Auction,
    ) -> Result<entities::Auction, ApiError> {
        let row: AuctionRow = sqlx::query_as(
            "INSERT INTO auctions \
             (title, description, status, start_price, step_price, current_price, \
              created_at, last_bid_time, ends_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(&auction.title)
        .bind(&auction.description)
        .bind(AuctionStatus::from(auction.status))
        .bind(auction.start_price)
        .bind(auction.step_price)
        .bind(auction.current_price)
        .bind(auction.created_at)
        .bind(auction.last_bid_time)
        .bind(auction.ends_at)
        .fetch_one(self)
        .await
        .map_err(store_unavailable)?;
        Ok(row.into())
    }

    #[instrument(name = "db_get_auction", skip_all, fields(auction_id = auction_id))]
    async fn get_auction(&self, auction_id: AuctionId) -> Result<entities::Auction, ApiError> {
        let row: Option<AuctionRow> = sqlx::query_as("SELECT * FROM auctions WHERE id = $1")
            .bind(auction_id)
            .fetch_optional(self)
            .await
            .map_err(store_unavailable)?;
        row.map(Into::into).ok_or(ApiError::AuctionNotFound)
    }

    #[instrument(name = "db_list_active", skip_all)]
    async fn list_active(
        &self,
        deadline_before: Option<OffsetDateTime>,
    ) -> Result<Vec<entities::Auction>, ApiError> {
        let rows: Vec<AuctionRow> = sqlx::query_as(
            "SELECT * FROM auctions \
             WHERE status = 'active' AND ($1::timestamptz IS NULL OR ends_at <= $1) \
             ORDER BY ends_at ASC",
        )
        .bind(deadline_before)
        .fetch_all(self)
        .await
        .map_err(store_unavailable)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// The whole read-validate-write sequence runs in one transaction
    /// holding a row-level exclusive lock on the auction, so concurrent
    /// submissions against the same auction are serialized by storage.
    #[instrument(
        name = "db_place_bid",
        skip_all,
        fields(auction_id = auction_id, bidder_id = bidder_id)
    )]
    async fn place_bid(
        &self,
        auction_id: AuctionId,
        bidder_id: BidderId,
        amount: Money,
        bid_timeout: Duration,
    ) -> Result<PlaceBidCommit, ApiError> {
        let mut tx = self.begin().await.map_err(store_unavailable)?;

        let row: Option<AuctionRow> =
            sqlx::query_as("SELECT * FROM auctions WHERE id = $1 FOR UPDATE")
                .bind(auction_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_unavailable)?;
        let mut auction: entities::Auction = row.ok_or(ApiError::AuctionNotFound)?.into();
        if !auction.is_active() {
            return Err(ApiError::AuctionNotActive);
        }

        let bidder: Option<BidderRow> =
            sqlx::query_as("SELECT id, display_name, confirmed FROM bidders WHERE id = $1")
                .bind(bidder_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_unavailable)?;
        let bidder: entities::Bidder = bidder.ok_or(ApiError::BidderNotConfirmed)?.into();

        let leader: Option<BidRow> = sqlx::query_as(
            "SELECT * FROM bids WHERE auction_id = $1 \
             ORDER BY amount DESC, created_at ASC LIMIT 1",
        )
        .bind(auction_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_unavailable)?;
        let leader: Option<entities::Bid> = leader.map(Into::into);

        auction.validate_bid(&bidder, leader.as_ref(), amount)?;

        let now = OffsetDateTime::now_utc();
        let bid: BidRow = sqlx::query_as(
            "INSERT INTO bids (auction_id, bidder_id, amount, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(auction_id)
        .bind(bidder_id)
        .bind(amount)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_unavailable)?;

        auction.apply_bid(amount, now, bid_timeout);
        sqlx::query(
            "UPDATE auctions SET current_price = $1, last_bid_time = $2, ends_at = $3 \
             WHERE id = $4",
        )
        .bind(auction.current_price)
        .bind(auction.last_bid_time)
        .bind(auction.ends_at)
        .bind(auction_id)
        .execute(&mut *tx)
        .await
        .map_err(store_unavailable)?;

        tx.commit().await.map_err(store_unavailable)?;
        Ok(PlaceBidCommit {
            bid: bid.into(),
            auction,
            outbid: leader,
        })
    }

    /// Terminal transition. Returns `Ok(None)` when the auction is missing
    /// or no longer Active: a timer firing after an admin closure or a
    /// reconciler sweep racing a live timer must degrade to a no-op.
    #[instrument(name = "db_conclude_auction", skip_all, fields(auction_id = auction_id))]
    async fn conclude_auction(
        &self,
        auction_id: AuctionId,
    ) -> Result<Option<ClosedAuction>, ApiError> {
        let mut tx = self.begin().await.map_err(store_unavailable)?;

        let row: Option<AuctionRow> =
            sqlx::query_as("SELECT * FROM auctions WHERE id = $1 FOR UPDATE")
                .bind(auction_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_unavailable)?;
        let mut auction: entities::Auction = match row {
            Some(row) => row.into(),
            None => return Ok(None),
        };
        if !auction.is_active() {
            return Ok(None);
        }

        let winner: Option<BidRow> = sqlx::query_as(
            "SELECT * FROM bids WHERE auction_id = $1 \
             ORDER BY amount DESC, created_at ASC LIMIT 1",
        )
        .bind(auction_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_unavailable)?;
        let winner: Option<entities::Bid> = winner.map(Into::into);

        auction.close(winner.as_ref(), OffsetDateTime::now_utc());
        sqlx::query(
            "UPDATE auctions SET status = $1, ended_at = $2, winner_id = $3, \
             current_price = $4 WHERE id = $5",
        )
        .bind(AuctionStatus::from(auction.status))
        .bind(auction.ended_at)
        .bind(auction.winner_id)
        .bind(auction.current_price)
        .bind(auction_id)
        .execute(&mut *tx)
        .await
        .map_err(store_unavailable)?;

        tx.commit().await.map_err(store_unavailable)?;
        Ok(Some(ClosedAuction { auction, winner }))
    }

    /// Removes the trailing bid (the current leader, prices being
    /// monotonic) and rewinds price and deadline to the next-ranked bid.
    #[instrument(name = "db_cancel_last_bid", skip_all, fields(auction_id = auction_id))]
    async fn cancel_last_bid(
        &self,
        auction_id: AuctionId,
        bid_timeout: Duration,
    ) -> Result<CancelledBid, ApiError> {
        let mut tx = self.begin().await.map_err(store_unavailable)?;

        let row: Option<AuctionRow> =
            sqlx::query_as("SELECT * FROM auctions WHERE id = $1 FOR UPDATE")
                .bind(auction_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_unavailable)?;
        let mut auction: entities::Auction = row.ok_or(ApiError::AuctionNotFound)?.into();
        if !auction.is_active() {
            return Err(ApiError::AuctionNotActive);
        }

        let last: Option<BidRow> = sqlx::query_as(
            "SELECT * FROM bids WHERE auction_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(auction_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_unavailable)?;
        let removed: entities::Bid = last.ok_or(ApiError::NoBids)?.into();

        sqlx::query("DELETE FROM bids WHERE id = $1")
            .bind(removed.id)
            .execute(&mut *tx)
            .await
            .map_err(store_unavailable)?;

        let next: Option<BidRow> = sqlx::query_as(
            "SELECT * FROM bids WHERE auction_id = $1 \
             ORDER BY amount DESC, created_at ASC LIMIT 1",
        )
        .bind(auction_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_unavailable)?;
        let next: Option<entities::Bid> = next.map(Into::into);

        auction.rewind_to(next.as_ref(), bid_timeout);
        sqlx::query(
            "UPDATE auctions SET current_price = $1, last_bid_time = $2, ends_at = $3 \
             WHERE id = $4",
        )
        .bind(auction.current_price)
        .bind(auction.last_bid_time)
        .bind(auction.ends_at)
        .bind(auction_id)
        .execute(&mut *tx)
        .await
        .map_err(store_unavailable)?;

        tx.commit().await.map_err(store_unavailable)?;
        Ok(CancelledBid { auction, removed })
    }

    /// Hard delete, only while Active (a winner can only exist on Ended
    /// auctions). Bids and subscriptions go with the auction.
    #[instrument(name = "db_delete_auction", skip_all, fields(auction_id = auction_id))]
    async fn delete_auction_cascade(
        &self,
        auction_id: AuctionId,
    ) -> Result<entities::Auction, ApiError> {
        let mut tx = self.begin().await.map_err(store_unavailable)?;

        let row: Option<AuctionRow> =
            sqlx::query_as("SELECT * FROM auctions WHERE id = $1 FOR UPDATE")
                .bind(auction_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_unavailable)?;
        let auction: entities::Auction = row.ok_or(ApiError::AuctionNotFound)?.into();
        if !auction.is_active() {
            return Err(ApiError::AuctionNotActive);
        }

        for statement in [
            "DELETE FROM subscriptions WHERE auction_id = $1",
            "DELETE FROM bids WHERE auction_id = $1",
            "DELETE FROM auctions WHERE id = $1",
        ] {
            sqlx::query(statement)
                .bind(auction_id)
                .execute(&mut *tx)
                .await
                .map_err(store_unavailable)?;
        }

        tx.commit().await.map_err(store_unavailable)?;
        Ok(auction)
    }

    #[instrument(name = "db_top_bids", skip_all, fields(auction_id = auction_id))]
    async fn top_bids(
        &self,
        auction_id: AuctionId,
        limit: i64,
    ) -> Result<Vec<entities::LeaderboardEntry>, ApiError> {
        let rows: Vec<LeaderboardRow> = sqlx::query_as(
            "SELECT b.id, b.auction_id, b.bidder_id, b.amount, b.created_at, \
             u.display_name AS bidder_name \
             FROM bids b JOIN bidders u ON u.id = b.bidder_id \
             WHERE b.auction_id = $1 \
             ORDER BY b.amount DESC, b.created_at ASC LIMIT $2",
        )
        .bind(auction_id)
        .bind(limit)
        .fetch_all(self)
        .await
        .map_err(store_unavailable)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(name = "db_count_bids", skip_all, fields(auction_id = auction_id))]
    async fn count_bids(&self, auction_id: AuctionId) -> Result<i64, ApiError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM bids WHERE auction_id = $1")
            .bind(auction_id)
            .fetch_one(self)
            .await
            .map_err(store_unavailable)
    }

    #[instrument(name = "db_set_external_ref", skip_all, fields(auction_id = auction_id))]
    async fn set_external_ref(
        &self,
        auction_id: AuctionId,
        external_ref: ExternalRef,
    ) -> Result<(), ApiError> {
        sqlx::query("UPDATE auctions SET external_ref = $1 WHERE id = $2")
            .bind(external_ref)
            .bind(auction_id)
            .execute(self)
            .await
            .map_err(store_unavailable)?;
        Ok(())
    }

    #[instrument(name = "db_list_subscribers", skip_all, fields(auction_id = auction_id))]
    async fn list_subscribers(&self, auction_id: AuctionId) -> Result<Vec<BidderId>, ApiError> {
        sqlx::query_scalar("SELECT bidder_id FROM subscriptions WHERE auction_id = $1")
            .bind(auction_id)
            .fetch_all(self)
            .await
            .map_err(store_unavailable)
    }
}
