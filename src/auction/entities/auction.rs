use {
    super::{
        bid::Bid,
        bidder::Bidder,
    },
    crate::{
        api::ApiError,
        kernel::entities::{
            AuctionId,
            BidderId,
            ExternalRef,
            Money,
        },
    },
    std::time::Duration,
    time::OffsetDateTime,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuctionStatus {
    Active,
    Ended,
    Deleted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Auction {
    pub id:            AuctionId,
    pub title:         String,
    pub description:   Option<String>,
    pub status:        AuctionStatus,
    pub start_price:   Money,
    pub step_price:    Money,
    pub current_price: Money,
    pub winner_id:     Option<BidderId>,
    pub external_ref:  Option<ExternalRef>,
    pub created_at:    OffsetDateTime,
    pub last_bid_time: OffsetDateTime,
    pub ends_at:       OffsetDateTime,
    pub ended_at:      Option<OffsetDateTime>,
}

impl Auction {
    /// A fresh Active auction whose deadline derives from its creation
    /// time. The id is assigned by storage on insert.
    pub fn new(
        title: String,
        description: Option<String>,
        start_price: Money,
        step_price: Money,
        created_at: OffsetDateTime,
        bid_timeout: Duration,
    ) -> Self {
        Self {
            id: 0,
            title,
            description,
            status: AuctionStatus::Active,
            start_price,
            step_price,
            current_price: start_price,
            winner_id: None,
            external_ref: None,
            created_at,
            last_bid_time: created_at,
            ends_at: created_at + bid_timeout,
            ended_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AuctionStatus::Active
    }

    /// Smallest amount the next bid must reach.
    pub fn min_next_bid(&self) -> Money {
        self.current_price + self.step_price
    }

    /// Checks a bid against the current state. Must be evaluated while the
    /// auction row is exclusively locked; the rejection order matters and
    /// each failure maps to a distinct reason.
    pub fn validate_bid(
        &self,
        bidder: &Bidder,
        leader: Option<&Bid>,
        amount: Money,
    ) -> Result<(), ApiError> {
        if !self.is_active() {
            return Err(ApiError::AuctionNotActive);
        }
        if !bidder.confirmed {
            return Err(ApiError::BidderNotConfirmed);
        }
        let minimum = self.min_next_bid();
        if amount < minimum {
            return Err(ApiError::BidTooLow { minimum });
        }
        if leader.is_some_and(|leader| leader.bidder_id == bidder.id) {
            return Err(ApiError::AlreadyLeading);
        }
        Ok(())
    }

    /// Commits an accepted bid: the price rises to the bid amount and the
    /// deadline restarts from the bid time.
    pub fn apply_bid(&mut self, amount: Money, at: OffsetDateTime, bid_timeout: Duration) {
        self.current_price = amount;
        self.last_bid_time = at;
        self.ends_at = at + bid_timeout;
    }

    /// Terminal transition to Ended. With a winner the price settles on the
    /// winning amount; without one it is left as-is.
    pub fn close(&mut self, winner: Option<&Bid>, at: OffsetDateTime) {
        self.status = AuctionStatus::Ended;
        self.ended_at = Some(at);
        if let Some(winner) = winner {
            self.winner_id = Some(winner.bidder_id);
            self.current_price = winner.amount;
        }
    }

    /// Rolls the running state back to the given leading bid, or to the
    /// start price if no bids remain. The deadline is recomputed from the
    /// surviving bid's original timestamp, not from "now", so `ends_at`
    /// stays a pure function of the bid ledger.
    pub fn rewind_to(&mut self, leader: Option<&Bid>, bid_timeout: Duration) {
        match leader {
            Some(bid) => {
                self.current_price = bid.amount;
                self.last_bid_time = bid.created_at;
                self.ends_at = bid.created_at + bid_timeout;
            }
            None => {
                self.current_price = self.start_price;
                self.last_bid_time = self.created_at;
                self.ends_at = self.created_at + bid_timeout;
            }
        }
    }
}
