use {
    crate::kernel::entities::{
        AuctionId,
        BidId,
        BidderId,
        Money,
    },
    std::cmp::Reverse,
    time::OffsetDateTime,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Bid {
    pub id:         BidId,
    pub auction_id: AuctionId,
    pub bidder_id:  BidderId,
    pub amount:     Money,
    pub created_at: OffsetDateTime,
}

impl Bid {
    /// Ranking key: highest amount first, earliest bid breaking ties.
    /// Amount ties are unreachable while the step rule holds but the order
    /// is total anyway.
    pub fn rank_key(&self) -> (Reverse<Money>, OffsetDateTime) {
        (Reverse(self.amount), self.created_at)
    }
}

/// Top-ranked bid, i.e. the winner once the auction closes.
pub fn winner_of(bids: &[Bid]) -> Option<&Bid> {
    bids.iter().min_by_key(|bid| bid.rank_key())
}

/// A ranked bid joined with its bidder's display name, for rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct LeaderboardEntry {
    pub bid:         Bid,
    pub bidder_name: String,
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::time::Duration,
    };

    fn bid(id: i64, bidder_id: i64, amount: Money, at: OffsetDateTime) -> Bid {
        Bid {
            id,
            auction_id: 1,
            bidder_id,
            amount,
            created_at: at,
        }
    }

    #[test]
    fn highest_amount_wins() {
        let now = OffsetDateTime::now_utc();
        let bids = vec![
            bid(1, 7, 11_000, now),
            bid(2, 8, 13_000, now + Duration::from_secs(60)),
            bid(3, 9, 12_000, now + Duration::from_secs(120)),
        ];
        assert_eq!(winner_of(&bids).map(|bid| bid.id), Some(2));
    }

    #[test]
    fn amount_ties_break_towards_earliest() {
        let now = OffsetDateTime::now_utc();
        let bids = vec![
            bid(1, 7, 12_000, now + Duration::from_secs(60)),
            bid(2, 8, 12_000, now),
        ];
        assert_eq!(winner_of(&bids).map(|bid| bid.id), Some(2));
    }

    #[test]
    fn no_bids_no_winner() {
        assert_eq!(winner_of(&[]), None);
    }
}
