pub type AuctionId = i64;
pub type BidId = i64;
pub type BidderId = i64;

/// Monetary amount in integer minor units (e.g. cents). All price
/// arithmetic and comparisons happen on this representation.
pub type Money = i64;

/// Opaque handle to the externally announced representation of an auction
/// (for the Telegram announcer this is a channel message id).
pub type ExternalRef = i64;

pub fn format_money(amount: Money) -> String {
    format!("{}.{:02}", amount / 100, (amount % 100).abs())
}
