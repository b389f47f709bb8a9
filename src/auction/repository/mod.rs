use {
    super::entities,
    std::fmt::Debug,
};

mod cancel_last_bid;
mod conclude_auction;
mod count_bids;
mod create_auction;
mod delete_auction;
mod get_auction;
mod list_active;
mod list_subscribers;
mod models;
mod place_bid;
mod set_external_ref;
mod top_bids;

pub use models::*;

/// Storage access for the auction domain. The `Database` seam is the unit
/// of mockability; the auction row behind it is the single source of
/// mutual exclusion for bid acceptance and closure.
#[derive(Debug)]
pub struct Repository {
    pub db: Box<dyn Database>,
}

impl Repository {
    pub fn new(db: impl Database) -> Self {
        Self { db: Box::new(db) }
    }
}
