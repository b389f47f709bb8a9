mod auction;
mod bid;
mod bidder;

pub use {
    auction::*,
    bid::*,
    bidder::*,
};
