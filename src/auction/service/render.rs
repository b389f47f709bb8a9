use {
    crate::{
        auction::entities::{
            Auction,
            LeaderboardEntry,
        },
        kernel::entities::format_money,
    },
    time::{
        format_description::FormatItem,
        macros::format_description,
        OffsetDateTime,
    },
};

const DEADLINE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute] UTC");

fn format_deadline(at: OffsetDateTime) -> String {
    // the format has no fallible components
    at.format(&DEADLINE_FORMAT)
        .unwrap_or_else(|_| at.to_string())
}

/// The published auction card. Rendering is a pure function of the
/// auction row plus its leaderboard, so the refresh cycle can rebuild
/// and compare it at any time.
pub(super) fn auction_card(
    auction: &Auction,
    leaderboard: &[LeaderboardEntry],
    total_bids: i64,
) -> String {
    let mut card = format!("\u{1F528} {}\n", auction.title);
    if let Some(description) = &auction.description {
        card.push_str(description);
        card.push('\n');
    }
    card.push('\n');
    card.push_str(&format!(
        "Current price: {}\n",
        format_money(auction.current_price)
    ));

    if auction.is_active() {
        card.push_str(&format!(
            "Next bid from: {}\n",
            format_money(auction.min_next_bid())
        ));
        card.push_str(&format!("Closes at: {}\n", format_deadline(auction.ends_at)));
    } else {
        card.push_str("Auction closed.\n");
    }

    if !leaderboard.is_empty() {
        card.push_str(&format!("\nTop bids ({total_bids} total):\n"));
        for (position, entry) in leaderboard.iter().enumerate() {
            card.push_str(&format!(
                "{}. {} — {}\n",
                position + 1,
                entry.bidder_name,
                format_money(entry.bid.amount)
            ));
        }
    }
    card
}

pub(super) fn new_bid_note(auction: &Auction) -> String {
    format!(
        "New bid on \"{}\". The price is now {}.",
        auction.title,
        format_money(auction.current_price)
    )
}

pub(super) fn outbid_note(auction: &Auction) -> String {
    format!(
        "You have been outbid on \"{}\". The price is now {}.",
        auction.title,
        format_money(auction.current_price)
    )
}

pub(super) fn winner_note(auction: &Auction) -> String {
    format!(
        "You won \"{}\" at {}. Congratulations!",
        auction.title,
        format_money(auction.current_price)
    )
}

pub(super) fn bid_removed_note(auction: &Auction) -> String {
    format!(
        "Your bid on \"{}\" was removed by the operator. The price is back to {}.",
        auction.title,
        format_money(auction.current_price)
    )
}

pub(super) fn closed_note(auction: &Auction) -> String {
    format!("Auction \"{}\" has closed.", auction.title)
}
