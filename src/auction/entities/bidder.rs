use crate::kernel::entities::BidderId;

/// A participant known to the engine. Registration and rule confirmation
/// happen in the UI layer; the engine only reads the flag.
#[derive(Clone, Debug, PartialEq)]
pub struct Bidder {
    pub id:           BidderId,
    pub display_name: String,
    pub confirmed:    bool,
}
