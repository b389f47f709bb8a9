use {
    super::{
        entities,
        Repository,
    },
    crate::api::ApiError,
    time::OffsetDateTime,
};

impl Repository {
    /// All Active auctions, oldest deadline first. With `deadline_before`
    /// set, only those whose deadline has passed that instant.
    pub async fn list_active(
        &self,
        deadline_before: Option<OffsetDateTime>,
    ) -> Result<Vec<entities::Auction>, ApiError> {
        self.db.list_active(deadline_before).await
    }
}
