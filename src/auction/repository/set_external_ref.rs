use {
    super::Repository,
    crate::{
        api::ApiError,
        kernel::entities::{
            AuctionId,
            ExternalRef,
        },
    },
};

impl Repository {
    pub async fn set_external_ref(
        &self,
        auction_id: AuctionId,
        external_ref: ExternalRef,
    ) -> Result<(), ApiError> {
        self.db.set_external_ref(auction_id, external_ref).await
    }
}
