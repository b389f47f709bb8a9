use {
    super::{
        conclude_auction::ConcludeAuctionInput,
        Service,
    },
    crate::{
        api::ApiError,
        auction::repository::ClosedAuction,
        kernel::entities::AuctionId,
    },
};

pub struct EndEarlyInput {
    pub auction_id: AuctionId,
}

impl Service {
    /// Operator-driven closure before the deadline. Unlike the timer path
    /// this is not a no-op on a non-Active auction: the caller asked for a
    /// state change and gets told when there is none to make.
    #[tracing::instrument(skip_all, fields(auction_id = input.auction_id))]
    pub async fn end_early(&self, input: EndEarlyInput) -> Result<ClosedAuction, ApiError> {
        match self
            .conclude_auction(ConcludeAuctionInput {
                auction_id: input.auction_id,
            })
            .await?
        {
            Some(closed) => Ok(closed),
            None => {
                // missing and already-closed map to distinct errors
                self.repo.get_auction(input.auction_id).await?;
                Err(ApiError::AuctionNotActive)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{
            super::timer::tests::ended_auction,
            *,
        },
        crate::{
            announcer::MockAnnouncer,
            auction::repository::MockDatabase,
        },
        time::OffsetDateTime,
    };

    #[tokio::test(start_paused = true)]
    async fn ending_a_closed_auction_reports_not_active() {
        let now = OffsetDateTime::now_utc();
        let mut db = MockDatabase::new();
        db.expect_conclude_auction().returning(|_| Ok(None));
        db.expect_get_auction()
            .returning(move |id| Ok(ended_auction(id, now)));

        let service = Service::new_with_mocks(db, MockAnnouncer::new());
        let result = service.end_early(EndEarlyInput { auction_id: 1 }).await;

        assert_eq!(result.unwrap_err(), ApiError::AuctionNotActive);
        service.drain().await;
    }

    #[tokio::test(start_paused = true)]
    async fn ending_a_missing_auction_reports_not_found() {
        let mut db = MockDatabase::new();
        db.expect_conclude_auction().returning(|_| Ok(None));
        db.expect_get_auction()
            .returning(|_| Err(ApiError::AuctionNotFound));

        let service = Service::new_with_mocks(db, MockAnnouncer::new());
        let result = service.end_early(EndEarlyInput { auction_id: 1 }).await;

        assert_eq!(result.unwrap_err(), ApiError::AuctionNotFound);
        service.drain().await;
    }
}
