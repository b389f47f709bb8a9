use {
    super::Service,
    crate::{
        api::ApiError,
        auction::entities::Auction,
        kernel::{
            entities::AuctionId,
            retry,
        },
    },
};

pub struct DeleteAuctionInput {
    pub auction_id: AuctionId,
}

impl Service {
    /// Removes an Active auction outright, together with its bids and
    /// subscriptions. The published card is taken down best-effort.
    #[tracing::instrument(skip_all, fields(auction_id = input.auction_id))]
    pub async fn delete_auction(&self, input: DeleteAuctionInput) -> Result<Auction, ApiError> {
        self.cancel_timer(input.auction_id).await;

        let auction = retry::with_backoff(self.config.store_retry, ApiError::is_retryable, || {
            self.repo.delete_auction_cascade(input.auction_id)
        })
        .await?;
        tracing::info!(auction_id = auction.id, "auction deleted");

        if let Some(external_ref) = auction.external_ref {
            let service = self.clone();
            self.task_tracker.spawn(async move {
                if let Err(err) = service.announcer.delete(external_ref).await {
                    tracing::warn!(external_ref, error = ?err, "failed to take down auction card");
                }
            });
        }

        Ok(auction)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{
            super::timer::tests::active_auction,
            *,
        },
        crate::{
            announcer::MockAnnouncer,
            auction::repository::MockDatabase,
        },
        mockall::predicate::eq,
        std::time::Duration,
        time::OffsetDateTime,
    };

    #[tokio::test(start_paused = true)]
    async fn deletion_cancels_the_timer_and_takes_down_the_card() {
        let now = OffsetDateTime::now_utc();
        let mut stored = active_auction(1, now + Duration::from_secs(600));
        stored.external_ref = Some(42);

        let mut db = MockDatabase::new();
        db.expect_get_auction().returning({
            let stored = stored.clone();
            move |_| Ok(stored.clone())
        });
        db.expect_delete_auction_cascade().times(1).returning({
            let stored = stored.clone();
            move |_| Ok(stored.clone())
        });

        let mut announcer = MockAnnouncer::new();
        announcer
            .expect_delete()
            .with(eq(42))
            .times(1)
            .returning(|_| Ok(()));

        let service = Service::new_with_mocks(db, announcer);
        service
            .schedule_closure(1, now + Duration::from_secs(600))
            .await;

        let deleted = service
            .delete_auction(DeleteAuctionInput { auction_id: 1 })
            .await
            .unwrap();

        assert_eq!(deleted.id, 1);
        assert!(!service.timers.contains(1).await);
        service.drain().await;
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_a_closed_auction_is_rejected() {
        let mut db = MockDatabase::new();
        db.expect_delete_auction_cascade()
            .returning(|_| Err(ApiError::AuctionNotActive));

        let service = Service::new_with_mocks(db, MockAnnouncer::new());
        let result = service
            .delete_auction(DeleteAuctionInput { auction_id: 1 })
            .await;

        assert_eq!(result.unwrap_err(), ApiError::AuctionNotActive);
        service.drain().await;
    }
}
