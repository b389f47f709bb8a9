use {
    super::{
        render,
        Service,
    },
    crate::{
        api::ApiError,
        auction::repository::ClosedAuction,
        kernel::{
            entities::AuctionId,
            retry,
        },
    },
};

pub struct ConcludeAuctionInput {
    pub auction_id: AuctionId,
}

impl Service {
    /// Closes an auction and settles the winner. Idempotent: closing an
    /// auction that is already gone or no longer Active returns `Ok(None)`,
    /// which makes the timer, the reconciler and explicit early closure
    /// safe to race against each other.
    #[tracing::instrument(skip_all, fields(auction_id = input.auction_id))]
    pub async fn conclude_auction(
        &self,
        input: ConcludeAuctionInput,
    ) -> Result<Option<ClosedAuction>, ApiError> {
        // a live timer for this auction is superseded by the closure
        self.cancel_timer(input.auction_id).await;

        let closed = retry::with_backoff(self.config.store_retry, ApiError::is_retryable, || {
            self.repo.conclude_auction(input.auction_id)
        })
        .await?;

        let Some(closed) = closed else {
            tracing::debug!(auction_id = input.auction_id, "auction was already closed");
            return Ok(None);
        };

        tracing::info!(
            auction_id = closed.auction.id,
            winner_id = closed.auction.winner_id,
            final_price = closed.auction.current_price,
            "auction closed"
        );

        self.refresh_announcement_detached(closed.auction.id);

        let service = self.clone();
        let outcome = closed.clone();
        self.task_tracker.spawn(async move {
            let winner_id = outcome.winner.as_ref().map(|winner| winner.bidder_id);
            if let Some(winner_id) = winner_id {
                service.send_note(winner_id, render::winner_note(&outcome.auction));
            }
            service
                .note_subscribers(
                    outcome.auction.id,
                    winner_id,
                    render::closed_note(&outcome.auction),
                )
                .await;
        });

        Ok(Some(closed))
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
            auction::{
                entities::Bid,
                repository::MockDatabase,
            },
        },
        mockall::predicate::eq,
        std::time::Duration,
        time::OffsetDateTime,
    };

    fn closed_with_winner(auction_id: i64, winner_id: i64) -> ClosedAuction {
        let now = OffsetDateTime::now_utc();
        let mut auction = ended_auction(auction_id, now);
        auction.winner_id = Some(winner_id);
        auction.current_price = 12_000;
        auction.external_ref = Some(10);
        ClosedAuction {
            auction,
            winner: Some(Bid {
                id: 1,
                auction_id,
                bidder_id: winner_id,
                amount: 12_000,
                created_at: now - Duration::from_secs(60),
            }),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn closing_settles_winner_and_notifies_participants() {
        let closed = closed_with_winner(1, 7);
        let announced = closed.auction.clone();

        let mut db = MockDatabase::new();
        db.expect_conclude_auction().times(1).returning({
            let closed = closed.clone();
            move |_| Ok(Some(closed.clone()))
        });
        db.expect_get_auction()
            .returning(move |_| Ok(announced.clone()));
        db.expect_top_bids().returning(|_, _| Ok(vec![]));
        db.expect_count_bids().returning(|_| Ok(1));
        db.expect_list_subscribers().returning(|_| Ok(vec![7, 8]));

        let mut announcer = MockAnnouncer::new();
        announcer.expect_update().returning(|_, _| Ok(()));
        // the winner gets the dedicated note, the other subscriber the
        // generic one; the winner is excluded from the broadcast
        announcer
            .expect_notify()
            .with(eq(7), mockall::predicate::always())
            .times(1)
            .returning(|_, _| Ok(()));
        announcer
            .expect_notify()
            .with(eq(8), mockall::predicate::always())
            .times(1)
            .returning(|_, _| Ok(()));

        let service = Service::new_with_mocks(db, announcer);
        let result = service
            .conclude_auction(ConcludeAuctionInput { auction_id: 1 })
            .await
            .unwrap();

        assert_eq!(result.unwrap().auction.winner_id, Some(7));
        service.drain().await;
    }

    #[tokio::test(start_paused = true)]
    async fn closing_twice_is_a_no_op() {
        let mut db = MockDatabase::new();
        db.expect_conclude_auction().returning(|_| Ok(None));

        let service = Service::new_with_mocks(db, MockAnnouncer::new());
        let result = service
            .conclude_auction(ConcludeAuctionInput { auction_id: 1 })
            .await
            .unwrap();

        assert!(result.is_none());
        service.drain().await;
    }
}
