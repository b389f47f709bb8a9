use {
    super::{
        render,
        Service,
    },
    crate::{
        api::ApiError,
        auction::repository::CancelledBid,
        kernel::{
            entities::AuctionId,
            retry,
        },
    },
};

pub struct CancelLastBidInput {
    pub auction_id: AuctionId,
}

impl Service {
    /// Operator rollback of the most recent bid. Price and deadline rewind
    /// to the surviving leader, so the timer is re-armed against the
    /// recomputed deadline rather than extended.
    #[tracing::instrument(skip_all, fields(auction_id = input.auction_id))]
    pub async fn cancel_last_bid(
        &self,
        input: CancelLastBidInput,
    ) -> Result<CancelledBid, ApiError> {
        let cancelled = retry::with_backoff(self.config.store_retry, ApiError::is_retryable, || {
            self.repo
                .cancel_last_bid(input.auction_id, self.config.bid_timeout)
        })
        .await?;

        tracing::info!(
            auction_id = cancelled.auction.id,
            removed_bid_id = cancelled.removed.id,
            price = cancelled.auction.current_price,
            ends_at = ?cancelled.auction.ends_at,
            "last bid cancelled"
        );

        self.schedule_closure(input.auction_id, cancelled.auction.ends_at)
            .await;
        self.refresh_announcement_detached(input.auction_id);
        self.send_note(
            cancelled.removed.bidder_id,
            render::bid_removed_note(&cancelled.auction),
        );

        Ok(cancelled)
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
            auction::{
                entities::Bid,
                repository::MockDatabase,
            },
        },
        mockall::predicate::eq,
        std::time::Duration,
        time::OffsetDateTime,
    };

    #[tokio::test(start_paused = true)]
    async fn rollback_rearms_timer_and_notes_the_removed_bidder() {
        let now = OffsetDateTime::now_utc();
        let mut rewound = active_auction(1, now + Duration::from_secs(300));
        rewound.external_ref = Some(10);
        let cancelled = CancelledBid {
            auction: rewound.clone(),
            removed: Bid {
                id:         3,
                auction_id: 1,
                bidder_id:  7,
                amount:     13_000,
                created_at: now - Duration::from_secs(30),
            },
        };

        let mut db = MockDatabase::new();
        db.expect_cancel_last_bid().times(1).returning({
            let cancelled = cancelled.clone();
            move |_, _| Ok(cancelled.clone())
        });
        db.expect_get_auction().returning({
            let rewound = rewound.clone();
            move |_| Ok(rewound.clone())
        });
        db.expect_top_bids().returning(|_, _| Ok(vec![]));
        db.expect_count_bids().returning(|_| Ok(1));

        let mut announcer = MockAnnouncer::new();
        announcer.expect_update().returning(|_, _| Ok(()));
        announcer
            .expect_notify()
            .with(eq(7), mockall::predicate::always())
            .times(1)
            .returning(|_, _| Ok(()));

        let service = Service::new_with_mocks(db, announcer);
        let result = service
            .cancel_last_bid(CancelLastBidInput { auction_id: 1 })
            .await
            .unwrap();

        assert_eq!(result.removed.id, 3);
        assert!(service.timers.contains(1).await);

        service.stop_timers().await;
        service.drain().await;
    }

    #[tokio::test(start_paused = true)]
    async fn rollback_without_bids_is_rejected() {
        let mut db = MockDatabase::new();
        db.expect_cancel_last_bid()
            .returning(|_, _| Err(ApiError::NoBids));

        let service = Service::new_with_mocks(db, MockAnnouncer::new());
        let result = service
            .cancel_last_bid(CancelLastBidInput { auction_id: 1 })
            .await;

        assert_eq!(result.unwrap_err(), ApiError::NoBids);
        service.drain().await;
    }
}
