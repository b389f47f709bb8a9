use {
    super::{
        render,
        Service,
    },
    crate::{
        api::ApiError,
        auction::repository::PlaceBidCommit,
        kernel::{
            entities::{
                AuctionId,
                BidderId,
                Money,
            },
            retry,
        },
    },
};

pub struct PlaceBidInput {
    pub auction_id: AuctionId,
    pub bidder_id:  BidderId,
    pub amount:     Money,
}

impl Service {
    /// Accepts a bid. Validation and commit happen atomically in storage;
    /// on success the auction timer restarts from the bid time, the card
    /// refresh and the outbid note run detached.
    #[tracing::instrument(
        skip_all,
        fields(auction_id = input.auction_id, bidder_id = input.bidder_id)
    )]
    pub async fn place_bid(&self, input: PlaceBidInput) -> Result<PlaceBidCommit, ApiError> {
        let commit = retry::with_backoff(self.config.store_retry, ApiError::is_retryable, || {
            self.repo.place_bid(
                input.auction_id,
                input.bidder_id,
                input.amount,
                self.config.bid_timeout,
            )
        })
        .await?;

        tracing::info!(
            bid_id = commit.bid.id,
            amount = commit.bid.amount,
            ends_at = ?commit.auction.ends_at,
            "bid accepted"
        );

        self.schedule_closure(input.auction_id, commit.auction.ends_at)
            .await;
        self.refresh_announcement_detached(input.auction_id);
        if let Some(outbid) = &commit.outbid {
            self.send_note(outbid.bidder_id, render::outbid_note(&commit.auction));
        }

        // subscribers hear about every accepted bid, except its author
        let service = self.clone();
        let auction = commit.auction.clone();
        let bidder_id = input.bidder_id;
        self.task_tracker.spawn(async move {
            service
                .note_subscribers(auction.id, Some(bidder_id), render::new_bid_note(&auction))
                .await;
        });

        Ok(commit)
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
        std::{
            sync::{
                atomic::{
                    AtomicU32,
                    Ordering,
                },
                Arc,
            },
            time::Duration,
        },
        time::OffsetDateTime,
    };

    fn commit_for(auction_id: i64, bidder_id: i64, amount: i64) -> PlaceBidCommit {
        let now = OffsetDateTime::now_utc();
        let mut auction = active_auction(auction_id, now + Duration::from_secs(240 * 60));
        auction.current_price = amount;
        auction.last_bid_time = now;
        auction.external_ref = Some(10);
        PlaceBidCommit {
            bid:     crate::auction::entities::Bid {
                id: 1,
                auction_id,
                bidder_id,
                amount,
                created_at: now,
            },
            auction,
            outbid:  Some(crate::auction::entities::Bid {
                id: 2,
                auction_id,
                bidder_id: 99,
                amount: amount - 1_000,
                created_at: now - Duration::from_secs(60),
            }),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_bid_restarts_timer_and_notes_the_outbid_leader() {
        let commit = commit_for(1, 7, 12_000);
        let ends_at = commit.auction.ends_at;

        let mut db = MockDatabase::new();
        db.expect_place_bid().returning({
            let commit = commit.clone();
            move |_, _, _, _| Ok(commit.clone())
        });
        db.expect_get_auction()
            .returning(move |id| Ok(active_auction(id, ends_at)));
        db.expect_top_bids().returning(|_, _| Ok(vec![]));
        db.expect_count_bids().returning(|_| Ok(1));
        db.expect_list_subscribers().returning(|_| Ok(vec![]));

        let mut announcer = MockAnnouncer::new();
        announcer.expect_update().returning(|_, _| Ok(()));
        announcer
            .expect_notify()
            .with(eq(99), mockall::predicate::always())
            .times(1)
            .returning(|_, _| Ok(()));

        let service = Service::new_with_mocks(db, announcer);
        let result = service
            .place_bid(PlaceBidInput {
                auction_id: 1,
                bidder_id:  7,
                amount:     12_000,
            })
            .await
            .unwrap();

        assert_eq!(result.bid.amount, 12_000);
        assert!(service.timers.contains(1).await);

        service.stop_timers().await;
        service.drain().await;
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_hear_about_an_accepted_bid_except_its_author() {
        let commit = commit_for(1, 7, 12_000);
        let ends_at = commit.auction.ends_at;

        let mut db = MockDatabase::new();
        db.expect_place_bid().returning({
            let commit = commit.clone();
            move |_, _, _, _| Ok(commit.clone())
        });
        db.expect_get_auction()
            .returning(move |id| Ok(active_auction(id, ends_at)));
        db.expect_top_bids().returning(|_, _| Ok(vec![]));
        db.expect_count_bids().returning(|_| Ok(1));
        // the bidding author is subscribed too and must be skipped
        db.expect_list_subscribers().returning(|_| Ok(vec![55, 7]));

        let notified = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut announcer = MockAnnouncer::new();
        announcer.expect_update().returning(|_, _| Ok(()));
        announcer.expect_notify().returning({
            let notified = notified.clone();
            move |recipient, _| {
                notified.lock().unwrap().push(recipient);
                Ok(())
            }
        });

        let service = Service::new_with_mocks(db, announcer);
        service
            .place_bid(PlaceBidInput {
                auction_id: 1,
                bidder_id:  7,
                amount:     12_000,
            })
            .await
            .unwrap();

        service.stop_timers().await;
        service.drain().await;

        let mut notified = notified.lock().unwrap().clone();
        notified.sort_unstable();
        // the outbid leader (99) and subscriber 55; never the author
        assert_eq!(notified, vec![55, 99]);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_storage_contention_is_retried() {
        let attempts = Arc::new(AtomicU32::new(0));
        let commit = commit_for(1, 7, 12_000);
        let ends_at = commit.auction.ends_at;

        let mut db = MockDatabase::new();
        db.expect_place_bid().returning({
            let attempts = attempts.clone();
            let commit = commit.clone();
            move |_, _, _, _| {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ApiError::TemporarilyUnavailable)
                } else {
                    Ok(commit.clone())
                }
            }
        });
        db.expect_get_auction()
            .returning(move |id| Ok(active_auction(id, ends_at)));
        db.expect_top_bids().returning(|_, _| Ok(vec![]));
        db.expect_count_bids().returning(|_| Ok(1));
        db.expect_list_subscribers().returning(|_| Ok(vec![]));

        let mut announcer = MockAnnouncer::new();
        announcer.expect_update().returning(|_, _| Ok(()));
        announcer.expect_notify().returning(|_, _| Ok(()));

        let service = Service::new_with_mocks(db, announcer);
        let result = service
            .place_bid(PlaceBidInput {
                auction_id: 1,
                bidder_id:  7,
                amount:     12_000,
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);

        service.stop_timers().await;
        service.drain().await;
    }

    #[tokio::test(start_paused = true)]
    async fn rejections_are_not_retried() {
        let mut db = MockDatabase::new();
        db.expect_place_bid()
            .times(1)
            .returning(|_, _, _, _| Err(ApiError::BidTooLow { minimum: 11_000 }));

        let service = Service::new_with_mocks(db, MockAnnouncer::new());
        let result = service
            .place_bid(PlaceBidInput {
                auction_id: 1,
                bidder_id:  7,
                amount:     10_500,
            })
            .await;

        assert_eq!(result.unwrap_err(), ApiError::BidTooLow { minimum: 11_000 });
        assert!(!service.timers.contains(1).await);
        service.drain().await;
    }
}
