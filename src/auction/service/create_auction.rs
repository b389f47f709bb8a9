use {
    super::{
        render,
        Service,
    },
    crate::{
        api::ApiError,
        auction::entities::Auction,
        kernel::entities::Money,
    },
    time::OffsetDateTime,
};

pub struct CreateAuctionInput {
    pub title:       String,
    pub description: Option<String>,
    pub start_price: Money,
    pub step_price:  Money,
}

impl Service {
    /// Creates an Active auction whose first deadline runs from creation
    /// time, publishes its card and arms the timer. A failed publish is
    /// logged and left for the refresh cycle to heal.
    #[tracing::instrument(skip_all, fields(title = input.title))]
    pub async fn create_auction(&self, input: CreateAuctionInput) -> Result<Auction, ApiError> {
        let auction = Auction::new(
            input.title,
            input.description,
            input.start_price,
            input.step_price,
            OffsetDateTime::now_utc(),
            self.config.bid_timeout,
        );
        let mut auction = self.repo.create_auction(&auction).await?;
        tracing::info!(
            auction_id = auction.id,
            start_price = auction.start_price,
            ends_at = ?auction.ends_at,
            "auction created"
        );

        let card = render::auction_card(&auction, &[], 0);
        match self.announcer.publish(&card).await {
            Ok(external_ref) => {
                self.repo.set_external_ref(auction.id, external_ref).await?;
                auction.external_ref = Some(external_ref);
            }
            Err(err) => {
                tracing::warn!(auction_id = auction.id, error = ?err, "failed to publish auction card");
            }
        }

        self.schedule_closure(auction.id, auction.ends_at).await;
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
            announcer::{
                AnnouncerError,
                MockAnnouncer,
            },
            auction::repository::MockDatabase,
        },
        mockall::predicate::eq,
        std::time::Duration,
    };

    fn input() -> CreateAuctionInput {
        CreateAuctionInput {
            title:       "Brass lamp".to_string(),
            description: None,
            start_price: 10_000,
            step_price:  1_000,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn creation_publishes_card_and_arms_timer() {
        let now = OffsetDateTime::now_utc();
        let stored = active_auction(5, now + Duration::from_secs(240 * 60));

        let mut db = MockDatabase::new();
        db.expect_add_auction().returning({
            let stored = stored.clone();
            move |_| Ok(stored.clone())
        });
        db.expect_set_external_ref()
            .with(eq(5), eq(42))
            .times(1)
            .returning(|_, _| Ok(()));
        db.expect_get_auction().returning({
            let stored = stored.clone();
            move |_| Ok(stored.clone())
        });

        let mut announcer = MockAnnouncer::new();
        announcer.expect_publish().times(1).returning(|_| Ok(42));

        let service = Service::new_with_mocks(db, announcer);
        let auction = service.create_auction(input()).await.unwrap();

        assert_eq!(auction.id, 5);
        assert_eq!(auction.external_ref, Some(42));
        assert!(service.timers.contains(5).await);

        service.stop_timers().await;
        service.drain().await;
    }

    #[tokio::test(start_paused = true)]
    async fn creation_survives_a_failed_publish() {
        let now = OffsetDateTime::now_utc();
        let stored = active_auction(5, now + Duration::from_secs(240 * 60));

        let mut db = MockDatabase::new();
        db.expect_add_auction().returning({
            let stored = stored.clone();
            move |_| Ok(stored.clone())
        });
        db.expect_get_auction().returning({
            let stored = stored.clone();
            move |_| Ok(stored.clone())
        });

        let mut announcer = MockAnnouncer::new();
        announcer
            .expect_publish()
            .returning(|_| Err(AnnouncerError::Rejected("kicked from channel".to_string())));

        let service = Service::new_with_mocks(db, announcer);
        let auction = service.create_auction(input()).await.unwrap();

        // no external ref yet; the refresh cycle will publish it later
        assert_eq!(auction.external_ref, None);
        assert!(service.timers.contains(5).await);

        service.stop_timers().await;
        service.drain().await;
    }
}
