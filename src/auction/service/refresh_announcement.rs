use {
    super::{
        render,
        Service,
    },
    crate::{
        announcer::AnnouncerError,
        kernel::entities::AuctionId,
    },
};

const LEADERBOARD_SIZE: i64 = 5;

impl Service {
    /// Re-renders the published card from current storage state and pushes
    /// it out. Publishes a fresh card when none exists yet, so a card that
    /// failed to publish at creation time heals on the next refresh.
    #[tracing::instrument(skip_all, fields(auction_id = auction_id))]
    pub(super) async fn refresh_announcement(
        &self,
        auction_id: AuctionId,
    ) -> anyhow::Result<()> {
        let auction = self.repo.get_auction(auction_id).await?;
        let leaderboard = self.repo.top_bids(auction_id, LEADERBOARD_SIZE).await?;
        let total_bids = self.repo.count_bids(auction_id).await?;
        let card = render::auction_card(&auction, &leaderboard, total_bids);

        match auction.external_ref {
            Some(external_ref) => {
                match self.announcer.update(external_ref, &card).await {
                    Ok(()) => {}
                    // an unchanged card is not drift
                    Err(AnnouncerError::Rejected(reason))
                        if reason.contains("message is not modified") =>
                    {
                        tracing::debug!(auction_id, "card already up to date");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            None => {
                let external_ref = self.announcer.publish(&card).await?;
                self.repo.set_external_ref(auction_id, external_ref).await?;
                tracing::info!(auction_id, external_ref, "published missing auction card");
            }
        }
        Ok(())
    }

    /// Spawned variant for call sites that must not block on the announcer.
    pub(super) fn refresh_announcement_detached(&self, auction_id: AuctionId) {
        let service = self.clone();
        self.task_tracker.spawn(async move {
            if let Err(err) = service.refresh_announcement(auction_id).await {
                tracing::warn!(auction_id, error = ?err, "failed to refresh auction card");
            }
        });
    }
}
