use {
    super::{
        conclude_auction::ConcludeAuctionInput,
        Service,
    },
    crate::{
        api::ApiError,
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
    },
    rand::Rng,
    std::{
        collections::HashSet,
        sync::atomic::Ordering,
        time::Duration,
    },
    time::OffsetDateTime,
};

/// Periodic repair of the drift an in-process timer map accumulates:
/// deadlines that passed without a timer firing, active auctions with no
/// timer armed, timers for auctions that are no longer active, and
/// published cards that fell behind storage. Two cadences share one loop;
/// each pass is also a startup sweep, since the first interval tick fires
/// immediately.
pub async fn run_reconciliation_loop(service: Service) {
    tracing::info!("starting reconciliation loop...");
    let mut refresh = tokio::time::interval(service.config.refresh_interval);
    let mut integrity = tokio::time::interval(service.config.integrity_interval);
    while !SHOULD_EXIT.load(Ordering::Acquire) {
        tokio::select! {
            _ = refresh.tick() => service.refresh_pass().await,
            _ = integrity.tick() => service.integrity_pass().await,
            _ = tokio::time::sleep(EXIT_CHECK_INTERVAL) => {}
        }
    }
    tracing::info!("shutting down reconciliation loop...");
}

impl Service {
    /// Re-renders and pushes every active auction's card. Cards are
    /// refreshed one at a time with a small jitter so a long list does not
    /// burst against the announcer's rate limits.
    pub(super) async fn refresh_pass(&self) {
        let Ok(_gate) = self.refresh_gate.try_lock() else {
            tracing::warn!("previous refresh pass still running, skipping");
            return;
        };
        let auctions = match self.repo.list_active(None).await {
            Ok(auctions) => auctions,
            Err(err) => {
                tracing::warn!(error = ?err, "refresh pass failed to list auctions");
                return;
            }
        };

        let mut refreshed = 0;
        for auction in &auctions {
            let jitter = rand::thread_rng().gen_range(500..=1500);
            tokio::time::sleep(Duration::from_millis(jitter)).await;
            match self.refresh_announcement(auction.id).await {
                Ok(()) => refreshed += 1,
                Err(err) => {
                    tracing::warn!(auction_id = auction.id, error = ?err, "failed to refresh auction card");
                }
            }
        }
        tracing::debug!(total = auctions.len(), refreshed, "refresh pass complete");
    }

    /// Reconciles the timer map against storage, which is authoritative.
    pub(super) async fn integrity_pass(&self) {
        let Ok(_gate) = self.integrity_gate.try_lock() else {
            tracing::warn!("previous integrity pass still running, skipping");
            return;
        };
        let auctions = match self.repo.list_active(None).await {
            Ok(auctions) => auctions,
            Err(err) => {
                tracing::warn!(error = ?err, "integrity pass failed to list auctions");
                return;
            }
        };

        let now = OffsetDateTime::now_utc();
        let active: HashSet<_> = auctions.iter().map(|auction| auction.id).collect();
        let (mut missed, mut rearmed, mut stale) = (0, 0, 0);

        for auction in auctions {
            if auction.ends_at <= now {
                tracing::warn!(
                    auction_id = auction.id,
                    ends_at = ?auction.ends_at,
                    "deadline passed without a timer firing, closing"
                );
                missed += 1;
                if let Err(err) = self
                    .conclude_auction(ConcludeAuctionInput {
                        auction_id: auction.id,
                    })
                    .await
                {
                    tracing::error!(auction_id = auction.id, error = ?err, "reconciler closure failed");
                }
            } else if !self.timers.contains(auction.id).await {
                tracing::warn!(auction_id = auction.id, "active auction had no timer, re-arming");
                rearmed += 1;
                self.schedule_closure(auction.id, auction.ends_at).await;
            }
        }

        for auction_id in self.timers.keys().await {
            if active.contains(&auction_id) {
                continue;
            }
            // The snapshot is stale by now: this loop sits behind the
            // closure round-trips above, and an auction created since
            // would have a live timer but no row in `active`. Cancel only
            // once storage confirms the auction is not Active.
            match self.repo.get_auction(auction_id).await {
                Ok(auction) if auction.is_active() => {}
                Ok(_) | Err(ApiError::AuctionNotFound) => {
                    tracing::warn!(auction_id, "timer armed for non-active auction, cancelling");
                    stale += 1;
                    self.cancel_timer(auction_id).await;
                }
                Err(err) => {
                    tracing::debug!(auction_id, error = ?err, "could not verify timer, leaving it armed");
                }
            }
        }

        if missed + rearmed + stale > 0 {
            tracing::info!(missed, rearmed, stale, "integrity pass repaired drift");
        } else {
            tracing::debug!("integrity pass found no drift");
        }
    }
}
