use {
    super::{
        conclude_auction::ConcludeAuctionInput,
        Service,
    },
    crate::kernel::entities::AuctionId,
    std::{
        collections::HashMap,
        sync::atomic::{
            AtomicU64,
            Ordering,
        },
        time::Duration,
    },
    time::OffsetDateTime,
    tokio::sync::Mutex,
    tokio_util::sync::CancellationToken,
};

/// One live expiration timer per auction. The map is the only in-process
/// state the engine keeps; it is rebuilt from persisted deadlines on
/// startup and never consulted for business decisions — closure itself
/// re-checks the auction status under the storage lock.
#[derive(Debug, Default)]
pub(super) struct TimerRegistry {
    slots:      Mutex<HashMap<AuctionId, TimerSlot>>,
    generation: AtomicU64,
}

#[derive(Debug)]
struct TimerSlot {
    token:      CancellationToken,
    generation: u64,
}

impl TimerRegistry {
    /// Installs a fresh slot, cancelling whatever occupied it. Returns the
    /// token the new timer task should watch and the generation it must
    /// present to release the slot.
    async fn arm(&self, auction_id: AuctionId) -> (CancellationToken, u64) {
        let token = CancellationToken::new();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let mut slots = self.slots.lock().await;
        if let Some(old) = slots.insert(
            auction_id,
            TimerSlot {
                token: token.clone(),
                generation,
            },
        ) {
            old.token.cancel();
        }
        (token, generation)
    }

    /// Removes the slot only if it still belongs to the presenting timer
    /// task; a newer schedule for the same auction keeps its slot.
    async fn release(&self, auction_id: AuctionId, generation: u64) {
        let mut slots = self.slots.lock().await;
        if slots
            .get(&auction_id)
            .is_some_and(|slot| slot.generation == generation)
        {
            slots.remove(&auction_id);
        }
    }

    async fn cancel(&self, auction_id: AuctionId) -> bool {
        match self.slots.lock().await.remove(&auction_id) {
            Some(slot) => {
                slot.token.cancel();
                true
            }
            None => false,
        }
    }

    pub(super) async fn contains(&self, auction_id: AuctionId) -> bool {
        self.slots.lock().await.contains_key(&auction_id)
    }

    pub(super) async fn keys(&self) -> Vec<AuctionId> {
        self.slots.lock().await.keys().copied().collect()
    }

    async fn cancel_all(&self) -> usize {
        let mut slots = self.slots.lock().await;
        let count = slots.len();
        for (_, slot) in slots.drain() {
            slot.token.cancel();
        }
        count
    }
}

impl Service {
    /// Arms (or re-arms) the expiration timer for an auction; any previous
    /// schedule for the same id is superseded. Scheduling against a
    /// non-Active auction is a benign race and degrades to a no-op.
    pub async fn schedule_closure(&self, auction_id: AuctionId, deadline: OffsetDateTime) {
        match self.repo.get_auction(auction_id).await {
            Ok(auction) if auction.is_active() => {}
            Ok(_) => {
                tracing::debug!(auction_id, "not scheduling timer for non-active auction");
                return;
            }
            Err(err) => {
                tracing::debug!(auction_id, error = ?err, "not scheduling timer");
                return;
            }
        }

        let (token, generation) = self.timers.arm(auction_id).await;
        tracing::info!(auction_id, deadline = ?deadline, "auction timer armed");
        let service = self.clone();
        self.task_tracker.spawn(async move {
            service.run_timer(auction_id, deadline, token, generation).await;
        });
    }

    async fn run_timer(
        self,
        auction_id: AuctionId,
        deadline: OffsetDateTime,
        token: CancellationToken,
        generation: u64,
    ) {
        let now = OffsetDateTime::now_utc();
        let fired = if deadline > now {
            let delay = (deadline - now).try_into().unwrap_or(Duration::ZERO);
            tokio::select! {
                _ = token.cancelled() => false,
                _ = tokio::time::sleep(delay) => true,
            }
        } else {
            // deadline already passed at schedule time
            true
        };

        // Release the slot before closing: if closure fails the auction is
        // left visible to the integrity sweep for re-arming.
        self.timers.release(auction_id, generation).await;

        if fired {
            tracing::info!(auction_id, "auction timer fired");
            if let Err(err) = self
                .conclude_auction(ConcludeAuctionInput { auction_id })
                .await
            {
                tracing::error!(auction_id, error = ?err, "timer-driven closure failed");
            }
        } else {
            tracing::debug!(auction_id, "auction timer cancelled");
        }
    }

    /// Cancels the live timer for an auction, if any. Used on early
    /// closure and deletion; a timer that already began firing exits
    /// cleanly through the status check inside closure.
    pub async fn cancel_timer(&self, auction_id: AuctionId) {
        if self.timers.cancel(auction_id).await {
            tracing::info!(auction_id, "auction timer cancelled");
        }
    }

    /// Rebuilds the timer map from persisted deadlines. Auctions that
    /// expired while the process was down are closed on the spot. Must
    /// finish before bid traffic is accepted.
    pub async fn restore_timers(&self) -> anyhow::Result<()> {
        tracing::info!("restoring auction timers...");
        let auctions = self.repo.list_active(None).await?;
        let now = OffsetDateTime::now_utc();
        let (mut restored, mut expired) = (0, 0);
        for auction in auctions {
            if auction.ends_at <= now {
                tracing::warn!(
                    auction_id = auction.id,
                    ends_at = ?auction.ends_at,
                    "auction expired while the process was down, closing"
                );
                expired += 1;
                if let Err(err) = self
                    .conclude_auction(ConcludeAuctionInput {
                        auction_id: auction.id,
                    })
                    .await
                {
                    tracing::error!(auction_id = auction.id, error = ?err, "failed to close expired auction");
                }
            } else {
                self.schedule_closure(auction.id, auction.ends_at).await;
                restored += 1;
            }
        }
        tracing::info!(restored, expired, "timer restore complete");
        Ok(())
    }

    /// Cancels every outstanding timer without touching persisted state.
    pub async fn stop_timers(&self) {
        let count = self.timers.cancel_all().await;
        tracing::info!(count, "all auction timers stopped");
    }
}
