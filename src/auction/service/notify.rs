use {
    super::Service,
    crate::kernel::entities::{
        AuctionId,
        BidderId,
    },
};

impl Service {
    /// Fire-and-forget direct note. Delivery failures are logged and
    /// dropped; no bid or closure ever depends on a note landing.
    pub(super) fn send_note(&self, recipient: BidderId, content: String) {
        let service = self.clone();
        self.task_tracker.spawn(async move {
            if let Err(err) = service.announcer.notify(recipient, &content).await {
                tracing::warn!(recipient, error = ?err, "failed to deliver note");
            }
        });
    }

    /// Notes every subscriber of an auction, skipping the ones in
    /// `except` (typically the winner, who gets a dedicated note).
    pub(super) async fn note_subscribers(
        &self,
        auction_id: AuctionId,
        except: Option<BidderId>,
        content: String,
    ) {
        let subscribers = match self.repo.list_subscribers(auction_id).await {
            Ok(subscribers) => subscribers,
            Err(err) => {
                tracing::warn!(auction_id, error = ?err, "failed to load subscribers");
                return;
            }
        };
        for subscriber in subscribers {
            if Some(subscriber) == except {
                continue;
            }
            self.send_note(subscriber, content.clone());
        }
    }
}
