use {
    super::repository::Repository,
    crate::{
        announcer::Announcer,
        kernel::retry::RetryPolicy,
    },
    std::{
        sync::Arc,
        time::Duration,
    },
    tokio::sync::Mutex,
    tokio_util::task::TaskTracker,
};

pub mod cancel_last_bid;
pub mod conclude_auction;
pub mod create_auction;
pub mod delete_auction;
pub mod end_early;
pub mod get_auction_board;
mod notify;
pub mod place_bid;
mod refresh_announcement;
mod render;
mod timer;
pub mod workers;

#[derive(Clone, Debug)]
pub struct Config {
    /// How long an auction stays open after its last accepted bid (and
    /// after creation, until the first bid).
    pub bid_timeout:        Duration,
    /// Cadence of the announcement refresh cycle.
    pub refresh_interval:   Duration,
    /// Cadence of the integrity cycle (missed deadlines, orphaned timers).
    pub integrity_interval: Duration,
    /// Backoff policy for transient storage contention.
    pub store_retry:        RetryPolicy,
}

pub struct ServiceInner {
    config:         Config,
    repo:           Repository,
    announcer:      Arc<dyn Announcer>,
    timers:         timer::TimerRegistry,
    task_tracker:   TaskTracker,
    refresh_gate:   Mutex<()>,
    integrity_gate: Mutex<()>,
}

#[derive(Clone)]
pub struct Service(Arc<ServiceInner>);
impl std::ops::Deref for Service {
    type Target = ServiceInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Service {
    pub fn new(config: Config, repo: Repository, announcer: Arc<dyn Announcer>) -> Self {
        Self(Arc::new(ServiceInner {
            config,
            repo,
            announcer,
            timers: timer::TimerRegistry::default(),
            task_tracker: TaskTracker::new(),
            refresh_gate: Mutex::new(()),
            integrity_gate: Mutex::new(()),
        }))
    }

    /// Waits for every spawned side-effect and timer task to finish. Call
    /// after `stop_timers` on shutdown.
    pub async fn drain(&self) {
        self.task_tracker.close();
        self.task_tracker.wait().await;
    }
}

#[cfg(test)]
pub mod tests {
    use {
        super::*,
        crate::announcer::MockAnnouncer,
        crate::auction::repository::MockDatabase,
    };

    impl Service {
        pub fn new_with_mocks(db: MockDatabase, announcer: MockAnnouncer) -> Self {
            let config = Config {
                bid_timeout:        Duration::from_secs(240 * 60),
                refresh_interval:   Duration::from_secs(60),
                integrity_interval: Duration::from_secs(300),
                store_retry:        RetryPolicy {
                    max_attempts: 3,
                    base_delay:   Duration::from_millis(10),
                },
            };
            Service::new(config, Repository::new(db), Arc::new(announcer))
        }
    }
}
