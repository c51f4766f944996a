use tokio::time::{interval, Duration as TokioDuration};

use crate::services::AchievementService;

/// Periodic full recalculation sweep. Inline triggers on workout completion
/// keep progress fresh for active users; this catches time-based metrics
/// (streaks going stale, consistency windows moving on) for everyone else.
#[derive(Clone)]
pub struct AchievementScheduler {
    achievement_service: AchievementService,
    interval_secs: u64,
}

impl AchievementScheduler {
    pub fn new(achievement_service: AchievementService, interval_secs: u64) -> Self {
        Self {
            achievement_service,
            interval_secs,
        }
    }

    /// Start the recalculation task
    pub async fn start(&self) {
        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_recalculation().await;
        });

        tracing::info!(
            "Achievement scheduler started, recalculating every {}s",
            self.interval_secs
        );
    }

    async fn run_recalculation(&self) {
        let mut interval = interval(TokioDuration::from_secs(self.interval_secs));

        loop {
            interval.tick().await;

            match self.achievement_service.recalculate_all().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!("Recalculated achievements for {} users", count);
                    }
                }
                Err(e) => {
                    tracing::error!("Achievement recalculation sweep failed: {}", e);
                }
            }
        }
    }
}
