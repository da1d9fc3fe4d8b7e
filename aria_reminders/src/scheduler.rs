//! Periodic driver that fires due reminders and delivers them.

use aria_core::{Broadcast, Destination, Outbound};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::ReminderEngine;
use crate::error::Result;
use crate::model::DueReminder;

pub struct ReminderScheduler {
    engine: Arc<ReminderEngine>,
    broadcast: Arc<dyn Broadcast>,
    period: Duration,
}

impl ReminderScheduler {
    #[must_use]
    pub const fn new(
        engine: Arc<ReminderEngine>,
        broadcast: Arc<dyn Broadcast>,
        period: Duration,
    ) -> Self {
        Self {
            engine,
            broadcast,
            period,
        }
    }

    /// One due search at `now`. Deliveries are spawned and not awaited.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<Vec<DueReminder>> {
        let fired = self.engine.fire_due(now).await?;
        debug!("Scheduler tick at {now}: {} due", fired.len());
        for hit in &fired {
            drop(self.deliver(hit, now));
        }
        Ok(fired)
    }

    /// Like [`Self::tick`], but waits for every delivery to finish. For one-shot
    /// callers that exit right after the tick.
    pub async fn tick_and_wait(&self, now: DateTime<Utc>) -> Result<Vec<DueReminder>> {
        let fired = self.engine.fire_due(now).await?;
        let handles: Vec<_> = fired.iter().flat_map(|hit| self.deliver(hit, now)).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Delivery task failed: {e}");
            }
        }
        Ok(fired)
    }

    /// Tick every period until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        info!("Reminder scheduler started, period {:?}", self.period);
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = interval.tick() => {
                    if let Err(e) = self.tick(Utc::now()).await {
                        warn!("Scheduler tick failed: {e}");
                    }
                }
            }
        }
        info!("Reminder scheduler stopped");
    }

    /// Chat always; voice only outside quiet hours.
    fn destinations(&self, now: DateTime<Utc>) -> Vec<Destination> {
        if self.engine.context().is_quiet(now) {
            vec![Destination::Chat]
        } else {
            vec![Destination::Chat, Destination::Voice]
        }
    }

    fn deliver(&self, hit: &DueReminder, now: DateTime<Utc>) -> Vec<JoinHandle<()>> {
        let text = hit.announcement();
        let mut handles = Vec::new();
        for destination in self.destinations(now) {
            let broadcast = Arc::clone(&self.broadcast);
            let message = Outbound {
                text: text.clone(),
                destination,
                timestamp: now,
            };
            let id = hit.reminder.id;
            handles.push(tokio::spawn(async move {
                if let Err(e) = broadcast.send(message).await {
                    warn!(
                        "Delivery of reminder {id} to {} failed: {e}",
                        destination.as_str()
                    );
                }
            }));
        }
        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{QuietHours, TimeContext};
    use crate::repository::InMemoryReminderRepository;
    use crate::request::SetRequest;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use tokio::sync::mpsc;

    struct Channel(mpsc::UnboundedSender<Outbound>);

    #[async_trait]
    impl Broadcast for Channel {
        async fn send(&self, message: Outbound) -> anyhow::Result<()> {
            self.0.send(message)?;
            Ok(())
        }
    }

    async fn scheduler(ctx: TimeContext) -> (ReminderScheduler, mpsc::UnboundedReceiver<Outbound>) {
        let engine = Arc::new(ReminderEngine::new(
            Arc::new(InMemoryReminderRepository::new()),
            ctx,
        ));
        let req: SetRequest =
            serde_json::from_value(serde_json::json!({"text": "water plants", "hour": 23, "minute": 0}))
                .unwrap();
        engine
            .set(req, Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap())
            .await
            .unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        (
            ReminderScheduler::new(engine, Arc::new(Channel(tx)), Duration::from_secs(30)),
            rx,
        )
    }

    async fn drain(rx: &mut mpsc::UnboundedReceiver<Outbound>, n: usize) -> Vec<Outbound> {
        let mut out = Vec::new();
        for _ in 0..n {
            out.push(rx.recv().await.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn tick_delivers_to_chat_and_voice() {
        let (scheduler, mut rx) = scheduler(TimeContext::default()).await;
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 23, 0, 10).unwrap();
        let fired = scheduler.tick(now).await.unwrap();
        assert_eq!(fired.len(), 1);

        let mut destinations: Vec<_> = drain(&mut rx, 2)
            .await
            .into_iter()
            .map(|m| {
                assert_eq!(m.text, "Reminder: water plants");
                m.destination
            })
            .collect();
        destinations.sort_by_key(|d| d.as_str());
        assert_eq!(destinations, [Destination::Chat, Destination::Voice]);

        // Already fired, the next tick in the same minute finds nothing.
        let again = scheduler.tick(now + chrono::Duration::seconds(30)).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn tick_and_wait_finishes_deliveries() {
        let (scheduler, mut rx) = scheduler(TimeContext::default()).await;
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 23, 0, 0).unwrap();
        assert_eq!(scheduler.tick_and_wait(now).await.unwrap().len(), 1);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn quiet_hours_keep_voice_silent() {
        let ctx = TimeContext::default()
            .with_quiet_hours(QuietHours::parse("22:00", "07:00").unwrap());
        let (scheduler, mut rx) = scheduler(ctx).await;
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 23, 0, 0).unwrap();
        assert_eq!(scheduler.tick(now).await.unwrap().len(), 1);

        let first = drain(&mut rx, 1).await;
        assert_eq!(first[0].destination, Destination::Chat);
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }
}
