//! Periodic rate refresh

use crate::core::error::{Error, Result};
use crate::core::rates::{RateSource, RateTable};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

pub const DEFAULT_REFRESH: Duration = Duration::from_secs(60);

/// Fetches once and publishes the result. On failure the table already in
/// the channel stays current.
pub async fn refresh_once(
    source: &dyn RateSource,
    sender: &watch::Sender<RateTable>,
) -> Result<()> {
    match source.fetch_rates().await {
        Ok(table) => {
            debug!(entries = table.iter().count(), "Publishing rate table");
            sender.send_replace(table);
            Ok(())
        }
        Err(e) => {
            warn!("Rate refresh failed, keeping previous rates: {e:#}");
            Err(Error::RateUnavailable(format!("{e:#}")))
        }
    }
}

/// Polls a [`RateSource`] on a fixed period and publishes each table to
/// every subscriber.
pub struct RateFeed {
    source: Box<dyn RateSource>,
    period: Duration,
}

impl RateFeed {
    pub fn new(source: Box<dyn RateSource>, period: Duration) -> Self {
        let period = if period.is_zero() {
            DEFAULT_REFRESH
        } else {
            period
        };
        RateFeed { source, period }
    }

    /// Starts the loop. The first fetch happens immediately. The task ends
    /// once every receiver is dropped, or when the handle is aborted.
    pub fn spawn(self, initial: RateTable) -> (watch::Receiver<RateTable>, JoinHandle<()>) {
        let (sender, receiver) = watch::channel(initial);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if sender.is_closed() {
                    debug!("No rate subscribers left, stopping feed");
                    break;
                }
                // Failure is already logged and the previous table kept.
                let _ = refresh_once(self.source.as_ref(), &sender).await;
            }
        });
        (receiver, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::AssetKind;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Succeeds on odd calls, fails on even ones.
    struct FlakySource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RateSource for FlakySource {
        async fn fetch_rates(&self) -> anyhow::Result<RateTable> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call % 2 == 0 {
                return Err(anyhow!("upstream timeout"));
            }
            Ok(RateTable::new().with_rate(AssetKind::Gold, Decimal::from(call)))
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_table() {
        let source = FlakySource {
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let (sender, receiver) = watch::channel(RateTable::new());

        refresh_once(&source, &sender).await.unwrap();
        assert_eq!(receiver.borrow().live_rate(AssetKind::Gold), Some(dec!(1)));

        let err = refresh_once(&source, &sender).await.unwrap_err();
        assert!(matches!(err, Error::RateUnavailable(ref m) if m.contains("upstream timeout")));
        assert_eq!(receiver.borrow().live_rate(AssetKind::Gold), Some(dec!(1)));

        refresh_once(&source, &sender).await.unwrap();
        assert_eq!(receiver.borrow().live_rate(AssetKind::Gold), Some(dec!(3)));
    }

    #[tokio::test]
    async fn test_failed_layered_refresh_keeps_fetched_rates() {
        use crate::providers::manual::{LayeredRateSource, StaticRateSource};

        let source = LayeredRateSource::new(
            Box::new(FlakySource {
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            StaticRateSource::new(RateTable::new().with_rate(AssetKind::Fund, dec!(2))),
        );
        let (sender, receiver) = watch::channel(source.fallback_rates());
        assert_eq!(receiver.borrow().live_rate(AssetKind::Fund), Some(dec!(2)));
        assert_eq!(receiver.borrow().live_rate(AssetKind::Gold), None);

        refresh_once(&source, &sender).await.unwrap();
        assert_eq!(receiver.borrow().live_rate(AssetKind::Gold), Some(dec!(1)));

        refresh_once(&source, &sender).await.unwrap_err();
        assert_eq!(receiver.borrow().live_rate(AssetKind::Gold), Some(dec!(1)));
        assert_eq!(receiver.borrow().live_rate(AssetKind::Fund), Some(dec!(2)));
    }

    #[tokio::test]
    async fn test_feed_publishes_periodically() {
        let calls = Arc::new(AtomicUsize::new(0));
        let feed = RateFeed::new(
            Box::new(FlakySource {
                calls: Arc::clone(&calls),
            }),
            Duration::from_millis(5),
        );
        let (mut receiver, handle) = feed.spawn(RateTable::new());

        tokio::time::timeout(Duration::from_secs(5), receiver.changed())
            .await
            .expect("feed never published")
            .unwrap();
        let first = receiver.borrow_and_update().live_rate(AssetKind::Gold).unwrap();

        // Failed calls publish nothing, so every table seen comes from an odd call.
        tokio::time::timeout(Duration::from_secs(5), receiver.changed())
            .await
            .expect("feed stopped publishing")
            .unwrap();
        let second = receiver.borrow().live_rate(AssetKind::Gold).unwrap();
        assert_eq!(first % dec!(2), dec!(1));
        assert_eq!(second % dec!(2), dec!(1));
        assert!(second > first);
        assert!(calls.load(Ordering::SeqCst) >= 3);

        drop(receiver);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("feed did not stop")
            .unwrap();
    }

    #[test]
    fn test_zero_period_uses_default() {
        let feed = RateFeed::new(
            Box::new(FlakySource {
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Duration::ZERO,
        );
        assert_eq!(feed.period, DEFAULT_REFRESH);
    }
}
