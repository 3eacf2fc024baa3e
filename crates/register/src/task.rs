//! Consumer of `TokenDetected` events.

use std::{collections::HashSet, sync::Arc};

use tokenscout_events::{Event, EventManager, EventType, Subscription};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::TokenRegistrar;

/// What a registration task did before it stopped.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RegistrationStats {
    pub registered: usize,
    pub failed: usize,
    /// Candidates skipped because the package was already handled.
    pub duplicates: usize,
}

/// Subscribes to `TokenDetected` right away and spawns [`registration_task`] on it.
///
/// The subscription is unbounded and made before spawning, so no candidate signalled
/// after this returns is missed, however slow the registrar is.
pub fn spawn_registration_task(
    events: &EventManager,
    registrar: Arc<dyn TokenRegistrar>,
    cancel: CancellationToken,
) -> JoinHandle<RegistrationStats> {
    let sub = events.subscribe_unbounded(&[EventType::TokenDetected]);
    tokio::spawn(registration_task(sub, registrar, cancel))
}

/// Registers every detected package once per session.
///
/// Returns when `cancel` fires or the subscription ends. Registration failures are
/// logged and the package is not retried.
pub async fn registration_task(
    mut sub: Subscription,
    registrar: Arc<dyn TokenRegistrar>,
    cancel: CancellationToken,
) -> RegistrationStats {
    let mut handled = HashSet::new();
    let mut stats = RegistrationStats::default();

    info!(sub_id = %sub.id(), "starting registration task");
    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = sub.recv() => match event {
                Some(event) => event,
                None => {
                    debug!("event stream ended");
                    break;
                }
            },
        };

        let Event::TokenDetected(candidate) = event else {
            continue;
        };
        let pkg_path = candidate.package_path;

        if !handled.insert(pkg_path.clone()) {
            debug!(%pkg_path, "token already handled");
            stats.duplicates += 1;
            continue;
        }

        match registrar.register_token(&pkg_path).await {
            Ok(()) => {
                info!(%pkg_path, height = %candidate.height, "registered token");
                stats.registered += 1;
            }
            Err(e) => {
                error!(%pkg_path, err = %e, "failed to register token");
                stats.failed += 1;
            }
        }
    }

    info!(
        registered = stats.registered,
        failed = stats.failed,
        duplicates = stats.duplicates,
        "registration task stopped"
    );
    stats
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockall::Sequence;
    use tokenscout_events::{EventSink, TokenCandidate};
    use tokio::time::timeout;

    use super::*;
    use crate::{MockTokenRegistrar, RegisterError};

    fn detected(pkg_path: &str, height: u64) -> Event {
        Event::TokenDetected(TokenCandidate {
            package_path: pkg_path.to_string(),
            height,
            creator: "g1creator".to_string(),
            functions: Vec::new(),
        })
    }

    async fn run_to_end(
        bus: &EventManager,
        registrar: MockTokenRegistrar,
        events: Vec<Event>,
    ) -> RegistrationStats {
        let handle =
            spawn_registration_task(bus, Arc::new(registrar), CancellationToken::new());
        for event in events {
            bus.signal_event(event);
        }
        bus.close();

        timeout(Duration::from_secs(5), handle)
            .await
            .expect("registration task did not stop")
            .unwrap()
    }

    #[tokio::test]
    async fn test_registers_each_package_once() {
        let bus = EventManager::new(16);
        let mut seq = Sequence::new();
        let mut registrar = MockTokenRegistrar::new();
        registrar
            .expect_register_token()
            .withf(|pkg_path| pkg_path == "gno.land/r/demo/foo")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        registrar
            .expect_register_token()
            .withf(|pkg_path| pkg_path == "gno.land/r/demo/bar")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let stats = run_to_end(
            &bus,
            registrar,
            vec![
                detected("gno.land/r/demo/foo", 3),
                detected("gno.land/r/demo/bar", 4),
                detected("gno.land/r/demo/foo", 9),
            ],
        )
        .await;

        assert_eq!(
            stats,
            RegistrationStats {
                registered: 2,
                failed: 0,
                duplicates: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_failure_is_logged_not_fatal() {
        let bus = EventManager::new(16);
        let mut registrar = MockTokenRegistrar::new();
        registrar
            .expect_register_token()
            .withf(|pkg_path| pkg_path == "gno.land/r/demo/bad")
            .times(1)
            .returning(|_| Err(RegisterError::Params("boom".to_string())));
        registrar
            .expect_register_token()
            .withf(|pkg_path| pkg_path == "gno.land/r/demo/good")
            .times(1)
            .returning(|_| Ok(()));

        let stats = run_to_end(
            &bus,
            registrar,
            vec![
                detected("gno.land/r/demo/bad", 1),
                detected("gno.land/r/demo/bad", 2),
                detected("gno.land/r/demo/good", 3),
            ],
        )
        .await;

        assert_eq!(stats.registered, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.duplicates, 1);
    }

    #[tokio::test]
    async fn test_burst_larger_than_bus_buffer() {
        let bus = EventManager::new(2);
        let mut registrar = MockTokenRegistrar::new();
        registrar
            .expect_register_token()
            .times(5)
            .returning(|_| Ok(()));

        let events = (0..5)
            .map(|i| detected(&format!("gno.land/r/demo/t{i}"), 1))
            .collect();
        let stats = run_to_end(&bus, registrar, events).await;

        assert_eq!(stats.registered, 5);
        assert_eq!(stats.duplicates, 0);
    }

    #[tokio::test]
    async fn test_stops_on_cancel() {
        let bus = EventManager::new(4);
        let mut registrar = MockTokenRegistrar::new();
        registrar.expect_register_token().never();

        let cancel = CancellationToken::new();
        let handle = spawn_registration_task(&bus, Arc::new(registrar), cancel.clone());
        assert_eq!(bus.subscriber_count(), 1);

        cancel.cancel();
        let stats = timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats, RegistrationStats::default());
    }
}
