//! services/app/src/screens/guard.rs

use crate::error::{GatewayError, GatewayResult};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Allows one in-flight request per control. A second trigger while the first
/// is pending fails with `InFlight` instead of issuing a duplicate request.
#[derive(Debug, Clone, Default)]
pub struct ActionGuard {
    busy: Arc<AtomicBool>,
}

/// Held for the duration of an action; releases the guard when dropped.
#[derive(Debug)]
pub struct InFlight {
    busy: Arc<AtomicBool>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl ActionGuard {
    pub fn try_begin(&self) -> Option<InFlight> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight {
                busy: Arc::clone(&self.busy),
            })
    }

    /// Whether the control should render as disabled.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn run<T, F>(&self, action: F) -> GatewayResult<T>
    where
        F: Future<Output = GatewayResult<T>>,
    {
        let _in_flight = self.try_begin().ok_or(GatewayError::InFlight)?;
        action.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn second_trigger_while_pending_is_rejected() {
        let guard = ActionGuard::default();
        let (tx, rx) = oneshot::channel::<()>();

        let first = {
            let guard = guard.clone();
            tokio::spawn(async move {
                guard
                    .run(async move {
                        let _ = rx.await;
                        Ok(1)
                    })
                    .await
            })
        };
        while !guard.is_busy() {
            tokio::task::yield_now().await;
        }

        let second = guard.run(async { Ok(2) }).await;
        assert_eq!(second, Err(GatewayError::InFlight));

        tx.send(()).unwrap();
        assert_eq!(first.await.unwrap(), Ok(1));
        assert!(!guard.is_busy());
        assert_eq!(guard.run(async { Ok(3) }).await, Ok(3));
    }

    #[tokio::test]
    async fn failure_releases_the_guard() {
        let guard = ActionGuard::default();
        let result: GatewayResult<()> = guard
            .run(async { Err(GatewayError::Network("offline".into())) })
            .await;
        assert!(result.is_err());
        assert!(!guard.is_busy());
    }
}
