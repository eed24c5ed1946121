//! Exclusive screen-share publishing.
//!
//! At most one participant shares a screen at a time. Publish and unpublish
//! calls on the media layer are slow and must not overlap, so requests are
//! serialized behind a lock. Whoever acquires the lock acts on the latest
//! requested state, not the state it was asked for, which collapses rapid
//! toggles into at most one call per waiter.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::error::ClientError;

/// Media layer errors.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Starting the local screen stream failed.
    #[error("publish failed: {0}")]
    PublishFailed(String),

    /// Stopping the local screen stream failed.
    #[error("unpublish failed: {0}")]
    UnpublishFailed(String),
}

/// Publishes the local screen to the media transport.
#[async_trait]
pub trait ScreenPublisher: Send + Sync {
    /// Start sharing.
    async fn publish(&self) -> Result<(), MediaError>;

    /// Stop sharing.
    async fn unpublish(&self) -> Result<(), MediaError>;
}

/// Guard around a [`ScreenPublisher`].
pub struct ScreenShare<P> {
    publisher: P,
    desired: AtomicBool,
    remote_active: AtomicBool,
    published: Mutex<bool>,
}

impl<P: ScreenPublisher> ScreenShare<P> {
    /// Create a guard that is not sharing.
    pub fn new(publisher: P) -> Self {
        Self {
            publisher,
            desired: AtomicBool::new(false),
            remote_active: AtomicBool::new(false),
            published: Mutex::new(false),
        }
    }

    /// Record whether another participant is sharing.
    pub fn set_remote_active(&self, active: bool) {
        self.remote_active.store(active, Ordering::SeqCst);
    }

    /// Whether another participant is sharing.
    pub fn remote_active(&self) -> bool {
        self.remote_active.load(Ordering::SeqCst)
    }

    /// Whether the remote screen stream should be subscribed.
    ///
    /// Local and remote sharing are mutually exclusive on screen.
    pub fn should_subscribe_remote(&self) -> bool {
        self.remote_active() && !self.desired.load(Ordering::SeqCst)
    }

    /// Whether the local screen is currently published.
    pub async fn is_published(&self) -> bool {
        *self.published.lock().await
    }

    /// Request sharing on or off.
    ///
    /// Returns whether the local screen is published once the request has
    /// been served. Fails with [`ClientError::AlreadyActive`] if another
    /// participant holds the share.
    pub async fn set_enabled(&self, enabled: bool) -> Result<bool, ClientError> {
        if enabled && self.remote_active() {
            return Err(ClientError::AlreadyActive(
                "another participant is sharing".into(),
            ));
        }
        self.desired.store(enabled, Ordering::SeqCst);

        let mut published = self.published.lock().await;
        let want = self.desired.load(Ordering::SeqCst);
        if want == *published {
            tracing::debug!("Screen share already {}", if want { "on" } else { "off" });
            return Ok(*published);
        }

        if want {
            if self.remote_active() {
                self.desired.store(false, Ordering::SeqCst);
                return Err(ClientError::AlreadyActive(
                    "another participant is sharing".into(),
                ));
            }
            if let Err(e) = self.publisher.publish().await {
                self.desired.store(*published, Ordering::SeqCst);
                return Err(e.into());
            }
            tracing::info!("Screen share started");
        } else {
            if let Err(e) = self.publisher.unpublish().await {
                self.desired.store(*published, Ordering::SeqCst);
                return Err(e.into());
            }
            tracing::info!("Screen share stopped");
        }
        *published = want;
        Ok(want)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::sync::{Notify, Semaphore};

    /// Publisher whose calls block until the test releases them.
    #[derive(Clone)]
    struct GatedPublisher {
        calls: Arc<StdMutex<Vec<&'static str>>>,
        started: Arc<Notify>,
        gate: Arc<Semaphore>,
    }

    impl GatedPublisher {
        fn new(permits: usize) -> Self {
            Self {
                calls: Arc::default(),
                started: Arc::new(Notify::new()),
                gate: Arc::new(Semaphore::new(permits)),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        async fn pass(&self, call: &'static str) {
            self.started.notify_one();
            self.gate.acquire().await.unwrap().forget();
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl ScreenPublisher for GatedPublisher {
        async fn publish(&self) -> Result<(), MediaError> {
            self.pass("publish").await;
            Ok(())
        }

        async fn unpublish(&self) -> Result<(), MediaError> {
            self.pass("unpublish").await;
            Ok(())
        }
    }

    struct FailingPublisher;

    #[async_trait]
    impl ScreenPublisher for FailingPublisher {
        async fn publish(&self) -> Result<(), MediaError> {
            Err(MediaError::PublishFailed("no capture device".into()))
        }

        async fn unpublish(&self) -> Result<(), MediaError> {
            Ok(())
        }
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn toggles_publish_and_unpublish() {
        let publisher = GatedPublisher::new(16);
        let share = ScreenShare::new(publisher.clone());

        assert!(share.set_enabled(true).await.unwrap());
        assert!(share.is_published().await);
        assert!(share.set_enabled(true).await.unwrap());
        assert!(!share.set_enabled(false).await.unwrap());

        assert_eq!(publisher.calls(), vec!["publish", "unpublish"]);
    }

    #[tokio::test]
    async fn refused_while_someone_else_shares() {
        let publisher = GatedPublisher::new(1);
        let share = ScreenShare::new(publisher.clone());
        share.set_remote_active(true);

        assert!(matches!(
            share.set_enabled(true).await,
            Err(ClientError::AlreadyActive(_))
        ));
        assert!(publisher.calls().is_empty());
        assert!(share.should_subscribe_remote());
    }

    #[tokio::test]
    async fn waiter_acts_on_latest_request() {
        let publisher = GatedPublisher::new(0);
        let share = Arc::new(ScreenShare::new(publisher.clone()));

        let first = tokio::spawn({
            let share = Arc::clone(&share);
            async move { share.set_enabled(true).await }
        });
        publisher.started.notified().await;

        // Off then on again while the publish is still pending.
        let second = tokio::spawn({
            let share = Arc::clone(&share);
            async move { share.set_enabled(false).await }
        });
        settle().await;
        let third = tokio::spawn({
            let share = Arc::clone(&share);
            async move { share.set_enabled(true).await }
        });
        settle().await;

        publisher.gate.add_permits(1);

        assert!(first.await.unwrap().unwrap());
        assert!(second.await.unwrap().unwrap());
        assert!(third.await.unwrap().unwrap());
        assert_eq!(publisher.calls(), vec!["publish"]);
        assert!(share.is_published().await);
    }

    #[tokio::test]
    async fn pending_publish_then_stop_unpublishes_once() {
        let publisher = GatedPublisher::new(0);
        let share = Arc::new(ScreenShare::new(publisher.clone()));

        let first = tokio::spawn({
            let share = Arc::clone(&share);
            async move { share.set_enabled(true).await }
        });
        publisher.started.notified().await;

        let second = tokio::spawn({
            let share = Arc::clone(&share);
            async move { share.set_enabled(false).await }
        });
        settle().await;

        publisher.gate.add_permits(2);

        assert!(first.await.unwrap().unwrap());
        assert!(!second.await.unwrap().unwrap());
        assert_eq!(publisher.calls(), vec!["publish", "unpublish"]);
    }

    #[tokio::test]
    async fn media_failure_leaves_share_off() {
        let share = ScreenShare::new(FailingPublisher);
        assert!(matches!(
            share.set_enabled(true).await,
            Err(ClientError::Media(MediaError::PublishFailed(_)))
        ));
        assert!(!share.is_published().await);
    }
}
