//! Notifications between services.
//!
//! Awaited calls go straight through the injected service handles; everything
//! that must never block or fail the caller is emitted here instead and picked
//! up by subscribers running on their own tasks. Every subscriber owns its
//! queue. Views are shed once a subscriber falls `capacity` behind; every
//! other notification is always queued.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    RecipeViewed { recipe_id: String, user_id: String },
    RecipeFirstRated { recipe_id: String, rating_id: String },
    RecipeDeleted { recipe_id: String },
    PictureChanged { recipe_id: String, filename: String },
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Notification::RecipeViewed { .. } => "recipe.viewed",
            Notification::RecipeFirstRated { .. } => "recipe.first_rating",
            Notification::RecipeDeleted { .. } => "recipe.deletion",
            Notification::PictureChanged { .. } => "recipe.new_picture",
        }
    }

    /// Whether a lagging subscriber may skip it.
    pub fn is_sheddable(&self) -> bool {
        matches!(self, Notification::RecipeViewed { .. })
    }
}

#[async_trait::async_trait]
pub trait Subscriber: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, notification: &Notification) -> crate::Result<()>;
}

struct Outlet {
    tx: mpsc::UnboundedSender<Notification>,
    pending: Arc<AtomicUsize>,
}

#[derive(Clone)]
pub struct NotificationBus {
    outlets: Arc<Mutex<Vec<Outlet>>>,
    capacity: usize,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            outlets: Arc::default(),
            capacity: std::cmp::max(capacity, 1),
        }
    }

    /// Receives everything emitted from now on.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));

        self.outlets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Outlet {
                tx,
                pending: pending.clone(),
            });

        Subscription { rx, pending }
    }

    /// Never blocks and never fails. Subscribers that went away are forgotten.
    pub fn emit(&self, notification: Notification) {
        let name = notification.name();
        let sheddable = notification.is_sheddable();
        let mut outlets = self
            .outlets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut receivers = 0;
        outlets.retain(|outlet| {
            if sheddable && outlet.pending.load(Ordering::Acquire) >= self.capacity {
                tracing::debug!(notification = name, "subscriber lagging, notification shed");
                return !outlet.tx.is_closed();
            }

            outlet.pending.fetch_add(1, Ordering::AcqRel);
            match outlet.tx.send(notification.clone()) {
                Ok(()) => {
                    receivers += 1;
                    true
                }
                Err(_) => false,
            }
        });

        if receivers == 0 {
            tracing::debug!(notification = name, "no subscriber, notification dropped");
        } else {
            tracing::debug!(notification = name, receivers, "emitted");
        }
    }

    pub fn spawn<S: Subscriber + 'static>(&self, subscriber: Arc<S>) -> SubscriptionHandle {
        let mut rx = self.subscribe();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let name = subscriber.name();

        let task = tokio::spawn(async move {
            tracing::info!(subscriber = name, "subscription started");

            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        drain(subscriber.as_ref(), &mut rx).await;
                        break;
                    }
                    received = rx.recv() => match received {
                        Some(notification) => dispatch(subscriber.as_ref(), &notification).await,
                        None => break,
                    },
                }
            }

            tracing::info!(subscriber = name, "subscription stopped");
        });

        SubscriptionHandle {
            name,
            stop: Some(stop_tx),
            task,
        }
    }
}

/// Queue of one subscriber.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Notification>,
    pending: Arc<AtomicUsize>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<Notification> {
        let notification = self.rx.recv().await?;
        self.pending.fetch_sub(1, Ordering::AcqRel);
        Some(notification)
    }

    pub fn try_recv(&mut self) -> Result<Notification, TryRecvError> {
        let notification = self.rx.try_recv()?;
        self.pending.fetch_sub(1, Ordering::AcqRel);
        Ok(notification)
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

pub struct SubscriptionHandle {
    name: &'static str,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Notifications already queued are still handled before the task ends.
    pub async fn shutdown_and_wait(mut self) -> crate::Result<()> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        self.task
            .await
            .map_err(|e| crate::Error::Server(format!("subscription {} panicked: {e}", self.name)))
    }
}

async fn dispatch<S: Subscriber + ?Sized>(subscriber: &S, notification: &Notification) {
    if let Err(err) = subscriber.handle(notification).await {
        tracing::error!(
            subscriber = subscriber.name(),
            notification = notification.name(),
            "{err}"
        );
    }
}

/// Runs every notification already queued on `rx` through `subscriber`.
pub async fn drain<S: Subscriber + ?Sized>(subscriber: &S, rx: &mut Subscription) -> usize {
    let mut handled = 0;

    while let Ok(notification) = rx.try_recv() {
        dispatch(subscriber, &notification).await;
        handled += 1;
    }

    handled
}
