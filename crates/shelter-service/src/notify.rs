//! Announcement email delivery.
//!
//! Posting an announcement only enqueues an [`EmailJob`]; a detached
//! worker owns delivery from then on. The queue is bounded and
//! [`EmailDispatcher::enqueue`] never waits: a full queue is reported
//! back immediately. Sends across all jobs share one concurrency limit.
//! Each job ends in a [`DeliveryReport`] listing what failed.

use std::sync::Arc;

use shelter_core::error::ShelterError;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{info, warn};
use uuid::Uuid;

/// Outbound email transport.
pub trait EmailSender: Send + Sync + 'static {
    /// Whether the transport has what it needs to send anything.
    fn is_configured(&self) -> bool;

    fn send_announcement_email(
        &self,
        address: &str,
        title: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery to {recipient} failed: {reason}")]
    Delivery { recipient: String, reason: String },

    #[error("email queue is full")]
    QueueFull,

    #[error("email dispatcher has shut down")]
    Closed,
}

impl From<NotifyError> for ShelterError {
    fn from(err: NotifyError) -> Self {
        ShelterError::Internal(err.to_string())
    }
}

/// One announcement to deliver to a list of recipients.
#[derive(Debug, Clone)]
pub struct EmailJob {
    pub announcement_id: Uuid,
    pub title: String,
    pub body: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub recipient: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub announcement_id: Uuid,
    pub sent: usize,
    /// Sorted by recipient.
    pub failures: Vec<DeliveryFailure>,
}

/// Handle to the outcome of an accepted job. Dropping it does not
/// cancel delivery.
#[derive(Debug)]
pub struct DeliveryReceipt {
    rx: oneshot::Receiver<DeliveryReport>,
}

impl DeliveryReceipt {
    pub async fn report(self) -> Result<DeliveryReport, NotifyError> {
        self.rx.await.map_err(|_| NotifyError::Closed)
    }
}

struct Queued {
    job: EmailJob,
    reply: oneshot::Sender<DeliveryReport>,
}

/// Producer side of the delivery queue. Cheap to clone.
#[derive(Clone)]
pub struct EmailDispatcher {
    tx: mpsc::Sender<Queued>,
    enabled: bool,
}

/// The running delivery task.
pub struct DispatcherWorker {
    handle: JoinHandle<()>,
    stop: oneshot::Sender<()>,
}

impl EmailDispatcher {
    /// Spawn the delivery worker. Must be called inside a Tokio runtime.
    pub fn start<E: EmailSender>(
        sender: E,
        max_concurrent_sends: usize,
        queue_capacity: usize,
    ) -> (Self, DispatcherWorker) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let (stop_tx, stop_rx) = oneshot::channel();
        let enabled = sender.is_configured();
        let permits = Arc::new(Semaphore::new(max_concurrent_sends.max(1)));

        let handle = tokio::spawn(run_worker(Arc::new(sender), permits, rx, stop_rx));

        (
            Self { tx, enabled },
            DispatcherWorker {
                handle,
                stop: stop_tx,
            },
        )
    }

    /// False when the sender is not configured; jobs would only fail.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enqueue(&self, job: EmailJob) -> Result<DeliveryReceipt, NotifyError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .try_send(Queued { job, reply })
            .map_err(|e| match e {
                TrySendError::Full(_) => NotifyError::QueueFull,
                TrySendError::Closed(_) => NotifyError::Closed,
            })?;
        Ok(DeliveryReceipt { rx })
    }
}

impl DispatcherWorker {
    /// Stop accepting jobs, finish everything already queued, and wait
    /// for the worker to exit.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Email dispatcher task failed");
        }
    }
}

async fn run_worker<E: EmailSender>(
    sender: Arc<E>,
    permits: Arc<Semaphore>,
    mut rx: mpsc::Receiver<Queued>,
    mut stop: oneshot::Receiver<()>,
) {
    let mut jobs = JoinSet::new();

    loop {
        tokio::select! {
            queued = rx.recv() => match queued {
                Some(queued) => {
                    jobs.spawn(deliver(sender.clone(), permits.clone(), queued));
                }
                None => break,
            },
            _ = &mut stop => {
                rx.close();
                while let Some(queued) = rx.recv().await {
                    jobs.spawn(deliver(sender.clone(), permits.clone(), queued));
                }
                break;
            }
            Some(joined) = jobs.join_next(), if !jobs.is_empty() => {
                if let Err(e) = joined {
                    warn!(error = %e, "Email job task failed");
                }
            }
        }
    }

    while let Some(joined) = jobs.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "Email job task failed");
        }
    }
    info!("Email dispatcher stopped");
}

async fn deliver<E: EmailSender>(sender: Arc<E>, permits: Arc<Semaphore>, queued: Queued) {
    let Queued { job, reply } = queued;
    let EmailJob {
        announcement_id,
        title,
        body,
        recipients,
    } = job;
    let title: Arc<str> = title.into();
    let body: Arc<str> = body.into();

    let mut sends = JoinSet::new();
    for recipient in recipients {
        let sender = sender.clone();
        let permits = permits.clone();
        let title = title.clone();
        let body = body.clone();
        sends.spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(permit) => {
                    let sent = sender
                        .send_announcement_email(&recipient, &title, &body)
                        .await;
                    drop(permit);
                    sent
                }
                Err(_) => Err(NotifyError::Closed),
            };
            (recipient, result)
        });
    }

    let mut report = DeliveryReport {
        announcement_id,
        sent: 0,
        failures: Vec::new(),
    };
    while let Some(joined) = sends.join_next().await {
        match joined {
            Ok((_, Ok(()))) => report.sent += 1,
            Ok((recipient, Err(e))) => {
                warn!(%announcement_id, %recipient, error = %e, "Announcement email failed");
                report.failures.push(DeliveryFailure {
                    recipient,
                    reason: e.to_string(),
                });
            }
            Err(e) => warn!(%announcement_id, error = %e, "Email send task failed"),
        }
    }
    report
        .failures
        .sort_by(|a, b| a.recipient.cmp(&b.recipient));

    info!(
        %announcement_id,
        sent = report.sent,
        failed = report.failures.len(),
        "Announcement emails delivered"
    );
    // The caller may have dropped its receipt.
    let _ = reply.send(report);
}
