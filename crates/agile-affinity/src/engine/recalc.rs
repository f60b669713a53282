//! Background affinity recalculation.
//!
//! Jobs are queued on an unbounded channel and processed one at a time by a
//! single worker task, which runs the blocking datastore batch on the blocking
//! pool. Callers get a [`RecalculationTicket`] they may await or drop; failures
//! are logged by the worker and otherwise only reported through the ticket.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::affinities::AffinityStore;
use super::domain::{AffinityRecord, PersonId};
use super::error::EngineError;
use super::repository::{AffinityRepository, CatalogRepository, PeopleRepository, ProfileRepository};

type RecalculationResult = Result<Vec<AffinityRecord>, EngineError>;

struct RecalculationJob {
    person_id: PersonId,
    reply: oneshot::Sender<RecalculationResult>,
}

/// Handle to the recalculation worker.
#[derive(Clone)]
pub struct RecalculationQueue {
    sender: mpsc::UnboundedSender<RecalculationJob>,
}

impl RecalculationQueue {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn<S>(affinities: AffinityStore<S>) -> Self
    where
        S: PeopleRepository + ProfileRepository + CatalogRepository + AffinityRepository + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<RecalculationJob>();

        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let RecalculationJob { person_id, reply } = job;
                let worker = affinities.clone();
                let outcome = match tokio::task::spawn_blocking(move || {
                    worker.recalculate_for_person(person_id)
                })
                .await
                {
                    Ok(result) => result,
                    Err(join_error) => Err(EngineError::Background(join_error.to_string())),
                };

                match &outcome {
                    Ok(records) => {
                        info!(%person_id, practices = records.len(), "background recalculation finished")
                    }
                    Err(err) => {
                        error!(%person_id, error = %err, "background recalculation failed")
                    }
                }
                if reply.send(outcome).is_err() {
                    debug!(%person_id, "recalculation ticket dropped before completion");
                }
            }
            debug!("recalculation queue closed");
        });

        Self { sender }
    }

    pub fn submit(&self, person_id: PersonId) -> RecalculationTicket {
        let (reply, receiver) = oneshot::channel();
        if self
            .sender
            .send(RecalculationJob { person_id, reply })
            .is_err()
        {
            warn!(%person_id, "recalculation worker is gone; job dropped");
        }
        RecalculationTicket {
            person_id,
            receiver,
        }
    }
}

/// Completion handle for one queued recalculation.
#[derive(Debug)]
pub struct RecalculationTicket {
    person_id: PersonId,
    receiver: oneshot::Receiver<RecalculationResult>,
}

impl RecalculationTicket {
    pub fn person_id(&self) -> PersonId {
        self.person_id
    }

    pub async fn wait(self) -> RecalculationResult {
        self.receiver
            .await
            .unwrap_or_else(|_| Err(EngineError::QueueClosed))
    }
}
