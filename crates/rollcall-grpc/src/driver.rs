//! Client-side driver for the four Directory calls.
//!
//! Every call is issued with a fixed deadline. When the deadline passes the
//! call is abandoned at its next suspension point and reported as a
//! `DEADLINE_EXCEEDED` status, the same way a transport failure is reported.
//! Nothing is retried.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;
use tonic::{Request, Status, Streaming};

use rollcall::PersonRecord;

use crate::proto::{self, LookupRequest, directory_client::DirectoryClient};

/// Deadline applied to every call unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoint the driver connects to unless configured otherwise.
pub const DEFAULT_ENDPOINT: &str = "http://[::1]:50001";

/// Capacity of the outgoing name channel for LookupPersons.
const NAME_BUFFER: usize = 16;

/// Errors surfaced by the [`CallDriver`].
#[derive(Debug, Error)]
pub enum CallError {
    /// Could not establish the connection
    #[error("failed to connect: {0}")]
    Connect(#[from] tonic::transport::Error),
    /// The call failed in transport or ran past its deadline
    #[error("call failed: {0}")]
    Rpc(#[from] Status),
}

impl CallError {
    /// The gRPC status behind a failed call, if the call got that far.
    pub fn status(&self) -> Option<&Status> {
        match self {
            CallError::Rpc(status) => Some(status),
            CallError::Connect(_) => None,
        }
    }
}

/// Connection settings for a [`CallDriver`].
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Server endpoint, e.g. `http://[::1]:50001`
    pub endpoint: String,
    /// Deadline applied to each call from the moment it is issued
    pub timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Issues Directory calls with a per-call deadline.
///
/// Cloning is cheap and clones share the underlying connection, so one driver
/// can issue many calls concurrently.
#[derive(Debug, Clone)]
pub struct CallDriver {
    client: DirectoryClient<Channel>,
    timeout: Duration,
}

impl CallDriver {
    /// Connect to the endpoint named in `config`.
    pub async fn connect(config: DriverConfig) -> Result<Self, CallError> {
        tracing::debug!("Connecting to {}", config.endpoint);
        let client = DirectoryClient::connect(config.endpoint).await?;
        Ok(Self::new(client, config.timeout))
    }

    /// Wrap an already connected client.
    pub fn new(client: DirectoryClient<Channel>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// The deadline applied to each call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Store one person. Returns the server's success flag.
    pub async fn add_person(&self, person: PersonRecord) -> Result<bool, CallError> {
        let mut client = self.client.clone();
        let request = self.request(proto::Person::from(person));

        self.within_deadline("AddPerson", async move {
            let response = client.add_person(request).await?;
            Ok::<_, Status>(response.into_inner().success)
        })
        .await
    }

    /// Stream `persons` to the server in order and return its success flag.
    pub async fn add_persons(&self, persons: Vec<PersonRecord>) -> Result<bool, CallError> {
        let mut client = self.client.clone();
        let outgoing = tokio_stream::iter(persons.into_iter().map(proto::Person::from));
        let request = self.request(outgoing);

        self.within_deadline("AddPersons", async move {
            let response = client.add_persons(request).await?;
            Ok::<_, Status>(response.into_inner().success)
        })
        .await
    }

    /// Fetch at most `limit` persons. A limit of zero or less yields none.
    pub async fn list_limit(&self, limit: i32) -> Result<Vec<PersonRecord>, CallError> {
        let mut client = self.client.clone();
        let request = self.request(proto::ListRequest { limit });

        self.within_deadline("ListPersons", async move {
            let mut stream = client.list_persons(request).await?.into_inner();
            collect_persons(&mut stream).await
        })
        .await
    }

    /// Look up each of `names`, returning the records that exist.
    ///
    /// Names are sent from a separate task while records are received here.
    /// The call only finishes once that task has closed its side of the
    /// stream and signalled completion, even if every record already arrived.
    /// Records come back in no particular order and unknown names are skipped.
    pub async fn lookup_many(&self, names: Vec<String>) -> Result<Vec<PersonRecord>, CallError> {
        let client = self.client.clone();
        let timeout = self.timeout;

        self.within_deadline("LookupPersons", async move {
            let (received, sent) = exchange_names(client, names, timeout).await;

            match &received {
                Ok(persons) => {
                    tracing::debug!(sent = ?sent, matched = persons.len(), "LookupPersons finished");
                }
                Err(status) => {
                    tracing::debug!(sent = ?sent, code = ?status.code(), "LookupPersons receive failed");
                }
            }

            let persons = received?;
            sent.ok_or_else(|| Status::aborted("name sender stopped early"))?;
            Ok::<_, Status>(persons)
        })
        .await
    }

    fn request<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        request.set_timeout(self.timeout);
        request
    }

    /// Run one call to completion or until its deadline, logging the outcome.
    async fn within_deadline<T, F>(&self, call: &'static str, fut: F) -> Result<T, CallError>
    where
        F: Future<Output = Result<T, Status>>,
    {
        tracing::debug!(call, "issued");

        let outcome = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(call, timeout = ?self.timeout, "deadline exceeded");
                Err(Status::deadline_exceeded(format!(
                    "{call} did not finish within {:?}",
                    self.timeout
                )))
            }
        };

        match outcome {
            Ok(value) => {
                tracing::debug!(call, "completed");
                Ok(value)
            }
            Err(status) => {
                tracing::warn!(call, code = ?status.code(), "call failed: {}", status.message());
                Err(CallError::Rpc(status))
            }
        }
    }
}

/// Run one LookupPersons exchange.
///
/// The names go out from a spawned task that closes its side of the stream
/// and then reports how many names it sent over a oneshot. That report is
/// awaited on every path, including a call that never opened, so the
/// exchange only ends after the send side has finished. The count is `None`
/// if the task went away without reporting.
async fn exchange_names(
    mut client: DirectoryClient<Channel>,
    names: Vec<String>,
    timeout: Duration,
) -> (Result<Vec<PersonRecord>, Status>, Option<usize>) {
    let (name_tx, name_rx) = mpsc::channel::<LookupRequest>(NAME_BUFFER);
    let (done_tx, done_rx) = oneshot::channel::<usize>();

    let mut request = Request::new(ReceiverStream::new(name_rx));
    request.set_timeout(timeout);

    tokio::spawn(async move {
        let mut sent = 0;
        for name in names {
            if name_tx.send(LookupRequest { name }).await.is_err() {
                tracing::warn!("LookupPersons request stream closed after {} names", sent);
                break;
            }
            sent += 1;
        }
        // Dropping the sender ends our side of the stream
        drop(name_tx);
        let _ = done_tx.send(sent);
    });

    let received = match client.lookup_persons(request).await {
        Ok(response) => collect_persons(&mut response.into_inner()).await,
        Err(status) => Err(status),
    };

    (received, done_rx.await.ok())
}

async fn collect_persons(
    stream: &mut Streaming<proto::Person>,
) -> Result<Vec<PersonRecord>, Status> {
    let mut persons = Vec::new();
    while let Some(person) = stream.message().await? {
        persons.push(person.into());
    }
    Ok(persons)
}
