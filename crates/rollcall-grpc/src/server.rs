//! gRPC server implementation for the Directory service.

use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tonic::{Request, Response, Status, Streaming};

use rollcall::{Directory, PersonRecord};

use crate::proto::{self, AddResult, ListRequest, LookupRequest, Person};

/// Capacity of the per-call channel feeding a response stream.
const RESPONSE_BUFFER: usize = 32;

type PersonStream = Pin<Box<dyn Stream<Item = Result<Person, Status>> + Send>>;
type PersonSender = mpsc::Sender<Result<Person, Status>>;

/// The Directory gRPC service implementation.
///
/// Cloning is cheap; all clones share the same [`Directory`].
#[derive(Clone, Debug)]
pub struct DirectoryService {
    directory: Arc<Directory>,
}

impl DirectoryService {
    /// Create a service backed by a fresh, empty directory.
    pub fn new() -> Self {
        Self::with_directory(Arc::new(Directory::new()))
    }

    /// Create a service backed by an existing directory.
    pub fn with_directory(directory: Arc<Directory>) -> Self {
        Self { directory }
    }

    /// The directory this service reads and writes.
    pub fn directory(&self) -> &Arc<Directory> {
        &self.directory
    }
}

impl Default for DirectoryService {
    fn default() -> Self {
        Self::new()
    }
}

#[tonic::async_trait]
impl proto::directory_server::Directory for DirectoryService {
    async fn add_person(&self, request: Request<Person>) -> Result<Response<AddResult>, Status> {
        let record = PersonRecord::from(request.into_inner());
        tracing::debug!(name = %record.name, "AddPerson");

        let success = self.directory.insert(record);
        Ok(Response::new(AddResult { success }))
    }

    async fn add_persons(
        &self,
        request: Request<Streaming<Person>>,
    ) -> Result<Response<AddResult>, Status> {
        let inserted = ingest(&self.directory, request.into_inner()).await?;
        tracing::debug!(inserted, "AddPersons stream closed by client");

        Ok(Response::new(AddResult { success: true }))
    }

    type ListPersonsStream = PersonStream;

    async fn list_persons(
        &self,
        request: Request<ListRequest>,
    ) -> Result<Response<Self::ListPersonsStream>, Status> {
        let limit = request.into_inner().limit;
        // Negative limits behave like zero
        let take = usize::try_from(limit).unwrap_or(0);

        // Drain the scan before the first await so no shard guard is held
        // while the client applies backpressure.
        let batch: Vec<PersonRecord> = self.directory.scan().take(take).collect();
        tracing::debug!(limit, selected = batch.len(), "ListPersons");

        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);
        tokio::spawn(async move {
            if let Err(e) = send_all(batch, &tx).await {
                tracing::error!("ListPersons stream failed: {}", e);
            }
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx)) as PersonStream))
    }

    type LookupPersonsStream = PersonStream;

    async fn lookup_persons(
        &self,
        request: Request<Streaming<LookupRequest>>,
    ) -> Result<Response<Self::LookupPersonsStream>, Status> {
        let names = request.into_inner();
        let directory = Arc::clone(&self.directory);
        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);

        // Names keep being read while matches drain through the channel;
        // dropping `tx` at the end of the task closes the response stream.
        tokio::spawn(async move {
            if let Err(e) = answer_lookups(&directory, names, &tx).await {
                tracing::error!("LookupPersons failed: {}", e);
                let _ = tx.send(Err(e)).await;
            }
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx)) as PersonStream))
    }
}

/// Insert every streamed person as it arrives.
///
/// Records inserted before a receive error stay in the directory. Returns the
/// number of records received once the client closes its side.
async fn ingest<S>(directory: &Directory, mut persons: S) -> Result<usize, Status>
where
    S: Stream<Item = Result<Person, Status>> + Unpin,
{
    let mut received = 0;
    while let Some(person) = persons.next().await {
        directory.insert(person?.into());
        received += 1;
    }
    Ok(received)
}

/// Send each record in order, stopping at the first failed send.
async fn send_all(records: Vec<PersonRecord>, tx: &PersonSender) -> Result<usize, Status> {
    let mut sent = 0;
    for record in records {
        tx.send(Ok(record.into()))
            .await
            .map_err(|_| Status::cancelled("response stream closed"))?;
        sent += 1;
    }
    Ok(sent)
}

/// Answer each streamed name with its record, skipping unknown names.
async fn answer_lookups<S>(
    directory: &Directory,
    mut names: S,
    tx: &PersonSender,
) -> Result<(), Status>
where
    S: Stream<Item = Result<LookupRequest, Status>> + Unpin,
{
    let mut received = 0usize;
    let mut matched = 0usize;

    while let Some(request) = names.next().await {
        let request = request?;
        received += 1;

        let Some(record) = directory.lookup(&request.name) else {
            tracing::debug!(name = %request.name, "no such person");
            continue;
        };

        tx.send(Ok(record.into()))
            .await
            .map_err(|_| Status::cancelled("response stream closed"))?;
        matched += 1;
    }

    tracing::debug!(received, matched, "LookupPersons stream closed by client");
    Ok(())
}
