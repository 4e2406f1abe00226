//! Transport layer abstraction for transaction execution.

use crate::error::{EngineError, EngineResult};
use crate::flags::TransactionFlags;
use entilink_model::{Container, EntityId};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Path prefix of a retrieve request line.
const RETRIEVE_PREFIX: &str = "/Entity/";

/// What a retrieve transaction addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrieveRequest {
    /// Retrieve by entity ids.
    Ids(Vec<EntityId>),
    /// Retrieve file entities by path.
    Paths(Vec<String>),
    /// Retrieve by entity name.
    Names(Vec<String>),
}

impl RetrieveRequest {
    /// Number of addressed entities.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            RetrieveRequest::Ids(ids) => ids.len(),
            RetrieveRequest::Paths(paths) => paths.len(),
            RetrieveRequest::Names(names) => names.len(),
        }
    }

    /// Returns true if nothing is addressed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length in bytes of the request line this request renders to.
    #[must_use]
    pub fn uri_length(&self) -> usize {
        let segments: usize = match self {
            RetrieveRequest::Ids(ids) => ids.iter().map(|id| id.to_string().len()).sum(),
            RetrieveRequest::Paths(items) | RetrieveRequest::Names(items) => {
                items.iter().map(String::len).sum()
            }
        };
        let separators = self.len().saturating_sub(1);
        RETRIEVE_PREFIX.len() + segments + separators
    }

    /// Splits the request in half, preserving order.
    ///
    /// Used to bisect a request the server rejected as too long. Callers
    /// must not split a request with fewer than two items.
    #[must_use]
    pub fn split(&self) -> (RetrieveRequest, RetrieveRequest) {
        let mid = self.len() / 2;
        match self {
            RetrieveRequest::Ids(ids) => {
                let (a, b) = ids.split_at(mid);
                (RetrieveRequest::Ids(a.to_vec()), RetrieveRequest::Ids(b.to_vec()))
            }
            RetrieveRequest::Paths(items) => {
                let (a, b) = items.split_at(mid);
                (
                    RetrieveRequest::Paths(a.to_vec()),
                    RetrieveRequest::Paths(b.to_vec()),
                )
            }
            RetrieveRequest::Names(items) => {
                let (a, b) = items.split_at(mid);
                (
                    RetrieveRequest::Names(a.to_vec()),
                    RetrieveRequest::Names(b.to_vec()),
                )
            }
        }
    }
}

/// A transport carries encoded transactions to the server and returns the
/// parsed response container.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, an in-process loopback, mock for testing).
pub trait Transport: Send + Sync {
    /// Executes a retrieve transaction.
    fn retrieve(
        &self,
        request: &RetrieveRequest,
        flags: &TransactionFlags,
    ) -> EngineResult<Container>;

    /// Executes an insert transaction over a linearized container.
    fn insert(&self, request: &Container, flags: &TransactionFlags) -> EngineResult<Container>;

    /// Executes an update transaction over a linearized container.
    fn update(&self, request: &Container, flags: &TransactionFlags) -> EngineResult<Container>;

    /// Executes a delete transaction over the given ids.
    fn delete(&self, ids: &[EntityId], flags: &TransactionFlags) -> EngineResult<Container>;
}

/// A mock transport for testing.
///
/// Responses are scripted per operation and consumed in order. An optional
/// uri length limit makes retrieves fail the way a server with a bounded
/// request line does.
#[derive(Debug, Default)]
pub struct MockTransport {
    retrieve_responses: Mutex<VecDeque<Container>>,
    insert_responses: Mutex<VecDeque<Container>>,
    update_responses: Mutex<VecDeque<Container>>,
    delete_responses: Mutex<VecDeque<Container>>,
    retrieve_requests: Mutex<Vec<RetrieveRequest>>,
    /// Maximum accepted retrieve request line length.
    pub uri_length_limit: Option<usize>,
}

impl MockTransport {
    /// Creates a mock transport with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum accepted retrieve request line length.
    #[must_use]
    pub fn with_uri_length_limit(mut self, limit: usize) -> Self {
        self.uri_length_limit = Some(limit);
        self
    }

    /// Scripts the next retrieve response.
    pub fn push_retrieve_response(&self, response: Container) {
        self.retrieve_responses.lock().unwrap().push_back(response);
    }

    /// Scripts the next insert response.
    pub fn push_insert_response(&self, response: Container) {
        self.insert_responses.lock().unwrap().push_back(response);
    }

    /// Scripts the next update response.
    pub fn push_update_response(&self, response: Container) {
        self.update_responses.lock().unwrap().push_back(response);
    }

    /// Scripts the next delete response.
    pub fn push_delete_response(&self, response: Container) {
        self.delete_responses.lock().unwrap().push_back(response);
    }

    /// Returns the retrieve requests seen so far, in order.
    #[must_use]
    pub fn retrieve_requests(&self) -> Vec<RetrieveRequest> {
        self.retrieve_requests.lock().unwrap().clone()
    }

    fn pop(
        queue: &Mutex<VecDeque<Container>>,
        operation: &str,
    ) -> EngineResult<Container> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| {
                EngineError::transport_fatal(format!("no mock {operation} response scripted"))
            })
    }
}

impl Transport for MockTransport {
    fn retrieve(
        &self,
        request: &RetrieveRequest,
        _flags: &TransactionFlags,
    ) -> EngineResult<Container> {
        self.retrieve_requests.lock().unwrap().push(request.clone());
        if let Some(limit) = self.uri_length_limit {
            let length = request.uri_length();
            if length > limit {
                return Err(EngineError::uri_too_long(length, limit));
            }
        }
        Self::pop(&self.retrieve_responses, "retrieve")
    }

    fn insert(&self, _request: &Container, _flags: &TransactionFlags) -> EngineResult<Container> {
        Self::pop(&self.insert_responses, "insert")
    }

    fn update(&self, _request: &Container, _flags: &TransactionFlags) -> EngineResult<Container> {
        Self::pop(&self.update_responses, "update")
    }

    fn delete(&self, _ids: &[EntityId], _flags: &TransactionFlags) -> EngineResult<Container> {
        Self::pop(&self.delete_responses, "delete")
    }
}
