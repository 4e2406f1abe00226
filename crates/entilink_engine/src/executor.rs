//! The transaction executor.
//!
//! [`EntityClient`] drives the four transactions over an abstract
//! [`Transport`]: it prepares the request container (clearing stale server
//! messages and linearizing references), hands it to the transport, merges
//! the response back and turns response error messages into structured
//! failures.

use crate::error::{EngineError, EngineResult};
use crate::flags::TransactionFlags;
use crate::transport::{RetrieveRequest, Transport};
use entilink_model::report;
use entilink_model::{Container, SyncOptions, SyncReport};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
enum WriteOp {
    Insert,
    Update,
}

/// Executes transactions against a server behind a [`Transport`].
#[derive(Debug)]
pub struct EntityClient<T: Transport> {
    transport: T,
    flags: TransactionFlags,
}

impl<T: Transport> EntityClient<T> {
    /// Creates a client with default flags.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            flags: TransactionFlags::default(),
        }
    }

    /// Sets the transaction flags.
    #[must_use]
    pub fn with_flags(mut self, flags: TransactionFlags) -> Self {
        self.flags = flags;
        self
    }

    /// The current transaction flags.
    #[must_use]
    pub fn flags(&self) -> &TransactionFlags {
        &self.flags
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Executes a retrieve transaction.
    ///
    /// When the server rejects the request line as too long, the request is
    /// bisected and retried recursively; the merged response preserves the
    /// requested order and takes its metadata from the last partial
    /// response.
    pub fn retrieve(&self, request: &RetrieveRequest) -> EngineResult<Container> {
        let mut response = self.dispatch_retrieve(request)?;
        if self.flags.strict {
            response.promote_warnings();
        }
        if self.flags.raise_on_error {
            report::raise_container_errors(&response)?;
        }
        Ok(response)
    }

    fn dispatch_retrieve(&self, request: &RetrieveRequest) -> EngineResult<Container> {
        match self.transport.retrieve(request, &self.flags) {
            Err(EngineError::UriTooLong { length, limit }) if request.len() >= 2 => {
                debug!(length, limit, items = request.len(), "bisecting oversize retrieve");
                let (left, right) = request.split();
                let mut merged = self.dispatch_retrieve(&left)?;
                let rest = self.dispatch_retrieve(&right)?;

                merged.timestamp = rest.timestamp.clone();
                merged.srid = rest.srid.clone();
                for message in &rest.messages {
                    merged.messages.set(message.clone());
                }
                merged.extend(rest);
                Ok(merged)
            }
            result => result,
        }
    }

    /// Retrieves the server state of the container's entities and merges
    /// it back in.
    ///
    /// Entities are addressed by id when every entity has one, by path
    /// when every entity has one, and by name otherwise.
    pub fn execute_retrieve(&self, container: &mut Container) -> EngineResult<SyncReport> {
        container.clear_server_messages();
        let request = retrieve_request_for(container);

        let mut response = self.dispatch_retrieve(&request)?;
        if self.flags.strict {
            response.promote_warnings();
        }

        let report = container.sync_with(response, &self.sync_options())?;
        if self.flags.raise_on_error {
            report::raise_container_errors(container)?;
        }
        Ok(report)
    }

    /// Executes an insert transaction, merging the assigned ids back into
    /// the container.
    pub fn insert(&self, container: &mut Container) -> EngineResult<SyncReport> {
        self.execute_write(container, WriteOp::Insert)
    }

    /// Executes an update transaction, merging the server state back into
    /// the container.
    pub fn update(&self, container: &mut Container) -> EngineResult<SyncReport> {
        self.execute_write(container, WriteOp::Update)
    }

    fn execute_write(
        &self,
        container: &mut Container,
        op: WriteOp,
    ) -> EngineResult<SyncReport> {
        container.clear_server_messages();
        container.linearize();
        debug!(entities = container.len(), ?op, "executing write transaction");

        let mut response = match op {
            WriteOp::Insert => self.transport.insert(container, &self.flags)?,
            WriteOp::Update => self.transport.update(container, &self.flags)?,
        };
        if self.flags.strict {
            response.promote_warnings();
        }

        let report = container.sync_with(response, &self.sync_options())?;
        if self.flags.raise_on_error {
            report::raise_container_errors(container)?;
        }
        Ok(report)
    }

    /// Executes a delete transaction over the container's ids.
    ///
    /// Entities the server reports deleted are invalidated: their id is
    /// cleared and they become not-valid.
    pub fn delete(&self, container: &mut Container) -> EngineResult<SyncReport> {
        container.clear_server_messages();
        let ids = container.ids();
        debug!(entities = ids.len(), "executing delete transaction");

        let mut response = self.transport.delete(&ids, &self.flags)?;
        if self.flags.strict {
            response.promote_warnings();
        }

        let report = container.sync_with(response, &self.sync_options())?;
        for entity in container.iter_mut() {
            if entity.is_deleted() {
                entity.invalidate();
            }
        }
        if self.flags.raise_on_error {
            report::raise_container_errors(container)?;
        }
        Ok(report)
    }

    fn sync_options(&self) -> SyncOptions {
        SyncOptions::new()
            .with_unique(self.flags.unique_name)
            .with_raise_on_ambiguity(self.flags.raise_on_error)
    }
}

/// Picks the addressing mode a container retrieves by: ids when complete,
/// else paths when complete, else names.
fn retrieve_request_for(container: &Container) -> RetrieveRequest {
    let ids = container.ids();
    if ids.len() == container.len() {
        return RetrieveRequest::Ids(ids);
    }
    let paths: Vec<String> = container
        .iter()
        .filter_map(|e| e.path().map(str::to_string))
        .collect();
    if paths.len() == container.len() {
        return RetrieveRequest::Paths(paths);
    }
    RetrieveRequest::Names(
        container
            .iter()
            .filter_map(|e| e.name().map(str::to_string))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use entilink_model::{Entity, EntityId, Message, ModelError};
    use proptest::prelude::*;

    fn record_with_id(name: &str, id: i64) -> Entity {
        let mut entity = Entity::record(name);
        entity.set_id(EntityId::new(id)).unwrap();
        entity
    }

    fn response_of(entities: Vec<Entity>) -> Container {
        entities.into_iter().collect()
    }

    #[test]
    fn retrieve_passes_the_response_through() {
        let transport = MockTransport::new();
        transport.push_retrieve_response(response_of(vec![record_with_id("a", 1)]));

        let client = EntityClient::new(transport);
        let response = client
            .retrieve(&RetrieveRequest::Ids(vec![EntityId::new(1)]))
            .unwrap();
        assert_eq!(response.len(), 1);
        assert_eq!(response[0].name(), Some("a"));
    }

    #[test]
    fn oversize_retrieve_bisects_and_preserves_order() {
        let ids: Vec<EntityId> = (1..=4).map(EntityId::new).collect();
        // Full request is "/Entity/1,2,3,4" (15 bytes), halves fit.
        let transport = MockTransport::new().with_uri_length_limit(12);
        transport.push_retrieve_response(response_of(vec![
            record_with_id("a", 1),
            record_with_id("b", 2),
        ]));
        let mut second = response_of(vec![record_with_id("c", 3), record_with_id("d", 4)]);
        second.timestamp = Some("later".into());
        transport.push_retrieve_response(second);

        let client = EntityClient::new(transport);
        let response = client.retrieve(&RetrieveRequest::Ids(ids)).unwrap();

        let names: Vec<_> = response.iter().map(|e| e.name().unwrap()).collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
        // Metadata comes from the last partial response.
        assert_eq!(response.timestamp.as_deref(), Some("later"));
        // One rejected full request plus the two halves.
        assert_eq!(client.transport().retrieve_requests().len(), 3);
    }

    #[test]
    fn ten_thousand_ids_split_once_and_stay_ordered() {
        let ids: Vec<EntityId> = (1..=10_000).map(EntityId::new).collect();
        let full = RetrieveRequest::Ids(ids.clone());
        let (left, right) = full.split();
        // A limit between the halves and the whole forces exactly one split.
        let limit = left.uri_length().max(right.uri_length());
        assert!(limit < full.uri_length());

        let transport = MockTransport::new().with_uri_length_limit(limit);
        for half in [&left, &right] {
            let RetrieveRequest::Ids(half_ids) = half else {
                unreachable!();
            };
            transport.push_retrieve_response(
                half_ids
                    .iter()
                    .map(|id| record_with_id(&format!("e{id}"), id.as_i64()))
                    .collect(),
            );
        }

        let client = EntityClient::new(transport);
        let response = client.retrieve(&full).unwrap();
        assert_eq!(response.ids(), ids);
        assert_eq!(client.transport().retrieve_requests().len(), 3);
    }

    #[test]
    fn execute_retrieve_syncs_server_state_into_the_container() {
        let transport = MockTransport::new();
        transport.push_retrieve_response(response_of(vec![
            record_with_id("a", 1).with_description("fresh"),
        ]));

        let client = EntityClient::new(transport);
        let mut container: Container = [Entity::record("a")].into_iter().collect();
        let report = client.execute_retrieve(&mut container).unwrap();

        assert_eq!(report.matched, 1);
        assert_eq!(container[0].id(), Some(EntityId::new(1)));
        assert_eq!(container[0].description(), Some("fresh"));
        // Addressed by name, since the local entity had no id.
        assert_eq!(
            client.transport().retrieve_requests(),
            vec![RetrieveRequest::Names(vec!["a".into()])]
        );
    }

    #[test]
    fn single_item_uri_too_long_is_not_bisected() {
        let transport = MockTransport::new().with_uri_length_limit(10);
        let client = EntityClient::new(transport);
        let err = client
            .retrieve(&RetrieveRequest::Names(vec!["a-very-long-name".into()]))
            .unwrap_err();
        assert!(matches!(err, EngineError::UriTooLong { .. }));
    }

    #[test]
    fn retrieve_raises_structured_errors_by_default() {
        let mut missing = Entity::record("gone");
        missing.add_message(Message::error(Some(101), "entity does not exist"));
        let transport = MockTransport::new();
        transport.push_retrieve_response(response_of(vec![missing]));

        let client = EntityClient::new(transport);
        let err = client
            .retrieve(&RetrieveRequest::Names(vec!["gone".into()]))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Model(ModelError::Transaction(_))
        ));
    }

    #[test]
    fn insert_merges_assigned_ids_back() {
        let transport = MockTransport::new();
        transport.push_insert_response(response_of(vec![record_with_id("A", 7)]));

        let client = EntityClient::new(transport);
        let mut container: Container = [Entity::record("A")].into_iter().collect();
        let report = client.insert(&mut container).unwrap();

        assert_eq!(report.matched, 1);
        assert_eq!(report.appended, 0);
        assert_eq!(container[0].id(), Some(EntityId::new(7)));
        assert!(container[0].is_valid());
    }

    #[test]
    fn strict_mode_turns_warnings_into_failures() {
        let mut warned = record_with_id("A", 7);
        warned.add_message(Message::warning(Some(3), "suspicious value"));

        let transport = MockTransport::new();
        transport.push_insert_response(response_of(vec![warned.clone()]));

        let client = EntityClient::new(transport)
            .with_flags(TransactionFlags::new().with_strict(true));
        let mut container: Container = [Entity::record("A")].into_iter().collect();
        assert!(client.insert(&mut container).is_err());

        // Without strict the same response passes.
        let transport = MockTransport::new();
        transport.push_insert_response(response_of(vec![warned]));
        let client = EntityClient::new(transport);
        let mut container: Container = [Entity::record("A")].into_iter().collect();
        assert!(client.insert(&mut container).is_ok());
    }

    #[test]
    fn raise_on_error_false_keeps_messages_attached() {
        let mut failed = Entity::record("A");
        failed.add_message(Message::error(Some(152), "name is not unique"));
        let transport = MockTransport::new();
        transport.push_insert_response(response_of(vec![failed]));

        let client = EntityClient::new(transport)
            .with_flags(TransactionFlags::new().with_raise_on_error(false));
        let mut container: Container = [Entity::record("A")].into_iter().collect();

        client.insert(&mut container).unwrap();
        assert!(container.has_errors());
    }

    #[test]
    fn unique_name_rejects_ambiguous_matches() {
        let transport = MockTransport::new();
        transport.push_update_response(response_of(vec![
            record_with_id("a", 1),
            record_with_id("A", 2),
        ]));

        let client = EntityClient::new(transport)
            .with_flags(TransactionFlags::new().with_unique_name(true));
        let mut container: Container = [Entity::record("a")].into_iter().collect();

        let err = client.update(&mut container).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Model(ModelError::AmbiguousMatch { .. })
        ));
    }

    #[test]
    fn delete_invalidates_deleted_entities() {
        let mut deleted = record_with_id("a", 9);
        deleted.set_deleted(true);
        let transport = MockTransport::new();
        transport.push_delete_response(response_of(vec![deleted]));

        let client = EntityClient::new(transport);
        let mut container: Container = [record_with_id("a", 9)].into_iter().collect();
        client.delete(&mut container).unwrap();

        assert!(!container[0].is_valid());
        assert_eq!(container[0].id(), None);
    }

    /// An echoing transport: any retrieve within the limit answers with
    /// one record per requested id.
    #[derive(Debug)]
    struct EchoTransport {
        limit: usize,
    }

    impl Transport for EchoTransport {
        fn retrieve(
            &self,
            request: &RetrieveRequest,
            _flags: &TransactionFlags,
        ) -> EngineResult<Container> {
            let length = request.uri_length();
            if length > self.limit {
                return Err(EngineError::uri_too_long(length, self.limit));
            }
            let RetrieveRequest::Ids(ids) = request else {
                return Err(EngineError::transport_fatal("ids only"));
            };
            Ok(ids
                .iter()
                .map(|id| record_with_id(&format!("e{id}"), id.as_i64()))
                .collect())
        }

        fn insert(&self, _: &Container, _: &TransactionFlags) -> EngineResult<Container> {
            Err(EngineError::transport_fatal("unsupported"))
        }

        fn update(&self, _: &Container, _: &TransactionFlags) -> EngineResult<Container> {
            Err(EngineError::transport_fatal("unsupported"))
        }

        fn delete(&self, _: &[EntityId], _: &TransactionFlags) -> EngineResult<Container> {
            Err(EngineError::transport_fatal("unsupported"))
        }
    }

    proptest! {
        #[test]
        fn bisection_returns_every_id_in_request_order(
            count in 1usize..64,
            limit in 16usize..96,
        ) {
            let ids: Vec<EntityId> = (1..=count as i64).map(EntityId::new).collect();
            let client = EntityClient::new(EchoTransport { limit });

            let response = client.retrieve(&RetrieveRequest::Ids(ids.clone())).unwrap();
            prop_assert_eq!(response.ids(), ids);
        }
    }
}
