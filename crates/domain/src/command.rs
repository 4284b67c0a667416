//! Command handling infrastructure.
//!
//! Every mutation of an existing stream follows the same protocol:
//!
//! 1. read the stream's current version (its entity tag);
//! 2. compare it with the caller's expected tag, failing with
//!    `PreconditionFailed` on mismatch before anything else is read;
//! 3. replay the stream up to the version read in step 1;
//! 4. run the behavior, which either refuses or returns new events;
//! 5. append with that version as the expected version, so a concurrent
//!    writer turns into a concurrency conflict;
//! 6. report the new version as the new tag.

use std::marker::PhantomData;

use common::AggregateId;
use event_store::{AppendOptions, ETag, EventEnvelope, EventStore, EventStoreError, Version};
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;
use crate::registry::decode_event;

/// Trait for commands that can be executed against an aggregate.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the ID of the aggregate this command targets.
    fn aggregate_id(&self) -> AggregateId;
}

/// Per-request metadata carried into every appended envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    /// Tag the caller last observed; `None` skips the precondition check.
    pub expected_etag: Option<ETag>,

    /// Stamped on every event the command appends.
    pub correlation_id: Uuid,

    /// The message that triggered the command, if any.
    pub causation_id: Option<Uuid>,
}

impl CommandContext {
    /// A context with a fresh correlation id and no precondition.
    pub fn new() -> Self {
        Self {
            expected_etag: None,
            correlation_id: Uuid::new_v4(),
            causation_id: None,
        }
    }

    pub fn with_expected_etag(mut self, etag: ETag) -> Self {
        self.expected_etag = Some(etag);
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    pub fn with_causation_id(mut self, causation_id: Uuid) -> Self {
        self.causation_id = Some(causation_id);
        self
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    /// The envelopes as appended.
    pub envelopes: Vec<EventEnvelope>,

    /// The new version of the aggregate after the command.
    pub new_version: Version,
}

impl<A: Aggregate> CommandResult<A> {
    pub fn etag(&self) -> ETag {
        ETag::from_version(self.new_version)
    }
}

/// Handler for executing commands against aggregates.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replays a list of stored envelopes into an aggregate.
    pub fn hydrate(envelopes: &[EventEnvelope]) -> Result<A, DomainError> {
        let mut aggregate = A::default();
        for envelope in envelopes {
            aggregate.apply(decode_event::<A>(envelope)?);
            aggregate.set_version(envelope.version);
        }
        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if its stream has no events.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError> {
        let envelopes = self.store.get_events_for_aggregate(aggregate_id).await?;
        if envelopes.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self::hydrate(&envelopes)?))
    }

    /// Current entity tag of a stream, or `None` if it does not exist.
    pub async fn current_etag(&self, aggregate_id: AggregateId) -> Result<Option<ETag>, DomainError> {
        Ok(self
            .store
            .get_aggregate_version(aggregate_id)
            .await?
            .map(ETag::from_version))
    }

    /// Starts a new stream. The append fails if the stream already exists.
    pub async fn create<F>(
        &self,
        aggregate_id: AggregateId,
        ctx: &CommandContext,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A::Event: Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let aggregate = A::default();
        let events = command_fn(&aggregate).map_err(|e| self.rejected(e))?;

        self.persist(
            aggregate,
            aggregate_id,
            Version::initial(),
            events,
            ctx,
            AppendOptions::expect_new(),
        )
        .await
    }

    /// Runs a behavior against an existing stream under the tag protocol.
    pub async fn execute<F>(
        &self,
        aggregate_id: AggregateId,
        ctx: &CommandContext,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A::Event: Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let Some(current_version) = self.store.get_aggregate_version(aggregate_id).await? else {
            return Err(DomainError::AggregateNotFound {
                aggregate_type: A::aggregate_type(),
                aggregate_id: aggregate_id.to_string(),
            });
        };

        if let Some(expected) = ctx.expected_etag
            && expected.version() != current_version
        {
            metrics::counter!(
                "catalog_concurrency_conflicts_total",
                "aggregate" => A::aggregate_type(),
                "reason" => "precondition"
            )
            .increment(1);
            return Err(DomainError::PreconditionFailed {
                expected,
                actual: ETag::from_version(current_version),
            });
        }

        let envelopes = self
            .store
            .get_events_for_aggregate_up_to(aggregate_id, current_version)
            .await?;
        let aggregate = Self::hydrate(&envelopes)?;

        let events = command_fn(&aggregate).map_err(|e| self.rejected(e))?;

        self.persist(
            aggregate,
            aggregate_id,
            current_version,
            events,
            ctx,
            AppendOptions::expect_version(current_version),
        )
        .await
    }

    async fn persist(
        &self,
        mut aggregate: A,
        aggregate_id: AggregateId,
        current_version: Version,
        events: Vec<A::Event>,
        ctx: &CommandContext,
        options: AppendOptions,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A::Event: Serialize,
    {
        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                envelopes: vec![],
                new_version: current_version,
            });
        }

        let envelopes = self.build_envelopes(aggregate_id, current_version, &events, ctx)?;

        let new_version = match self.store.append(envelopes.clone(), options).await {
            Ok(version) => version,
            Err(e @ EventStoreError::ConcurrencyConflict { .. }) => {
                metrics::counter!(
                    "catalog_concurrency_conflicts_total",
                    "aggregate" => A::aggregate_type(),
                    "reason" => "append"
                )
                .increment(1);
                tracing::warn!(%aggregate_id, error = %e, "concurrent append rejected");
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        for event in &events {
            aggregate.apply(event.clone());
        }
        aggregate.set_version(new_version);

        metrics::counter!(
            "catalog_commands_total",
            "aggregate" => A::aggregate_type(),
            "outcome" => "committed"
        )
        .increment(1);

        Ok(CommandResult {
            aggregate,
            events,
            envelopes,
            new_version,
        })
    }

    fn rejected(&self, error: A::Error) -> DomainError
    where
        DomainError: From<A::Error>,
    {
        metrics::counter!(
            "catalog_commands_total",
            "aggregate" => A::aggregate_type(),
            "outcome" => "rejected"
        )
        .increment(1);
        DomainError::from(error)
    }

    /// Builds event envelopes from domain events.
    fn build_envelopes(
        &self,
        aggregate_id: AggregateId,
        current_version: Version,
        events: &[A::Event],
        ctx: &CommandContext,
    ) -> Result<Vec<EventEnvelope>, DomainError>
    where
        A::Event: Serialize,
    {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = current_version;

        for event in events {
            version = version.next();
            let envelope = EventEnvelope::builder()
                .aggregate_id(aggregate_id)
                .aggregate_type(A::aggregate_type())
                .event_type(event.event_type())
                .schema_version(event.schema_version())
                .version(version)
                .correlation_id(Some(ctx.correlation_id))
                .causation_id(ctx.causation_id)
                .payload(event)?
                .build();
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }
}
