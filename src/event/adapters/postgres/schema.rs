//! Diesel schema for the event log.

diesel::table! {
    /// Append-only audit events, indexed by `(scope_id, created_at, id)`.
    agent_events (id) {
        /// Event identifier.
        id -> Uuid,
        /// Partition key.
        #[max_length = 255]
        scope_id -> Varchar,
        /// Event tag.
        #[max_length = 100]
        event_type -> Varchar,
        /// Event payload.
        payload -> Jsonb,
        /// Producing tool.
        #[max_length = 255]
        tool -> Nullable<Varchar>,
        /// Redacted tool inputs.
        redacted_inputs -> Nullable<Jsonb>,
        /// Redacted tool outputs.
        redacted_outputs -> Nullable<Jsonb>,
        /// Policy-check results.
        policy_checks -> Jsonb,
        /// Confidence flags.
        confidence_flags -> Array<Text>,
        /// Downstream effects.
        downstream_effects -> Jsonb,
        /// Creating actor.
        #[max_length = 255]
        created_by -> Nullable<Varchar>,
        /// Correlation identifier.
        #[max_length = 255]
        correlation_id -> Nullable<Varchar>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
