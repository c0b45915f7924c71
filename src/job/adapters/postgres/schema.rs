//! Diesel schema for job persistence.

diesel::table! {
    /// Deferred jobs with their due-time index columns.
    agent_jobs (id) {
        /// Job identifier.
        id -> Uuid,
        /// Handler tag.
        #[max_length = 100]
        job_type -> Varchar,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Business context as a JSON object of strings.
        scope -> Jsonb,
        /// Handler payload.
        payload -> Jsonb,
        /// Earliest execution time; indexed together with `id`.
        due_at -> Timestamptz,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Latest change timestamp.
        updated_at -> Timestamptz,
        /// Claim timestamp.
        started_at -> Nullable<Timestamptz>,
        /// Terminal timestamp.
        finished_at -> Nullable<Timestamptz>,
        /// Bounded failure message.
        error -> Nullable<Text>,
        /// Result payload.
        result -> Nullable<Jsonb>,
        /// Checkpoint recorded when the job paused.
        checkpoint_id -> Nullable<Uuid>,
        /// Checkpoint a continuation resumes from.
        resume_from -> Nullable<Uuid>,
        /// Identifiers of prerequisite jobs.
        depends_on -> Array<Uuid>,
        /// Requesting actor.
        #[max_length = 255]
        requested_by -> Nullable<Varchar>,
        /// Creation token.
        #[max_length = 255]
        idempotency_key -> Nullable<Varchar>,
    }
}
