//! Unit tests for the event log.
