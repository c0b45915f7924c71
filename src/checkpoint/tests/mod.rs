//! Unit tests for checkpoints.
