//! Unit tests for the runner module.
