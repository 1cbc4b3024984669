//! Shared test utilities for gfd-db tests.
