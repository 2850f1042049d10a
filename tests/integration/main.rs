//! End-to-end tests across all layers.
