//! Property-based tests for selection, registry, and cycle invariants
