//! Workspace-level integration tests for texbatch live under `tests/`.
