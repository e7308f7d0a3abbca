//! Integration tests for the fleet CLI
//!
//! These tests spawn the actual binary. None of them reach a remote host:
//! they stop at argument parsing, fleet file loading or `--dry-run`.

mod plan_command;
