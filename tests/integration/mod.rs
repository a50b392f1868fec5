//! Integration tests for storage node records

mod cli_contracts;
mod node_lifecycle;
