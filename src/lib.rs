// SeaTable MCP Gateway - Library Root
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// All modules exported here for use by the binary and tests.

pub mod error;
pub mod token;
pub mod config;
pub mod resolve;
pub mod column;
pub mod seatable;
pub mod cache;
pub mod tools;
pub mod mcp;

#[cfg(test)]
mod testing;
