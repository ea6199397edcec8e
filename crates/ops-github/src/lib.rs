//! ops-github: GitHub adapter and tools for ops-bridge
//!
//! This crate wraps the GitHub REST and GraphQL APIs behind [`GitHubClient`]
//! and exposes them as tools through [`register_github_tools`].

pub mod client;
pub mod tools;
pub mod types;

pub use client::{CommitQuery, GitHubClient, IssueUpdate, NewIssue};
pub use tools::{GitHubOp, GitHubTool, register_github_tools};
pub use types::*;
