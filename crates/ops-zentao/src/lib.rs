//! ops-zentao: ZenTao (禅道) adapter and tools for ops-bridge

pub mod client;
pub mod tools;
pub mod types;

pub use client::ZentaoClient;
pub use tools::{ZentaoOp, ZentaoTool, register_zentao_tools};
pub use types::{BugSummary, BugUpdate, NewBug, NewTask, Product, Project, Story, TaskSummary};
