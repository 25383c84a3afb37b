//! Judging.
//!
//! The execution service is an external collaborator behind the
//! `ExecutionService` trait. The dispatcher bounds every call with a deadline
//! and makes it cancellable.

pub mod adapter;
pub mod dispatcher;
pub mod http;

pub use adapter::{ExecutionService, JudgeRequest, JudgeResponse};
pub use dispatcher::{DispatchCanceller, PendingDispatch, SubmissionDispatcher};
pub use http::HttpExecutionService;
