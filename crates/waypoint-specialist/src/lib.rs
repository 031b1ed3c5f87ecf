//! Client side of the uniform specialist `/task` contract.
//!
//! Every downstream specialist (weather, packing, activities, budget,
//! transport) accepts a natural-language task plus optional context and
//! answers with a status, a text result and the sub-tools it called. This
//! crate owns the wire types for that contract and the HTTP client that turns
//! every transport or protocol failure into an error-flagged
//! [`SpecialistResult`] instead of an `Err`.
mod client;
mod contract;

pub use client::{HttpSpecialistClient, Specialist, SpecialistConfig, SpecialistError};
pub use contract::{
    parse_task_response, truncate_chars, HealthResponse, SpecialistHealth, SpecialistResult,
    TaskRequest, TaskResponse, ToolInvocation, TASK_STATUS_SUCCESS,
};
