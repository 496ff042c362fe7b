//! RegDesk core library — transport-agnostic registration logic.
//!
//! `regdesk-core` holds everything about the college registration workflow
//! that does not depend on HTTP: request throttling, the student lifecycle,
//! and the seams to persistence and photo storage.
//!
//! # Modules
//!
//! - [`ratelimit`] — sliding-window limiter, per-call-site policies, periodic sweeper.
//! - [`student`] — records, registration validation, lifecycle transitions, id generation.
//! - [`service`] — [`Students`], the operations the web layer calls.
//! - [`store`] — [`StudentStore`] trait and the in-memory implementation.
//! - [`photo`] — upload validation and the [`PhotoStore`] trait.
//! - [`access`] — departments, admin roles and scopes.
//! - [`clock`] — injectable time source.
//! - [`error`] — unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod access;
pub mod clock;
pub mod error;
pub mod photo;
pub mod ratelimit;
pub mod service;
pub mod store;
pub mod student;

pub use access::{Department, Role, Scope};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use photo::{InlinePhotoStore, PhotoStore, PhotoUpload};
pub use ratelimit::{Decision, PolicyLimiter, RateLimitPolicy, RateLimiter, SweepHandle, Sweeper};
pub use service::Students;
pub use store::{MemoryStudentStore, StudentStore};
pub use student::{DocumentCheck, Lookup, NewStudent, Status, StudentRecord, Transition};
