#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod sessions;

pub use exam_core::Clock;

pub use app_services::AppServices;
pub use config::TestPolicy;
pub use error::{AppServicesError, StoreError, TestError};
pub use sessions::{
    SessionStatus, SessionStore, StartTestRequest, StartedTest, SubmitTestRequest, TestService,
    spawn_session_sweeper, sweep_expired_sessions,
};
