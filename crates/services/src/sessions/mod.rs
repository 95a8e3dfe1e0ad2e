mod service;
mod store;
mod sweeper;
mod view;

// Public API of the session subsystem.
pub use crate::error::{StoreError, TestError};
pub use service::TestService;
pub use store::SessionStore;
pub use sweeper::{spawn_session_sweeper, sweep_expired_sessions};
pub use view::{SessionStatus, StartTestRequest, StartedTest, SubmitTestRequest};
