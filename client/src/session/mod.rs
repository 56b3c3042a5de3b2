pub mod guard;
pub mod manager;
pub mod state;

pub use guard::{Navigation, Route, guard};
pub use manager::{SessionError, SessionManager};
pub use state::{Credentials, ProfileUpdate, SessionSnapshot, SignupRequest, UserProfile};
