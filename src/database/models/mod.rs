pub mod apply;
pub mod macros;
pub mod record;
pub mod route;
pub mod schedule;
pub mod user;
pub mod work_pattern;

// Re-export all models for easy importing
pub use apply::*;
pub use record::*;
pub use route::*;
pub use schedule::*;
pub use user::*;
pub use work_pattern::*;
