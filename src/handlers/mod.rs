pub mod applies;
pub mod attendance;
pub mod records;
pub mod shared;
