pub mod attendance;
pub mod payload;
