pub mod booking;
pub mod order;
pub mod session;
