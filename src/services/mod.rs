pub mod ai;
pub mod availability;
pub mod booking;
pub mod conversation;
pub mod session;
pub mod slots;
