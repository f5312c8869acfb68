pub mod bookings;
pub mod chat;
pub mod doctors;
pub mod health;
