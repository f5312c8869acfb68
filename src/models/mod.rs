pub mod booking;
pub mod chat;
pub mod conversation;
pub mod doctor;
pub mod intent;

pub use booking::Booking;
pub use chat::{ChatReply, ChatRequest};
pub use conversation::{ConversationState, Step};
pub use doctor::{Doctor, NewDoctor};
pub use intent::{ExtractedEntities, Intent};
