//! PostgreSQL store implementations.

pub mod chat;
pub mod consultant;
pub mod notification;
pub mod room;
pub mod session;

pub use chat::ChatRepository;
pub use consultant::ConsultantRepository;
pub use notification::NotificationRepository;
pub use room::RoomRepository;
pub use session::SessionRepository;
