pub mod database;
pub mod image;
pub mod providers;

pub use database::ConversationDb;
