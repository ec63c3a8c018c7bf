pub mod model;
pub mod relay;

pub use model::{Conversation, ConversationSummary, Message, UserPair};
pub use relay::MessageRelay;
