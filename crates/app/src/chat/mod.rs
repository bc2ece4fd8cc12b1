pub mod message_input;
pub mod message_list;
/// Coordinator wiring the controller to gpui tasks.
pub mod view;

pub use message_input::MessageInput;
pub use message_list::{MessageList, MessageRow};
pub use view::{ChatView, SessionChanged};
