#![deny(unsafe_code)]

/// Window shell: sidebar, chat area and shell actions.
pub mod app;
pub mod chat;
pub mod sidebar;
