mod client;
mod types;

pub use client::UpstreamClient;
pub use types::{ChatMessage, ContentPart, ImageUrl, MessageContent};
