mod handler;
mod model;

pub use handler::{ask, method_not_allowed};
pub use model::{ChatReply, ChatRequest, MAX_IMAGE_BYTES};
