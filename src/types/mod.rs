//! Shared data types: messages, extras, and HTTP request/result shapes.

pub mod extras;
pub mod http;
pub mod message;

pub use extras::{ExtraValue, Extras};
pub use http::{BodyType, FormParams, HttpRequestSpec, SendResult};
pub use message::{Category, Message, MessageBuilder, MessageType};
