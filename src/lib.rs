//! # smsmux - A Unified SMS Dispatch Library
//!
//! smsmux sends SMS, voice and MMS notifications through a pool of accounts
//! spread over regional telecom vendors, behind one message type and one
//! `send` call.
//!
#![deny(unsafe_code)]

//! ## Features
//!
//! - **Account Pools**: Round-robin, weighted or random selection per vendor, with per-call account preference.
//! - **Vendor Transformers**: Each vendor turns a [`Message`] into a signed HTTP request and judges its response.
//! - **Open Registry**: Register your own transformer under a new tag without touching the dispatcher.
//! - **Cancellation**: Every send honours a cancellation token and an optional deadline.
//! - **HTTP Customization**: Bring your own reqwest client, interceptors or a full custom transport.
//! - **Typed Errors**: One error enum with stable codes and a retryability flag for the caller's retry policy.
//!
//! Built-in sub-providers: `aliyun`, `tencent`, `huawei`, `submail`, `cl253`,
//! `luosimao`, `smsbao`, `juhe`, `yunpian`, `ucp`, `yuntongxun`, `netease`
//! and the generic `normal` HTTP channel.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smsmux::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SmsConfig::from_json_str(
//!         r#"{
//!             "strategy": "weighted",
//!             "items": [
//!                 {"name": "primary", "sub_type": "aliyun", "weight": 3,
//!                  "api_key": "your-access-key", "api_secret": "your-secret"}
//!             ]
//!         }"#,
//!     )?;
//!     let provider = SmsProvider::new(config)?;
//!
//!     let msg = Message::builder("aliyun")
//!         .mobile("13800138000")
//!         .sign_name("Acme")
//!         .template_id("SMS_123456")
//!         .param("code", "1234")
//!         .build();
//!     let receipt = provider
//!         .send(&SendContext::new(), &msg, &SendOptions::default())
//!         .await?;
//!     println!("sent via {}", receipt.account);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod executors;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod selector;
pub mod transformers;
pub mod types;
pub mod utils;

pub use config::{Account, SmsConfig, Strategy};
pub use error::{ErrorCategory, SmsError};
pub use provider::{SendOptions, SendReceipt, SmsProvider, SmsProviderBuilder};
pub use registry::{TransformerRegistry, register_transformer};
pub use transformers::{ResponseHandler, SmsTransformer, TransformContext};
pub use types::{Category, ExtraValue, HttpRequestSpec, Message, MessageBuilder, MessageType};
pub use utils::cancel::SendContext;

/// Commonly used types.
pub mod prelude {
    pub use crate::config::{Account, SmsConfig, Strategy};
    pub use crate::error::SmsError;
    pub use crate::provider::{SendOptions, SendReceipt, SmsProvider};
    pub use crate::types::{Category, Message, MessageType};
    pub use crate::utils::cancel::SendContext;
}
