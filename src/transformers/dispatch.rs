//! Dispatching facade over the transformer registry.

use std::sync::Arc;

use super::{ResponseHandler, SmsTransformer, TransformContext};
use crate::config::Account;
use crate::error::SmsError;
use crate::registry::TransformerRegistry;
use crate::types::{HttpRequestSpec, Message};

/// Routes each message to the transformer registered for its sub-provider.
///
/// Only SMS [`Message`]s can reach this type, so there is no runtime check
/// for other provider kinds.
#[derive(Clone)]
pub struct SmsDispatchTransformer {
    registry: Arc<TransformerRegistry>,
}

impl SmsDispatchTransformer {
    pub fn new(registry: Arc<TransformerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TransformerRegistry {
        &self.registry
    }

    /// Resolve the transformer for `msg`.
    pub fn resolve(&self, msg: &Message) -> Result<Arc<dyn SmsTransformer>, SmsError> {
        if msg.sub_provider.is_empty() {
            return Err(SmsError::MissingSubProvider);
        }
        let transformer =
            self.registry
                .get(&msg.sub_provider)
                .ok_or_else(|| SmsError::UnsupportedSubProvider {
                    provider: msg.sub_provider.clone(),
                })?;
        if !transformer.can_transform(msg) {
            return Err(SmsError::UnsupportedSubProvider {
                provider: msg.sub_provider.clone(),
            });
        }
        Ok(transformer)
    }

    pub fn transform(
        &self,
        ctx: &TransformContext,
        msg: &Message,
        account: &Account,
    ) -> Result<(HttpRequestSpec, ResponseHandler), SmsError> {
        let transformer = self.resolve(msg)?;
        transformer
            .transform(ctx, msg, account)
            .map_err(|e| e.with_provider(&msg.sub_provider))
    }
}

impl Default for SmsDispatchTransformer {
    fn default() -> Self {
        Self::new(Arc::new(TransformerRegistry::with_builtin()))
    }
}
