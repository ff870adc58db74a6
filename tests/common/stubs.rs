//! Hand-rolled stubs for the external services.

use async_trait::async_trait;
use std::collections::HashMap;
use vibezmaster_studio::chain::{ChainClient, ChainError, TxReceipt};
use vibezmaster_studio::gemini::{GenerativeModel, ModelError};

/// What the scripted model should do when invoked.
#[derive(Clone)]
pub enum ModelScript {
    /// Return this text as the model output.
    Reply(String),
    /// Fail with a connection error.
    Fail,
}

pub struct ScriptedModel {
    script: ModelScript,
}

impl ScriptedModel {
    pub fn new(script: ModelScript) -> Self {
        Self { script }
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_from_audio(
        &self,
        _mime_type: &str,
        _audio_b64: &str,
    ) -> Result<String, ModelError> {
        match &self.script {
            ModelScript::Reply(text) => Ok(text.clone()),
            ModelScript::Fail => Err(ModelError::Connection("scripted failure".to_string())),
        }
    }
}

/// In-memory chain: receipts keyed by lowercased transaction hash.
#[derive(Default)]
pub struct StubChainClient {
    receipts: HashMap<String, TxReceipt>,
    fail: bool,
}

impl StubChainClient {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            receipts: HashMap::new(),
            fail: true,
        }
    }

    pub fn with_receipt(mut self, receipt: TxReceipt) -> Self {
        self.receipts
            .insert(receipt.transaction_hash.to_lowercase(), receipt);
        self
    }
}

#[async_trait]
impl ChainClient for StubChainClient {
    async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>, ChainError> {
        if self.fail {
            return Err(ChainError::Connection("stub chain offline".to_string()));
        }
        Ok(self.receipts.get(&tx_hash.to_lowercase()).cloned())
    }
}
