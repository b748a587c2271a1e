//! State Tool
//!
//! Dispatches tool-call argument records (`action`, `key`, `value`, `ttl`) to
//! the store and renders every outcome, failures included, as a JSON string.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{Result, StateError};
use crate::models::{
    Action, ClearResponse, DeleteResponse, ErrorResponse, GetResponse, MetaResponse,
    SetResponse, ToolRequest,
};
use crate::store::{StoreHandle, DEFAULT_AGENT};

/// Registration record a tool host needs: name, description and argument schema.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Persistent key-value tool shared by every agent session in a project.
#[derive(Clone)]
pub struct StateTool {
    handle: StoreHandle,
}

impl StateTool {
    pub const NAME: &'static str = "state";

    pub fn new(handle: StoreHandle) -> Self {
        Self { handle }
    }

    /// Describes the tool for registration with a host.
    pub fn spec() -> ToolSpec {
        let actions: Vec<&str> = Action::ALL.iter().map(|a| a.as_str()).collect();
        ToolSpec {
            name: Self::NAME.to_string(),
            description: "Agent-only persistent state database with TTL, metadata, and size \
                          limits. Shares data between sessions and agents working in the \
                          same project."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "enum": actions,
                        "description": "The operation to perform on the state store."
                    },
                    "key": {
                        "type": "string",
                        "description": "The unique key. Required for get, set, del and meta."
                    },
                    "value": {
                        "description": "Any JSON value to store. Required for set."
                    },
                    "ttl": {
                        "type": "number",
                        "minimum": 0,
                        "description": "Time-to-live in whole milliseconds (set only); 0 means no expiry."
                    }
                },
                "required": ["action"]
            }),
        }
    }

    /// Runs a call given its raw JSON arguments.
    ///
    /// Malformed arguments and unknown actions come back as `{"error": ...}`.
    pub async fn invoke_json(&self, arguments: &str, agent: Option<&str>) -> String {
        match serde_json::from_str::<ToolRequest>(arguments) {
            Ok(request) => self.invoke(request, agent).await,
            Err(e) => {
                warn!("Rejected state tool arguments: {}", e);
                render(&ErrorResponse::new(format!("Invalid arguments: {}", e)))
            }
        }
    }

    /// Runs a call and renders the outcome as a JSON string.
    pub async fn invoke(&self, request: ToolRequest, agent: Option<&str>) -> String {
        let action = request.action;
        let agent = agent.unwrap_or(DEFAULT_AGENT);
        debug!(%action, agent, "State tool call");

        match self.execute(request, agent).await {
            Ok(body) => body,
            Err(err) => {
                warn!(%action, agent, "State tool call failed: {}", err);
                render(&ErrorResponse::from(&err))
            }
        }
    }

    async fn execute(&self, request: ToolRequest, agent: &str) -> Result<String> {
        // Argument checks come before the store is touched
        let ToolRequest {
            action,
            key,
            value,
            ttl,
        } = request;

        match action {
            Action::Set => {
                let key = required_key(key)?;
                let value =
                    value.ok_or_else(|| StateError::Validation("value is required".to_string()))?;
                let store = self.handle.store().await?;
                let outcome = store.set(&key, &value, ttl, agent).await?;
                Ok(render(&SetResponse::from(outcome)))
            }
            Action::Get => {
                let key = required_key(key)?;
                let stored = self.handle.store().await?.get(&key).await?;
                Ok(render(&GetResponse::from(stored)))
            }
            Action::Meta => {
                let key = required_key(key)?;
                let meta = self.handle.store().await?.meta(&key).await?;
                Ok(render(&MetaResponse::from(meta)))
            }
            Action::List => {
                let entries = self.handle.store().await?.list().await?;
                Ok(render(&entries))
            }
            Action::Del => {
                let key = required_key(key)?;
                let deleted = self.handle.store().await?.delete(&key).await?;
                Ok(render(&DeleteResponse::new(key, deleted)))
            }
            Action::Clear => {
                let cleared = self.handle.store().await?.clear().await?;
                Ok(render(&ClearResponse::new(cleared)))
            }
        }
    }
}

fn required_key(key: Option<String>) -> Result<String> {
    key.filter(|k| !k.is_empty())
        .ok_or_else(|| StateError::Validation("key is required".to_string()))
}

fn render<T: Serialize + ?Sized>(body: &T) -> String {
    serde_json::to_string(body)
        .unwrap_or_else(|e| json!({ "error": format!("Failed to encode response: {}", e) }).to_string())
}
