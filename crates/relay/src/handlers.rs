//! Tool dispatch: call types in, JSON results out.
//!
//! Every handler resolves its target, performs the action and answers with
//! `{success, ...}`. Failures are encoded as handler errors and travel back
//! inside the result envelope; nothing here tears down the connection.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use relay_rpc::CallHandler;

use crate::errors::RelayError;
use crate::page::{PageHost, Target};

/// Routes the browser-facing call types onto a page context.
pub struct ToolRouter {
    page: PageHost,
}

#[derive(Deserialize)]
struct SnapshotArgs {
    #[serde(default)]
    selector: Option<String>,
}

#[derive(Deserialize)]
struct TargetArgs {
    #[serde(flatten)]
    target: Target,
}

#[derive(Deserialize)]
struct TypeArgs {
    #[serde(flatten)]
    target: Target,
    text: String,
}

#[derive(Deserialize)]
struct SelectArgs {
    #[serde(flatten)]
    target: Target,
    values: Vec<String>,
}

#[derive(Deserialize)]
struct NavigateArgs {
    html: String,
}

impl ToolRouter {
    pub fn new(page: PageHost) -> Self {
        Self { page }
    }

    async fn dispatch(&self, call_type: &str, payload: Value) -> Result<Value, RelayError> {
        match call_type {
            "snapshot" => {
                let args: SnapshotArgs = parse(payload)?;
                let snap = self.page.snapshot(args.selector).await?;
                Ok(json!({
                    "success": true,
                    "generation": snap.generation,
                    "refCount": snap.ref_count,
                    "snapshot": snap.text,
                }))
            }
            "click" => {
                let args: TargetArgs = parse(payload)?;
                let acted = self.page.click(args.target).await?;
                Ok(acted_json(&acted.role, acted.name, &acted.selector))
            }
            "type" => {
                let args: TypeArgs = parse(payload)?;
                let acted = self.page.type_text(args.target, args.text).await?;
                Ok(acted_json(&acted.role, acted.name, &acted.selector))
            }
            "select" => {
                let args: SelectArgs = parse(payload)?;
                let acted = self.page.select_options(args.target, args.values).await?;
                Ok(acted_json(&acted.role, acted.name, &acted.selector))
            }
            "navigate" => {
                let args: NavigateArgs = parse(payload)?;
                self.page.set_content(args.html).await?;
                info!(target: "tabwire-relay", "navigated to new document");
                Ok(json!({"success": true}))
            }
            other => Err(RelayError::BadArgs(format!("unknown call type {other:?}"))),
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, RelayError> {
    serde_json::from_value(payload).map_err(|err| RelayError::BadArgs(err.to_string()))
}

fn acted_json(role: &str, name: Option<String>, selector: &str) -> Value {
    json!({
        "success": true,
        "role": role,
        "name": name,
        "selector": selector,
    })
}

#[async_trait]
impl CallHandler for ToolRouter {
    async fn handle(&self, call_type: String, payload: Value) -> Result<Value, String> {
        self.dispatch(&call_type, payload).await.map_err(|err| {
            warn!(target: "tabwire-relay", call_type = %call_type, error = %err, "call failed");
            err.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> ToolRouter {
        ToolRouter::new(PageHost::spawn(
            r#"<button id="go">Go</button><input aria-label="Query">"#.to_string(),
        ))
    }

    #[tokio::test]
    async fn snapshot_call_returns_rendered_tree() {
        let result = router()
            .handle("snapshot".to_string(), json!({}))
            .await
            .unwrap();
        assert_eq!(result["success"], true);
        let text = result["snapshot"].as_str().unwrap();
        assert!(text.contains("- button \"Go\""), "got:\n{text}");
    }

    #[tokio::test]
    async fn click_by_selector_reports_role_and_name() {
        let result = router()
            .handle("click".to_string(), json!({"selector": "#go"}))
            .await
            .unwrap();
        assert_eq!(result["role"], "button");
        assert_eq!(result["name"], "Go");
    }

    #[tokio::test]
    async fn type_call_reaches_the_input() {
        let result = router()
            .handle(
                "type".to_string(),
                json!({"selector": "input", "text": "rust"}),
            )
            .await
            .unwrap();
        assert_eq!(result["role"], "textbox");
        assert_eq!(result["name"], "Query");
    }

    #[tokio::test]
    async fn unknown_call_type_is_a_handler_error() {
        let err = router()
            .handle("teleport".to_string(), json!({}))
            .await
            .unwrap_err();
        assert!(err.contains("teleport"), "got: {err}");
    }

    #[tokio::test]
    async fn bad_args_are_a_handler_error_not_a_panic() {
        let err = router()
            .handle("type".to_string(), json!({"selector": "input"}))
            .await
            .unwrap_err();
        assert!(err.contains("missing") || err.contains("text"), "got: {err}");
    }
}
