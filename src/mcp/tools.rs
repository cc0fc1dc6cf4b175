//! Tool catalog and dispatch.
//!
//! Four tools translate validated arguments into one BugBacon API call each.
//! The dispatcher is a hard error boundary: whatever fails inside a tool —
//! validation, timeout, HTTP status, network — is rendered as error-flagged
//! content and never propagates as a protocol-level failure.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::api::{ApiClient, ApiError};
use crate::utils::validate::{
    one_of, optional_string, require_number, require_string, safe_identifier, ValidationError,
};

/// Allowed `severity` values for submitted issues. No implicit default:
/// omission is a validation failure, not an auto-fill.
pub const SEVERITIES: &[&str] = &["low", "medium", "high", "critical"];

/// Allowed `type` values for submitted issues. Same rule: never defaulted.
pub const ISSUE_TYPES: &[&str] = &["bug", "vulnerability", "enhancement", "question"];

/// Allowed `status` values for issue transitions.
pub const STATUSES: &[&str] = &["open", "triaged", "in_progress", "resolved", "closed"];

/// An MCP tool that can be called by the client
pub struct Tool {
    /// Tool name (e.g., "submit_issue")
    pub name: &'static str,

    /// Human-readable description
    pub description: &'static str,

    /// JSON Schema for input parameters
    pub input_schema: Value,

    /// Handler that performs the API call
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool against the BugBacon API
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with already-structured arguments
    async fn execute(&self, args: &Map<String, Value>) -> Result<Value, ApiError>;
}

/// Registry for all MCP tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Arc<Vec<Tool>>,
}

impl ToolRegistry {
    /// Build the fixed four-tool catalog around one shared API client.
    pub fn new(client: Arc<ApiClient>) -> Self {
        let tools = vec![
            Tool {
                name: "submit_issue",
                description: "Report a new issue to the BugBacon platform",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "title": {
                            "type": "string",
                            "description": "Short issue title"
                        },
                        "description": {
                            "type": "string",
                            "description": "Full issue description"
                        },
                        "severity": {
                            "type": "string",
                            "description": "Issue severity",
                            "enum": SEVERITIES
                        },
                        "type": {
                            "type": "string",
                            "description": "Issue classification",
                            "enum": ISSUE_TYPES
                        },
                        "repo_id": {
                            "type": "string",
                            "description": "Repository to file the issue against (optional)"
                        }
                    },
                    "required": ["title", "description", "severity", "type"]
                }),
                handler: Arc::new(SubmitIssueHandler {
                    client: client.clone(),
                }),
            },
            Tool {
                name: "award_bacon",
                description: "Award bacon points to a contributor",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "contributor_id": {
                            "type": "string",
                            "description": "Contributor receiving the award"
                        },
                        "points": {
                            "type": "number",
                            "description": "Number of points to award (must be positive)"
                        },
                        "reason": {
                            "type": "string",
                            "description": "Why the points are being awarded"
                        }
                    },
                    "required": ["contributor_id", "points", "reason"]
                }),
                handler: Arc::new(AwardBaconHandler {
                    client: client.clone(),
                }),
            },
            Tool {
                name: "update_issue_status",
                description: "Move an issue to a new workflow status",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "issue_id": {
                            "type": "string",
                            "description": "Issue to update"
                        },
                        "status": {
                            "type": "string",
                            "description": "New status",
                            "enum": STATUSES
                        },
                        "comment": {
                            "type": "string",
                            "description": "Optional note explaining the transition"
                        }
                    },
                    "required": ["issue_id", "status"]
                }),
                handler: Arc::new(UpdateIssueStatusHandler {
                    client: client.clone(),
                }),
            },
            Tool {
                name: "add_comment",
                description: "Add a comment to an issue",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "issue_id": {
                            "type": "string",
                            "description": "Issue to comment on"
                        },
                        "comment": {
                            "type": "string",
                            "description": "Comment text"
                        }
                    },
                    "required": ["issue_id", "comment"]
                }),
                handler: Arc::new(AddCommentHandler { client }),
            },
        ];

        Self {
            tools: Arc::new(tools),
        }
    }

    /// Get all tools
    pub fn all(&self) -> &[Tool] {
        &self.tools
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Dispatch a tool call. This never fails: every failure inside a tool
    /// branch is converted into error-flagged content whose text carries the
    /// failure kind's label.
    pub async fn dispatch(&self, name: &str, args: Option<&Value>) -> Value {
        let Some(args) = args.and_then(Value::as_object) else {
            return error_content("Validation error: tool arguments must be an object");
        };

        let Some(tool) = self.get(name) else {
            return error_content(&format!("Unknown tool: {}", name));
        };

        match tool.handler.execute(args).await {
            Ok(value) => {
                let text = serde_json::to_string_pretty(&value)
                    .unwrap_or_else(|_| value.to_string());
                json!({
                    "content": [{"type": "text", "text": text}],
                    "isError": false
                })
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                error_content(&e.to_string())
            }
        }
    }
}

fn error_content(text: &str) -> Value {
    json!({
        "content": [{"type": "text", "text": text}],
        "isError": true
    })
}

/// Handler for reporting a new issue
struct SubmitIssueHandler {
    client: Arc<ApiClient>,
}

#[async_trait::async_trait]
impl ToolHandler for SubmitIssueHandler {
    async fn execute(&self, args: &Map<String, Value>) -> Result<Value, ApiError> {
        let title = require_string(args, "title")?;
        let description = require_string(args, "description")?;

        // severity and type classify how the report is handled downstream,
        // so they must be supplied explicitly.
        let severity = one_of(&require_string(args, "severity")?, "severity", SEVERITIES)?;
        let issue_type = one_of(&require_string(args, "type")?, "type", ISSUE_TYPES)?;

        let mut body = json!({
            "title": title,
            "description": description,
            "severity": severity,
            "type": issue_type,
        });

        // repo_id only travels in the JSON body, but gets the same character
        // restriction as path identifiers.
        if let Some(repo_id) = optional_string(args, "repo_id")? {
            let repo_id = safe_identifier(&repo_id, "repo_id")?;
            body["repo_id"] = Value::String(repo_id);
        }

        self.client.post("/issues", &body).await
    }
}

/// Handler for awarding bacon points to a contributor
struct AwardBaconHandler {
    client: Arc<ApiClient>,
}

#[async_trait::async_trait]
impl ToolHandler for AwardBaconHandler {
    async fn execute(&self, args: &Map<String, Value>) -> Result<Value, ApiError> {
        let contributor_id =
            safe_identifier(&require_string(args, "contributor_id")?, "contributor_id")?;

        let points = require_number(args, "points")?;
        if points <= 0.0 {
            return Err(ValidationError::NotPositive("points".to_string()).into());
        }

        let reason = require_string(args, "reason")?;

        // Keep the caller's original number representation in the body.
        let body = json!({
            "points": args["points"],
            "reason": reason,
        });

        // Awards are a sub-resource of the contributor, keeping the
        // association explicit instead of posting to a flat collection.
        let endpoint = format!("/contributors/{}/rewards", contributor_id);
        self.client.post(&endpoint, &body).await
    }
}

/// Handler for moving an issue through the workflow
struct UpdateIssueStatusHandler {
    client: Arc<ApiClient>,
}

#[async_trait::async_trait]
impl ToolHandler for UpdateIssueStatusHandler {
    async fn execute(&self, args: &Map<String, Value>) -> Result<Value, ApiError> {
        let issue_id = safe_identifier(&require_string(args, "issue_id")?, "issue_id")?;
        let status = one_of(&require_string(args, "status")?, "status", STATUSES)?;

        let mut body = json!({ "status": status });
        if let Some(comment) = optional_string(args, "comment")? {
            body["comment"] = Value::String(comment);
        }

        let endpoint = format!("/issues/{}", issue_id);
        self.client.patch(&endpoint, &body).await
    }
}

/// Handler for commenting on an issue
struct AddCommentHandler {
    client: Arc<ApiClient>,
}

#[async_trait::async_trait]
impl ToolHandler for AddCommentHandler {
    async fn execute(&self, args: &Map<String, Value>) -> Result<Value, ApiError> {
        let issue_id = safe_identifier(&require_string(args, "issue_id")?, "issue_id")?;
        let comment = require_string(args, "comment")?;

        let endpoint = format!("/issues/{}/comments", issue_id);
        self.client.post(&endpoint, &json!({ "comment": comment })).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn registry_for(base: &str) -> ToolRegistry {
        let config = Config {
            api_base_url: base.to_string(),
            api_key: None,
        };
        ToolRegistry::new(Arc::new(ApiClient::new(&config).unwrap()))
    }

    fn offline_registry() -> ToolRegistry {
        // Points at nothing; only validation-path tests use this.
        registry_for("http://127.0.0.1:1")
    }

    #[test]
    fn test_catalog_has_four_tools() {
        let registry = offline_registry();
        let names: Vec<&str> = registry.all().iter().map(|t| t.name).collect();
        assert_eq!(names.len(), 4);
        for name in ["submit_issue", "award_bacon", "update_issue_status", "add_comment"] {
            assert!(names.contains(&name), "missing {}", name);
        }
    }

    #[test]
    fn test_catalog_is_idempotent() {
        let registry = offline_registry();
        let first: Vec<Value> = registry
            .all()
            .iter()
            .map(|t| json!({"name": t.name, "schema": t.input_schema}))
            .collect();
        let second: Vec<Value> = registry
            .all()
            .iter()
            .map(|t| json!({"name": t.name, "schema": t.input_schema}))
            .collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_content_not_failure() {
        let registry = offline_registry();
        let result = registry
            .dispatch("nonexistent_tool", Some(&json!({})))
            .await;

        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_missing_arguments_is_error_content() {
        let registry = offline_registry();
        let result = registry.dispatch("submit_issue", None).await;
        assert_eq!(result["isError"], true);

        let result = registry
            .dispatch("submit_issue", Some(&json!("not-an-object")))
            .await;
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn test_submit_issue_has_no_severity_default() {
        let registry = offline_registry();
        let result = registry
            .dispatch(
                "submit_issue",
                Some(&json!({
                    "title": "t", "description": "d", "type": "bug"
                })),
            )
            .await;

        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Validation error"));
        assert!(text.contains("severity"));
    }

    #[tokio::test]
    async fn test_submit_issue_has_no_type_default() {
        let registry = offline_registry();
        let result = registry
            .dispatch(
                "submit_issue",
                Some(&json!({
                    "title": "t", "description": "d", "severity": "high"
                })),
            )
            .await;

        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("type"));
    }

    #[tokio::test]
    async fn test_submit_issue_rejects_unknown_enum_value() {
        let registry = offline_registry();
        let result = registry
            .dispatch(
                "submit_issue",
                Some(&json!({
                    "title": "t", "description": "d",
                    "severity": "catastrophic", "type": "bug"
                })),
            )
            .await;

        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("must be one of"));
    }

    #[tokio::test]
    async fn test_submit_issue_round_trip_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/issues")
            .match_body(mockito::Matcher::Json(json!({
                "title": "t",
                "description": "d",
                "severity": "high",
                "type": "bug"
            })))
            .with_status(201)
            .with_body(r#"{"id": "77"}"#)
            .expect(1)
            .create_async()
            .await;

        let registry = registry_for(&server.url());
        let result = registry
            .dispatch(
                "submit_issue",
                Some(&json!({
                    "title": "t", "description": "d",
                    "severity": "high", "type": "bug"
                })),
            )
            .await;

        mock.assert_async().await;
        assert_eq!(result["isError"], false);
        assert!(result["content"][0]["text"].as_str().unwrap().contains("77"));
    }

    #[tokio::test]
    async fn test_award_bacon_posts_to_contributor_subresource() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/contributors/42/rewards")
            .match_body(mockito::Matcher::Json(json!({
                "points": 10,
                "reason": "x"
            })))
            .with_status(201)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let registry = registry_for(&server.url());
        let result = registry
            .dispatch(
                "award_bacon",
                Some(&json!({"contributor_id": "42", "points": 10, "reason": "x"})),
            )
            .await;

        mock.assert_async().await;
        assert_eq!(result["isError"], false);
    }

    #[tokio::test]
    async fn test_award_bacon_rejects_non_positive_points() {
        let registry = offline_registry();
        for points in [json!(0), json!(-5), json!(-0.5)] {
            let result = registry
                .dispatch(
                    "award_bacon",
                    Some(&json!({"contributor_id": "42", "points": points, "reason": "x"})),
                )
                .await;
            assert_eq!(result["isError"], true, "accepted points={}", points);
            assert!(result["content"][0]["text"]
                .as_str()
                .unwrap()
                .contains("positive"));
        }
    }

    #[tokio::test]
    async fn test_award_bacon_validates_contributor_identifier() {
        let registry = offline_registry();
        let result = registry
            .dispatch(
                "award_bacon",
                Some(&json!({
                    "contributor_id": "42/../../admin",
                    "points": 10,
                    "reason": "x"
                })),
            )
            .await;

        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Validation error"));
    }

    #[tokio::test]
    async fn test_update_issue_status_patches_issue() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/issues/abc123")
            .match_body(mockito::Matcher::Json(json!({
                "status": "resolved",
                "comment": "fixed in 1.2.3"
            })))
            .with_status(200)
            .with_body(r#"{"id": "abc123", "status": "resolved"}"#)
            .expect(1)
            .create_async()
            .await;

        let registry = registry_for(&server.url());
        let result = registry
            .dispatch(
                "update_issue_status",
                Some(&json!({
                    "issue_id": "abc123",
                    "status": "resolved",
                    "comment": "fixed in 1.2.3"
                })),
            )
            .await;

        mock.assert_async().await;
        assert_eq!(result["isError"], false);
    }

    #[tokio::test]
    async fn test_update_issue_status_rejects_unknown_status() {
        let registry = offline_registry();
        let result = registry
            .dispatch(
                "update_issue_status",
                Some(&json!({"issue_id": "abc123", "status": "done"})),
            )
            .await;
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn test_add_comment_posts_to_issue_comments() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/issues/abc123/comments")
            .match_body(mockito::Matcher::Json(json!({"comment": "looks good"})))
            .with_status(201)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let registry = registry_for(&server.url());
        let result = registry
            .dispatch(
                "add_comment",
                Some(&json!({"issue_id": "abc123", "comment": "looks good"})),
            )
            .await;

        mock.assert_async().await;
        assert_eq!(result["isError"], false);
    }

    #[tokio::test]
    async fn test_http_failure_label_includes_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/issues/abc123/comments")
            .with_status(502)
            .create_async()
            .await;

        let registry = registry_for(&server.url());
        let result = registry
            .dispatch(
                "add_comment",
                Some(&json!({"issue_id": "abc123", "comment": "c"})),
            )
            .await;

        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("HTTP 502"), "got: {}", text);
    }

    #[tokio::test]
    async fn test_network_failure_label() {
        let registry = offline_registry();
        let result = registry
            .dispatch(
                "add_comment",
                Some(&json!({"issue_id": "abc123", "comment": "c"})),
            )
            .await;

        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Network error"));
    }
}
