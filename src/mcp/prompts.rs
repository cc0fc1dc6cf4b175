//! Prompt catalog and rendering.
//!
//! Three named templates turn prompt arguments into triage guidance for an
//! agent. `plan_remediation` is the one prompt that talks to the API: it
//! looks the issue up to enrich the template, and degrades to an inline note
//! when that lookup fails instead of failing the whole prompt.

use std::collections::HashMap;

use crate::api::{ApiClient, ApiError};
use crate::utils::validate::{safe_identifier, ValidationError};

/// Argument declaration for one prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptArgumentSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

/// One entry in the static prompt catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: Vec<PromptArgumentSpec>,
}

/// A rendered prompt: one user-role message.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    pub description: &'static str,
    pub text: String,
}

/// Static prompt catalog.
pub fn list_prompts() -> Vec<PromptEntry> {
    vec![
        PromptEntry {
            name: "triage_vulnerability",
            description: "Analyze a reported vulnerability and recommend a severity",
            arguments: vec![
                PromptArgumentSpec {
                    name: "vulnerability_description",
                    description: "Description of the reported vulnerability",
                    required: true,
                },
                PromptArgumentSpec {
                    name: "affected_component",
                    description: "Component or subsystem affected",
                    required: false,
                },
            ],
        },
        PromptEntry {
            name: "plan_remediation",
            description: "Draft a remediation plan for an existing issue",
            arguments: vec![
                PromptArgumentSpec {
                    name: "issue_id",
                    description: "Identifier of the issue to remediate",
                    required: true,
                },
                PromptArgumentSpec {
                    name: "context",
                    description: "Extra context to fold into the plan",
                    required: false,
                },
            ],
        },
        PromptEntry {
            name: "review_contribution",
            description: "Evaluate a contribution for quality and reward-worthiness",
            arguments: vec![
                PromptArgumentSpec {
                    name: "contribution_id",
                    description: "Identifier of the contribution under review",
                    required: true,
                },
                PromptArgumentSpec {
                    name: "contribution_type",
                    description: "Kind of contribution (fix, report, review, ...)",
                    required: false,
                },
            ],
        },
    ]
}

fn required_arg(args: &HashMap<String, String>, name: &str) -> Result<String, ValidationError> {
    match args.get(name).map(|s| s.trim()) {
        None => Err(ValidationError::MissingField(name.to_string())),
        Some("") => Err(ValidationError::BlankField(name.to_string())),
        Some(v) => Ok(v.to_string()),
    }
}

fn optional_arg(args: &HashMap<String, String>, name: &str) -> Option<String> {
    args.get(name)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Render a prompt by name. Unknown names fail fast: they indicate a
/// client/catalog mismatch, not bad user input.
pub async fn get_prompt(
    client: &ApiClient,
    name: &str,
    args: &HashMap<String, String>,
) -> Result<RenderedPrompt, ApiError> {
    match name {
        "triage_vulnerability" => triage_vulnerability(args),
        "plan_remediation" => plan_remediation(client, args).await,
        "review_contribution" => review_contribution(args),
        _ => Err(ApiError::Other(format!("Unknown prompt: {}", name))),
    }
}

fn triage_vulnerability(args: &HashMap<String, String>) -> Result<RenderedPrompt, ApiError> {
    let description = required_arg(args, "vulnerability_description")?;
    let component =
        optional_arg(args, "affected_component").unwrap_or_else(|| "an unspecified component".to_string());

    let text = format!(
        "You are triaging a vulnerability reported against {component} on the \
         BugBacon platform.\n\n\
         Reported vulnerability:\n{description}\n\n\
         Work through the following five points:\n\
         1. Summarize the vulnerability and its attack vector in plain terms.\n\
         2. Assess exploitability: what access or preconditions does an attacker need?\n\
         3. Estimate the impact on confidentiality, integrity and availability.\n\
         4. Recommend a severity (low, medium, high or critical) and justify it.\n\
         5. Suggest immediate mitigations and who should own the permanent fix."
    );

    Ok(RenderedPrompt {
        description: "Vulnerability triage analysis",
        text,
    })
}

async fn plan_remediation(
    client: &ApiClient,
    args: &HashMap<String, String>,
) -> Result<RenderedPrompt, ApiError> {
    let issue_id = safe_identifier(&required_arg(args, "issue_id")?, "issue_id")?;

    // Enrich with the real issue where possible; a failed lookup turns into
    // an inline note rather than failing the prompt.
    let details = match client.get(&format!("/issues/{}", issue_id)).await {
        Ok(issue) => serde_json::to_string_pretty(&issue)
            .unwrap_or_else(|_| issue.to_string()),
        Err(e) => {
            tracing::debug!(issue_id = %issue_id, error = %e, "issue lookup for prompt failed");
            format!("(could not fetch details: {})", e)
        }
    };

    let mut text = format!(
        "Draft a remediation plan for BugBacon issue {issue_id}.\n\n\
         Issue details:\n{details}\n\n\
         The plan should cover: root cause analysis, the proposed fix, \
         testing strategy, rollout steps, and how to prevent regressions."
    );

    if let Some(context) = optional_arg(args, "context") {
        text.push_str("\n\nAdditional context:\n");
        text.push_str(&context);
    }

    Ok(RenderedPrompt {
        description: "Issue remediation plan",
        text,
    })
}

fn review_contribution(args: &HashMap<String, String>) -> Result<RenderedPrompt, ApiError> {
    let contribution_id = required_arg(args, "contribution_id")?;
    let contribution_type =
        optional_arg(args, "contribution_type").unwrap_or_else(|| "contribution".to_string());

    let text = format!(
        "Review the {contribution_type} with ID {contribution_id} on the BugBacon \
         platform.\n\n\
         Evaluate it on five points:\n\
         1. Correctness: does it do what it claims, without side effects?\n\
         2. Completeness: are edge cases and failure modes covered?\n\
         3. Clarity: is the work understandable to the next maintainer?\n\
         4. Impact: how much does it move the project forward?\n\
         5. Reward: how many bacon points does it merit, and why?"
    );

    Ok(RenderedPrompt {
        description: "Contribution review",
        text,
    })
}
