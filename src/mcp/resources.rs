//! Resource catalog and URI routing.
//!
//! Resources are read-only views over the BugBacon API, addressed as
//! `bugbacon://<type>[/<id>]`. The catalog lists only concrete collection
//! URIs — never `{id}`-style templates, since a client dereferencing a
//! template verbatim would send the placeholder text as an identifier.

use serde_json::Value;

use crate::api::{ApiClient, ApiError};
use crate::utils::validate::safe_identifier;

/// URI scheme for all BugBacon resources.
pub const RESOURCE_SCHEME: &str = "bugbacon";

/// One entry in the static resource catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEntry {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

/// Content returned by a successful resource read.
#[derive(Debug, Clone)]
pub struct ResourceContents {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}

/// The six resource types and their collection endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ResourceKind {
    Issues,
    Repos,
    Contributors,
    Workflows,
    Leaderboards,
    Rewards,
}

impl ResourceKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "issues" => Some(Self::Issues),
            "repos" => Some(Self::Repos),
            "contributors" => Some(Self::Contributors),
            "workflows" => Some(Self::Workflows),
            "leaderboards" => Some(Self::Leaderboards),
            "rewards" => Some(Self::Rewards),
            _ => None,
        }
    }

    fn collection_endpoint(self) -> &'static str {
        match self {
            Self::Issues => "/issues",
            Self::Repos => "/repos",
            Self::Contributors => "/contributors",
            Self::Workflows => "/workflows",
            Self::Leaderboards => "/leaderboards",
            Self::Rewards => "/rewards",
        }
    }

    /// Leaderboards and rewards are collection-only.
    fn supports_identifier(self) -> bool {
        !matches!(self, Self::Leaderboards | Self::Rewards)
    }
}

/// Static resource catalog. Collection URIs only.
pub fn list_resources() -> Vec<ResourceEntry> {
    vec![
        ResourceEntry {
            uri: "bugbacon://issues",
            name: "Issues",
            description: "All reported issues on the BugBacon platform",
            mime_type: "application/json",
        },
        ResourceEntry {
            uri: "bugbacon://repos",
            name: "Repositories",
            description: "Repositories registered for bounty tracking",
            mime_type: "application/json",
        },
        ResourceEntry {
            uri: "bugbacon://contributors",
            name: "Contributors",
            description: "Contributors and their bacon point totals",
            mime_type: "application/json",
        },
        ResourceEntry {
            uri: "bugbacon://workflows",
            name: "Workflows",
            description: "Triage and remediation workflow definitions",
            mime_type: "application/json",
        },
        ResourceEntry {
            uri: "bugbacon://leaderboards",
            name: "Leaderboards",
            description: "Contributor rankings by bacon points",
            mime_type: "application/json",
        },
        ResourceEntry {
            uri: "bugbacon://rewards",
            name: "Rewards",
            description: "All bacon point awards",
            mime_type: "application/json",
        },
    ]
}

/// Map a resource URI onto its API endpoint path.
///
/// Malformed URIs and unknown types fail with a generic error; an identifier
/// segment must pass identifier validation before it is appended to the
/// collection endpoint.
fn endpoint_for(uri: &str) -> Result<String, ApiError> {
    let rest = uri
        .strip_prefix(RESOURCE_SCHEME)
        .and_then(|r| r.strip_prefix("://"))
        .ok_or_else(|| ApiError::Other(format!("Unknown resource URI: {}", uri)))?;

    let (kind_str, id) = match rest.split_once('/') {
        Some((kind, id)) => (kind, Some(id)),
        None => (rest, None),
    };

    let kind = ResourceKind::parse(kind_str)
        .ok_or_else(|| ApiError::Other(format!("Unknown resource type: {}", kind_str)))?;

    match id {
        None => Ok(kind.collection_endpoint().to_string()),
        Some(id) => {
            if !kind.supports_identifier() {
                return Err(ApiError::Other(format!(
                    "Resource type '{}' does not take an identifier",
                    kind_str
                )));
            }
            let id = safe_identifier(id, "resource identifier")?;
            Ok(format!("{}/{}", kind.collection_endpoint(), id))
        }
    }
}

/// Read a resource: route the URI, perform one API call, wrap the outcome as
/// JSON text tagged with the original URI.
pub async fn read_resource(client: &ApiClient, uri: &str) -> Result<ResourceContents, ApiError> {
    let endpoint = endpoint_for(uri)?;

    let value: Value = client
        .get(&endpoint)
        .await
        .map_err(|e| ApiError::Other(format!("failed to read resource {}: {}", uri, e)))?;

    let text = serde_json::to_string_pretty(&value)
        .map_err(|e| ApiError::Other(format!("failed to read resource {}: {}", uri, e)))?;

    Ok(ResourceContents {
        uri: uri.to_string(),
        mime_type: "application/json".to_string(),
        text,
    })
}
