use feedless_core::compose::split_default;
use feedless_core::models::{DeleteContent, PostContent};
use feedless_core::store::LogWriter;
use feedless_core::{Content, EntryFilter, LogRecord, Profile, Queries, QueryResult};
use serde::Deserialize;
use tracing::info;

use super::protocol::ApiResponse;

/// Read-only query shared by the CLI subcommands and the HTTP routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Resolved profile, bare when resolution fails
    Profile { id: String },
    Posts { id: String },
    Vanishing { id: String },
    Friends { id: String },
    Status { source: String, dest: String },
    Search { query: String },
    Entries { filter: EntryFilter },
}

impl CliCommand {
    pub async fn execute(&self, queries: &Queries) -> ApiResponse {
        match self {
            CliCommand::Profile { id } => {
                ApiResponse::from_result(Ok(queries.profiles().resolve_or_unresolved(id).await))
            }
            CliCommand::Posts { id } => {
                ApiResponse::from_result(queries.get_posts(&Profile::unresolved(id.as_str())).await)
            }
            CliCommand::Vanishing { id } => ApiResponse::from_result(
                queries
                    .get_vanishing_messages(&Profile::unresolved(id.as_str()))
                    .await,
            ),
            CliCommand::Friends { id } => {
                ApiResponse::from_result(queries.get_friends(&Profile::unresolved(id.as_str())).await)
            }
            CliCommand::Status { source, dest } => {
                ApiResponse::from_result(queries.get_friendship_status(source, dest).await)
            }
            CliCommand::Search { query } => {
                ApiResponse::from_result(queries.search_people(query).await)
            }
            CliCommand::Entries { filter } => {
                ApiResponse::from_result(queries.get_all_entries(filter).await)
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishRequest {
    pub author: String,
    pub text: String,
    /// Recipients of a secret message; public when absent
    #[serde(default)]
    pub recps: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VanishRequest {
    pub author: String,
    /// Records to retract, one tombstone each
    pub keys: Vec<String>,
}

/// Appends a post. Public text longer than a small post is published as
/// numbered chunks; secret messages are always one record addressed to the
/// recipients plus the author.
pub async fn publish(writer: &dyn LogWriter, request: PublishRequest) -> ApiResponse {
    let PublishRequest { author, text, recps } = request;
    if author.is_empty() || text.trim().is_empty() {
        return ApiResponse::bad_request("author and text are required");
    }

    let result: QueryResult<Vec<LogRecord>> = match recps {
        Some(mut recps) => {
            if !recps.contains(&author) {
                recps.push(author.clone());
            }
            let content = Content::Post(PostContent {
                text,
                root: None,
                recps: Some(recps),
            });
            writer.append(&author, content, true).await.map(|record| vec![record])
        }
        None => append_chunks(writer, &author, &text).await,
    };

    if let Ok(records) = &result {
        info!(author = %author, records = records.len(), "Published");
    }
    ApiResponse::from_result(result)
}

async fn append_chunks(writer: &dyn LogWriter, author: &str, text: &str) -> QueryResult<Vec<LogRecord>> {
    let mut appended = Vec::new();
    for chunk in split_default(text) {
        let content = Content::Post(PostContent {
            text: chunk,
            ..Default::default()
        });
        appended.push(writer.append(author, content, false).await?);
    }
    Ok(appended)
}

/// Appends one `delete` tombstone per key, in order.
pub async fn vanish(writer: &dyn LogWriter, request: VanishRequest) -> ApiResponse {
    let VanishRequest { author, keys } = request;
    if author.is_empty() || keys.is_empty() || keys.iter().any(String::is_empty) {
        return ApiResponse::bad_request("author and keys are required");
    }

    let mut tombstones = Vec::with_capacity(keys.len());
    for key in keys {
        let content = Content::Delete(DeleteContent { dest: key });
        match writer.append(&author, content, false).await {
            Ok(record) => tombstones.push(record),
            Err(err) => return ApiResponse::from_error(&err),
        }
    }

    info!(author = %author, tombstones = tombstones.len(), "Vanished");
    ApiResponse::from_result(Ok(tombstones))
}
