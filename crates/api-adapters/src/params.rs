//! Query-string parameters of the listing endpoints and their conversion into
//! domain queries.

use chrono::{DateTime, Utc};
use domains::{
    DomainError, ForumUserQuery, PostListQuery, Related, Result, SortMode, ThreadListQuery,
};
use serde::Deserialize;

/// Page size used when a request does not pass `limit`.
pub const DEFAULT_LIMIT: i64 = 100;

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Negative limits are rejected; 0 keeps its "no cap" meaning.
fn page_limit(limit: i64) -> Result<u32> {
    if limit < 0 {
        return Err(DomainError::Validation(format!(
            "limit must not be negative, got {limit}"
        )));
    }
    Ok(u32::try_from(limit).unwrap_or(u32::MAX))
}

/// `GET /thread/{slug_or_id}/posts`
#[derive(Debug, Clone, Deserialize)]
pub struct PostsParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub since: Option<i64>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub desc: bool,
}

impl Default for PostsParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            since: None,
            sort: None,
            desc: false,
        }
    }
}

impl PostsParams {
    pub fn into_query(self) -> Result<PostListQuery> {
        let sort = match self.sort.as_deref() {
            None | Some("") => SortMode::default(),
            Some(raw) => raw.parse()?,
        };
        Ok(PostListQuery {
            sort,
            limit: page_limit(self.limit)?,
            since: self.since,
            desc: self.desc,
        })
    }
}

/// `GET /forum/{slug}/threads`
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadsParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub desc: bool,
}

impl ThreadsParams {
    pub fn into_query(self) -> Result<ThreadListQuery> {
        Ok(ThreadListQuery {
            limit: page_limit(self.limit)?,
            since: self.since,
            desc: self.desc,
        })
    }
}

/// `GET /forum/{slug}/users`
#[derive(Debug, Clone, Deserialize)]
pub struct UsersParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub since: Option<String>,
    #[serde(default)]
    pub desc: bool,
}

impl UsersParams {
    pub fn into_query(self) -> Result<ForumUserQuery> {
        Ok(ForumUserQuery {
            limit: page_limit(self.limit)?,
            since: self.since.filter(|since| !since.is_empty()),
            desc: self.desc,
        })
    }
}

/// `GET /post/{id}/details`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailsParams {
    #[serde(default)]
    pub related: Option<String>,
}

impl DetailsParams {
    pub fn related(&self) -> Vec<Related> {
        self.related
            .as_deref()
            .map(Related::parse_list)
            .unwrap_or_default()
    }
}
