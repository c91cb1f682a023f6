//! Result envelope and error taxonomy shared by the services.

use crate::model::entity::{EntityId, EntityKind};
use crate::model::link::LinkKind;
use crate::repo::entity_repo::RepoError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable, copyable discriminant of a `ServiceError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidLinkKind,
    EntityNotFound,
    DuplicateLink,
    LinkNotFound,
    LinkFailed,
    UpsertFailed,
    DeleteNotFound,
    DeleteFailed,
}

/// Which link-registry operation failed at the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOperation {
    Link,
    Unlink,
    Query,
}

impl LinkOperation {
    /// Log event name.
    pub fn event(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Unlink => "unlink",
            Self::Query => "linked_query",
        }
    }

    fn gerund(self) -> &'static str {
        match self {
            Self::Link => "linking",
            Self::Unlink => "unlinking",
            Self::Query => "getting linked entities",
        }
    }
}

/// Failure of one store or registry operation.
#[derive(Debug)]
pub enum ServiceError {
    /// Tag is not one of the fixed link kinds.
    InvalidLinkKind(String),
    /// An endpoint of the requested link does not exist.
    EntityNotFound { kind: EntityKind, id: EntityId },
    /// The join row already exists.
    DuplicateLink(LinkKind),
    /// Unlink found no join row.
    LinkNotFound(LinkKind),
    /// Persistence failed; the transaction was rolled back.
    LinkFailed {
        operation: LinkOperation,
        source: RepoError,
    },
    /// Validation or persistence failed; nothing was written.
    UpsertFailed { kind: EntityKind, source: RepoError },
    /// Delete matched no rows.
    DeleteNotFound(EntityKind),
    /// Persistence failed; nothing was deleted.
    DeleteFailed { kind: EntityKind, source: RepoError },
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidLinkKind(_) => ErrorKind::InvalidLinkKind,
            Self::EntityNotFound { .. } => ErrorKind::EntityNotFound,
            Self::DuplicateLink(_) => ErrorKind::DuplicateLink,
            Self::LinkNotFound(_) => ErrorKind::LinkNotFound,
            Self::LinkFailed { .. } => ErrorKind::LinkFailed,
            Self::UpsertFailed { .. } => ErrorKind::UpsertFailed,
            Self::DeleteNotFound(_) => ErrorKind::DeleteNotFound,
            Self::DeleteFailed { .. } => ErrorKind::DeleteFailed,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLinkKind(tag) => write!(
                f,
                "Invalid link type: {tag}. Valid link types are: [{}]",
                LinkKind::valid_tags()
            ),
            Self::EntityNotFound { kind, id } => write!(
                f,
                "One or both entity records do not exist: {kind} {id} not found"
            ),
            Self::DuplicateLink(kind) => write!(
                f,
                "{} already linked to {}",
                kind.secondary(),
                kind.primary()
            ),
            Self::LinkNotFound(_) => write!(f, "Link does not exist."),
            Self::LinkFailed { operation, source } => write!(
                f,
                "Error while {} due to an exception: {source}",
                operation.gerund()
            ),
            Self::UpsertFailed { kind, source } => {
                write!(f, "Error while upserting {kind}: {source}")
            }
            Self::DeleteNotFound(_) => write!(f, "Row not found"),
            Self::DeleteFailed { kind, source } => {
                write!(f, "Error while deleting {kind}: {source}")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LinkFailed { source, .. }
            | Self::UpsertFailed { source, .. }
            | Self::DeleteFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Uniform result envelope returned by every store and registry operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DbResponse<T> {
    /// Whether the operation succeeded.
    pub status: bool,
    /// Human-readable outcome for logs and UI.
    pub message: String,
    /// Payload; `None` for operations that carry no data.
    pub data: Option<T>,
    /// Set exactly when `status` is `false`.
    pub error: Option<ErrorKind>,
}

impl<T> DbResponse<T> {
    pub fn success(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: true,
            message: message.into(),
            data,
            error: None,
        }
    }

    pub fn failure(err: &ServiceError) -> Self {
        Self::failure_with(err, None)
    }

    /// Failure that still carries a payload, e.g. an empty collection.
    pub fn failure_with(err: &ServiceError, data: Option<T>) -> Self {
        Self {
            status: false,
            message: err.to_string(),
            data,
            error: Some(err.kind()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status
    }
}
