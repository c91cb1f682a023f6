//! Link registry use-case service.
//!
//! # Responsibility
//! - Validate kind tags before any storage access.
//! - Map repository link outcomes onto the error taxonomy.
//! - Serve linked collections, typed or as plain maps.
//!
//! # Invariants
//! - An unknown tag performs no I/O.
//! - Linking an existing triple reports `DuplicateLink` and changes nothing.
//! - Unlinking a missing triple reports `LinkNotFound`; unlink is not
//!   idempotent-success.
//! - `get_linked_entities` always returns a collection, empty on failure.

use crate::logging::sanitize_message;
use crate::model::entity::EntityId;
use crate::model::link::{LinkKind, LinkedEntities};
use crate::repo::entity_repo::{RepoError, RepoResult};
use crate::repo::link_repo::{LinkOutcome, LinkRepository};
use crate::service::response::{DbResponse, LinkOperation, ServiceError};
use log::{error, info, warn};

const MAX_LOGGED_TAG_CHARS: usize = 64;

/// Link registry facade over a repository implementation.
pub struct LinkRegistry<R: LinkRepository> {
    repo: R,
}

impl<R: LinkRepository> LinkRegistry<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Links `secondary_id` under `primary_id` for the tagged kind.
    pub fn link(&self, kind: &str, primary_id: EntityId, secondary_id: EntityId) -> DbResponse<()> {
        let kind = match parse_kind(kind, LinkOperation::Link) {
            Ok(kind) => kind,
            Err(err) => return DbResponse::failure(&err),
        };

        let result = self.repo.link(kind, primary_id, secondary_id);
        let message = format!(
            "{} successfully linked to {}",
            kind.secondary(),
            kind.primary()
        );
        self.finish(
            LinkOperation::Link,
            kind,
            (primary_id, secondary_id),
            result,
            message,
        )
    }

    /// Removes the link between `primary_id` and `secondary_id`.
    pub fn unlink(
        &self,
        kind: &str,
        primary_id: EntityId,
        secondary_id: EntityId,
    ) -> DbResponse<()> {
        let kind = match parse_kind(kind, LinkOperation::Unlink) {
            Ok(kind) => kind,
            Err(err) => return DbResponse::failure(&err),
        };

        let result = self.repo.unlink(kind, primary_id, secondary_id);
        self.finish(
            LinkOperation::Unlink,
            kind,
            (primary_id, secondary_id),
            result,
            "Link removed successfully.".to_string(),
        )
    }

    /// Returns the secondaries linked to `primary_id` in link order.
    ///
    /// With `as_plain_map` the data is `LinkedEntities::Records`; otherwise the
    /// typed variant for the kind. Failures yield an empty collection with
    /// `status=false`.
    pub fn get_linked_entities(
        &self,
        kind: &str,
        primary_id: EntityId,
        as_plain_map: bool,
    ) -> DbResponse<LinkedEntities> {
        let kind = match parse_kind(kind, LinkOperation::Query) {
            Ok(kind) => kind,
            Err(err) => return DbResponse::failure_with(&err, Some(LinkedEntities::default())),
        };

        match self.load_linked(kind, primary_id, as_plain_map) {
            Ok(Some(linked)) => {
                info!(
                    "event=linked_query module=link status=ok kind={} primary_id={} count={}",
                    kind,
                    primary_id,
                    linked.len()
                );
                let message = format!(
                    "Found {} {} linked to {} {}",
                    linked.len(),
                    kind.secondary(),
                    kind.primary(),
                    primary_id
                );
                DbResponse::success(message, Some(linked))
            }
            Ok(None) => {
                let err = ServiceError::EntityNotFound {
                    kind: kind.primary(),
                    id: primary_id,
                };
                warn!(
                    "event=linked_query module=link status=rejected kind={} primary_id={} reason=entity_not_found",
                    kind, primary_id
                );
                DbResponse::failure_with(&err, Some(LinkedEntities::default()))
            }
            Err(source) => {
                let err = ServiceError::LinkFailed {
                    operation: LinkOperation::Query,
                    source,
                };
                error!(
                    "event=linked_query module=link status=error kind={} primary_id={} error={}",
                    kind, primary_id, err
                );
                DbResponse::failure_with(&err, Some(LinkedEntities::default()))
            }
        }
    }

    /// Number of join rows currently stored for the tagged kind.
    pub fn count_links(&self, kind: LinkKind) -> RepoResult<u64> {
        self.repo.count_links(kind)
    }

    fn load_linked(
        &self,
        kind: LinkKind,
        primary_id: EntityId,
        as_plain_map: bool,
    ) -> RepoResult<Option<LinkedEntities>> {
        let Some(linked) = self.repo.linked_entities(kind, primary_id)? else {
            return Ok(None);
        };
        if !as_plain_map {
            return Ok(Some(linked));
        }
        let records = linked.into_records().map_err(RepoError::from)?;
        Ok(Some(LinkedEntities::Records(records)))
    }

    fn finish(
        &self,
        operation: LinkOperation,
        kind: LinkKind,
        ids: (EntityId, EntityId),
        result: RepoResult<LinkOutcome>,
        success_message: String,
    ) -> DbResponse<()> {
        let (primary_id, secondary_id) = ids;
        let err = match result {
            Ok(LinkOutcome::Applied) => {
                info!(
                    "event={} module=link status=ok kind={} directional={} primary_id={} secondary_id={}",
                    operation.event(),
                    kind,
                    kind.is_directional(),
                    primary_id,
                    secondary_id
                );
                return DbResponse::success(success_message, None);
            }
            Ok(LinkOutcome::AlreadyLinked) => ServiceError::DuplicateLink(kind),
            Ok(LinkOutcome::NotLinked) => ServiceError::LinkNotFound(kind),
            Ok(LinkOutcome::MissingEndpoint {
                kind: missing_kind,
                id,
            }) => ServiceError::EntityNotFound {
                kind: missing_kind,
                id,
            },
            Err(source) => {
                let err = ServiceError::LinkFailed { operation, source };
                error!(
                    "event={} module=link status=error kind={} primary_id={} secondary_id={} error={}",
                    operation.event(),
                    kind,
                    primary_id,
                    secondary_id,
                    err
                );
                return DbResponse::failure(&err);
            }
        };

        info!(
            "event={} module=link status=rejected kind={} primary_id={} secondary_id={} reason={:?}",
            operation.event(),
            kind,
            primary_id,
            secondary_id,
            err.kind()
        );
        DbResponse::failure(&err)
    }
}

fn parse_kind(tag: &str, operation: LinkOperation) -> Result<LinkKind, ServiceError> {
    LinkKind::parse(tag).ok_or_else(|| {
        let shown = sanitize_message(tag, MAX_LOGGED_TAG_CHARS);
        warn!(
            "event={} module=link status=rejected reason=invalid_link_kind tag={}",
            operation.event(),
            shown
        );
        ServiceError::InvalidLinkKind(shown)
    })
}
