//! Entity store use-case service.
//!
//! # Responsibility
//! - Provide upsert/get/delete entry points for any entity type.
//! - Report created vs updated and deleted vs not-found as distinct outcomes.
//!
//! # Invariants
//! - A failed upsert or delete leaves storage untouched (repository
//!   transactions roll back on error).
//! - `delete` with empty filters removes every row of the table and logs at
//!   `warn`.

use crate::model::entity::{EntityId, EntityKind, PlainRecord};
use crate::repo::entity_repo::{EntityRepository, Filters, RepoResult, UpsertOutcome, Upserted};
use crate::repo::entity_rows::StoredEntity;
use crate::service::response::{DbResponse, ServiceError};
use log::{error, info, warn};
use std::time::Instant;

/// Entity store facade over a repository implementation.
pub struct EntityStore<R: EntityRepository> {
    repo: R,
}

impl<R: EntityRepository> EntityStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Inserts `entity`, or overwrites the stored row with the same id.
    ///
    /// On success `data` holds the stored record, including the assigned id
    /// and timestamps. The message is `"<Type> Created Successfully"` or
    /// `"<Type> Updated Successfully"`.
    pub fn upsert<E: StoredEntity>(&self, entity: &E) -> DbResponse<E> {
        let started_at = Instant::now();
        match self.repo.upsert(entity) {
            Ok(Upserted { entity, outcome }) => {
                let verb = match outcome {
                    UpsertOutcome::Created => "Created",
                    UpsertOutcome::Updated => "Updated",
                };
                info!(
                    "event=entity_upsert module=store status=ok entity={} id={} outcome={} duration_ms={}",
                    E::KIND,
                    entity.id().unwrap_or_default(),
                    verb.to_ascii_lowercase(),
                    started_at.elapsed().as_millis()
                );
                DbResponse::success(format!("{} {verb} Successfully", E::KIND), Some(entity))
            }
            Err(source) => {
                let err = ServiceError::UpsertFailed {
                    kind: E::KIND,
                    source,
                };
                error!(
                    "event=entity_upsert module=store status=error entity={} duration_ms={} error={}",
                    E::KIND,
                    started_at.elapsed().as_millis(),
                    err
                );
                DbResponse::failure(&err)
            }
        }
    }

    /// Lists entities of type `E` matching all filters.
    pub fn get<E: StoredEntity>(&self, filters: &Filters) -> RepoResult<Vec<E>> {
        self.repo.find(filters)
    }

    /// Loads one entity by id.
    pub fn get_by_id<E: StoredEntity>(&self, id: EntityId) -> RepoResult<Option<E>> {
        Ok(self.repo.find::<E>(&Filters::by_id(id))?.into_iter().next())
    }

    /// Lists entities of `kind` matching all filters as plain field maps.
    pub fn get_records(&self, kind: EntityKind, filters: &Filters) -> RepoResult<Vec<PlainRecord>> {
        self.repo.find_records(kind, filters)
    }

    /// Deletes every row of `kind` matching `filters`; `data` is the count.
    ///
    /// Empty filters delete the whole table.
    pub fn delete(&self, kind: EntityKind, filters: &Filters) -> DbResponse<usize> {
        if filters.is_empty() {
            warn!("event=entity_delete module=store status=start entity={kind} scope=all_rows");
        }

        match self.repo.delete(kind, filters) {
            Ok(0) => {
                let err = ServiceError::DeleteNotFound(kind);
                info!(
                    "event=entity_delete module=store status=rejected entity={} filters={} reason=not_found",
                    kind,
                    filters.describe_fields()
                );
                DbResponse::failure(&err)
            }
            Ok(removed) => {
                info!(
                    "event=entity_delete module=store status=ok entity={} filters={} removed={}",
                    kind,
                    filters.describe_fields(),
                    removed
                );
                DbResponse::success("Deleted Successfully", Some(removed))
            }
            Err(source) => {
                let err = ServiceError::DeleteFailed { kind, source };
                error!(
                    "event=entity_delete module=store status=error entity={} filters={} error={}",
                    kind,
                    filters.describe_fields(),
                    err
                );
                DbResponse::failure(&err)
            }
        }
    }
}
