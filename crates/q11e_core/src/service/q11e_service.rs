//! Questionnaire use-case service.
//!
//! # Responsibility
//! - Provide submit/lookup/remove entry points keyed by respondent address.
//! - Delegate persistence to any `Q11eRepository` implementation.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - One respondent address maps to at most one stored response.

use crate::model::mbti::MbtiType;
use crate::model::q11e::Q11e;
use crate::repo::base::RepoResult;
use crate::repo::context::RequestContext;
use crate::repo::q11e_repo::{Q11eListQuery, Q11eRepository, UpsertOutcome};
use log::{debug, info};

/// Use-case service wrapper for questionnaire operations.
pub struct Q11eService<R: Q11eRepository> {
    repo: R,
}

impl<R: Q11eRepository> Q11eService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stores `q11e`, replacing any earlier response from the same address.
    pub fn submit(&self, ctx: &RequestContext, q11e: &Q11e) -> RepoResult<UpsertOutcome> {
        let outcome = self.repo.upsert_by_address(ctx, q11e)?;

        info!(
            "event=q11e_submit module=service status=ok outcome={} address_len={} mbti={}",
            match outcome {
                UpsertOutcome::Created(_) => "created",
                UpsertOutcome::Updated(_) => "updated",
            },
            q11e.address.len(),
            q11e.mbti
        );
        Ok(outcome)
    }

    pub fn get_by_address(&self, ctx: &RequestContext, address: &str) -> RepoResult<Option<Q11e>> {
        self.repo.get_by_address(ctx, address)
    }

    pub fn check_and_get_exists_by_addr(
        &self,
        ctx: &RequestContext,
        address: &str,
    ) -> RepoResult<(bool, Option<Q11e>)> {
        self.repo.check_and_get_exists_by_addr(ctx, address)
    }

    /// Personality type recorded for `address`, `None` when no response exists.
    pub fn mbti_of(&self, ctx: &RequestContext, address: &str) -> RepoResult<Option<MbtiType>> {
        Ok(self
            .repo
            .get_by_address(ctx, address)?
            .and_then(|record| record.mbti_type()))
    }

    /// Deletes the response for `address`. Returns `false` when none existed.
    pub fn remove_by_address(&self, ctx: &RequestContext, address: &str) -> RepoResult<bool> {
        let Some(id) = self.repo.id_by_address(ctx, address)? else {
            debug!("event=q11e_remove module=service status=noop");
            return Ok(false);
        };

        self.repo.delete(ctx, id)?;
        info!(
            "event=q11e_remove module=service status=ok address_len={}",
            address.len()
        );
        Ok(true)
    }

    pub fn list(&self, ctx: &RequestContext, query: &Q11eListQuery) -> RepoResult<Vec<Q11e>> {
        self.repo.list(ctx, query)
    }

    pub fn count(&self, ctx: &RequestContext) -> RepoResult<u64> {
        self.repo.count(ctx)
    }
}
