//! Questionnaire repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide address-keyed lookups on top of the generic CRUD contract.
//! - Keep SQL and JSON column encoding inside the persistence boundary.
//!
//! # Invariants
//! - At most one record per address (`idx_q11e_address`).
//! - Write paths call `Q11e::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `check_and_get_exists_by_addr` returns `true` iff the record is `Some`.
//! - `upsert_by_address` runs inside one `BEGIN IMMEDIATE` transaction, so
//!   it fails when the connection already has a transaction open.

use crate::db::migrations::latest_version;
use crate::model::mbti::MbtiType;
use crate::model::q11e::Q11e;
use crate::repo::base::{Page, RecordId, RepoError, RepoResult, RepositoryBase};
use crate::repo::context::RequestContext;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, ErrorCode, Row, Transaction, TransactionBehavior,
};
use uuid::Uuid;

const Q11E_SELECT_SQL: &str = "SELECT
    id,
    address,
    goals,
    interests,
    pref1,
    pref2,
    pref3,
    mbti
FROM q11e";

const Q11E_REQUIRED_COLUMNS: [&str; 10] = [
    "id",
    "address",
    "goals",
    "interests",
    "pref1",
    "pref2",
    "pref3",
    "mbti",
    "created_at",
    "updated_at",
];

/// List filter for questionnaire records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Q11eListQuery {
    /// Only records classified as this type.
    pub mbti: Option<MbtiType>,
    pub page: Page,
}

/// Result of [`Q11eRepository::upsert_by_address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No prior record existed; a new one was stored.
    Created(RecordId),
    /// The prior record for the address was replaced.
    Updated(RecordId),
}

impl UpsertOutcome {
    pub fn id(self) -> RecordId {
        match self {
            Self::Created(id) | Self::Updated(id) => id,
        }
    }
}

/// Address-keyed access to questionnaire responses.
pub trait Q11eRepository: RepositoryBase<Q11e, ListQuery = Q11eListQuery> {
    /// Returns the record for `address`, `None` when absent.
    fn get_by_address(&self, ctx: &RequestContext, address: &str) -> RepoResult<Option<Q11e>>;

    /// Returns the storage id of the record for `address`, `None` when absent.
    fn id_by_address(&self, ctx: &RequestContext, address: &str) -> RepoResult<Option<RecordId>>;

    /// Stores `entity`, replacing the record already held for its address.
    ///
    /// Lookup and write happen atomically with respect to other connections.
    fn upsert_by_address(&self, ctx: &RequestContext, entity: &Q11e) -> RepoResult<UpsertOutcome>;

    /// Existence flag paired with the record.
    ///
    /// Derived from `get_by_address`, so the flag and record never disagree.
    fn check_and_get_exists_by_addr(
        &self,
        ctx: &RequestContext,
        address: &str,
    ) -> RepoResult<(bool, Option<Q11e>)> {
        let found = self.get_by_address(ctx, address)?;
        Ok((found.is_some(), found))
    }
}

/// SQLite-backed questionnaire repository.
pub struct SqliteQ11eRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteQ11eRepository<'conn> {
    /// Creates repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `user_version` is not the latest.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_q11e_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl RepositoryBase<Q11e> for SqliteQ11eRepository<'_> {
    type ListQuery = Q11eListQuery;

    fn insert(&self, ctx: &RequestContext, entity: &Q11e) -> RepoResult<RecordId> {
        entity.validate()?;
        ctx.check()?;

        let id = Uuid::new_v4();
        insert_row(self.conn, id, entity)?;
        Ok(id)
    }

    fn get(&self, ctx: &RequestContext, id: RecordId) -> RepoResult<Option<Q11e>> {
        ctx.check()?;
        self.query_one(
            &format!("{Q11E_SELECT_SQL} WHERE id = ?1;"),
            id.to_string().as_str(),
        )
    }

    fn update(&self, ctx: &RequestContext, id: RecordId, entity: &Q11e) -> RepoResult<()> {
        entity.validate()?;
        ctx.check()?;

        let changed = update_row(self.conn, id, entity)?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete(&self, ctx: &RequestContext, id: RecordId) -> RepoResult<()> {
        ctx.check()?;

        let changed = self
            .conn
            .execute("DELETE FROM q11e WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn list(&self, ctx: &RequestContext, query: &Q11eListQuery) -> RepoResult<Vec<Q11e>> {
        ctx.check()?;

        let mut sql = format!("{Q11E_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(kind) = query.mbti {
            sql.push_str(" AND mbti = ?");
            bind_values.push(Value::Integer(i64::from(kind.code())));
        }

        sql.push_str(" ORDER BY updated_at DESC, address ASC");

        if let Some(limit) = query.page.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.page.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.page.offset)));
            }
        } else if query.page.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.page.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_q11e_row(row)?);
        }

        Ok(records)
    }

    fn count(&self, ctx: &RequestContext) -> RepoResult<u64> {
        ctx.check()?;

        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM q11e;", [], |row| row.get(0))?;
        u64::try_from(total)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{total}`")))
    }
}

impl Q11eRepository for SqliteQ11eRepository<'_> {
    fn get_by_address(&self, ctx: &RequestContext, address: &str) -> RepoResult<Option<Q11e>> {
        ctx.check()?;
        if address.trim().is_empty() {
            return Ok(None);
        }

        self.query_one(&format!("{Q11E_SELECT_SQL} WHERE address = ?1;"), address)
    }

    fn id_by_address(&self, ctx: &RequestContext, address: &str) -> RepoResult<Option<RecordId>> {
        ctx.check()?;
        if address.trim().is_empty() {
            return Ok(None);
        }

        select_id_by_address(self.conn, address)
    }

    fn upsert_by_address(&self, ctx: &RequestContext, entity: &Q11e) -> RepoResult<UpsertOutcome> {
        entity.validate()?;
        ctx.check()?;

        // IMMEDIATE takes the write lock before the lookup, so no other
        // connection can insert the address between lookup and write.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let outcome = match select_id_by_address(&tx, &entity.address)? {
            Some(id) => {
                update_row(&tx, id, entity)?;
                UpsertOutcome::Updated(id)
            }
            None => {
                let id = Uuid::new_v4();
                insert_row(&tx, id, entity)?;
                UpsertOutcome::Created(id)
            }
        };
        tx.commit()?;

        Ok(outcome)
    }
}

impl SqliteQ11eRepository<'_> {
    fn query_one(&self, sql: &str, key: &str) -> RepoResult<Option<Q11e>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_q11e_row(row)?));
        }
        Ok(None)
    }
}

fn insert_row(conn: &Connection, id: RecordId, entity: &Q11e) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO q11e (
            id,
            address,
            goals,
            interests,
            pref1,
            pref2,
            pref3,
            mbti
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            id.to_string(),
            entity.address.as_str(),
            encode_tags(&entity.goals)?,
            encode_tags(&entity.interests)?,
            entity.pref1.as_str(),
            entity.pref2.as_str(),
            entity.pref3.as_str(),
            entity.mbti,
        ],
    )
    .map_err(|err| map_write_error(err, &entity.address))?;
    Ok(())
}

fn update_row(conn: &Connection, id: RecordId, entity: &Q11e) -> RepoResult<usize> {
    conn.execute(
        "UPDATE q11e
         SET
            address = ?1,
            goals = ?2,
            interests = ?3,
            pref1 = ?4,
            pref2 = ?5,
            pref3 = ?6,
            mbti = ?7,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?8;",
        params![
            entity.address.as_str(),
            encode_tags(&entity.goals)?,
            encode_tags(&entity.interests)?,
            entity.pref1.as_str(),
            entity.pref2.as_str(),
            entity.pref3.as_str(),
            entity.mbti,
            id.to_string(),
        ],
    )
    .map_err(|err| map_write_error(err, &entity.address))
}

fn select_id_by_address(conn: &Connection, address: &str) -> RepoResult<Option<RecordId>> {
    let mut stmt = conn.prepare("SELECT id FROM q11e WHERE address = ?1;")?;
    let mut rows = stmt.query([address])?;
    match rows.next()? {
        Some(row) => {
            let id_text: String = row.get(0)?;
            Ok(Some(parse_record_id(&id_text)?))
        }
        None => Ok(None),
    }
}

fn parse_q11e_row(row: &Row<'_>) -> RepoResult<Q11e> {
    let id_text: String = row.get("id")?;
    parse_record_id(&id_text)?;

    let goals_text: String = row.get("goals")?;
    let interests_text: String = row.get("interests")?;

    let record = Q11e {
        address: row.get("address")?,
        goals: decode_tags(&goals_text, "q11e.goals")?,
        interests: decode_tags(&interests_text, "q11e.interests")?,
        pref1: row.get("pref1")?,
        pref2: row.get("pref2")?,
        pref3: row.get("pref3")?,
        mbti: row.get("mbti")?,
    };
    record
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("{err} in record `{id_text}`")))?;
    Ok(record)
}

fn parse_record_id(value: &str) -> RepoResult<RecordId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in q11e.id")))
}

fn encode_tags(tags: &[String]) -> RepoResult<String> {
    serde_json::to_string(tags)
        .map_err(|err| RepoError::InvalidData(format!("failed to encode tag list: {err}")))
}

fn decode_tags(value: &str, column: &str) -> RepoResult<Vec<String>> {
    serde_json::from_str(value)
        .map_err(|err| RepoError::InvalidData(format!("invalid tag list in {column}: {err}")))
}

fn map_write_error(err: rusqlite::Error, address: &str) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.code == ErrorCode::ConstraintViolation
            && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        {
            return RepoError::DuplicateAddress(address.to_string());
        }
    }
    err.into()
}

fn ensure_q11e_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "q11e")? {
        return Err(RepoError::MissingRequiredTable("q11e"));
    }

    for column in Q11E_REQUIRED_COLUMNS {
        if !table_has_column(conn, "q11e", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "q11e",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
