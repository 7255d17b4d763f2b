//! Find-or-create-else-reactivate.
//!
//! Every seeded row (roles, permission groups, permissions, sidebars and the
//! association tables) converges through [`upsert_row`]: look the row up by
//! its natural key, insert it active if absent, otherwise re-enable it and
//! refresh its attributes in place.

use civic_database::DatabaseError;
use civic_models::STATUS_ACTIVE;
use serde::Serialize;
use sqlx::{PgConnection, Postgres, QueryBuilder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedValue {
    BigInt(i64),
    Int(i32),
    Text(String),
    NullableText(Option<String>),
}

impl From<i64> for SeedValue {
    fn from(value: i64) -> Self {
        SeedValue::BigInt(value)
    }
}

impl From<i32> for SeedValue {
    fn from(value: i32) -> Self {
        SeedValue::Int(value)
    }
}

impl From<&str> for SeedValue {
    fn from(value: &str) -> Self {
        SeedValue::Text(value.to_string())
    }
}

impl From<Option<&str>> for SeedValue {
    fn from(value: Option<&str>) -> Self {
        SeedValue::NullableText(value.map(str::to_string))
    }
}

impl SeedValue {
    fn push_bind(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            SeedValue::BigInt(v) => builder.push_bind(*v),
            SeedValue::Int(v) => builder.push_bind(*v),
            SeedValue::Text(v) => builder.push_bind(v.clone()),
            SeedValue::NullableText(v) => builder.push_bind(v.clone()),
        };
    }

    fn display(&self) -> String {
        match self {
            SeedValue::BigInt(v) => v.to_string(),
            SeedValue::Int(v) => v.to_string(),
            SeedValue::Text(v) => v.clone(),
            SeedValue::NullableText(v) => v.clone().unwrap_or_default(),
        }
    }
}

/// Desired state of one row: its natural key and the attributes to converge.
#[derive(Debug, Clone)]
pub struct UpsertSpec {
    pub table: &'static str,
    pub key: Vec<(&'static str, SeedValue)>,
    pub attributes: Vec<(&'static str, SeedValue)>,
}

impl UpsertSpec {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            key: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn key(mut self, column: &'static str, value: impl Into<SeedValue>) -> Self {
        self.key.push((column, value.into()));
        self
    }

    pub fn attr(mut self, column: &'static str, value: impl Into<SeedValue>) -> Self {
        self.attributes.push((column, value.into()));
        self
    }

    /// Natural key rendered for status lines, e.g. `posts:create` or `3/7`
    pub fn key_label(&self) -> String {
        self.key
            .iter()
            .map(|(_, v)| v.display())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn key_columns(&self) -> String {
        self.key.iter().map(|(c, _)| *c).collect::<Vec<_>>().join(", ")
    }

    fn push_key_predicate(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        for (index, (column, value)) in self.key.iter().enumerate() {
            builder.push(if index == 0 { " WHERE " } else { " AND " });
            builder.push(format!("{} = ", column));
            value.push_bind(builder);
        }
    }

    pub(crate) fn build_find(&self) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(format!("SELECT id, status FROM {}", self.table));
        self.push_key_predicate(&mut builder);
        builder.push(" FOR UPDATE");
        builder
    }

    pub(crate) fn build_update(&self, id: i64, actor_id: i64) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(format!("UPDATE {} SET status = ", self.table));
        builder.push_bind(STATUS_ACTIVE);
        builder.push(", updated_by = ");
        builder.push_bind(actor_id);
        for (column, value) in &self.attributes {
            builder.push(format!(", {} = ", column));
            value.push_bind(&mut builder);
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder
    }

    /// Insert that turns into an update when a concurrent writer committed
    /// the same natural key first.
    pub(crate) fn build_insert(&self, actor_id: i64) -> QueryBuilder<'static, Postgres> {
        let columns = self
            .key
            .iter()
            .chain(self.attributes.iter())
            .map(|(c, _)| *c)
            .collect::<Vec<_>>();

        let mut builder = QueryBuilder::new(format!(
            "INSERT INTO {} ({}, status, created_by, updated_by) VALUES (",
            self.table,
            columns.join(", ")
        ));
        for (_, value) in self.key.iter().chain(self.attributes.iter()) {
            value.push_bind(&mut builder);
            builder.push(", ");
        }
        builder.push_bind(STATUS_ACTIVE);
        builder.push(", ");
        builder.push_bind(actor_id);
        builder.push(", ");
        builder.push_bind(actor_id);

        builder.push(format!(
            ") ON CONFLICT ({}) DO UPDATE SET status = EXCLUDED.status, updated_by = EXCLUDED.updated_by",
            self.key_columns()
        ));
        for (column, _) in &self.attributes {
            builder.push(format!(", {} = EXCLUDED.{}", column, column));
        }
        builder.push(" RETURNING id, (xmax = 0) AS inserted");
        builder
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    /// No row existed for the natural key
    Created,
    /// Row existed with status 0 and was re-enabled
    Reactivated,
    /// Row existed and was already active
    Refreshed,
}

impl std::fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpsertOutcome::Created => write!(f, "created"),
            UpsertOutcome::Reactivated => write!(f, "reactivated"),
            UpsertOutcome::Refreshed => write!(f, "unchanged"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upserted {
    pub id: i64,
    pub outcome: UpsertOutcome,
}

/// Converge one row to `spec` on the caller's connection (normally a
/// transaction owned by the batch).
pub async fn upsert_row(
    conn: &mut PgConnection,
    spec: &UpsertSpec,
    actor_id: i64,
) -> Result<Upserted, DatabaseError> {
    if spec.key.is_empty() {
        return Err(DatabaseError::InvalidInput(format!(
            "Upsert into {} needs a natural key",
            spec.table
        )));
    }

    let existing: Option<(i64, i16)> = spec
        .build_find()
        .build_query_as()
        .fetch_optional(&mut *conn)
        .await?;

    let upserted = match existing {
        Some((id, status)) => {
            spec.build_update(id, actor_id).build().execute(&mut *conn).await?;
            let outcome = if status == STATUS_ACTIVE {
                UpsertOutcome::Refreshed
            } else {
                UpsertOutcome::Reactivated
            };
            Upserted { id, outcome }
        }
        None => {
            let (id, inserted): (i64, bool) = spec
                .build_insert(actor_id)
                .build_query_as()
                .fetch_one(&mut *conn)
                .await?;
            let outcome = if inserted {
                UpsertOutcome::Created
            } else {
                // Lost the race to a concurrent seeder; its row was updated
                UpsertOutcome::Refreshed
            };
            Upserted { id, outcome }
        }
    };

    tracing::debug!(
        "{} {} -> id {} ({})",
        spec.table,
        spec.key_label(),
        upserted.id,
        upserted.outcome
    );

    Ok(upserted)
}
