//! Generic repository for registry-described lookup tables.
//!
//! Every statement is assembled from a [`MetaTableDescriptor`]; table and
//! column identifiers come only from the static registry, never from request
//! input, while all values are bound parameters.

use crate::error::{DatabaseError, Result};
use civic_models::{
    ColumnKind, FieldValue, LookupFilter, MetaTableDescriptor, SearchFilter, ValidatedPayload,
};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

type Record = (Json<serde_json::Value>,);

#[derive(Clone)]
pub struct LookupRepository {
    pool: PgPool,
}

impl LookupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List rows, with related entities embedded as nested objects
    pub async fn list(
        &self,
        descriptor: &MetaTableDescriptor,
        filter: &LookupFilter,
    ) -> Result<Vec<serde_json::Value>> {
        let rows = build_list_query(descriptor, filter)
            .build_query_as::<Record>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(Json(record),)| record).collect())
    }

    pub async fn count(&self, descriptor: &MetaTableDescriptor, filter: &LookupFilter) -> Result<i64> {
        let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {} t", descriptor.table_name));
        push_filters(&mut builder, filter);

        let count: (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(count.0)
    }

    /// Find a single row by primary key
    pub async fn get(&self, descriptor: &MetaTableDescriptor, id: i64) -> Result<serde_json::Value> {
        let mut builder = QueryBuilder::new("");
        push_select(&mut builder, descriptor);
        builder.push(format!(" WHERE t.{} = ", descriptor.primary_key));
        builder.push_bind(id);

        builder
            .build_query_as::<Record>()
            .fetch_optional(&self.pool)
            .await?
            .map(|(Json(record),)| record)
            .ok_or_else(|| DatabaseError::not_found(descriptor.display_name, &id.to_string()))
    }

    pub async fn create(
        &self,
        descriptor: &MetaTableDescriptor,
        payload: &ValidatedPayload,
        actor_id: i64,
    ) -> Result<serde_json::Value> {
        let mut builder = QueryBuilder::new(format!("INSERT INTO {} (", descriptor.table_name));
        for (name, _) in &payload.fields {
            builder.push(name).push(", ");
        }
        if descriptor.has_status {
            builder.push("status, ");
        }
        builder.push("created_by, updated_by) VALUES (");

        {
            let mut values = builder.separated(", ");
            for (name, value) in &payload.fields {
                push_field_value(&mut values, descriptor, name, value);
            }
            if descriptor.has_status {
                values.push_bind(payload.status.unwrap_or(civic_models::STATUS_ACTIVE));
            }
            values.push_bind(actor_id);
            values.push_bind(actor_id);
        }
        builder.push(format!(") RETURNING {}", descriptor.primary_key));

        let (id,): (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        tracing::debug!("Created {} row {}", descriptor.table_name, id);

        self.get(descriptor, id).await
    }

    pub async fn update(
        &self,
        descriptor: &MetaTableDescriptor,
        id: i64,
        payload: &ValidatedPayload,
        actor_id: i64,
    ) -> Result<serde_json::Value> {
        let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", descriptor.table_name));
        {
            let mut assignments = builder.separated(", ");
            assignments.push("updated_by = ");
            assignments.push_bind_unseparated(actor_id);
            for (name, value) in &payload.fields {
                assignments.push(format!("{} = ", name));
                match value {
                    FieldValue::Text(text) => assignments.push_bind_unseparated(text.clone()),
                    FieldValue::Integer(number) => assignments.push_bind_unseparated(*number),
                    FieldValue::Null => assignments.push_bind_unseparated(None::<i64>),
                };
            }
            if let (true, Some(status)) = (descriptor.has_status, payload.status) {
                assignments.push("status = ");
                assignments.push_bind_unseparated(status);
            }
        }
        builder.push(format!(" WHERE {} = ", descriptor.primary_key));
        builder.push_bind(id);
        builder.push(format!(" RETURNING {}", descriptor.primary_key));

        builder
            .build_query_as::<(i64,)>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found(descriptor.display_name, &id.to_string()))?;

        self.get(descriptor, id).await
    }
}

fn push_field_value(
    values: &mut sqlx::query_builder::Separated<'_, '_, Postgres, &'static str>,
    descriptor: &MetaTableDescriptor,
    name: &str,
    value: &FieldValue,
) {
    match value {
        FieldValue::Text(text) => {
            values.push_bind(text.clone());
        }
        FieldValue::Integer(number) => {
            values.push_bind(*number);
        }
        FieldValue::Null => match descriptor.column(name).map(|c| c.kind) {
            Some(ColumnKind::Text) => {
                values.push_bind(None::<String>);
            }
            _ => {
                values.push_bind(None::<i64>);
            }
        },
    }
}

/// `SELECT <record jsonb> FROM <table> t`, embedding each custom include as a
/// scalar subquery so a missing parent yields `null` instead of dropping the row.
fn push_select(builder: &mut QueryBuilder<'_, Postgres>, descriptor: &MetaTableDescriptor) {
    builder.push("SELECT to_jsonb(t)");
    for include in descriptor.custom_includes {
        let projection = include
            .attributes
            .iter()
            .map(|attr| format!("'{}', i.{}", attr, attr))
            .collect::<Vec<_>>()
            .join(", ");
        builder.push(format!(
            " || jsonb_build_object('{}', (SELECT jsonb_build_object({}) FROM {} i WHERE i.id = t.{}))",
            include.association, projection, include.table_name, include.foreign_key
        ));
    }
    builder.push(format!(" AS record FROM {} t", descriptor.table_name));
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &LookupFilter) {
    builder.push(" WHERE 1 = 1");

    if let Some(status) = filter.status {
        builder.push(" AND t.status = ");
        builder.push_bind(status);
    }

    match &filter.search {
        Some(SearchFilter::Contains { column, term }) => {
            builder.push(format!(" AND t.{} ILIKE ", column));
            builder.push_bind(format!("%{}%", escape_like(term)));
        }
        Some(SearchFilter::Equals { column, value }) => {
            builder.push(format!(" AND t.{} = ", column));
            builder.push_bind(*value);
        }
        None => {}
    }
}

pub(crate) fn build_list_query(
    descriptor: &MetaTableDescriptor,
    filter: &LookupFilter,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("");
    push_select(&mut builder, descriptor);
    push_filters(&mut builder, filter);
    builder.push(format!(" ORDER BY t.{}", descriptor.primary_key));
    builder.push(" LIMIT ");
    builder.push_bind(filter.limit);
    builder.push(" OFFSET ");
    builder.push_bind(filter.offset);
    builder
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
