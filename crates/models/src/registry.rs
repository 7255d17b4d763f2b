//! Meta-table registry
//!
//! Static catalog of the lookup ("meta") tables served by the generic lookup
//! controller. Each entry is a plain [`MetaTableDescriptor`]; the controller
//! and the lookup repository never contain table-specific code, so adding a
//! lookup table means adding a descriptor below plus its storage relation.

use crate::status::StatusFilter;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ============================================================================
// Descriptor types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Integer,
    /// Numeric foreign key to another meta table
    Reference,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Reference)
    }
}

/// Writable scalar column of a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

impl ColumnDef {
    pub const fn text(name: &'static str) -> Self {
        Self { name, kind: ColumnKind::Text, required: true }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self { name, kind: ColumnKind::Integer, required: true }
    }

    pub const fn reference(name: &'static str, required: bool) -> Self {
        Self { name, kind: ColumnKind::Reference, required }
    }
}

/// Related-entity join embedded into list/detail responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CustomInclude {
    /// Key under which the related row is embedded, e.g. `mlaConstituency`
    pub association: &'static str,
    pub table_name: &'static str,
    /// Column on the owning table holding the related id
    pub foreign_key: &'static str,
    /// Projected attributes of the related row
    pub attributes: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetaTableDescriptor {
    pub name: &'static str,
    pub table_name: &'static str,
    pub display_name: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [ColumnDef],
    pub searchable_fields: &'static [&'static str],
    pub has_status: bool,
    pub custom_includes: &'static [CustomInclude],
}

// ============================================================================
// Catalog
// ============================================================================

const NAME_ONLY: &[ColumnDef] = &[ColumnDef::text("name")];
const NAME_AND_NUM: &[ColumnDef] = &[ColumnDef::text("name"), ColumnDef::integer("num")];

const SEARCH_NAME: &[&str] = &["name"];
const SEARCH_NAME_NUM: &[&str] = &["name", "num"];

const fn simple(
    name: &'static str,
    table_name: &'static str,
    display_name: &'static str,
) -> MetaTableDescriptor {
    MetaTableDescriptor {
        name,
        table_name,
        display_name,
        primary_key: "id",
        columns: NAME_ONLY,
        searchable_fields: SEARCH_NAME,
        has_status: true,
        custom_includes: &[],
    }
}

const fn numbered(
    name: &'static str,
    table_name: &'static str,
    display_name: &'static str,
) -> MetaTableDescriptor {
    MetaTableDescriptor {
        columns: NAME_AND_NUM,
        searchable_fields: SEARCH_NAME_NUM,
        ..simple(name, table_name, display_name)
    }
}

const ID_AND_NAME: &[&str] = &["id", "name"];
const ID_NAME_NUM: &[&str] = &["id", "name", "num"];

static DESCRIPTORS: &[MetaTableDescriptor] = &[
    simple("businessType", "tbl_meta_business_type", "Business Type"),
    simple("genderOption", "tbl_meta_gender_option", "Gender Option"),
    numbered("mlaConstituency", "tbl_meta_mla_constituency", "MLA Constituency"),
    numbered("mpConstituency", "tbl_meta_mp_constituency", "MP Constituency"),
    MetaTableDescriptor {
        columns: &[
            ColumnDef::text("name"),
            ColumnDef::integer("num"),
            ColumnDef::reference("mla_constituency_id", true),
        ],
        searchable_fields: &["name", "num", "mla_constituency_id"],
        custom_includes: &[CustomInclude {
            association: "mlaConstituency",
            table_name: "tbl_meta_mla_constituency",
            foreign_key: "mla_constituency_id",
            attributes: ID_NAME_NUM,
        }],
        ..simple("boothNumber", "tbl_meta_booth_number", "Booth Number")
    },
    numbered("wardNumber", "tbl_meta_ward_number", "Ward Number"),
    simple("district", "tbl_meta_district", "District"),
    MetaTableDescriptor {
        columns: &[ColumnDef::text("name"), ColumnDef::reference("district_id", true)],
        searchable_fields: &["name", "district_id"],
        custom_includes: &[CustomInclude {
            association: "district",
            table_name: "tbl_meta_district",
            foreign_key: "district_id",
            attributes: ID_AND_NAME,
        }],
        ..simple("mandal", "tbl_meta_mandal", "Mandal")
    },
    MetaTableDescriptor {
        columns: &[ColumnDef::text("name"), ColumnDef::reference("mandal_id", true)],
        searchable_fields: &["name", "mandal_id"],
        custom_includes: &[CustomInclude {
            association: "mandal",
            table_name: "tbl_meta_mandal",
            foreign_key: "mandal_id",
            attributes: ID_AND_NAME,
        }],
        ..simple("village", "tbl_meta_village", "Village")
    },
    simple("religion", "tbl_meta_religion", "Religion"),
    MetaTableDescriptor {
        columns: &[ColumnDef::text("name"), ColumnDef::reference("religion_id", false)],
        searchable_fields: &["name", "religion_id"],
        custom_includes: &[CustomInclude {
            association: "religion",
            table_name: "tbl_meta_religion",
            foreign_key: "religion_id",
            attributes: ID_AND_NAME,
        }],
        ..simple("caste", "tbl_meta_caste", "Caste")
    },
    simple("educationLevel", "tbl_meta_education_level", "Education Level"),
    simple("occupation", "tbl_meta_occupation", "Occupation"),
    simple("bloodGroup", "tbl_meta_blood_group", "Blood Group"),
    simple("maritalStatus", "tbl_meta_marital_status", "Marital Status"),
    simple("language", "tbl_meta_language", "Language"),
    simple("designation", "tbl_meta_designation", "Designation"),
    simple("jobCategory", "tbl_meta_job_category", "Job Category"),
];

lazy_static! {
    static ref INDEX: HashMap<&'static str, &'static MetaTableDescriptor> =
        DESCRIPTORS.iter().map(|d| (d.name, d)).collect();
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Lookup table not found: {0}")]
    NotFound(String),

    #[error("Field '{field}' is not searchable on {table}")]
    UnsearchableField { table: String, field: String },

    #[error("Invalid search term for '{field}': {term}")]
    InvalidSearchTerm { field: String, term: String },

    #[error("Unknown column '{column}' on {table}")]
    UnknownColumn { table: String, column: String },

    #[error("Missing required column '{column}' on {table}")]
    MissingColumn { table: String, column: String },

    #[error("Invalid value for '{column}': {reason}")]
    InvalidValue { column: String, reason: String },

    #[error("Payload must be a non-empty JSON object")]
    EmptyPayload,

    #[error("{0}")]
    InvalidStatusFilter(String),
}

impl RegistryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound(_))
    }
}

// ============================================================================
// Registry
// ============================================================================

pub struct MetaRegistry;

impl MetaRegistry {
    /// Resolve a routing key to its descriptor.
    pub fn resolve(key: &str) -> Result<&'static MetaTableDescriptor, RegistryError> {
        INDEX
            .get(key)
            .copied()
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))
    }

    pub fn all() -> &'static [MetaTableDescriptor] {
        DESCRIPTORS
    }
}

impl MetaTableDescriptor {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Kind of a field usable in filters: the primary key, `name`, or a declared column.
    fn field_kind(&self, field: &str) -> Option<ColumnKind> {
        if field == self.primary_key {
            return Some(ColumnKind::Integer);
        }
        self.column(field).map(|c| c.kind)
    }

    /// Plan a list request, rejecting fields outside `searchable_fields`.
    pub fn plan_list(&self, params: &LookupListParams) -> Result<LookupFilter, RegistryError> {
        let status = match params.status.as_deref() {
            Some(raw) => raw
                .parse::<StatusFilter>()
                .map_err(RegistryError::InvalidStatusFilter)?,
            None => StatusFilter::default(),
        };
        // Tables without a status column ignore the filter
        let status = if self.has_status { status.as_status() } else { None };

        // A named field must be searchable even when the term is blank
        if let Some(field) = params.field.as_deref() {
            self.searchable_column(field)?;
        }

        let search = match params.search.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(term) => {
                let field = params.field.as_deref().unwrap_or("name");
                Some(self.plan_search(field, term)?)
            }
        };

        Ok(LookupFilter {
            status,
            search,
            limit: params.limit.unwrap_or(100).clamp(1, 1000),
            offset: params.offset.unwrap_or(0).max(0),
        })
    }

    fn searchable_column(&self, field: &str) -> Result<(&'static str, ColumnKind), RegistryError> {
        let searchable = self.searchable_fields.iter().find(|f| **f == field);
        let kind = searchable.and_then(|f| self.field_kind(f));

        match (searchable, kind) {
            (Some(column), Some(kind)) => Ok((*column, kind)),
            _ => Err(RegistryError::UnsearchableField {
                table: self.name.to_string(),
                field: field.to_string(),
            }),
        }
    }

    fn plan_search(&self, field: &str, term: &str) -> Result<SearchFilter, RegistryError> {
        let (column, kind) = self.searchable_column(field)?;

        if kind.is_numeric() {
            let value = term.parse::<i64>().map_err(|_| RegistryError::InvalidSearchTerm {
                field: field.to_string(),
                term: term.to_string(),
            })?;
            Ok(SearchFilter::Equals { column, value })
        } else {
            Ok(SearchFilter::Contains { column, term: term.to_string() })
        }
    }

    /// Validate a create/update body against the declared columns.
    ///
    /// `partial` is set for updates: required columns may be omitted but the
    /// body must still change something.
    pub fn validate_payload(
        &self,
        payload: &serde_json::Value,
        partial: bool,
    ) -> Result<ValidatedPayload, RegistryError> {
        let object = payload.as_object().ok_or(RegistryError::EmptyPayload)?;

        let mut fields = Vec::new();
        let mut status = None;

        for (key, value) in object {
            if key == "status" && self.has_status {
                status = Some(parse_status(value)?);
                continue;
            }

            let column = self.column(key).ok_or_else(|| RegistryError::UnknownColumn {
                table: self.name.to_string(),
                column: key.clone(),
            })?;
            fields.push((column.name, parse_value(column, value)?));
        }

        if !partial {
            for column in self.columns.iter().filter(|c| c.required) {
                let present = fields
                    .iter()
                    .any(|(name, value)| *name == column.name && *value != FieldValue::Null);
                if !present {
                    return Err(RegistryError::MissingColumn {
                        table: self.name.to_string(),
                        column: column.name.to_string(),
                    });
                }
            }
        } else if fields.is_empty() && status.is_none() {
            return Err(RegistryError::EmptyPayload);
        }

        // Stable bind order regardless of JSON key order
        fields.sort_by_key(|(name, _)| {
            self.columns.iter().position(|c| c.name == *name).unwrap_or(usize::MAX)
        });

        Ok(ValidatedPayload { fields, status })
    }
}

fn parse_status(value: &serde_json::Value) -> Result<i16, RegistryError> {
    match value.as_i64() {
        Some(v @ 0..=1) => Ok(v as i16),
        _ => Err(RegistryError::InvalidValue {
            column: "status".to_string(),
            reason: "expected 0 or 1".to_string(),
        }),
    }
}

fn parse_value(column: &ColumnDef, value: &serde_json::Value) -> Result<FieldValue, RegistryError> {
    let invalid = |reason: &str| RegistryError::InvalidValue {
        column: column.name.to_string(),
        reason: reason.to_string(),
    };

    if value.is_null() {
        if column.required {
            return Err(invalid("must not be null"));
        }
        return Ok(FieldValue::Null);
    }

    match column.kind {
        ColumnKind::Text => {
            let text = value.as_str().ok_or_else(|| invalid("expected a string"))?.trim();
            if text.is_empty() || text.len() > 255 {
                return Err(invalid("length must be between 1 and 255"));
            }
            Ok(FieldValue::Text(text.to_string()))
        }
        ColumnKind::Integer | ColumnKind::Reference => {
            // Accept numeric strings, as the admin UI posts form values
            let number = value
                .as_i64()
                .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
                .ok_or_else(|| invalid("expected an integer"))?;
            if column.kind == ColumnKind::Reference && number <= 0 {
                return Err(invalid("expected a positive id"));
            }
            Ok(FieldValue::Integer(number))
        }
    }
}

// ============================================================================
// Planned queries
// ============================================================================

/// Raw list parameters as received from the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupListParams {
    pub field: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// Case-insensitive substring match on a text column
    Contains { column: &'static str, term: String },
    /// Equality match on a numeric column
    Equals { column: &'static str, value: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFilter {
    pub status: Option<i16>,
    pub search: Option<SearchFilter>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPayload {
    pub fields: Vec<(&'static str, FieldValue)>,
    pub status: Option<i16>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_resolve_is_stable() {
        for descriptor in MetaRegistry::all() {
            let first = MetaRegistry::resolve(descriptor.name).unwrap();
            let second = MetaRegistry::resolve(descriptor.name).unwrap();
            assert_eq!(first, second);
            assert!(std::ptr::eq(first, second));
        }
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        let err = MetaRegistry::resolve("noSuchTable").unwrap_err();
        assert!(err.is_not_found());
        // Lookup is exact, no case folding onto another table
        assert!(MetaRegistry::resolve("BusinessType").is_err());
    }

    #[test]
    fn test_catalog_is_consistent() {
        let all = MetaRegistry::all();
        assert_eq!(all.len(), 18);

        let keys: HashSet<_> = all.iter().map(|d| d.name).collect();
        let tables: HashSet<_> = all.iter().map(|d| d.table_name).collect();
        assert_eq!(keys.len(), all.len());
        assert_eq!(tables.len(), all.len());

        for descriptor in all {
            assert!(descriptor.table_name.starts_with("tbl_meta_"));
            for field in descriptor.searchable_fields {
                assert!(
                    descriptor.field_kind(field).is_some(),
                    "{}.{} is searchable but not declared",
                    descriptor.name,
                    field
                );
            }
            for include in descriptor.custom_includes {
                assert!(tables.contains(include.table_name));
                assert!(descriptor.column(include.foreign_key).is_some());
            }
        }
    }

    #[test]
    fn test_booth_number_embeds_constituency() {
        let booth = MetaRegistry::resolve("boothNumber").unwrap();
        let include = &booth.custom_includes[0];
        assert_eq!(include.association, "mlaConstituency");
        assert_eq!(include.table_name, "tbl_meta_mla_constituency");
        assert!(include.attributes.contains(&"id"));
        assert!(include.attributes.contains(&"name"));
    }

    #[test]
    fn test_search_on_unlisted_field_is_rejected() {
        let gender = MetaRegistry::resolve("genderOption").unwrap();
        let params = LookupListParams {
            field: Some("created_by".to_string()),
            search: Some("1".to_string()),
            ..Default::default()
        };
        let err = gender.plan_list(&params).unwrap_err();
        assert!(matches!(err, RegistryError::UnsearchableField { .. }));

        for search in [Some(String::new()), Some("   ".to_string()), None] {
            let params = LookupListParams {
                field: Some("created_by".to_string()),
                search,
                ..Default::default()
            };
            let err = gender.plan_list(&params).unwrap_err();
            assert!(matches!(err, RegistryError::UnsearchableField { .. }));
        }

        let blank_on_name = LookupListParams {
            field: Some("name".to_string()),
            search: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(gender.plan_list(&blank_on_name).unwrap().search, None);
    }

    #[test]
    fn test_search_plans() {
        let booth = MetaRegistry::resolve("boothNumber").unwrap();

        let by_name = booth
            .plan_list(&LookupListParams {
                search: Some(" school ".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            by_name.search,
            Some(SearchFilter::Contains { column: "name", term: "school".to_string() })
        );

        let by_num = booth
            .plan_list(&LookupListParams {
                field: Some("num".to_string()),
                search: Some("42".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_num.search, Some(SearchFilter::Equals { column: "num", value: 42 }));

        let bad_num = booth.plan_list(&LookupListParams {
            field: Some("num".to_string()),
            search: Some("forty".to_string()),
            ..Default::default()
        });
        assert!(matches!(bad_num, Err(RegistryError::InvalidSearchTerm { .. })));
    }

    #[test]
    fn test_status_defaults_to_active() {
        let district = MetaRegistry::resolve("district").unwrap();

        let plan = district.plan_list(&LookupListParams::default()).unwrap();
        assert_eq!(plan.status, Some(1));
        assert_eq!(plan.limit, 100);

        let all = district
            .plan_list(&LookupListParams { status: Some("all".to_string()), ..Default::default() })
            .unwrap();
        assert_eq!(all.status, None);

        let bad = district
            .plan_list(&LookupListParams { status: Some("maybe".to_string()), ..Default::default() });
        assert!(matches!(bad, Err(RegistryError::InvalidStatusFilter(_))));
    }

    #[test]
    fn test_payload_validation() {
        let booth = MetaRegistry::resolve("boothNumber").unwrap();

        let ok = booth
            .validate_payload(&json!({"mla_constituency_id": "3", "num": 12, "name": "Govt School"}), false)
            .unwrap();
        assert_eq!(
            ok.fields,
            vec![
                ("name", FieldValue::Text("Govt School".to_string())),
                ("num", FieldValue::Integer(12)),
                ("mla_constituency_id", FieldValue::Integer(3)),
            ]
        );

        let missing = booth.validate_payload(&json!({"name": "x", "num": 1}), false);
        assert!(matches!(missing, Err(RegistryError::MissingColumn { .. })));

        let unknown = booth.validate_payload(&json!({"name": "x", "colour": "red"}), true);
        assert!(matches!(unknown, Err(RegistryError::UnknownColumn { .. })));

        let status_only = booth.validate_payload(&json!({"status": 0}), true).unwrap();
        assert_eq!(status_only.status, Some(0));
        assert!(status_only.fields.is_empty());

        assert_eq!(booth.validate_payload(&json!({}), true), Err(RegistryError::EmptyPayload));
        assert_eq!(booth.validate_payload(&json!([1, 2]), false), Err(RegistryError::EmptyPayload));
    }

    #[test]
    fn test_optional_reference_accepts_null() {
        let caste = MetaRegistry::resolve("caste").unwrap();
        let payload = caste
            .validate_payload(&json!({"name": "Other", "religion_id": null}), false)
            .unwrap();
        assert_eq!(payload.fields[1], ("religion_id", FieldValue::Null));
    }
}
