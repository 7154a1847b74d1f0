//! Static mapping from public sort keys to storage columns.
//!
//! List endpoints accept an `orderBy` string such as `"lastName desc, email"`.
//! Every key must appear in the resource's `SortMapping`; keys are compared
//! case-insensitively and translated to the underlying column before any SQL
//! is built, so client input never reaches the query text.

use thiserror::Error;

use crate::errors::ServiceError;

#[derive(Debug, Error, PartialEq)]
pub enum SortError {
    #[error("Unknown sort key '{0}'")]
    UnknownSortKey(String),
    #[error("Invalid sort clause '{0}'")]
    InvalidClause(String),
}

impl From<SortError> for ServiceError {
    fn from(error: SortError) -> Self {
        ServiceError::invalid_operation(error.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One resolved `column direction` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub column: &'static str,
    pub direction: SortDirection,
}

/// Declared mapping for one resource.
#[derive(Debug)]
pub struct SortMapping {
    pub resource: &'static str,
    pub default_key: &'static str,
    /// `(public key, column)` pairs.
    pub entries: &'static [(&'static str, &'static str)],
}

pub static USER_SORT_MAPPING: SortMapping = SortMapping {
    resource: "users",
    default_key: "Username",
    entries: &[
        ("FirstName", "first_name"),
        ("LastName", "last_name"),
        ("Email", "email"),
        ("Username", "username"),
    ],
};

pub static CARPARK_SORT_MAPPING: SortMapping = SortMapping {
    resource: "carparks",
    default_key: "CarparkName",
    entries: &[
        ("CarparkId", "carpark_id"),
        ("CarparkName", "carpark_name"),
        ("LotType", "lot_type"),
        ("Area", "area"),
        ("AgencyType", "agency_type"),
        ("Address", "address"),
    ],
};

/// All mappings checked by `validate_all` at startup.
pub static ALL_SORT_MAPPINGS: [&SortMapping; 2] = [&USER_SORT_MAPPING, &CARPARK_SORT_MAPPING];

impl SortMapping {
    fn column_for(&self, key: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(public, _)| public.eq_ignore_ascii_case(key))
            .map(|(_, column)| *column)
    }

    /// Resolves an `orderBy` string into column clauses.
    ///
    /// A missing or blank value resolves to the default key, ascending.
    pub fn resolve(&self, order_by: Option<&str>) -> Result<Vec<SortClause>, SortError> {
        let order_by = match order_by.map(str::trim) {
            Some(value) if !value.is_empty() => value,
            _ => self.default_key,
        };

        order_by
            .split(',')
            .map(|clause| self.resolve_clause(clause.trim()))
            .collect()
    }

    fn resolve_clause(&self, clause: &str) -> Result<SortClause, SortError> {
        let mut parts = clause.split_whitespace();
        let key = parts
            .next()
            .ok_or_else(|| SortError::InvalidClause(clause.to_string()))?;

        let direction = match parts.next() {
            None => SortDirection::Asc,
            Some(d) if d.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            Some(d) if d.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            Some(_) => return Err(SortError::InvalidClause(clause.to_string())),
        };
        if parts.next().is_some() {
            return Err(SortError::InvalidClause(clause.to_string()));
        }

        let column = self
            .column_for(key)
            .ok_or_else(|| SortError::UnknownSortKey(key.to_string()))?;

        Ok(SortClause { column, direction })
    }

    /// Renders an `ORDER BY` body, ending with insertion order as the tie-breaker.
    pub fn order_by_sql(&self, clauses: &[SortClause]) -> String {
        let mut sql: Vec<String> = clauses
            .iter()
            .map(|c| format!("{} COLLATE NOCASE {}", c.column, c.direction.as_sql()))
            .collect();
        sql.push("rowid ASC".to_string());
        sql.join(", ")
    }

    /// Checks the table is well formed: default present, no duplicate keys,
    /// plain identifier columns.
    pub fn validate(&self) -> Result<(), String> {
        if self.column_for(self.default_key).is_none() {
            return Err(format!(
                "{}: default sort key '{}' is not mapped",
                self.resource, self.default_key
            ));
        }

        for (i, (key, column)) in self.entries.iter().enumerate() {
            if self.entries[..i]
                .iter()
                .any(|(other, _)| other.eq_ignore_ascii_case(key))
            {
                return Err(format!("{}: duplicate sort key '{}'", self.resource, key));
            }
            let valid_column = !column.is_empty()
                && column
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
            if !valid_column {
                return Err(format!(
                    "{}: column '{}' for key '{}' is not a plain identifier",
                    self.resource, column, key
                ));
            }
        }

        Ok(())
    }
}

/// Validates every declared sort mapping.
pub fn validate_all() -> Result<(), String> {
    ALL_SORT_MAPPINGS.iter().try_for_each(|m| m.validate())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_mappings_are_valid() {
        assert_eq!(validate_all(), Ok(()));
    }

    #[test]
    fn test_default_key_when_unspecified() {
        let clauses = USER_SORT_MAPPING.resolve(None).unwrap();
        assert_eq!(
            clauses,
            vec![SortClause {
                column: "username",
                direction: SortDirection::Asc
            }]
        );
        assert_eq!(USER_SORT_MAPPING.resolve(Some("  ")).unwrap(), clauses);
    }

    #[test]
    fn test_keys_are_case_insensitive_and_support_direction() {
        let clauses = USER_SORT_MAPPING
            .resolve(Some("lastname DESC, email"))
            .unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].column, "last_name");
        assert_eq!(clauses[0].direction, SortDirection::Desc);
        assert_eq!(clauses[1].column, "email");
        assert_eq!(clauses[1].direction, SortDirection::Asc);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert_eq!(
            USER_SORT_MAPPING.resolve(Some("password_hash")),
            Err(SortError::UnknownSortKey("password_hash".to_string()))
        );
        assert_eq!(
            USER_SORT_MAPPING.resolve(Some("Email; DROP TABLE users")),
            Err(SortError::InvalidClause("Email; DROP TABLE users".to_string()))
        );
        assert!(matches!(
            USER_SORT_MAPPING.resolve(Some("Email sideways")),
            Err(SortError::InvalidClause(_))
        ));
    }

    #[test]
    fn test_order_by_sql_appends_insertion_order() {
        let clauses = CARPARK_SORT_MAPPING.resolve(Some("Area desc")).unwrap();
        assert_eq!(
            CARPARK_SORT_MAPPING.order_by_sql(&clauses),
            "area COLLATE NOCASE DESC, rowid ASC"
        );
    }

    #[test]
    fn test_validate_catches_bad_tables() {
        let missing_default = SortMapping {
            resource: "things",
            default_key: "Name",
            entries: &[("Title", "title")],
        };
        assert!(missing_default.validate().is_err());

        let duplicate = SortMapping {
            resource: "things",
            default_key: "Name",
            entries: &[("Name", "name"), ("name", "other")],
        };
        assert!(duplicate.validate().is_err());

        let bad_column = SortMapping {
            resource: "things",
            default_key: "Name",
            entries: &[("Name", "name; --")],
        };
        assert!(bad_column.validate().is_err());
    }
}
