//! Column descriptors.

use serde::Serialize;

/// A column as reported by the catalog, after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    /// Column name (lower-cased, unquoted).
    pub name: String,
    /// Lower-cased type name without size arguments.
    pub data_type: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Declared size, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<ColumnSize>,
    /// Default value expression, verbatim from the catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Backend-specific extras.
    #[serde(skip_serializing_if = "ColumnExtra::is_empty")]
    pub extra: ColumnExtra,
}

/// Declared size of a column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ColumnSize {
    /// Character or binary length.
    Length(u32),
    /// Numeric precision and scale.
    Precision {
        /// Total number of digits.
        precision: u32,
        /// Digits after the decimal point.
        scale: u32,
    },
}

/// Backend-specific column attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnExtra {
    /// Unsigned numeric column (MySQL).
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unsigned: bool,
    /// Value generated by the database on insert.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub auto_increment: bool,
    /// Allowed values of an enumerated type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl ColumnExtra {
    /// Check if no extra attribute is set.
    pub fn is_empty(&self) -> bool {
        !self.unsigned && !self.auto_increment && self.enum_values.is_none()
    }
}

impl ColumnInfo {
    /// Create a NOT NULL column.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: false,
            size: None,
            default_value: None,
            extra: ColumnExtra::default(),
        }
    }

    /// Create a nullable column.
    pub fn nullable(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            nullable: true,
            ..Self::new(name, data_type)
        }
    }

    /// Build a column from a declared type such as `VARCHAR(255)`.
    pub fn from_declared(name: impl Into<String>, declared: &str, nullable: bool) -> Self {
        let (data_type, size) = parse_declared_type(declared);
        Self {
            name: name.into(),
            data_type,
            nullable,
            size,
            default_value: None,
            extra: ColumnExtra::default(),
        }
    }

    /// Set the declared size.
    pub fn with_size(mut self, size: ColumnSize) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default_value = Some(default.into());
        self
    }

    /// Set the enumerated values.
    pub fn with_enum_values(mut self, values: Vec<String>) -> Self {
        self.extra.enum_values = Some(values);
        self
    }

    /// Mark as auto-increment.
    pub fn with_auto_increment(mut self) -> Self {
        self.extra.auto_increment = true;
        self
    }

    /// Check if this column is an enumerated type.
    pub fn is_enum(&self) -> bool {
        self.data_type.eq_ignore_ascii_case("enum") || self.extra.enum_values.is_some()
    }
}

/// Split a declared type into a lower-cased name and optional size.
///
/// `VARCHAR(255)` becomes `("varchar", Length(255))`, `DECIMAL(10, 2)` becomes
/// `("decimal", Precision { 10, 2 })`. Unparseable arguments are dropped.
pub fn parse_declared_type(declared: &str) -> (String, Option<ColumnSize>) {
    let declared = declared.trim();
    let Some(open) = declared.find('(') else {
        return (declared.to_lowercase(), None);
    };

    let name = declared[..open].trim().to_lowercase();
    let args = declared[open + 1..]
        .split(')')
        .next()
        .unwrap_or_default();
    let numbers: Vec<u32> = args
        .split(',')
        .map(|a| a.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .unwrap_or_default();

    let size = match numbers.as_slice() {
        [length] => Some(ColumnSize::Length(*length)),
        [precision, scale] => Some(ColumnSize::Precision {
            precision: *precision,
            scale: *scale,
        }),
        _ => None,
    };

    (name, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_type() {
        assert_eq!(parse_declared_type("INTEGER"), ("integer".to_string(), None));
        assert_eq!(parse_declared_type(""), (String::new(), None));
    }

    #[test]
    fn test_parse_sized_types() {
        assert_eq!(
            parse_declared_type("VARCHAR(255)"),
            ("varchar".to_string(), Some(ColumnSize::Length(255)))
        );
        assert_eq!(
            parse_declared_type("decimal(10, 2)"),
            (
                "decimal".to_string(),
                Some(ColumnSize::Precision {
                    precision: 10,
                    scale: 2
                })
            )
        );
        assert_eq!(
            parse_declared_type("enum('a','b')"),
            ("enum".to_string(), None)
        );
    }

    #[test]
    fn test_column_builders() {
        let col = ColumnInfo::nullable("title", "text").with_default("'untitled'");
        assert!(col.nullable);
        assert_eq!(col.default_value.as_deref(), Some("'untitled'"));
        assert!(col.extra.is_empty());

        let status = ColumnInfo::new("status", "ENUM").with_enum_values(vec!["on".into()]);
        assert!(status.is_enum());
        assert!(!status.extra.is_empty());
    }
}
