//! Descriptor loading and validation.
//!
//! A descriptor names a keyspace and an ordered list of per-table compaction
//! and gc_grace changes. Raw records ([`AlterationSpec`]) come from a TOML or
//! JSON file, or from the embedded default; [`load`] turns them into a
//! [`Descriptor`] or reports the first record that breaks a constraint.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{format_ratio, is_valid_identifier, CompactionClass, Descriptor, TableAlteration};

/// An unvalidated alteration record, as written in a descriptor file.
///
/// Numeric fields are signed so that negative input reaches validation and is
/// reported with the offending record instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterationSpec {
    #[serde(alias = "table_name")]
    pub table: String,
    #[serde(alias = "class", alias = "compaction_class")]
    pub compaction: String,
    pub min_threshold: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tombstone_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unchecked_tombstone_compaction: Option<bool>,
    pub gc_grace_seconds: i64,
}

impl AlterationSpec {
    pub fn new(
        table: impl Into<String>,
        compaction: impl Into<String>,
        min_threshold: i64,
        gc_grace_seconds: i64,
    ) -> Self {
        Self {
            table: table.into(),
            compaction: compaction.into(),
            min_threshold,
            max_threshold: None,
            tombstone_threshold: None,
            unchecked_tombstone_compaction: None,
            gc_grace_seconds,
        }
    }

    pub fn max_threshold(mut self, max: i64) -> Self {
        self.max_threshold = Some(max);
        self
    }

    pub fn tombstone_threshold(mut self, ratio: f64) -> Self {
        self.tombstone_threshold = Some(ratio);
        self
    }

    pub fn unchecked_tombstone_compaction(mut self, enabled: bool) -> Self {
        self.unchecked_tombstone_compaction = Some(enabled);
        self
    }
}

/// Validate `specs` against `keyspace` and build the run's descriptor.
///
/// Record indexes in errors are 1-based, matching declaration order in the
/// file. Nothing is sent anywhere; this is a pure check.
pub fn load(keyspace: &str, specs: &[AlterationSpec]) -> Result<Descriptor, ValidationError> {
    let keyspace = keyspace.trim();
    if keyspace.is_empty() {
        return Err(ValidationError::EmptyKeyspace);
    }
    if !is_valid_identifier(keyspace) {
        return Err(ValidationError::InvalidKeyspace(keyspace.to_string()));
    }
    if specs.is_empty() {
        return Err(ValidationError::NoAlterations);
    }

    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(specs.len());
    let mut alterations = Vec::with_capacity(specs.len());

    for (i, spec) in specs.iter().enumerate() {
        let index = i + 1;
        let table = spec.table.trim();

        if table.is_empty() {
            return Err(ValidationError::EmptyTableName { index });
        }
        if !is_valid_identifier(table) {
            return Err(ValidationError::InvalidTableName {
                index,
                table: table.to_string(),
            });
        }
        if let Some(&first) = seen.get(table) {
            return Err(ValidationError::DuplicateTable {
                index,
                table: table.to_string(),
                first,
            });
        }
        seen.insert(table, index);

        alterations.push(validate_record(index, table, spec)?);
    }

    Ok(Descriptor {
        keyspace: keyspace.to_string(),
        alterations,
    })
}

fn validate_record(
    index: usize,
    table: &str,
    spec: &AlterationSpec,
) -> Result<TableAlteration, ValidationError> {
    let compaction_class = CompactionClass::parse(&spec.compaction).ok_or_else(|| {
        ValidationError::UnknownCompactionClass {
            index,
            table: table.to_string(),
            class: spec.compaction.clone(),
        }
    })?;

    if spec.min_threshold < 1 {
        return Err(ValidationError::MinThresholdTooSmall {
            index,
            table: table.to_string(),
            value: spec.min_threshold,
        });
    }
    let min_threshold = cql_int(index, table, "min_threshold", spec.min_threshold)?;

    let max_threshold = match spec.max_threshold {
        Some(max) if max < 2 || max < spec.min_threshold => {
            return Err(ValidationError::MaxThresholdBelowMin {
                index,
                table: table.to_string(),
                min: spec.min_threshold,
                max,
            });
        }
        Some(max) => Some(cql_int(index, table, "max_threshold", max)?),
        None => None,
    };

    if spec.gc_grace_seconds < 0 {
        return Err(ValidationError::NegativeGcGrace {
            index,
            table: table.to_string(),
            value: spec.gc_grace_seconds,
        });
    }
    let gc_grace_seconds = cql_int(index, table, "gc_grace_seconds", spec.gc_grace_seconds)?;

    if let Some(t) = spec.tombstone_threshold {
        if !(0.0..=1.0).contains(&t) {
            return Err(ValidationError::TombstoneThresholdOutOfRange {
                index,
                table: table.to_string(),
                value: format_ratio(t),
            });
        }
    }

    Ok(TableAlteration {
        table_name: table.to_string(),
        compaction_class,
        min_threshold,
        max_threshold,
        tombstone_threshold: spec.tombstone_threshold,
        unchecked_tombstone_compaction: spec.unchecked_tombstone_compaction,
        gc_grace_seconds,
    })
}

/// Values land in CQL `int` columns; anything past `i32::MAX` is rejected by
/// the server, so reject it here.
fn cql_int(
    index: usize,
    table: &str,
    field: &'static str,
    value: i64,
) -> Result<u32, ValidationError> {
    if value > i64::from(i32::MAX) {
        return Err(ValidationError::OutOfRange {
            index,
            table: table.to_string(),
            field,
            value,
        });
    }
    // Non-negative and <= i32::MAX here.
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stcs(table: &str) -> AlterationSpec {
        AlterationSpec::new(table, "SizeTieredCompactionStrategy", 2, 3600)
    }

    #[test]
    fn test_load_preserves_declaration_order() {
        let specs = vec![stcs("scaling_group"), stcs("locks"), stcs("webhook_keys")];
        let d = load("otter", &specs).unwrap();
        let names: Vec<&str> = d.alterations().iter().map(|a| a.table_name()).collect();
        assert_eq!(names, vec!["scaling_group", "locks", "webhook_keys"]);
        assert_eq!(d.keyspace(), "otter");
    }

    #[test]
    fn test_load_scenario_single_table() {
        let d = load("otter", &[stcs("locks")]).unwrap();
        let a = &d.alterations()[0];
        assert_eq!(a.table_name(), "locks");
        assert_eq!(a.compaction_class(), CompactionClass::SizeTiered);
        assert_eq!(a.min_threshold(), 2);
        assert_eq!(a.gc_grace_seconds(), 3600);
        assert_eq!(a.max_threshold(), None);
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let specs = vec![stcs("locks"), stcs("servers"), stcs("locks")];
        let err = load("otter", &specs).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateTable {
                index: 3,
                table: "locks".into(),
                first: 1,
            }
        );
    }

    #[test]
    fn test_zero_min_threshold_rejected() {
        let specs = vec![AlterationSpec::new("locks", "SizeTieredCompactionStrategy", 0, 3600)];
        let err = load("otter", &specs).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MinThresholdTooSmall { index: 1, value: 0, .. }
        ));
    }

    #[test]
    fn test_negative_gc_grace_rejected() {
        let specs = vec![AlterationSpec::new("locks", "SizeTieredCompactionStrategy", 2, -1)];
        let err = load("otter", &specs).unwrap_err();
        assert!(matches!(err, ValidationError::NegativeGcGrace { value: -1, .. }));
    }

    #[test]
    fn test_zero_gc_grace_allowed() {
        let specs = vec![AlterationSpec::new("locks", "SizeTieredCompactionStrategy", 2, 0)];
        assert_eq!(load("otter", &specs).unwrap().alterations()[0].gc_grace_seconds(), 0);
    }

    #[test]
    fn test_unknown_class_rejected() {
        let specs = vec![AlterationSpec::new("locks", "FastCompaction", 2, 3600)];
        let err = load("otter", &specs).unwrap_err();
        assert!(err.to_string().contains("FastCompaction"));
    }

    #[test]
    fn test_empty_and_invalid_names() {
        let err = load("otter", &[stcs("  ")]).unwrap_err();
        assert_eq!(err, ValidationError::EmptyTableName { index: 1 });

        let err = load("otter", &[stcs("locks; DROP")]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTableName { index: 1, .. }));

        assert_eq!(load("", &[stcs("locks")]).unwrap_err(), ValidationError::EmptyKeyspace);
        assert!(matches!(
            load("my-ks", &[stcs("locks")]).unwrap_err(),
            ValidationError::InvalidKeyspace(_)
        ));
    }

    #[test]
    fn test_no_alterations_rejected() {
        assert_eq!(load("otter", &[]).unwrap_err(), ValidationError::NoAlterations);
    }

    #[test]
    fn test_gc_grace_beyond_cql_int() {
        let specs = vec![AlterationSpec::new(
            "locks",
            "SizeTieredCompactionStrategy",
            2,
            i64::from(i32::MAX) + 1,
        )];
        let err = load("otter", &specs).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange { field: "gc_grace_seconds", .. }
        ));
    }

    #[test]
    fn test_max_threshold_must_cover_min() {
        let specs = vec![stcs("locks").max_threshold(1)];
        assert!(matches!(
            load("otter", &specs).unwrap_err(),
            ValidationError::MaxThresholdBelowMin { .. }
        ));

        let specs = vec![AlterationSpec::new("locks", "SizeTieredCompactionStrategy", 8, 3600)
            .max_threshold(4)];
        assert!(load("otter", &specs).is_err());

        let specs = vec![stcs("locks").max_threshold(32)];
        assert_eq!(load("otter", &specs).unwrap().alterations()[0].max_threshold(), Some(32));
    }

    #[test]
    fn test_tombstone_threshold_range() {
        let specs = vec![stcs("locks").tombstone_threshold(1.5)];
        assert!(matches!(
            load("otter", &specs).unwrap_err(),
            ValidationError::TombstoneThresholdOutOfRange { .. }
        ));
        let specs = vec![stcs("locks").tombstone_threshold(0.1)];
        assert!(load("otter", &specs).is_ok());
    }

    #[test]
    fn test_first_bad_record_wins() {
        let specs = vec![
            stcs("locks"),
            AlterationSpec::new("servers", "SizeTieredCompactionStrategy", 0, 3600),
            AlterationSpec::new("", "SizeTieredCompactionStrategy", 2, 3600),
        ];
        let err = load("otter", &specs).unwrap_err();
        assert!(matches!(err, ValidationError::MinThresholdTooSmall { index: 2, .. }));
    }
}
