//! Partitioning of records into annotation groups.
//!
//! A key is computed once per record and groups are returned in ascending
//! key order, so repeated runs over the same table create ROIs in the same
//! order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::table::Record;

/// Deterministic group identifier. Integer keys order before text keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Int(i64),
    Text(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Int(v) => write!(f, "{}", v),
            GroupKey::Text(s) => f.write_str(s),
        }
    }
}

fn default_multiplier() -> i64 {
    100
}

/// How a record's group key is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupKeyRule {
    /// Value of a single column; integer when it parses as one.
    Field { column: String },
    /// `secondary * multiplier + primary`, both integer columns.
    Composite {
        primary: String,
        secondary: String,
        #[serde(default = "default_multiplier")]
        multiplier: i64,
    },
}

impl Default for GroupKeyRule {
    fn default() -> Self {
        GroupKeyRule::Field {
            column: "chr".to_string(),
        }
    }
}

impl GroupKeyRule {
    /// Columns the rule reads.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            GroupKeyRule::Field { column } => vec![column.as_str()],
            GroupKeyRule::Composite {
                primary, secondary, ..
            } => vec![primary.as_str(), secondary.as_str()],
        }
    }

    /// Compute the key of one record.
    pub fn key(&self, record: &Record) -> Result<GroupKey> {
        match self {
            GroupKeyRule::Field { column } => {
                // Same integer reading as the style index, so "3.0" joins "3".
                let raw = record.text(column)?.trim();
                Ok(match record.i64(column) {
                    Ok(v) => GroupKey::Int(v),
                    Err(_) => GroupKey::Text(raw.to_string()),
                })
            }
            GroupKeyRule::Composite {
                primary,
                secondary,
                multiplier,
            } => {
                let p = record.i64(primary)?;
                let s = record.i64(secondary)?;
                s.checked_mul(*multiplier)
                    .and_then(|v| v.checked_add(p))
                    .map(GroupKey::Int)
                    .ok_or_else(|| {
                        PipelineError::config(format!(
                            "row {}: composite key {} * {} + {} overflows",
                            record.origin(),
                            s,
                            multiplier,
                            p
                        ))
                    })
            }
        }
    }
}

/// Records sharing one key, in encounter order.
#[derive(Debug, Clone)]
pub struct Group<'a> {
    pub key: GroupKey,
    pub records: Vec<&'a Record>,
}

impl Group<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Split records into groups, returned in strictly ascending key order.
pub fn partition<'a>(
    rule: &GroupKeyRule,
    records: impl IntoIterator<Item = &'a Record>,
) -> Result<Vec<Group<'a>>> {
    let mut groups: BTreeMap<GroupKey, Vec<&'a Record>> = BTreeMap::new();
    for record in records {
        let key = rule.key(record)?;
        groups.entry(key).or_default().push(record);
    }

    log::debug!("Partitioned records into {} groups", groups.len());

    Ok(groups
        .into_iter()
        .map(|(key, records)| Group { key, records })
        .collect())
}
