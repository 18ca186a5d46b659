use std::fmt;

const COMPACTION_PACKAGE: &str = "org.apache.cassandra.db.compaction.";

/// Compaction strategies the loader accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompactionClass {
    SizeTiered,
    Leveled,
    TimeWindow,
    DateTiered,
}

impl CompactionClass {
    pub const ALL: [CompactionClass; 4] = [
        Self::SizeTiered,
        Self::Leveled,
        Self::TimeWindow,
        Self::DateTiered,
    ];

    /// Parse the short class name or the fully qualified
    /// `org.apache.cassandra.db.compaction.*` form. Case-sensitive, as CQL
    /// class names are.
    pub fn parse(s: &str) -> Option<Self> {
        let short = s.trim();
        let short = short.strip_prefix(COMPACTION_PACKAGE).unwrap_or(short);
        Self::ALL.into_iter().find(|c| c.as_str() == short)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SizeTiered => "SizeTieredCompactionStrategy",
            Self::Leveled => "LeveledCompactionStrategy",
            Self::TimeWindow => "TimeWindowCompactionStrategy",
            Self::DateTiered => "DateTieredCompactionStrategy",
        }
    }

    /// The class name as `system_schema.tables` reports it.
    pub fn qualified_name(&self) -> String {
        format!("{}{}", COMPACTION_PACKAGE, self.as_str())
    }
}

impl fmt::Display for CompactionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated per-table change. Only the descriptor loader builds these.
#[derive(Debug, Clone, PartialEq)]
pub struct TableAlteration {
    pub(crate) table_name: String,
    pub(crate) compaction_class: CompactionClass,
    pub(crate) min_threshold: u32,
    pub(crate) max_threshold: Option<u32>,
    pub(crate) tombstone_threshold: Option<f64>,
    pub(crate) unchecked_tombstone_compaction: Option<bool>,
    pub(crate) gc_grace_seconds: u32,
}

impl TableAlteration {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn compaction_class(&self) -> CompactionClass {
        self.compaction_class
    }

    pub fn min_threshold(&self) -> u32 {
        self.min_threshold
    }

    pub fn max_threshold(&self) -> Option<u32> {
        self.max_threshold
    }

    pub fn tombstone_threshold(&self) -> Option<f64> {
        self.tombstone_threshold
    }

    pub fn unchecked_tombstone_compaction(&self) -> Option<bool> {
        self.unchecked_tombstone_compaction
    }

    pub fn gc_grace_seconds(&self) -> u32 {
        self.gc_grace_seconds
    }

    /// Compaction sub-options in the order they are rendered, as the string
    /// pairs CQL stores in the `compaction` map. `class` is excluded.
    pub fn compaction_options(&self) -> Vec<(&'static str, String)> {
        let mut opts = vec![("min_threshold", self.min_threshold.to_string())];
        if let Some(max) = self.max_threshold {
            opts.push(("max_threshold", max.to_string()));
        }
        if let Some(t) = self.tombstone_threshold {
            opts.push(("tombstone_threshold", format_ratio(t)));
        }
        if let Some(u) = self.unchecked_tombstone_compaction {
            opts.push(("unchecked_tombstone_compaction", u.to_string()));
        }
        opts
    }
}

/// Render a ratio so that whole numbers keep one decimal (`1.0`, not `1`).
pub(crate) fn format_ratio(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

/// The validated, ordered set of alterations for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub(crate) keyspace: String,
    pub(crate) alterations: Vec<TableAlteration>,
}

impl Descriptor {
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn alterations(&self) -> &[TableAlteration] {
        &self.alterations
    }

    pub fn len(&self) -> usize {
        self.alterations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alterations.is_empty()
    }
}

/// CQL identifier rule: a letter followed by letters, digits or underscores,
/// at most 48 characters.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    name.len() <= 48 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
