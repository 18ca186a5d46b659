use gcgrace_common::statement::render_all;
use gcgrace_common::Descriptor;
use serde_json::{json, Value};

use crate::format::{tables, OutputMode};

/// Cassandra's default grace period (10 days). Below it, a replica that stays
/// down longer than the grace period can resurrect deleted rows.
pub const DEFAULT_GC_GRACE_SECONDS: u32 = 864_000;

/// Risk level for an alteration plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field in a plan output.
#[derive(Debug, Clone)]
pub struct PlanField {
    pub label: String,
    pub value: String,
}

/// What an `--apply` run would do, rendered without touching the cluster.
#[derive(Debug, Clone)]
pub struct PlanOutput {
    pub risk: RiskLevel,
    pub fields: Vec<PlanField>,
    pub statements: Vec<String>,
    pub warnings: Vec<String>,
}

impl PlanOutput {
    /// Build the plan for `descriptor` against `hosts`.
    pub fn for_descriptor(descriptor: &Descriptor, hosts: &[String]) -> Self {
        let mut plan = Self {
            risk: RiskLevel::Low,
            fields: Vec::new(),
            statements: render_all(descriptor),
            warnings: Vec::new(),
        }
        .field("Keyspace", descriptor.keyspace())
        .field("Tables", tables(descriptor.len()))
        .field("Hosts", hosts.join(", "));

        for a in descriptor.alterations() {
            let gc = a.gc_grace_seconds();
            if gc == 0 {
                plan.risk = plan.risk.max(RiskLevel::High);
                plan = plan.warn(format!(
                    "{}: gc_grace_seconds = 0 drops tombstones at the next compaction; \
                     hints and repairs can resurrect deleted rows",
                    a.table_name()
                ));
            } else if gc < DEFAULT_GC_GRACE_SECONDS {
                plan.risk = plan.risk.max(RiskLevel::Medium);
                plan = plan.warn(format!(
                    "{}: gc_grace_seconds = {} is shorter than the repair window of {}s",
                    a.table_name(),
                    gc,
                    DEFAULT_GC_GRACE_SECONDS
                ));
            }
        }
        plan
    }

    pub fn field(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(PlanField {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    pub fn warn(mut self, msg: impl Into<String>) -> Self {
        self.warnings.push(msg.into());
        self
    }

    /// Render the plan as a human-readable string (table mode) or JSON.
    pub fn render(&self, mode: OutputMode) -> String {
        match mode {
            OutputMode::Json => self.render_json(),
            OutputMode::Table => self.render_table(),
        }
    }

    fn render_table(&self) -> String {
        let mut out = String::new();

        out.push_str("╔══ PLAN: alter compaction / gc_grace_seconds ══\n");
        out.push_str(&format!("  Risk Level : {}\n", self.risk));

        let label_width = self
            .fields
            .iter()
            .map(|f| f.label.len())
            .max()
            .unwrap_or(0)
            .max(10);
        for f in &self.fields {
            out.push_str(&format!(
                "  {:<width$} : {}\n",
                f.label,
                f.value,
                width = label_width
            ));
        }

        for (i, stmt) in self.statements.iter().enumerate() {
            out.push_str(&format!("  {:>2}. {};\n", i + 1, stmt));
        }

        for w in &self.warnings {
            out.push_str(&format!("  ⚠  WARNING : {}\n", w));
        }

        out.push_str("╚══ To execute, re-run with --apply (add --yes to skip confirmation) ══\n");
        out
    }

    fn render_json(&self) -> String {
        let fields: Value = self
            .fields
            .iter()
            .map(|f| (f.label.clone(), Value::String(f.value.clone())))
            .collect::<serde_json::Map<_, _>>()
            .into();

        let v = json!({
            "plan": {
                "risk": self.risk.as_str(),
                "fields": fields,
                "statements": self.statements,
                "warnings": self.warnings,
            }
        });
        let mut s = serde_json::to_string_pretty(&v).unwrap_or_default();
        s.push('\n');
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcgrace_common::descriptor::load;
    use gcgrace_common::AlterationSpec;

    fn hosts() -> Vec<String> {
        vec!["10.0.0.1:9042".to_string(), "10.0.0.2:9042".to_string()]
    }

    fn descriptor(gc: &[i64]) -> Descriptor {
        let specs: Vec<AlterationSpec> = gc
            .iter()
            .enumerate()
            .map(|(i, g)| {
                AlterationSpec::new(format!("t{}", i), "SizeTieredCompactionStrategy", 2, *g)
            })
            .collect();
        load("otter", &specs).unwrap()
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }

    #[test]
    fn test_plan_lists_every_statement_in_order() {
        let plan = PlanOutput::for_descriptor(&descriptor(&[864000, 900000]), &hosts());
        assert_eq!(plan.statements.len(), 2);
        assert!(plan.statements[0].contains("otter.t0"));
        assert!(plan.statements[1].contains("otter.t1"));
        assert_eq!(plan.risk, RiskLevel::Low);
        assert!(plan.warnings.is_empty());

        let out = plan.render(OutputMode::Table);
        assert!(out.contains("Keyspace"));
        assert!(out.contains("10.0.0.1:9042, 10.0.0.2:9042"));
        assert!(out.contains("--apply"));
    }

    #[test]
    fn test_short_grace_is_medium_risk() {
        let plan = PlanOutput::for_descriptor(&descriptor(&[3600, 864000]), &hosts());
        assert_eq!(plan.risk, RiskLevel::Medium);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.render(OutputMode::Table).contains("WARNING"));
    }

    #[test]
    fn test_zero_grace_is_high_risk() {
        let plan = PlanOutput::for_descriptor(&descriptor(&[3600, 0]), &hosts());
        assert_eq!(plan.risk, RiskLevel::High);
        assert_eq!(plan.warnings.len(), 2);
    }

    #[test]
    fn test_plan_render_json() {
        let plan = PlanOutput::for_descriptor(&descriptor(&[3600]), &hosts());
        let out = plan.render(OutputMode::Json);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["plan"]["risk"], "MEDIUM");
        assert_eq!(v["plan"]["fields"]["Keyspace"], "otter");
        assert_eq!(v["plan"]["statements"].as_array().unwrap().len(), 1);
    }
}
