use crate::types::{Descriptor, TableAlteration};

/// Quote an identifier only when CQL would otherwise fold its case.
pub fn quote_identifier(name: &str) -> String {
    if name.chars().any(|c| c.is_ascii_uppercase()) {
        format!("\"{}\"", name.replace('"', "\"\""))
    } else {
        name.to_string()
    }
}

/// Render the compaction map literal, e.g.
/// `{'class': 'SizeTieredCompactionStrategy', 'min_threshold': '2'}`.
pub fn compaction_literal(alteration: &TableAlteration) -> String {
    let mut parts = vec![format!("'class': '{}'", alteration.compaction_class())];
    for (key, value) in alteration.compaction_options() {
        parts.push(format!("'{}': '{}'", key, value));
    }
    format!("{{{}}}", parts.join(", "))
}

/// Render the `ALTER TABLE` statement for one alteration.
///
/// Pure and deterministic: equal input yields byte-identical output.
pub fn render(keyspace: &str, alteration: &TableAlteration) -> String {
    format!(
        "ALTER TABLE {}.{} WITH compaction = {} AND gc_grace_seconds = {}",
        quote_identifier(keyspace),
        quote_identifier(alteration.table_name()),
        compaction_literal(alteration),
        alteration.gc_grace_seconds()
    )
}

/// Render every statement of a descriptor, in declaration order.
pub fn render_all(descriptor: &Descriptor) -> Vec<String> {
    descriptor
        .alterations()
        .iter()
        .map(|a| render(descriptor.keyspace(), a))
        .collect()
}

/// Render a descriptor as a runnable CQL script, one statement per line.
pub fn render_script(descriptor: &Descriptor) -> String {
    let mut out = String::new();
    for stmt in render_all(descriptor) {
        out.push_str(&stmt);
        out.push_str(";\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{load, AlterationSpec};

    fn one(spec: AlterationSpec) -> Descriptor {
        load("otter", &[spec]).unwrap()
    }

    #[test]
    fn test_render_locks_scenario() {
        let d = one(AlterationSpec::new("locks", "SizeTieredCompactionStrategy", 2, 3600));
        assert_eq!(
            render(d.keyspace(), &d.alterations()[0]),
            "ALTER TABLE otter.locks WITH compaction = \
             {'class': 'SizeTieredCompactionStrategy', 'min_threshold': '2'} \
             AND gc_grace_seconds = 3600"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let spec = AlterationSpec::new("servers", "LeveledCompactionStrategy", 4, 864000)
            .max_threshold(32)
            .tombstone_threshold(0.2);
        let a = one(spec.clone());
        let b = one(spec);
        assert_eq!(
            render(a.keyspace(), &a.alterations()[0]),
            render(b.keyspace(), &b.alterations()[0])
        );
        assert_eq!(render_all(&a), render_all(&a));
    }

    #[test]
    fn test_qualified_class_rendered_short() {
        let d = one(AlterationSpec::new(
            "locks",
            "org.apache.cassandra.db.compaction.TimeWindowCompactionStrategy",
            2,
            60,
        ));
        let stmt = render(d.keyspace(), &d.alterations()[0]);
        assert!(stmt.contains("'class': 'TimeWindowCompactionStrategy'"));
    }

    #[test]
    fn test_optional_options_in_fixed_order() {
        let d = one(
            AlterationSpec::new("locks", "SizeTieredCompactionStrategy", 2, 0)
                .unchecked_tombstone_compaction(true)
                .tombstone_threshold(1.0)
                .max_threshold(16),
        );
        assert_eq!(
            compaction_literal(&d.alterations()[0]),
            "{'class': 'SizeTieredCompactionStrategy', 'min_threshold': '2', \
             'max_threshold': '16', 'tombstone_threshold': '1.0', \
             'unchecked_tombstone_compaction': 'true'}"
        );
    }

    #[test]
    fn test_mixed_case_identifiers_quoted() {
        assert_eq!(quote_identifier("locks"), "locks");
        assert_eq!(quote_identifier("scalingGroup"), "\"scalingGroup\"");
    }

    #[test]
    fn test_render_script_terminates_statements() {
        let d = load(
            "otter",
            &[
                AlterationSpec::new("locks", "SizeTieredCompactionStrategy", 2, 3600),
                AlterationSpec::new("servers", "SizeTieredCompactionStrategy", 2, 3600),
            ],
        )
        .unwrap();
        let script = render_script(&d);
        assert_eq!(script.lines().count(), 2);
        assert!(script.lines().all(|l| l.ends_with(';')));
    }
}
