/// Output mode for plans and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Table,
    Json,
}

/// Pluralize a table count for display.
pub fn tables(n: usize) -> String {
    format!("{} table{}", n, if n == 1 { "" } else { "s" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_plural() {
        assert_eq!(tables(1), "1 table");
        assert_eq!(tables(0), "0 tables");
        assert_eq!(tables(7), "7 tables");
    }
}
