//! SQL text shared by the MySQL and SQLite backends
//!
//! Both dialects accept backtick-quoted identifiers, `?` placeholders and
//! `REPLACE INTO`.

/// Quote an identifier with backticks, doubling embedded backticks
pub fn ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

pub fn show_columns(table: &str) -> String {
    format!("SHOW COLUMNS FROM {}", ident(table))
}

pub fn select_all(table: &str) -> String {
    format!("SELECT * FROM {}", ident(table))
}

pub fn add_column(table: &str, column: &str, column_type: &str) -> String {
    format!("ALTER TABLE {} ADD COLUMN {} {}", ident(table), ident(column), column_type)
}

pub fn drop_column(table: &str, column: &str) -> String {
    format!("ALTER TABLE {} DROP COLUMN {}", ident(table), ident(column))
}

/// `REPLACE INTO` with one placeholder per column
pub fn replace_into(table: &str, columns: &[String]) -> String {
    let cols = columns.iter().map(|c| ident(c)).collect::<Vec<_>>().join(", ");
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!("REPLACE INTO {} ({}) VALUES ({})", ident(table), cols, placeholders)
}
