//! Splitting SQL scripts into statements for the `exec_sql` RPC

/// Split a SQL script into single-line statements.
///
/// Lines are trimmed, blank lines and `--` comment lines are dropped, and the
/// remaining lines are joined with single spaces until a line ends with `;`.
/// A trailing statement without a terminating `;` is still returned.
///
/// This is line based: a `;` in the middle of a line does not end a
/// statement, and dollar-quoted function bodies are not understood.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in script.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("--") {
            continue;
        }

        current.push(line);

        if line.ends_with(';') {
            statements.push(current.join(" "));
            current.clear();
        }
    }

    if !current.is_empty() {
        statements.push(current.join(" "));
    }

    statements
}

/// First `max` characters of a statement, for progress output
pub fn preview(statement: &str, max: usize) -> String {
    if statement.chars().count() <= max {
        return statement.to_string();
    }
    let head: String = statement.chars().take(max).collect();
    format!("{}...", head)
}
