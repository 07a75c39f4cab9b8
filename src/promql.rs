//! Small PromQL string builders.
//!
//! Expressions are opaque to the engine; these helpers only take care of
//! quoting, window rendering and relabeling.

use std::time::Duration;

/// Escapes a label value for use inside a double-quoted PromQL string.
pub fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders a window as a PromQL duration, using the largest unit that divides it.
pub fn format_window(window: Duration) -> String {
    let secs = window.as_secs().max(1);
    if secs % 86400 == 0 {
        format!("{}d", secs / 86400)
    } else if secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

/// Wraps `expr` so every result series carries `name="<metric>"`.
pub fn relabel(expr: &str, metric: &str) -> String {
    format!(
        r#"label_replace({}, "name", "{}", "", "")"#,
        expr,
        escape_label_value(metric)
    )
}

/// Joins sub-expressions with a logical `or`.
pub fn join_or<I, S>(exprs: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    exprs
        .into_iter()
        .map(|e| e.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_label_value() {
        assert_eq!(escape_label_value("host:9090"), "host:9090");
        assert_eq!(escape_label_value(r#"a"b"#), r#"a\"b"#);
        assert_eq!(escape_label_value(r"c:\dir"), r"c:\\dir");
    }

    #[test]
    fn test_format_window() {
        assert_eq!(format_window(Duration::from_secs(15 * 86400)), "15d");
        assert_eq!(format_window(Duration::from_secs(7200)), "2h");
        assert_eq!(format_window(Duration::from_secs(90)), "90s");
        assert_eq!(format_window(Duration::from_secs(300)), "5m");
        assert_eq!(format_window(Duration::ZERO), "1s");
    }

    #[test]
    fn test_relabel_and_join() {
        let a = relabel("go_memstats_sys_bytes", "mem_used_bytes");
        assert_eq!(
            a,
            r#"label_replace(go_memstats_sys_bytes, "name", "mem_used_bytes", "", "")"#
        );
        assert_eq!(join_or(["a", "b", "c"]), "a or b or c");
        assert_eq!(join_or(Vec::<String>::new()), "");
    }
}
