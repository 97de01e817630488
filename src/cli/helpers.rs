//! Shared helper functions for CLI commands

/// Fixed-point formatting, `-` for a missing value
pub fn fmt_fixed(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.prec$}", v, prec = decimals),
        None => "-".to_string(),
    }
}

/// Fixed-point formatting with an explicit sign
pub fn fmt_signed(value: f64, decimals: usize) -> String {
    format!("{:+.prec$}", value, prec = decimals)
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Write `content` to `path`, or to stdout when no path is given
pub fn emit(content: &str, path: Option<&std::path::Path>) -> std::io::Result<()> {
    use std::io::Write;

    match path {
        Some(path) => std::fs::write(path, content),
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                lock.write_all(b"\n")?;
            }
            Ok(())
        }
    }
}
