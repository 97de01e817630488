//! YAML error diagnostics pointing at the offending line of a sheet

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// YAML error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(gravcal::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl YamlSyntaxError {
    /// Build from a serde_yml error raised while reading `source`
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let message = err.to_string();
        let help = suggest(&message);
        Self::at(message, source, filename, line, column, help)
    }

    /// Error at a one-based line and column
    pub fn at(
        message: impl Into<String>,
        source: &str,
        filename: &str,
        line: usize,
        column: usize,
        help: Option<String>,
    ) -> Self {
        let offset = offset_of(source, line, column);
        let len = usize::from(offset < source.len());

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset + len),
            help,
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn offset(&self) -> usize {
        self.span.offset()
    }
}

/// Byte offset of a one-based line and column, clamped to the source
fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let line_start = if line <= 1 {
        0
    } else {
        match source.match_indices('\n').nth(line - 2) {
            Some((i, _)) => i + 1,
            None => return source.len(),
        }
    };

    source[line_start..]
        .char_indices()
        .take_while(|&(_, c)| c != '\n')
        .nth(column.saturating_sub(1))
        .map(|(i, _)| line_start + i)
        .unwrap_or_else(|| {
            source[line_start..]
                .find('\n')
                .map_or(source.len(), |n| line_start + n)
        })
}

/// Hints for the mistakes people make when hand-editing a sheet
fn suggest(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    let hint = if msg.contains("tab") {
        "YAML requires spaces for indentation, not tabs"
    } else if msg.contains("unknown variant") && msg.contains("bv") {
        "instrument.class must be one of: bv, bvl, bu, bdm, bda, dis, msa, msd, mmc, pg, pv"
    } else if msg.contains("unknown variant") && msg.contains("ml") {
        "instrument.unit must be ml or ul"
    } else if msg.contains("unknown variant") && msg.contains("boro") {
        "instrument.material must be boro33, boro50 or soda-lime"
    } else if msg.contains("missing field") {
        "a sheet needs at least `title`, `instrument.class` and `columns`"
    } else if msg.contains("duplicate key") {
        "each key can only appear once"
    } else if msg.contains("mapping values are not allowed") {
        "you may be missing a space after ':' or have inconsistent indentation"
    } else if msg.contains("expected block end") || msg.contains("did not find expected") {
        "check the indentation of the lines above"
    } else {
        return None;
    };

    Some(hint.to_string())
}
