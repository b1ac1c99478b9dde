//! Consumers of view operations.

use std::io::Write;

use crate::config::DisplayConfig;
use crate::datetime::format_timestamp;
use crate::feed::{LogEntry, Ordinal};
use crate::view::sequence::ViewOp;
use crate::Result;

/// Receives ordered insert/remove operations keyed by entry id.
pub trait FragmentSink {
    /// Apply one operation.
    fn apply(&mut self, op: &ViewOp) -> Result<()>;
}

/// Sink that keeps a mirror of the view and the full operation log.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    ids: Vec<Ordinal>,
    ops: Vec<ViewOp>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirrored ids, newest first.
    pub fn ids(&self) -> &[Ordinal] {
        &self.ids
    }

    /// Every operation applied so far.
    pub fn ops(&self) -> &[ViewOp] {
        &self.ops
    }
}

impl FragmentSink for MemorySink {
    fn apply(&mut self, op: &ViewOp) -> Result<()> {
        match op {
            ViewOp::Insert { id, index, .. } => {
                let index = (*index).min(self.ids.len());
                self.ids.insert(index, *id);
            }
            ViewOp::Remove { id } => self.ids.retain(|held| held != id),
        }
        self.ops.push(op.clone());
        Ok(())
    }
}

/// Sink printing inserted entries as text lines.
///
/// A terminal cannot splice lines above already printed output, so inserts
/// are printed as they arrive; an entry that did not land at the newest end
/// is marked with its position. Removals print nothing.
pub struct TerminalSink<W: Write> {
    out: W,
    timezone: String,
    time_format: String,
}

impl<W: Write> TerminalSink<W> {
    /// Create a sink writing to `out`.
    pub fn new(out: W, display: &DisplayConfig) -> Self {
        Self {
            out,
            timezone: display.timezone.clone(),
            time_format: display.time_format.clone(),
        }
    }

    /// Consume the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn format_entry(&self, entry: &LogEntry, index: usize) -> String {
        let time = format_timestamp(entry.sort_key, &self.timezone, &self.time_format);
        let text = strip_html(&entry.fragment);
        if index == 0 {
            format!("{} {}", time, text)
        } else {
            format!("{} [+{}] {}", time, index, text)
        }
    }
}

impl<W: Write> FragmentSink for TerminalSink<W> {
    fn apply(&mut self, op: &ViewOp) -> Result<()> {
        if let ViewOp::Insert { entry, index, .. } = op {
            let line = self.format_entry(entry, *index);
            writeln!(self.out, "{}", line)?;
            self.out.flush()?;
        }
        Ok(())
    }
}

/// Strip HTML tags from a fragment and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut in_entity = false;
    let mut entity = String::new();

    for ch in html.chars() {
        if in_entity {
            if ch == ';' {
                in_entity = false;
                push_entity(&mut result, &entity);
                continue;
            }
            if ch.is_ascii_alphanumeric() || ch == '#' {
                entity.push(ch);
                continue;
            }
            // A bare ampersand, as in query strings or shell commands.
            in_entity = false;
            result.push('&');
            result.push_str(&entity);
        }

        match ch {
            '<' => {
                in_tag = true;
                // Cell and row boundaries separate words.
                result.push(' ');
            }
            '>' => in_tag = false,
            '&' if !in_tag => {
                in_entity = true;
                entity.clear();
            }
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    if in_entity {
        result.push('&');
        result.push_str(&entity);
    }

    result.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn push_entity(result: &mut String, entity: &str) {
    match entity {
        "amp" => result.push('&'),
        "lt" => result.push('<'),
        "gt" => result.push('>'),
        "quot" => result.push('"'),
        "apos" => result.push('\''),
        "nbsp" => result.push(' '),
        _ if entity.starts_with('#') => {
            if let Some(c) = parse_numeric_entity(entity).and_then(char::from_u32) {
                result.push(c);
            }
        }
        _ => {
            result.push('&');
            result.push_str(entity);
            result.push(';');
        }
    }
}

/// Parse a numeric HTML entity (e.g., "#123" or "#x7B").
fn parse_numeric_entity(entity: &str) -> Option<u32> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()
    } else {
        entity.strip_prefix('#')?.parse().ok()
    }
}
