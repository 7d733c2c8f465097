use std::str::Lines;

use crate::Config;
use crate::error::ParseError;

/// Inline comments only start after whitespace so that `#` and `;` may appear inside values.
const COMMENT_MARKERS: [&str; 4] = [" ;", "\t;", " #", "\t#"];

/// Represents an on-going parse.
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Lines<'a>,
    line: usize,
    section: String,
    // Empty whenever a continuation line has nothing to extend.
    option: String,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            line: 0,
            section: String::new(),
            option: String::new(),
        }
    }
}

impl Parser<'_> {
    /// Feed every line into `config`, stopping at the first malformed one.
    ///
    /// # Errors
    ///
    /// [`ParseError::Syntax`] for a line that has no `=` or `:` separator (or starts with one)
    /// and is not a continuation. Lines already applied stay in `config`.
    pub fn parse_into(mut self, config: &mut Config) -> Result<(), ParseError> {
        while let Some(raw) = self.lines.next() {
            self.line += 1;
            self.parse_line(raw, config)?;
        }

        Ok(())
    }

    fn parse_line(&mut self, raw: &str, config: &mut Config) -> Result<(), ParseError> {
        let line = strip_comment(raw).trim_end();

        if line.is_empty() || line.starts_with(['#', ';']) {
            return Ok(());
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            self.option.clear();
            self.section = name.trim().to_owned();
            config.create_section(&self.section);
            return Ok(());
        }

        let indented = line.starts_with([' ', '\t']);

        if indented && !self.section.is_empty() && !self.option.is_empty() {
            let previous = config
                .raw_value(&self.section, &self.option)
                .unwrap_or_default();
            let value = format!("{previous}\n{}", line.trim());
            config.set_option(&self.section, &self.option, value);
            return Ok(());
        }

        match line.find(['=', ':']) {
            Some(i) if i > 0 && !indented => {
                self.option = line[..i].trim().to_owned();
                let value = line[i + 1..].trim().to_owned();
                config.set_option(&self.section, &self.option, value);
                Ok(())
            }
            _ => {
                log::debug!("could not parse line {}: {line:?}", self.line);
                Err(ParseError::Syntax {
                    line: self.line,
                    content: line.to_owned(),
                })
            }
        }
    }
}

/// Truncate `line` at the earliest inline comment marker.
fn strip_comment(line: &str) -> &str {
    COMMENT_MARKERS
        .iter()
        .filter_map(|marker| line.find(marker))
        .min()
        .map_or(line, |i| &line[..i])
}
