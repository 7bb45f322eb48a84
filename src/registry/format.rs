//! Line templates for the plain-text channels
//!
//! A template mixes literal text with `{field}` placeholders. It is parsed once
//! when the registry is configured so a bad template fails at startup instead
//! of on every emission.

use std::fmt::Write;

use chrono::{DateTime, Local};

use super::level::Severity;
use crate::error::{Error, Result};

/// Template used when none is configured
pub const DEFAULT_FORMAT: &str = "{asctime} - {levelname} - {name}: {message}";

/// Timestamp layout for `{asctime}`
const ASCTIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    AscTime,
    LevelName,
    LevelNo,
    Name,
    Channel,
    Message,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "asctime" => Some(Field::AscTime),
            "levelname" => Some(Field::LevelName),
            "levelno" => Some(Field::LevelNo),
            "name" => Some(Field::Name),
            "channel" => Some(Field::Channel),
            "message" => Some(Field::Message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// Everything a template can refer to
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub time: DateTime<Local>,
    pub severity: Severity,
    /// Logical base name of the logger
    pub name: &'a str,
    /// Channel the line is written to
    pub channel: &'a str,
    pub message: &'a str,
}

/// A parsed line template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormat {
    template: String,
    segments: Vec<Segment>,
}

impl LineFormat {
    /// Parse a template such as `"{asctime} {levelname} {name}: {message}"`
    ///
    /// `{{` and `}}` produce literal braces.
    pub fn parse(template: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidFormat {
            template: template.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => name.push(c),
                            None => return Err(invalid("unterminated placeholder".to_string())),
                        }
                    }
                    let field = Field::from_name(&name)
                        .ok_or_else(|| invalid(format!("unknown placeholder {{{name}}}")))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
                '}' => return Err(invalid("unmatched '}'".to_string())),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    /// The template text this format was parsed from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render one line
    pub fn render(&self, record: &Record<'_>) -> String {
        let mut out = String::with_capacity(self.template.len() + record.message.len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(Field::AscTime) => {
                    let _ = write!(out, "{}", record.time.format(ASCTIME_FORMAT));
                }
                Segment::Field(Field::LevelName) => out.push_str(record.severity.as_str()),
                Segment::Field(Field::LevelNo) => {
                    let _ = write!(out, "{}", record.severity.rank());
                }
                Segment::Field(Field::Name) => out.push_str(record.name),
                Segment::Field(Field::Channel) => out.push_str(record.channel),
                Segment::Field(Field::Message) => out.push_str(record.message),
            }
        }
        out
    }
}

impl Default for LineFormat {
    fn default() -> Self {
        Self {
            template: DEFAULT_FORMAT.to_string(),
            segments: vec![
                Segment::Field(Field::AscTime),
                Segment::Literal(" - ".to_string()),
                Segment::Field(Field::LevelName),
                Segment::Literal(" - ".to_string()),
                Segment::Field(Field::Name),
                Segment::Literal(": ".to_string()),
                Segment::Field(Field::Message),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(message: &str) -> Record<'_> {
        Record {
            time: Local.with_ymd_and_hms(2018, 4, 23, 11, 42, 45).unwrap(),
            severity: Severity::Info,
            name: "demo",
            channel: "service",
            message,
        }
    }

    #[test]
    fn test_default_format_matches_parsed() {
        assert_eq!(LineFormat::default(), LineFormat::parse(DEFAULT_FORMAT).unwrap());
    }

    #[test]
    fn test_render_default() {
        let line = LineFormat::default().render(&record("test logger"));
        assert_eq!(line, "2018-04-23 11:42:45,000 - INFO - demo: test logger");
    }

    #[test]
    fn test_render_all_fields() {
        let format = LineFormat::parse("[{channel}] {levelno} {levelname} {name}: {message}").unwrap();
        let line = format.render(&record("hello"));
        assert_eq!(line, "[service] 20 INFO demo: hello");
    }

    #[test]
    fn test_escaped_braces() {
        let format = LineFormat::parse("{{{levelname}}} {message}").unwrap();
        assert_eq!(format.render(&record("x")), "{INFO} x");
    }

    #[test]
    fn test_invalid_templates() {
        for template in ["{nope}", "{message", "message}", "{}"] {
            let err = LineFormat::parse(template).unwrap_err();
            assert!(matches!(err, Error::InvalidFormat { .. }), "{template}");
        }
    }
}
