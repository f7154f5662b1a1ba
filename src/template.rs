//! Minimal `{name}` placeholder templates.
//!
//! Used for shape labels (`"{cell_id} chr{chr}"`) and segmentation source
//! paths (`"/data/{dataset}/seg_{segmentation}.tif"`). `{{` and `}}` escape
//! literal braces.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Field(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    parts: Vec<Part>,
}

impl Template {
    /// Parse a template string.
    pub fn parse(source: &str) -> Result<Self> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

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
                            Some('{') | None => {
                                return Err(PipelineError::config(format!(
                                    "unterminated placeholder in template '{}'",
                                    source
                                )));
                            }
                            Some(ch) => name.push(ch),
                        }
                    }
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(PipelineError::config(format!(
                            "empty placeholder in template '{}'",
                            source
                        )));
                    }
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(Part::Field(name.to_string()));
                }
                '}' => {
                    return Err(PipelineError::config(format!(
                        "unmatched '}}' in template '{}'",
                        source
                    )));
                }
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            parts,
        })
    }

    /// Placeholder names in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            Part::Field(name) => Some(name.as_str()),
            Part::Literal(_) => None,
        })
    }

    /// Render the template, resolving each placeholder with `lookup`.
    ///
    /// Fails with a configuration error on the first unresolved placeholder.
    pub fn render<'a, F>(&self, mut lookup: F) -> Result<String>
    where
        F: FnMut(&str) -> Option<&'a str>,
    {
        let mut out = String::with_capacity(self.source.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Field(name) => {
                    let value = lookup(name).ok_or_else(|| {
                        PipelineError::config(format!(
                            "template '{}' references unknown field '{}'",
                            self.source, name
                        ))
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    /// Source text of the template.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Template::parse(&source).map_err(serde::de::Error::custom)
    }
}
