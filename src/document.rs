//! A small markdown document builder.
//!
//! Formatters push typed blocks and serialize once with [`Document::render`]
//! (or `to_string`), instead of concatenating strings as they go.

use std::fmt;

/// One block of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// `#`-style heading; `level` is clamped to 1..=6 on render.
    Heading { level: u8, text: String },
    /// Consecutive `**Label:** value` lines.
    Fields(Vec<(String, String)>),
    /// `**Label:**` on its own line followed by a body.
    Section { label: String, body: String },
    /// Plain paragraph.
    Text(String),
    /// `> quoted` line.
    Quote(String),
    /// `*emphasized*` note.
    Note(String),
    /// Horizontal rule.
    Rule,
}

/// An ordered list of blocks rendered as markdown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heading(&mut self, level: u8, text: impl Into<String>) -> &mut Self {
        self.push(Block::Heading {
            level,
            text: text.into(),
        })
    }

    /// Adds a `**label:** value` line, merging with a directly preceding
    /// field block.
    pub fn field(&mut self, label: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let entry = (label.into(), value.into());
        if let Some(Block::Fields(fields)) = self.blocks.last_mut() {
            fields.push(entry);
            return self;
        }
        self.push(Block::Fields(vec![entry]))
    }

    pub fn section(&mut self, label: impl Into<String>, body: impl Into<String>) -> &mut Self {
        self.push(Block::Section {
            label: label.into(),
            body: body.into(),
        })
    }

    /// Adds a paragraph; empty text is skipped.
    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if text.trim().is_empty() {
            return self;
        }
        self.push(Block::Text(text))
    }

    pub fn quote(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Block::Quote(text.into()))
    }

    pub fn note(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Block::Note(text.into()))
    }

    pub fn rule(&mut self) -> &mut Self {
        self.push(Block::Rule)
    }

    pub fn push(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Serializes the document. Blocks are separated by a blank line.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Heading { level, text } => {
                let hashes = "#".repeat(usize::from((*level).clamp(1, 6)));
                write!(f, "{} {}", hashes, single_line(text))
            }
            Block::Fields(fields) => {
                for (i, (label, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "**{}:** {}", label, single_line(value))?;
                }
                Ok(())
            }
            Block::Section { label, body } => write!(f, "**{}:**\n{}", label, body.trim_end()),
            Block::Text(text) => write!(f, "{}", text.trim_end()),
            Block::Quote(text) => write!(f, "> {}", single_line(text)),
            Block::Note(text) => write!(f, "*{}*", single_line(text)),
            Block::Rule => write!(f, "---"),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                write!(f, "\n\n")?;
            }
            write!(f, "{}", block)?;
        }
        if !self.blocks.is_empty() {
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Markdown inline link with brackets in the text escaped.
pub fn link(text: &str, url: &str) -> String {
    let text = if text.trim().is_empty() { url } else { text };
    format!(
        "[{}]({})",
        single_line(text).replace('[', "\\[").replace(']', "\\]"),
        url.replace(' ', "%20")
    )
}

/// Headings, fields and notes must stay on one line.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
