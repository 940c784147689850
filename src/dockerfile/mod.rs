//! Dockerfile instruction parser
//!
//! Groups physical lines into logical instructions so a `FROM` spread over
//! several lines with `\` continuations is handled as one unit. Heredoc bodies
//! (`RUN <<EOF` ... `EOF`) belong to the instruction that opens them and are
//! never read as instructions. Only the structure needed for pinning is
//! extracted: the keyword as written, the `--flag` options, and for `FROM` the
//! image and optional stage alias.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PinnyError, Result};

const CONTINUATION: char = '\\';

static HEREDOC: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"<<(?P<strip>-?)["']?(?P<word>[A-Za-z_][A-Za-z0-9_]*)["']?"#)
        .unwrap()
});

/// What a `FROM` instruction builds on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseImage {
    /// The empty `scratch` image
    Scratch,
    /// A stage declared earlier in the same file
    Stage,
    /// An image name containing a build argument expansion
    Templated,
    /// An image already pinned to a digest
    Digest,
    /// An image selected by tag (or no tag); the only kind that gets pinned
    Tagged,
}

impl BaseImage {
    /// Returns `true` if the instruction should be resolved and rewritten
    pub fn is_pinnable(self) -> bool {
        self == Self::Tagged
    }
}

/// The arguments of a `FROM` instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromClause {
    /// Image reference as written
    pub image: String,
    /// `AS` keyword as written, with the alias
    pub alias: Option<(String, String)>,
    /// Classification of the image
    pub base: BaseImage,
}

/// One logical instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Keyword as written, e.g. `FROM` or `from`
    pub keyword: String,
    /// Index of the first physical line
    pub start_line: usize,
    /// Index of the last physical line (inclusive)
    pub end_line: usize,
    /// Leading `--flag[=value]` options
    pub flags: Vec<String>,
    /// Remaining whitespace-separated arguments
    pub args: Vec<String>,
    /// Parsed arguments for `FROM`
    pub from: Option<FromClause>,
}

impl Instruction {
    /// Returns `true` for `FROM` in any letter case
    pub fn is_from(&self) -> bool {
        self.keyword.eq_ignore_ascii_case("FROM")
    }
}

/// Parsed Dockerfile
#[derive(Debug, Clone, Default)]
pub struct Dockerfile {
    pub instructions: Vec<Instruction>,
}

impl Dockerfile {
    /// Parse physical lines (without line endings). `path` labels errors.
    pub fn parse(path: &str, lines: &[&str]) -> Result<Self> {
        let mut instructions = Vec::new();
        let mut stages: Vec<String> = Vec::new();
        let mut index = 0;

        while index < lines.len() {
            let trimmed = lines[index].trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                index += 1;
                continue;
            }

            let start_line = index;
            let mut text = String::new();
            loop {
                let line = lines[index].trim_end();
                let inside = index != start_line;
                let skipped = inside && {
                    let body = line.trim_start();
                    body.is_empty() || body.starts_with('#')
                };
                if !skipped {
                    match line.strip_suffix(CONTINUATION) {
                        Some(head) => text.push_str(head),
                        None => {
                            text.push_str(line);
                            break;
                        }
                    }
                }
                if index + 1 == lines.len() {
                    break;
                }
                index += 1;
            }
            let end_line = heredoc_end(lines, index, &text);
            index = end_line + 1;

            let mut tokens = text.split_whitespace().map(str::to_string);
            let Some(keyword) = tokens.next() else {
                continue;
            };
            let mut flags = Vec::new();
            let mut args = Vec::new();
            for token in tokens {
                if args.is_empty() && token.starts_with("--") {
                    flags.push(token);
                } else {
                    args.push(token);
                }
            }

            let mut instruction = Instruction {
                keyword,
                start_line,
                end_line,
                flags,
                args,
                from: None,
            };
            if instruction.is_from() {
                let clause = parse_from(path, &instruction, &stages)?;
                if let Some((_, alias)) = &clause.alias {
                    stages.push(alias.to_lowercase());
                }
                instruction.from = Some(clause);
            }
            instructions.push(instruction);
        }

        Ok(Self { instructions })
    }

    /// `FROM` instructions in file order
    pub fn from_instructions(&self) -> impl Iterator<Item = (&Instruction, &FromClause)> {
        self.instructions
            .iter()
            .filter_map(|i| i.from.as_ref().map(|from| (i, from)))
    }
}

/// Last line of the heredoc bodies opened by `text`, or `last` when there are none
///
/// Bodies follow one another in the order their markers appear. A body without
/// its terminator runs to the end of the file.
fn heredoc_end(lines: &[&str], last: usize, text: &str) -> usize {
    let mut end = last;
    for marker in HEREDOC.captures_iter(text) {
        let strip_tabs = !marker["strip"].is_empty();
        let word = &marker["word"];
        while end + 1 < lines.len() {
            end += 1;
            let line = if strip_tabs {
                lines[end].trim_start_matches('\t')
            } else {
                lines[end]
            };
            if line == word {
                break;
            }
        }
    }
    end
}

fn parse_from(path: &str, instruction: &Instruction, stages: &[String]) -> Result<FromClause> {
    let line = instruction.start_line + 1;
    let (image, alias) = match instruction.args.as_slice() {
        [image] => (image.clone(), None),
        [image, keyword, alias] if keyword.eq_ignore_ascii_case("AS") => {
            (image.clone(), Some((keyword.clone(), alias.clone())))
        }
        [] => return Err(parse_error(path, format!("line {line}: FROM without an image"))),
        _ => {
            return Err(parse_error(
                path,
                format!("line {line}: expected `FROM image [AS name]`"),
            ));
        }
    };

    let base = classify(&image, stages);
    Ok(FromClause { image, alias, base })
}

fn classify(image: &str, stages: &[String]) -> BaseImage {
    if image.contains('$') {
        BaseImage::Templated
    } else if image.eq_ignore_ascii_case("scratch") {
        BaseImage::Scratch
    } else if stages.contains(&image.to_lowercase()) {
        BaseImage::Stage
    } else if image.contains('@') {
        BaseImage::Digest
    } else {
        BaseImage::Tagged
    }
}

fn parse_error(path: &str, reason: String) -> PinnyError {
    PinnyError::DockerfileParseFailed {
        path: path.to_string(),
        reason,
    }
}
