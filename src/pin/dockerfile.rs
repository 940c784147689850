//! Dockerfile `FROM` rewriting
//!
//! Each tag-selected `FROM` is replaced by a provenance comment and a single
//! line `FROM [flags ]image@digest[ AS alias]`. A provenance comment left by a
//! previous run directly above such a `FROM` is dropped so re-pinning never
//! stacks comments. Instructions already pinned to a digest, `scratch`, stage
//! references and templated images are copied verbatim together with any
//! comment above them.

use super::Rewrite;
use crate::dockerfile::{Dockerfile, FromClause, Instruction};
use crate::error::{PinnyError, Result};
use crate::lockfile::LockFile;
use crate::reference::ImageRef;
use crate::resolver::Resolver;
use crate::text::SourceText;

const PROVENANCE_MARKER: &str = "# Pinned";

/// Where digests come from
pub enum DigestSource<'a> {
    /// Ask the registry
    Registry(&'a mut Resolver),
    /// Read a previously generated lock file
    LockFile(&'a LockFile),
}

impl DigestSource<'_> {
    fn digest(&mut self, raw: &str) -> Result<String> {
        match self {
            Self::Registry(resolver) => {
                let resolved = resolver.resolve_image(raw)?;
                let key = resolved.canonical_tag();
                resolved
                    .digest
                    .ok_or(PinnyError::DigestNotFound { reference: key })
            }
            Self::LockFile(lock) => {
                let image = ImageRef::parse(raw)?;
                lock.lookup(&image).map(str::to_string)
            }
        }
    }
}

/// Rewrite every tag-selected `FROM` of a Dockerfile
///
/// `timestamp` is written into provenance comments of images pinned from a
/// floating tag. `path` labels parse errors.
pub fn rewrite(
    path: &str,
    source: &SourceText,
    digests: &mut DigestSource<'_>,
    timestamp: &str,
) -> Result<Rewrite> {
    let parsed = Dockerfile::parse(path, &source.texts())?;
    let newline = source.newline();
    let mut content = String::new();
    let mut pinned = 0;
    let mut cursor = 0;

    for (instruction, from) in parsed.from_instructions() {
        let start = instruction.start_line;
        if !from.base.is_pinnable() {
            continue;
        }

        let digest = digests.digest(&from.image)?;
        let mut image = ImageRef::parse(&from.image)?;
        image.digest = Some(digest);

        let mut gap_end = start;
        if gap_end > cursor && source.text(gap_end - 1).starts_with(PROVENANCE_MARKER) {
            gap_end -= 1;
        }
        for index in cursor..gap_end {
            content.push_str(&source.line(index));
        }

        let ending = match source.ending(instruction.end_line) {
            "" => newline,
            ending => ending,
        };
        content.push_str(&provenance_comment(&image, timestamp));
        content.push_str(ending);
        content.push_str(&pinned_instruction(instruction, from, &image));
        content.push_str(source.ending(instruction.end_line));

        cursor = instruction.end_line + 1;
        pinned += 1;
    }

    for index in cursor..source.len() {
        content.push_str(&source.line(index));
    }

    Ok(Rewrite {
        content,
        pinned,
        warnings: 0,
    })
}

/// `# Pinned <raw> using pinny[ on <timestamp>]`
fn provenance_comment(image: &ImageRef, timestamp: &str) -> String {
    let mut comment = format!("{PROVENANCE_MARKER} {} using pinny", image.raw);
    if image.is_floating() {
        comment.push_str(" on ");
        comment.push_str(timestamp);
    }
    comment
}

fn pinned_instruction(instruction: &Instruction, from: &FromClause, image: &ImageRef) -> String {
    let mut parts = vec![instruction.keyword.clone()];
    parts.extend(instruction.flags.iter().cloned());
    parts.push(image.pinned_name().unwrap_or_else(|| image.original_name()));
    if let Some((keyword, alias)) = &from.alias {
        parts.push(keyword.clone());
        parts.push(alias.clone());
    }
    parts.join(" ")
}
