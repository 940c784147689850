//! Workflow `uses:` rewriting
//!
//! A matching line becomes `<prefix><pinned reference> # <original reference>`,
//! with ` | <aliases>` appended for step references that share their commit
//! with other refs. Anything after the reference on the original line (usually
//! a previous provenance comment) is replaced. A line whose reference is
//! already pinned to the resolved digest is left exactly as it was.
//!
//! Only a `uses` key counts, optionally opening a sequence item; the same text
//! inside a scalar such as a `run:` script is left alone.

use std::sync::LazyLock;

use regex::Regex;

use super::Rewrite;
use crate::error::Result;
use crate::reference::image::DOCKER_SCHEME;
use crate::resolver::Resolver;
use crate::text::SourceText;

static USES: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"^(?P<pre>\s*(?:-\s+)?uses\s*:\s*)(?P<quote>["']?)(?P<reference>[^\s"'#]+)(?P<post>.*)$"#)
        .unwrap()
});

/// Rewrite every `uses:` line of a workflow file
pub fn rewrite(source: &SourceText, resolver: &mut Resolver) -> Result<Rewrite> {
    let mut content = String::new();
    let mut pinned = 0;
    let mut warnings = 0;

    for index in 0..source.len() {
        match rewrite_line(source.text(index), resolver, &mut warnings)? {
            Some(line) => {
                content.push_str(&line);
                content.push_str(source.ending(index));
                pinned += 1;
            }
            None => content.push_str(&source.line(index)),
        }
    }

    Ok(Rewrite {
        content,
        pinned,
        warnings,
    })
}

/// The rewritten line, or `None` if it stays as written
///
/// Resolution warnings for the line's step reference are added to `warnings`.
fn rewrite_line(
    line: &str,
    resolver: &mut Resolver,
    warnings: &mut usize,
) -> Result<Option<String>> {
    if line.trim_start().starts_with('#') {
        return Ok(None);
    }
    let Some(caps) = USES.captures(line) else {
        return Ok(None);
    };
    let pre = &caps["pre"];
    let quote = &caps["quote"];
    let reference = &caps["reference"];
    if !caps["post"].starts_with(quote) {
        return Ok(None);
    }

    let (pinned, comment) = if reference.starts_with(DOCKER_SCHEME) {
        let image = resolver.resolve_image(reference)?;
        let Some(name) = image.pinned_name() else {
            return Ok(None);
        };
        (format!("{DOCKER_SCHEME}{name}"), format!(" # {reference}"))
    } else if reference.contains('@') {
        let resolved = resolver.resolve_action(reference)?;
        *warnings += resolved.warnings.len();
        let Some(pinned) = resolved.reference.name_with_digest() else {
            tracing::debug!("Leaving {} unpinned", reference);
            return Ok(None);
        };
        let mut comment = format!(" # {reference}");
        if !resolved.reference.alias_refs.is_empty() {
            comment.push_str(" | ");
            comment.push_str(&resolved.reference.alias_refs.join(","));
        }
        (pinned, comment)
    } else {
        return Ok(None);
    };

    if pinned == reference {
        return Ok(None);
    }
    Ok(Some(format!("{pre}{quote}{pinned}{quote}{comment}")))
}
