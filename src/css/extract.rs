//! Finding background-image rules in raw stylesheet text and splicing
//! rewritten rules back in.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

use super::declaration::{BackgroundDeclaration, COMMENT_RE};
use crate::debug;
use crate::image::sprite::SpritePlacement;

/// Innermost rule block: a selector run followed by a brace-free body.
static RULE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^{};]*\{[^{}]*\}").unwrap());

/// A background (shorthand or longhand) property carrying a url.
static BACKGROUND_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)background(?:-image)?\s*:[^;}]*url\s*\(").unwrap());

/// Collect every spritable background rule in `css`, in document order.
///
/// `base_url` is the url the stylesheet was served from; relative image urls
/// resolve against it. Rules inside comments are not rules, and rules the
/// parser rejects are skipped.
pub fn extract_images(css: &str, base_url: &str) -> Vec<BackgroundDeclaration> {
    let scanned = blank_comments(css);
    RULE_RE
        .find_iter(&scanned)
        .filter(|m| BACKGROUND_URL_RE.is_match(m.as_str()))
        .filter_map(|m| {
            // Leading whitespace may be a blanked comment; the rule starts after it.
            let start = m.end() - m.as_str().trim_start().len();
            let rule = css.get(start..m.end())?;
            match BackgroundDeclaration::parse(rule, base_url) {
                Ok(decl) => Some(decl.at(start)),
                Err(e) => {
                    debug!("css"; "skipping rule in {}: {}", base_url, e);
                    None
                }
            }
        })
        .collect()
}

/// Rewrite placed rules of `css`, the stylesheet they were extracted from.
///
/// Each rule is located by its extraction offset, so duplicated rule texts
/// and declarations left out of `rewrites` never shift a rewrite onto another
/// occurrence. `rewrites` must follow extraction order.
pub fn inject_sprites<'a>(
    css: &str,
    rewrites: impl IntoIterator<Item = (&'a BackgroundDeclaration, &'a SpritePlacement)>,
) -> String {
    let mut out = String::with_capacity(css.len());
    let mut cursor = 0;
    for (decl, placement) in rewrites {
        let span = decl.span();
        if span.start < cursor || css.get(span.clone()) != Some(decl.original()) {
            debug!("css"; "rule for {} not found at {}, left as is", decl.image_url(), span.start);
            continue;
        }
        out.push_str(&css[cursor..span.start]);
        out.push_str(&decl.render(placement));
        cursor = span.end;
    }
    out.push_str(&css[cursor..]);
    out
}

/// `css` with every comment overwritten by spaces, byte offsets preserved.
fn blank_comments(css: &str) -> Cow<'_, str> {
    COMMENT_RE.replace_all(css, |caps: &regex::Captures| " ".repeat(caps[0].len()))
}
