//! Stylesheet minification.
//!
//! Uses lightningcss. Input it cannot parse is passed through untouched, so a
//! reduction never fails on minification alone.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

use crate::debug;

/// Turns stylesheet text into a smaller equivalent.
pub trait Minify: Send + Sync {
    fn minify(&self, css: &str) -> String;
}

/// lightningcss-backed minifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct CssMinifier;

impl Minify for CssMinifier {
    fn minify(&self, css: &str) -> String {
        minify_css(css).unwrap_or_else(|| {
            debug!("css"; "minify failed, keeping source ({} bytes)", css.len());
            css.to_string()
        })
    }
}

/// Minify CSS source code, `None` if it does not parse or print.
pub fn minify_css(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}
