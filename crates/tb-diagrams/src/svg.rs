//! SVG post-processing for inline embedding.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::consts::STANDARD_DPI;

static GOOGLE_FONTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@import\s+url\([^)]*fonts\.googleapis\.com[^)]*\)\s*;?").unwrap()
});

/// `width` attribute on the root `<svg>` element.
static SVG_WIDTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(<svg[^>]*\s)width="(\d+(?:\.\d+)?)(?:px)?""#).unwrap());

/// `height` attribute on the root `<svg>` element.
static SVG_HEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(<svg[^>]*\s)height="(\d+(?:\.\d+)?)(?:px)?""#).unwrap());

/// Width in a style declaration (`width:136px`, `max-width: 523.5px`).
static STYLE_WIDTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(width:\s*)(\d+(?:\.\d+)?)(px)").unwrap());

/// Height in a style declaration.
static STYLE_HEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(height:\s*)(\d+(?:\.\d+)?)(px)").unwrap());

/// Pixel size rendered at `dpi`, scaled to standard display size.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn display_size(px: f64, dpi: u32) -> u32 {
    if dpi == 0 {
        return px.round() as u32;
    }
    (px * f64::from(STANDARD_DPI) / f64::from(dpi)).round() as u32
}

/// Scale SVG dimensions rendered at `dpi` down to standard display size.
///
/// The factor is `96 / dpi`: at 192 DPI dimensions are halved, at 96 they are
/// unchanged. Percentage dimensions are left alone.
#[must_use]
pub fn scale_svg_dimensions(svg: &str, dpi: u32) -> String {
    if dpi == STANDARD_DPI || dpi == 0 {
        return svg.to_owned();
    }

    let scale_dim = |caps: &Captures| display_size(caps[2].parse().unwrap_or(0.0), dpi);

    let result = SVG_WIDTH_RE.replace(svg, |caps: &Captures| {
        format!(r#"{}width="{}""#, &caps[1], scale_dim(caps))
    });
    let result = SVG_HEIGHT_RE.replace(&result, |caps: &Captures| {
        format!(r#"{}height="{}""#, &caps[1], scale_dim(caps))
    });
    let result = STYLE_WIDTH_RE.replace_all(&result, |caps: &Captures| {
        format!("{}{}{}", &caps[1], scale_dim(caps), &caps[3])
    });
    let result = STYLE_HEIGHT_RE.replace_all(&result, |caps: &Captures| {
        format!("{}{}{}", &caps[1], scale_dim(caps), &caps[3])
    });

    result.into_owned()
}

/// Remove Google Fonts `@import` rules so the page makes no font requests.
#[must_use]
pub fn strip_google_fonts_import(svg: &str) -> String {
    GOOGLE_FONTS_RE.replace_all(svg, "").into_owned()
}

/// Prepare Kroki SVG output for inline embedding.
#[must_use]
pub fn prepare_svg(svg: &str, dpi: u32) -> String {
    let clean = strip_google_fonts_import(svg.trim());
    scale_svg_dimensions(&clean, dpi)
}
