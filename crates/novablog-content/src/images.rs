//! Image references inside note bodies.
//!
//! Two syntaxes are recognised:
//!
//! - bracketed: `![[pic.png]]` (and `[[pic.png]]` when the payload looks like
//!   an image file), carrying only a file name;
//! - standard: `![alt](path/to/pic.png)`, whose final path segment is used.
//!
//! Both are rewritten to `![<file name>](<asset url>/<file name>)`. Only the
//! space character is percent-encoded in the web path; other reserved
//! characters pass through unchanged.
//!
//! Scanning and rewriting are pure. Copying the referenced files is left to
//! the caller.

use std::ops::Range;

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;

static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(!?)\[\[([^\[\]\n]+)\]\]").unwrap());

static STANDARD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]\n]*)\]\(([^)\n]*)\)").unwrap());

static TRAILING_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(.*?)\s+(?:"[^"]*"|'[^']*')$"#).unwrap());

static SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]+:").unwrap());

const IMAGE_EXTENSIONS: [&str; 11] = [
    "png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "avif", "ico", "tif", "tiff",
];

/// Which syntax a reference was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSyntax {
    Bracketed,
    Standard,
}

/// An image reference found in a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Exact matched text
    pub token: String,

    /// Byte range of the token in the scanned body
    pub span: Range<usize>,

    /// File name looked up in the asset source directory
    pub file_name: String,

    pub syntax: ImageSyntax,
}

/// An image after rewriting, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub file_name: String,
    pub web_path: String,
}

/// Body text with every reference rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedBody {
    pub content: String,
    pub images: Vec<ResolvedImage>,
}

impl ResolvedBody {
    /// Web path of the first image, used as the default cover.
    pub fn first_image(&self) -> Option<&str> {
        self.images.first().map(|i| i.web_path.as_str())
    }
}

/// Find every local image reference in `body`, ordered by position.
///
/// External references (`https://...`, `data:...`, `//host/...`) are not
/// returned. When two matches overlap the earlier one wins.
pub fn scan_images(body: &str) -> Vec<ImageReference> {
    let mut found: Vec<ImageReference> = BRACKETED
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let embedded = !caps[1].is_empty();
            let file_name = bracketed_payload(&caps[2])?;
            if !embedded && !has_image_extension(&file_name) {
                return None;
            }
            Some(ImageReference {
                token: whole.as_str().to_string(),
                span: whole.range(),
                file_name,
                syntax: ImageSyntax::Bracketed,
            })
        })
        .collect();

    found.extend(STANDARD.captures_iter(body).filter_map(|caps| {
        let whole = caps.get(0)?;
        let file_name = standard_file_name(&caps[2])?;
        Some(ImageReference {
            token: whole.as_str().to_string(),
            span: whole.range(),
            file_name,
            syntax: ImageSyntax::Standard,
        })
    }));

    found.sort_by_key(|r| (r.span.start, r.syntax == ImageSyntax::Standard));

    let mut refs = Vec::with_capacity(found.len());
    let mut covered = 0;
    for reference in found {
        if reference.span.start < covered {
            continue;
        }
        covered = reference.span.end;
        refs.push(reference);
    }
    refs
}

/// Replace each reference by its canonical form.
///
/// Replacement is positional: two references with identical text are
/// rewritten independently. References whose span no longer matches `body`
/// are left alone.
pub fn rewrite_images(body: &str, refs: &[ImageReference], asset_url: &str) -> ResolvedBody {
    let mut content = String::with_capacity(body.len());
    let mut images = Vec::with_capacity(refs.len());
    let mut cursor = 0;

    for reference in refs {
        if reference.span.start < cursor {
            continue;
        }
        if body.get(reference.span.clone()) != Some(reference.token.as_str()) {
            continue;
        }

        let web_path = web_path(asset_url, &reference.file_name);
        content.push_str(&body[cursor..reference.span.start]);
        content.push_str(&format!("![{}]({})", reference.file_name, web_path));
        cursor = reference.span.end;

        images.push(ResolvedImage {
            file_name: reference.file_name.clone(),
            web_path,
        });
    }

    content.push_str(&body[cursor..]);

    ResolvedBody { content, images }
}

/// Scan and rewrite in one step.
pub fn resolve_images(body: &str, asset_url: &str) -> (ResolvedBody, Vec<ImageReference>) {
    let refs = scan_images(body);
    let resolved = rewrite_images(body, &refs, asset_url);
    (resolved, refs)
}

/// Public path of an asset: `<asset url>/<name>` with spaces as `%20`.
pub fn web_path(asset_url: &str, file_name: &str) -> String {
    format!(
        "{}/{}",
        asset_url.trim_end_matches('/'),
        file_name.replace(' ', "%20")
    )
}

/// File name inside the first `[[...]]` of `text`, if any.
///
/// Used for cover values, where the leading `!` is optional and no
/// extension check applies.
pub fn bracketed_name(text: &str) -> Option<String> {
    BRACKETED
        .captures(text)
        .and_then(|caps| bracketed_payload(&caps[2]))
}

/// Whether a path points outside the site.
pub fn is_external(path: &str) -> bool {
    path.starts_with("//") || SCHEME.is_match(path)
}

/// Strip Obsidian `|size` and `#anchor` suffixes.
fn bracketed_payload(payload: &str) -> Option<String> {
    let name = payload.split(['|', '#']).next().unwrap_or("").trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn standard_file_name(raw: &str) -> Option<String> {
    let mut path = raw.trim();

    if let Some(inner) = path.strip_prefix('<') {
        path = inner.split('>').next().unwrap_or(inner);
    } else if let Some(caps) = TRAILING_TITLE.captures(path) {
        path = caps.get(1).map_or(path, |m| m.as_str());
    }

    if path.is_empty() || is_external(path) {
        return None;
    }

    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let name = decoded.rsplit(['/', '\\']).next().unwrap_or("").trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn has_image_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
    })
}
