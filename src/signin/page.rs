//! Provider page inspection: login-state detection and OpenID form extraction.
//!
//! The provider answers the sign-in redirect with one of two pages: its
//! password login form when the session is not authenticated, or an
//! auto-submitting OpenID form carrying the assertion parameters. Elements are
//! matched by `id`, the same way an `#id` selector would.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, instrument};

/// `id` of the provider's password login form.
pub const LOGIN_FORM_ID: &str = "loginForm";

/// `id` of the provider's auto-submitting OpenID form.
pub const OPENID_FORM_ID: &str = "openidForm";

/// Elements that never have children.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Compiles a regex at static init; panics on invalid pattern.
fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

// Comments and raw-text elements: their content never yields elements.
static INERT_MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r"(?is)<!--.*?-->|<(?:script|style|textarea|title)\b[^>]*>.*?</(?:script|style|textarea|title)\s*>",
    )
});
// Quotes only delimit a value right after `=`; elsewhere they are plain characters.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?s)<(/?)([a-zA-Z][a-zA-Z0-9:-]*)((?:=\s*"[^"]*"|=\s*'[^']*'|[^>])*)>"#,
    )
});
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+)))?"#)
});
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]*);")
});

/// Form fields of the OpenID form, in document order.
///
/// A repeated name keeps the position of its first occurrence and takes the
/// value of its last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginFormData {
    fields: Vec<(String, String)>,
}

impl LoginFormData {
    /// Creates an empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, overwriting an earlier value for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self.fields.iter_mut().find(|(key, _)| *key == name) {
            existing.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    /// Returns the value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Number of distinct field names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the form had no named inputs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(name, value)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Encodes the fields as an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn to_urlencoded(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

/// What the provider served in response to the sign-in redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderPage {
    /// The password login form: the session is not authenticated.
    PasswordLogin,
    /// Exactly one OpenID form, with its extracted fields.
    OpenIdForm(LoginFormData),
    /// No OpenID form, or more than one.
    Unrecognized {
        /// Number of elements carrying the OpenID form `id`.
        openid_forms: usize,
    },
}

#[derive(Debug)]
struct Tag {
    name: String,
    closing: bool,
    attrs: Vec<(String, String)>,
}

impl Tag {
    /// First occurrence wins, as in an HTML parser.
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn has_id(&self, id: &str) -> bool {
        !self.closing && self.attr("id") == Some(id)
    }

    /// A trailing `/>` does not close a non-void element.
    fn has_children(&self) -> bool {
        !VOID_ELEMENTS.contains(&self.name.as_str())
    }
}

/// Classifies the provider page body.
#[instrument(level = "debug", skip(html), fields(bytes = html.len()))]
#[must_use]
pub fn classify_provider_page(html: &str) -> ProviderPage {
    let markup = INERT_MARKUP_RE.replace_all(html, "");
    let tags = scan_tags(&markup);

    if tags.iter().any(|tag| tag.has_id(LOGIN_FORM_ID)) {
        debug!("Provider page contains the password login form");
        return ProviderPage::PasswordLogin;
    }

    let openid_positions: Vec<usize> = tags
        .iter()
        .enumerate()
        .filter(|(_, tag)| tag.has_id(OPENID_FORM_ID))
        .map(|(index, _)| index)
        .collect();

    let &[form_index] = openid_positions.as_slice() else {
        debug!(
            openid_forms = openid_positions.len(),
            "Provider page does not contain exactly one OpenID form"
        );
        return ProviderPage::Unrecognized {
            openid_forms: openid_positions.len(),
        };
    };

    let form = extract_form_data(&tags, form_index);
    debug!(fields = form.len(), "Extracted OpenID form fields");
    ProviderPage::OpenIdForm(form)
}

/// Collects the `input` descendants of the element at `tags[form_index]`.
///
/// An input without a `value` attribute is submitted as an empty string, the
/// way a browser submits it, rather than being left out of the body.
fn extract_form_data(tags: &[Tag], form_index: usize) -> LoginFormData {
    let mut data = LoginFormData::new();
    let form = &tags[form_index];
    if !form.has_children() {
        return data;
    }

    let mut depth = 1usize;
    for tag in &tags[form_index + 1..] {
        if tag.name == form.name {
            if tag.closing {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            } else if tag.has_children() {
                depth += 1;
            }
            continue;
        }

        if tag.closing || tag.name != "input" {
            continue;
        }

        match tag.attr("name") {
            Some(name) if !name.is_empty() => {
                data.insert(name, tag.attr("value").unwrap_or_default());
            }
            _ => {}
        }
    }

    data
}

fn scan_tags(markup: &str) -> Vec<Tag> {
    TAG_RE
        .captures_iter(markup)
        .map(|captures| {
            let raw_attrs = captures.get(3).map_or("", |m| m.as_str());
            Tag {
                name: captures
                    .get(2)
                    .map_or("", |m| m.as_str())
                    .to_ascii_lowercase(),
                closing: captures.get(1).is_some_and(|m| !m.as_str().is_empty()),
                attrs: parse_attrs(raw_attrs),
            }
        })
        .collect()
}

fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(raw)
        .map(|attr| {
            let key = attr
                .get(1)
                .map_or("", |m| m.as_str())
                .to_ascii_lowercase();
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map_or(String::new(), |m| html_unescape(m.as_str()));
            (key, value)
        })
        .collect()
}

/// Decodes character references in an attribute value.
///
/// Unknown named references are left untouched.
fn html_unescape(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }

    ENTITY_RE
        .replace_all(value, |caps: &Captures<'_>| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            let body = caps.get(1).map_or("", |m| m.as_str());
            decode_reference(body).unwrap_or_else(|| whole.to_string())
        })
        .into_owned()
}

fn decode_reference(body: &str) -> Option<String> {
    let numeric = if let Some(hex) = body
        .strip_prefix("#x")
        .or_else(|| body.strip_prefix("#X"))
    {
        Some(u32::from_str_radix(hex, 16).ok()?)
    } else if let Some(decimal) = body.strip_prefix('#') {
        Some(decimal.parse::<u32>().ok()?)
    } else {
        None
    };

    if let Some(code) = numeric {
        let ch = char::from_u32(code)
            .filter(|ch| *ch != '\0')
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        return Some(ch.to_string());
    }

    let decoded = match body {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{00a0}",
        _ => return None,
    };
    Some(decoded.to_string())
}
