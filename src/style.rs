use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::normalize_ws;
use crate::fields::CitationFields;

/// Supported citation styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Style {
    Mla,
    Apa,
    Chicago,
    Ieee,
    Harvard,
}

impl Style {
    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Mla => "mla",
            Style::Apa => "apa",
            Style::Chicago => "chicago",
            Style::Ieee => "ieee",
            Style::Harvard => "harvard",
        }
    }
}

impl std::fmt::Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub omit_date: bool,
    pub omit_url: bool,
}

/// One generated citation: the selected style, the (possibly overridden)
/// fields, and the rendered string. Immutable once built.
#[derive(Debug, Clone)]
pub struct Citation {
    pub style: Style,
    pub fields: CitationFields,
    pub rendered: String,
}

impl Citation {
    pub fn new(style: Style, fields: CitationFields, opts: &RenderOptions) -> Self {
        let rendered = render(style, &fields, opts);
        Citation {
            style,
            fields,
            rendered,
        }
    }
}

/// Render `fields` in the given style. Pure: equal inputs produce equal
/// output. Missing fields are omitted, except where a style prescribes a
/// placeholder (`n.d.` for a missing publish date in APA/Harvard).
pub fn render(style: Style, fields: &CitationFields, opts: &RenderOptions) -> String {
    let author = fields.author.as_deref();
    let title = fields.title.as_deref();
    let publisher = fields.publisher.as_deref();
    let pub_date = fields.publish_date.as_deref();
    let accessed = if opts.omit_date {
        None
    } else {
        fields.access_date.as_deref()
    };
    let url = if opts.omit_url {
        None
    } else {
        fields.url.as_deref()
    };

    let mut parts: Vec<String> = Vec::new();
    match style {
        Style::Mla => {
            if let Some(a) = author {
                parts.push(format!("{a}."));
            }
            if let Some(t) = title {
                parts.push(format!("\"{t}.\""));
            }
            if let Some(p) = publisher {
                parts.push(p.to_string());
            }
            if let Some(u) = url {
                parts.push(u.to_string());
            }
            if let Some(d) = accessed {
                parts.push(format!("Accessed {d}."));
            }
        }
        Style::Apa => {
            if let Some(a) = author {
                parts.push(a.to_string());
            }
            parts.push(format!("({}).", pub_date.unwrap_or("n.d.")));
            if let Some(t) = title {
                parts.push(format!("{t}."));
            }
            if let Some(p) = publisher {
                parts.push(format!("{p}."));
            }
            if let Some(d) = accessed {
                parts.push(format!("Retrieved {d}"));
            }
            if let Some(u) = url {
                parts.push(format!("from {u}"));
            }
        }
        Style::Chicago => {
            if let Some(a) = author {
                parts.push(format!("{a}."));
            }
            if let Some(t) = title {
                parts.push(format!("\"{t}.\""));
            }
            if let Some(p) = publisher {
                parts.push(format!("{p}."));
            }
            if let Some(d) = accessed {
                parts.push(format!("Accessed {d}."));
            }
            if let Some(u) = url {
                parts.push(format!("{u}."));
            }
        }
        Style::Ieee => {
            if let Some(a) = author {
                parts.push(format!("{a},"));
            }
            if let Some(t) = title {
                parts.push(format!("\"{t},\""));
            }
            if let Some(p) = publisher {
                parts.push(format!("{p}."));
            }
            parts.push("[Online].".to_string());
            if let Some(u) = url {
                parts.push(format!("Available: {u}"));
            }
            if let Some(d) = accessed {
                parts.push(format!("[Accessed: {}]", ieee_date(d)));
            }
        }
        Style::Harvard => {
            if let Some(a) = author {
                parts.push(format!("{a},"));
            }
            parts.push(format!("({})", pub_date.unwrap_or("n.d.")));
            if let Some(t) = title {
                parts.push(format!("{t}."));
            }
            if let Some(u) = url {
                parts.push(format!("Available at: {u}"));
            }
            if let Some(d) = accessed {
                parts.push(format!("(Accessed: {d})"));
            }
        }
    }

    cleanup(&parts.join(" "))
}

/// IEEE brackets want `dd-Mon-yyyy`; the access date is carried around as
/// `dd Month yyyy`, so reformat when it parses and pass it through when it
/// does not (e.g. an overridden free-form value).
fn ieee_date(accessed: &str) -> String {
    NaiveDate::parse_from_str(accessed, "%d %B %Y")
        .map(|d| d.format("%d-%b-%Y").to_string())
        .unwrap_or_else(|_| accessed.to_string())
}

static REPEAT_DOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}").unwrap());
static REPEAT_COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",{2,}").unwrap());
static SPACE_PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s([,.])").unwrap());

/// Collapse whitespace, squash repeated punctuation and drop spaces before
/// `,`/`.`, so that gaps left by missing fields do not show in the output.
fn cleanup(s: &str) -> String {
    let s = normalize_ws(s);
    let s = REPEAT_DOT_RE.replace_all(&s, ".");
    let s = REPEAT_COMMA_RE.replace_all(&s, ",");
    SPACE_PUNCT_RE.replace_all(&s, "$1").trim().to_string()
}
