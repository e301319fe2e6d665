use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::CiteError;
use crate::fields::CitationFields;

/// Best-effort bibliographic metadata pulled out of one fetched page.
///
/// Extraction never fails: a page with no usable tags just leaves every
/// field empty and the formatter substitutes placeholders downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub publish_date: Option<String>,
}

impl PageMetadata {
    /// Fetch `url` and extract metadata from the response body.
    pub fn resolve(url: &str) -> Result<Self, CiteError> {
        let html = fetch(url)?;
        Ok(extract(&html))
    }

    /// Combine page metadata with the source URL and access date into the
    /// field mapping the formatter consumes.
    pub fn into_fields(self, url: &str, access_date: Option<String>) -> CitationFields {
        CitationFields {
            author: self.author,
            title: self.title,
            publisher: self.publisher,
            publish_date: self.publish_date,
            access_date,
            url: Some(url.to_string()),
        }
    }
}

/// Blocking GET with fixed timeouts. Unreachable hosts, timeouts and
/// non-success statuses all come back as a network error; there is no retry.
pub fn fetch(url: &str) -> Result<String, CiteError> {
    let cfg = ureq::Agent::config_builder()
        .timeout_connect(Some(std::time::Duration::from_secs(5)))
        .timeout_global(Some(std::time::Duration::from_secs(15)))
        .build();
    let agent = ureq::Agent::new_with_config(cfg);
    let wrap = |e: ureq::Error| CiteError::Network {
        url: url.to_string(),
        source: Box::new(e),
    };
    agent
        .get(url)
        .header(
            "User-Agent",
            "Mozilla/5.0 (compatible; cite/0.1; +https://example.org)",
        )
        .call()
        .map_err(wrap)?
        .into_body()
        .read_to_string()
        .map_err(wrap)
}

/// Heuristic extraction over raw markup: HighWire/OpenGraph/W3C meta tags,
/// JSON-LD blocks, the `<title>` element and `<time datetime>` attributes,
/// each field with its own precedence chain.
pub fn extract(html: &str) -> PageMetadata {
    let meta = collect_meta(html);
    let json_ld = collect_json_ld(html);

    let site_name = meta_property(&meta, "og:site_name");

    let mut title = meta_value(&meta, "citation_title")
        .or_else(|| json_headline(&json_ld))
        .or_else(|| meta_property(&meta, "og:title"))
        .or_else(|| collect_title(html));
    if let (Some(t), Some(site)) = (&title, &site_name) {
        let stripped = strip_site_suffix(t, site);
        if !stripped.is_empty() {
            title = Some(stripped);
        }
    }

    let mut authors = Vec::new();
    for m in meta
        .iter()
        .filter(|m| m.name.as_deref() == Some("citation_author"))
    {
        let s = m.content.trim();
        if !s.is_empty() && !looks_like_url_or_handle(s) {
            authors.push(s.to_string());
        }
    }
    if authors.is_empty()
        && let Some(list) = json_authors(&json_ld)
    {
        authors.extend(list);
    }
    // OpenGraph article:author, ignoring URL-valued entries
    if authors.is_empty() {
        authors.extend(
            meta.iter()
                .filter(|m| m.property.as_deref() == Some("article:author"))
                .filter_map(|m| {
                    let v = m.content.trim();
                    if v.is_empty() || Url::parse(v).is_ok() {
                        None
                    } else {
                        Some(v.to_string())
                    }
                }),
        );
    }
    if authors.is_empty()
        && let Some(a) = meta_name(&meta, "author")
    {
        authors.extend(
            split_creators(&a)
                .into_iter()
                .filter(|s| !s.is_empty() && !looks_like_url_or_handle(s)),
        );
    }
    dedup_in_place(&mut authors);

    let publisher = meta_value(&meta, "citation_publisher")
        .or_else(|| meta_name(&meta, "publisher"))
        .or_else(|| json_publisher(&json_ld))
        .or(site_name);

    let publish_date = meta_value(&meta, "citation_publication_date")
        .or_else(|| meta_value(&meta, "citation_date"))
        .or_else(|| meta_name(&meta, "date"))
        .or_else(|| json_date_published(&json_ld))
        .or_else(|| meta_property(&meta, "article:published_time"))
        .or_else(|| collect_time_datetime(html))
        .and_then(|d| normalise_date(&d));

    PageMetadata {
        title: title.map(|t| normalize_ws(&t)),
        author: if authors.is_empty() {
            None
        } else {
            Some(authors.join(", "))
        },
        publisher: publisher.map(|p| normalize_ws(&p)),
        publish_date,
    }
}

#[derive(Debug, Clone)]
struct MetaTag {
    name: Option<String>,
    property: Option<String>,
    content: String,
}

static META_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?is)<meta\b[^>]*>"#).unwrap());
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    // Attribute pairs: key="value" or key='value' (no backreferences in Rust regex)
    Regex::new(r#"(?i)([a-zA-Z_:\-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});
static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<title[^>]*>(.*?)</title>"#).unwrap());
static TIME_DT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<time\b[^>]*?datetime\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*>"#).unwrap()
});
static SCRIPT_LD_JSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<script\b[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .unwrap()
});

fn collect_meta(html: &str) -> Vec<MetaTag> {
    META_TAG_RE
        .find_iter(html)
        .filter_map(|m| parse_meta_tag(m.as_str()))
        .collect()
}

fn parse_meta_tag(tag: &str) -> Option<MetaTag> {
    let mut name = None;
    let mut property = None;
    let mut content = None;
    for cap in ATTR_RE.captures_iter(tag) {
        let key = &cap[1];
        let val = cap
            .get(2)
            .or_else(|| cap.get(3))
            .map(|m| m.as_str().to_string());
        if let Some(val) = val {
            match key.to_ascii_lowercase().as_str() {
                "name" => name = Some(val),
                "property" => property = Some(val),
                "content" => content = Some(val),
                _ => {}
            }
        }
    }
    let content = content?;
    Some(MetaTag {
        name,
        property,
        content,
    })
}

fn collect_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1).map(|m| normalize_ws(m.as_str())))
        .filter(|t| !t.is_empty())
}

fn collect_time_datetime(html: &str) -> Option<String> {
    TIME_DT_RE
        .captures(html)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().to_string())
}

fn collect_json_ld(html: &str) -> Vec<serde_json::Value> {
    let mut out = Vec::new();
    for c in SCRIPT_LD_JSON_RE.captures_iter(html) {
        if let Some(m) = c.get(1) {
            let raw = m.as_str().trim();
            // Relax common issues: strip HTML comments and NULs
            let cleaned = raw
                .replace("<!--", "")
                .replace("-->", "")
                .replace("\u{0000}", "");
            if let Ok(v) = serde_json::from_str::<serde_json::Value>(&cleaned) {
                match v {
                    serde_json::Value::Array(a) => out.extend(a),
                    _ => out.push(v),
                }
            }
        }
    }
    out
}

fn meta_value(metas: &[MetaTag], name: &str) -> Option<String> {
    metas
        .iter()
        .find(|m| m.name.as_deref() == Some(name))
        .map(|m| m.content.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn meta_name(metas: &[MetaTag], name: &str) -> Option<String> {
    metas
        .iter()
        .find(|m| {
            m.name
                .as_deref()
                .map(|n| n.eq_ignore_ascii_case(name))
                .unwrap_or(false)
        })
        .map(|m| m.content.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn meta_property(metas: &[MetaTag], prop: &str) -> Option<String> {
    metas
        .iter()
        .find(|m| m.property.as_deref() == Some(prop))
        .map(|m| m.content.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn json_headline(json_ld: &[serde_json::Value]) -> Option<String> {
    for v in json_ld {
        if let Some(obj) = v.as_object()
            && let Some(h) = obj.get("headline").or_else(|| obj.get("name"))
            && let Some(s) = h.as_str()
        {
            return Some(s.to_string());
        }
    }
    None
}

fn json_date_published(json_ld: &[serde_json::Value]) -> Option<String> {
    for v in json_ld {
        if let Some(obj) = v.as_object()
            && let Some(h) = obj.get("datePublished")
            && let Some(s) = h.as_str()
        {
            return Some(s.to_string());
        }
    }
    None
}

fn json_publisher(json_ld: &[serde_json::Value]) -> Option<String> {
    for v in json_ld {
        if let Some(obj) = v.as_object()
            && let Some(p) = obj.get("publisher")
        {
            if let Some(s) = p.as_str() {
                return Some(s.to_string());
            }
            if let Some(o) = p.as_object()
                && let Some(n) = o.get("name").and_then(|x| x.as_str())
            {
                return Some(n.to_string());
            }
        }
    }
    None
}

fn json_authors(json_ld: &[serde_json::Value]) -> Option<Vec<String>> {
    for v in json_ld {
        if let Some(obj) = v.as_object()
            && let Some(a) = obj.get("author")
        {
            if let Some(s) = a.as_str() {
                return Some(split_creators(s));
            }
            if let Some(o) = a.as_object()
                && let Some(n) = o.get("name").and_then(|x| x.as_str())
            {
                return Some(vec![n.to_string()]);
            }
            if let Some(arr) = a.as_array() {
                let mut out = Vec::new();
                for it in arr {
                    if let Some(s) = it.as_str() {
                        out.push(s.to_string());
                        continue;
                    }
                    if let Some(o) = it.as_object()
                        && let Some(n) = o.get("name").and_then(|x| x.as_str())
                    {
                        out.push(n.to_string());
                    }
                }
                if !out.is_empty() {
                    return Some(out);
                }
            }
        }
    }
    None
}

fn split_creators(s: &str) -> Vec<String> {
    let t = s.trim();
    if t.contains(';') {
        t.split(';').map(normalize_name).collect()
    } else if t.contains(" and ") {
        t.split(" and ").map(normalize_name).collect()
    } else if t.split(',').count() > 2 {
        t.split(',').map(normalize_name).collect()
    } else {
        vec![normalize_name(t)]
    }
}

fn normalize_name(s: &str) -> String {
    normalize_ws(s).trim_matches(',').trim().to_string()
}

fn looks_like_url_or_handle(s: &str) -> bool {
    s.contains('@') || s.starts_with("http://") || s.starts_with("https://")
}

fn dedup_in_place(v: &mut Vec<String>) {
    let mut seen = std::collections::BTreeSet::new();
    v.retain(|x| seen.insert(x.to_ascii_lowercase()));
}

pub(crate) fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

fn strip_site_suffix(title: &str, site: &str) -> String {
    // Strip common separators when the site name appears at the end
    let site_esc = regex::escape(site.trim());
    let re = Regex::new(&format!(r"(?i)\s*[\-–—=|:~#]\s*{}\s*$", site_esc)).unwrap();
    re.replace(title, "").trim().to_string()
}

fn normalise_date(s: &str) -> Option<String> {
    let t = s.trim();
    static ISO_FULL: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(\d{4})[-/](\d{2})[-/](\d{2})").unwrap());
    static ISO_YM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})[-/](\d{2})\b").unwrap());
    static ISO_Y: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})\b").unwrap());
    if let Some(c) = ISO_FULL.captures(t) {
        return Some(format!("{}-{}-{}", &c[1], &c[2], &c[3]));
    }
    if let Some(c) = ISO_YM.captures(t) {
        return Some(format!("{}-{}", &c[1], &c[2]));
    }
    if let Some(c) = ISO_Y.captures(t) {
        return Some(c[1].to_string());
    }
    None
}
