//! Outbound links and the heuristic link filter used by the deep reader.

use std::cmp::Reverse;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

/// Kind of clickable element a link was discovered on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Plain anchor.
    #[default]
    Link,
    /// Anchor styled or marked up as a button.
    Button,
}

/// A link discovered on a rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Link target as found on the page.
    pub url: String,
    /// Visible anchor text (or aria-label).
    pub text: String,
    /// Element kind.
    #[serde(default)]
    pub kind: LinkKind,
}

impl Link {
    /// Creates a plain link.
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            kind: LinkKind::Link,
        }
    }

    /// Sets the link kind.
    pub fn with_kind(mut self, kind: LinkKind) -> Self {
        self.kind = kind;
        self
    }
}

/// URL substrings that mark auth flows, legal/meta pages and social sites.
const EXCLUDED_PATTERNS: &[&str] = &[
    "login", "signin", "sign-in", "signup", "sign-up", "register",
    "logout", "log-out", "subscribe", "unsubscribe",
    "privacy", "terms", "legal", "cookie",
    "contact", "about", "help", "support", "faq",
    "sitemap", "rss", "feed", "xml",
    "facebook.com", "twitter.com", "linkedin.com", "instagram.com",
    "youtube.com", "github.com", "medium.com",
];

/// Documents, archives, images and audio/video.
const EXCLUDED_EXTENSIONS: &[&str] = &[
    ".pdf", ".zip", ".doc", ".docx", ".xls", ".xlsx",
    ".ppt", ".pptx", ".mp3", ".mp4", ".avi", ".mov",
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp",
];

/// Anchor texts that say nothing about the target (matched whole, any case).
const GENERIC_ANCHORS: &[&str] = &["click here", "read more", "more", "learn more", "here", "link"];

const MIN_ANCHOR_CHARS: usize = 3;

/// Picks the most promising outbound links of a page.
///
/// Best-effort relevance heuristic: drops non-navigational, duplicate,
/// off-site, boilerplate and binary links, then prefers longer anchor text.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    max_links: usize,
    same_domain: bool,
}

impl LinkFilter {
    /// Creates a filter keeping at most `max_links` links.
    pub fn new(max_links: usize, same_domain: bool) -> Self {
        Self {
            max_links,
            same_domain,
        }
    }

    /// Filters, dedups and ranks `links` found on `seed_url`.
    ///
    /// Surviving links carry absolute URLs resolved against the seed. Among
    /// links sharing a URL the first survivor wins; ties in anchor length
    /// keep page order.
    pub fn filter(&self, seed_url: &str, links: &[Link]) -> Vec<Link> {
        let seed = Url::parse(seed_url).ok();
        let seed_host = seed.as_ref().and_then(|u| u.host_str().map(str::to_owned));

        let mut seen: HashSet<&str> = HashSet::new();
        let mut kept: Vec<Link> = Vec::new();

        for link in links {
            let raw = link.url.trim();
            if is_non_navigational(raw) || seen.contains(raw) {
                continue;
            }
            let Some(resolved) = resolve(seed.as_ref(), raw) else {
                continue;
            };
            if points_back_to(&resolved, seed.as_ref()) {
                continue;
            }
            if self.same_domain {
                if let Some(host) = seed_host.as_deref() {
                    if resolved.host_str() != Some(host) {
                        continue;
                    }
                }
            }

            let lower = resolved.as_str().to_lowercase();
            if EXCLUDED_PATTERNS.iter().any(|p| lower.contains(p)) {
                continue;
            }
            if EXCLUDED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
                continue;
            }
            if is_generic_anchor(&link.text) {
                continue;
            }

            seen.insert(raw);
            kept.push(Link {
                url: resolved.into(),
                text: link.text.trim().to_string(),
                kind: link.kind,
            });
        }

        kept.sort_by_key(|l| Reverse(l.text.chars().count()));
        kept.truncate(self.max_links);
        kept
    }
}

fn is_non_navigational(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    url.is_empty()
        || url == "#"
        || lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
}

/// Same-page anchors: a fragment link whose page is the seed page.
fn points_back_to(url: &Url, seed: Option<&Url>) -> bool {
    let Some(seed) = seed else {
        return false;
    };
    if url.fragment().is_none() {
        return false;
    }
    let mut page = url.clone();
    page.set_fragment(None);
    let mut seed_page = seed.clone();
    seed_page.set_fragment(None);
    page == seed_page
}

fn resolve(seed: Option<&Url>, raw: &str) -> Option<Url> {
    match seed {
        Some(seed) => seed.join(raw).ok(),
        None => Url::parse(raw).ok(),
    }
}

fn is_generic_anchor(text: &str) -> bool {
    let text = text.trim();
    if text.chars().count() < MIN_ANCHOR_CHARS {
        return true;
    }
    let lower = text.to_lowercase();
    GENERIC_ANCHORS.iter().any(|g| *g == lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "https://example.com/articles";

    fn filter(links: &[Link]) -> Vec<Link> {
        LinkFilter::new(10, true).filter(SEED, links)
    }

    #[test]
    fn test_login_dropped_article_kept() {
        let links = vec![
            Link::new("/login", "Sign In"),
            Link::new("/a1", "Interesting Long Article Title"),
        ];
        let kept = LinkFilter::new(10, true).filter("https://example.com", &links);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "https://example.com/a1");
        assert_eq!(kept[0].text, "Interesting Long Article Title");
    }

    #[test]
    fn test_non_navigational_dropped() {
        let links = vec![
            Link::new("", "Empty target"),
            Link::new("#", "Top of page"),
            Link::new("javascript:void(0)", "Open menu"),
            Link::new("mailto:team@example.com", "Email the team"),
            Link::new("tel:+15551234", "Call us now"),
        ];
        assert!(filter(&links).is_empty());
    }

    #[test]
    fn test_duplicate_url_first_seen_wins() {
        let links = vec![
            Link::new("https://example.com/post", "Original anchor"),
            Link::new("https://example.com/post", "A much longer second anchor text"),
        ];
        let kept = filter(&links);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "Original anchor");
    }

    #[test]
    fn test_same_page_fragment_dropped() {
        let links = vec![
            Link::new(format!("{}#section-2", SEED), "Jump to section two"),
            Link::new("#comments", "Jump to comments"),
            Link::new("https://example.com/other#part", "Other article part"),
        ];
        let kept = filter(&links);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "https://example.com/other#part");
    }

    #[test]
    fn test_fragment_on_normalized_seed_dropped() {
        let links = vec![
            Link::new("https://example.com/#top", "Back to the top of the page"),
            Link::new("/#top", "Another way back to the top"),
            Link::new("/news", "Latest news from the site"),
        ];
        let kept = LinkFilter::new(10, true).filter("https://example.com", &links);
        let urls: Vec<&str> = kept.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/news"]);
    }

    #[test]
    fn test_same_domain_compares_host_only() {
        let links = vec![
            Link::new("http://example.com/plain-http", "Plain http article"),
            Link::new("https://other.org/story", "Offsite story title"),
            Link::new("https://sub.example.com/story", "Subdomain story title"),
        ];
        let kept = filter(&links);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "http://example.com/plain-http");
    }

    #[test]
    fn test_cross_domain_allowed_when_disabled() {
        let links = vec![Link::new("https://other.org/story", "Offsite story title")];
        let kept = LinkFilter::new(10, false).filter(SEED, &links);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_blocklisted_patterns_dropped() {
        let links = vec![
            Link::new("/privacy-policy", "Privacy policy page"),
            Link::new("/Terms-Of-Service", "Terms of service"),
            Link::new("/about-us", "About our company"),
            Link::new("https://www.facebook.com/example", "Our Facebook page"),
        ];
        assert!(LinkFilter::new(10, false).filter(SEED, &links).is_empty());
    }

    #[test]
    fn test_excluded_extensions_dropped() {
        let links = vec![
            Link::new("/report.PDF", "Annual report download"),
            Link::new("/images/photo.jpg", "Photo of the event"),
            Link::new("/files/archive.zip", "Download everything"),
            Link::new("/guide", "Beginner guide"),
        ];
        let kept = filter(&links);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "Beginner guide");
    }

    #[test]
    fn test_generic_and_short_anchor_text_dropped() {
        let links = vec![
            Link::new("/p1", "Read More"),
            Link::new("/p2", "here"),
            Link::new("/p3", "Go"),
            Link::new("/p4", "LINK"),
            Link::new("/p5", "Read more about pricing"),
        ];
        let kept = filter(&links);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "Read more about pricing");
    }

    #[test]
    fn test_sorted_by_anchor_length_and_capped() {
        let links = vec![
            Link::new("/a", "Medium length"),
            Link::new("/b", "The longest anchor text of all"),
            Link::new("/c", "Short"),
            Link::new("/d", "Quite long anchor"),
        ];
        let kept = LinkFilter::new(2, true).filter(SEED, &links);
        let texts: Vec<&str> = kept.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["The longest anchor text of all", "Quite long anchor"]);
    }

    #[test]
    fn test_kind_preserved() {
        let links = vec![Link::new("/start", "Start free trial").with_kind(LinkKind::Button)];
        let kept = filter(&links);
        assert_eq!(kept[0].kind, LinkKind::Button);
    }

    #[test]
    fn test_unparseable_seed_skips_domain_check() {
        let links = vec![
            Link::new("https://a.com/story", "Absolute story link"),
            Link::new("/relative", "Relative story link"),
        ];
        let kept = LinkFilter::new(10, true).filter("not a url", &links);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "https://a.com/story");
    }

    #[test]
    fn test_empty_input() {
        assert!(filter(&[]).is_empty());
    }

    #[test]
    fn test_link_kind_serialization() {
        let json = serde_json::to_string(&LinkKind::Button).unwrap();
        assert_eq!(json, "\"button\"");
    }
}
