//! Classification and rewriting of links found in post bodies.
//!
//! Links back into the platform become paths served by this site, links to
//! a short list of known hosts are upgraded to HTTPS, and media on the
//! platform's content-addressed hosts is marked as embeddable. Everything
//! else keeps its destination.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Regex, RegexSet};
use url::Host;

use crate::error::{Error, Result};
use crate::uri::ParsedUri;

const PLATFORM_DOMAIN: &str = "tumblr.com";
const CANONICAL_HOST: &str = "www.tumblr.com";
const AUDIO_HOST: &str = "a.tumblr.com";
const SHORTENER_HOST: &str = "tmblr.co";

static HTTPS_HOSTS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    hashset![
        "www.tumblr.com",
        "api.tumblr.com",
        "tumblr.com",
        "imgur.com",
        "i.imgur.com"
    ]
});

static MEDIA_HOSTS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"^(?:\d+\.)?media\.tumblr\.com$",
        r"(?i)^[\w-]+\.ytimg\.com$",
    ])
    .unwrap()
});

static BLOG_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[\w-]+\.tumblr\.com$").unwrap());

static AUDIO_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/audio_file/[^/]+/\d+/(tumblr_[a-zA-Z\d]+)$").unwrap()
});

static SHORTENER_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/([a-zA-Z\d_-]+)$").unwrap());

/// Paths a blog can be viewed at on this site: the index, one post with an
/// optional slug, or a tag listing.
static BLOG_PAGE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:/|/post/\d+(?:/[^/]*)?|/tagged/[^/]+)?$").unwrap()
});

/// The blog currently being viewed.
///
/// Either a blog name on the platform (`staff`) or the blog's own domain
/// (`example.com`). Stored lowercase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseDomain(String);

impl BaseDomain {
    pub fn new(name: &str) -> Result<BaseDomain> {
        if name.is_empty() {
            return Err(Error::EmptyBaseDomain);
        }
        match Host::parse(name) {
            Ok(Host::Domain(domain)) => Ok(BaseDomain(domain)),
            _ => Err(Error::InvalidBaseDomain(name.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The host the blog is served from on the open web.
    pub fn hostname(&self) -> Cow<'_, str> {
        if self.0.contains('.') {
            Cow::Borrowed(&self.0)
        } else {
            Cow::Owned(format!("{}.{}", self.0, PLATFORM_DOMAIN))
        }
    }
}

impl std::str::FromStr for BaseDomain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BaseDomain::new(s)
    }
}

/// The path this site serves `pathname` of the blog `name` at.
///
/// `name` may be a bare blog name or a hostname on the platform; the
/// platform suffix is stripped so both map to the same path.
///
/// ```
/// assert_eq!(splash_clean::blog_path("staff.tumblr.com", Some("/post/1")), "/blog/staff/post/1");
/// assert_eq!(splash_clean::blog_path("example.com", None), "/blog/example.com");
/// ```
pub fn blog_path(name: &str, pathname: Option<&str>) -> String {
    let suffix = format!(".{}", PLATFORM_DOMAIN);
    let name = name.strip_suffix(&suffix).unwrap_or(name);
    format!("/blog/{}{}", name, pathname.unwrap_or(""))
}

fn is_blog_page_path(pathname: Option<&str>) -> bool {
    BLOG_PAGE_PATH.is_match(pathname.unwrap_or(""))
}

/// Decide what a link found on `base`'s pages should point at.
///
/// The first matching rule wins:
///
///  1. A scheme-relative link is taken to be HTTPS. Links with any scheme
///     other than HTTP(S), or with an explicit port, are returned as is.
///  2. Audio file pages on the platform become the direct CDN file.
///  3. A host-relative link is resolved against `base`.
///  4. Shortener links become `/tmblr/<code>`, left for the site to resolve.
///  5. Known hosts are upgraded to HTTPS.
///  6. Platform media hosts are upgraded to HTTPS and marked embeddable.
///  7. Viewable pages of a platform blog (or of `base` itself) become local
///     `/blog/...` paths.
pub fn rewrite_link(uri: ParsedUri, base: &BaseDomain) -> ParsedUri {
    let uri = match uri.scheme.as_deref() {
        None if uri.hostname.is_some() => ParsedUri {
            scheme: Some("https".to_owned()),
            ..uri
        },
        _ => uri,
    };

    if !matches!(uri.scheme.as_deref(), None | Some("http" | "https")) || uri.port.is_some() {
        return uri;
    }

    if uri.hostname.as_deref() == Some(CANONICAL_HOST) {
        if let Some(token) = uri
            .pathname
            .as_deref()
            .and_then(|p| AUDIO_PATH.captures(p))
            .map(|c| c[1].to_owned())
        {
            return ParsedUri {
                scheme: Some("https".to_owned()),
                hostname: Some(AUDIO_HOST.to_owned()),
                pathname: Some(format!("/{}o1.mp3", token)),
                ..uri
            };
        }
    }

    let uri = if uri.scheme.is_none() && uri.pathname.is_some() {
        ParsedUri {
            scheme: Some("https".to_owned()),
            slashes: true,
            hostname: Some(base.hostname().into_owned()),
            ..uri
        }
    } else {
        uri
    };

    let Some(hostname) = uri.hostname.as_deref() else {
        return uri;
    };

    if hostname == SHORTENER_HOST {
        let code = uri
            .pathname
            .as_deref()
            .and_then(|p| SHORTENER_PATH.captures(p))
            .map(|c| c[1].to_owned());
        return match code {
            Some(code) => ParsedUri {
                scheme: None,
                slashes: false,
                auth: None,
                hostname: None,
                pathname: Some(format!("/tmblr/{}", code)),
                ..uri
            },
            None => ParsedUri {
                scheme: Some("https".to_owned()),
                ..uri
            },
        };
    }

    if HTTPS_HOSTS.contains(hostname) {
        ParsedUri {
            scheme: Some("https".to_owned()),
            ..uri
        }
    } else if MEDIA_HOSTS.is_match(hostname) {
        ParsedUri {
            scheme: Some("https".to_owned()),
            embeddable: true,
            ..uri
        }
    } else if (BLOG_HOST.is_match(hostname) || hostname == base.hostname())
        && is_blog_page_path(uri.pathname.as_deref())
    {
        let pathname = blog_path(hostname, uri.pathname.as_deref());
        ParsedUri {
            scheme: None,
            slashes: false,
            auth: None,
            hostname: None,
            pathname: Some(pathname),
            ..uri
        }
    } else {
        uri
    }
}

/// Parse `uri`, rewrite it with [`rewrite_link`] and format the result.
///
/// ```
/// use splash_clean::{rewrite_link_string, BaseDomain};
///
/// let base = BaseDomain::new("staff").unwrap();
/// assert_eq!(rewrite_link_string("http://imgur.com/", &base).unwrap(), "https://imgur.com/");
/// assert_eq!(rewrite_link_string("/tagged/example", &base).unwrap(), "/blog/staff/tagged/example");
/// ```
pub fn rewrite_link_string(uri: &str, base: &BaseDomain) -> Result<String> {
    Ok(rewrite_link(ParsedUri::parse(uri)?, base).to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    fn rewrite(uri: &str) -> String {
        rewrite_link_string(uri, &BaseDomain::new("staff").unwrap()).unwrap()
    }

    fn rewrite_on(base: &str, uri: &str) -> String {
        rewrite_link_string(uri, &BaseDomain::new(base).unwrap()).unwrap()
    }

    fn embeddable(uri: &str) -> bool {
        rewrite_link(ParsedUri::parse(uri).unwrap(), &BaseDomain::new("staff").unwrap()).embeddable
    }

    #[test]
    fn empty_base_domain() {
        assert!(matches!(BaseDomain::new(""), Err(Error::EmptyBaseDomain)));
    }

    #[test]
    fn invalid_base_domain() {
        for name in ["evil.example/path", "a b", "127.0.0.1", "[::1]", "staff:80"] {
            assert!(
                matches!(BaseDomain::new(name), Err(Error::InvalidBaseDomain(_))),
                "{}",
                name
            );
        }
    }

    #[test]
    fn base_domain_hostname() {
        assert_eq!(BaseDomain::new("Staff").unwrap().hostname(), "staff.tumblr.com");
        assert_eq!(BaseDomain::new("example.com").unwrap().hostname(), "example.com");
    }

    #[test]
    fn blog_path_strips_platform_suffix() {
        assert_eq!(blog_path("staff", Some("/")), "/blog/staff/");
        assert_eq!(blog_path("staff.tumblr.com", Some("/tagged/x")), "/blog/staff/tagged/x");
        assert_eq!(blog_path("staff", None), "/blog/staff");
    }

    #[test]
    fn other_schemes_untouched() {
        assert_eq!(rewrite("mailto:staff@tumblr.com"), "mailto:staff@tumblr.com");
        assert_eq!(rewrite("ftp://staff.tumblr.com/"), "ftp://staff.tumblr.com/");
    }

    #[test]
    fn explicit_port_untouched() {
        assert_eq!(rewrite("http://staff.tumblr.com:8080/"), "http://staff.tumblr.com:8080/");
        assert_eq!(rewrite("http://imgur.com:8080/"), "http://imgur.com:8080/");
    }

    #[test]
    fn scheme_relative_becomes_https() {
        assert_eq!(rewrite("//example.com/a"), "https://example.com/a");
        assert_eq!(rewrite("//imgur.com:8080/"), "https://imgur.com:8080/");
    }

    #[test]
    fn audio_file() {
        assert_eq!(
            rewrite("http://www.tumblr.com/audio_file/staff/123456/tumblr_abc123XYZ"),
            "https://a.tumblr.com/tumblr_abc123XYZo1.mp3"
        );
        assert_eq!(
            rewrite("https://www.tumblr.com/audio_file/staff/123456/tumblr_abc123/extra"),
            "https://www.tumblr.com/audio_file/staff/123456/tumblr_abc123/extra"
        );
    }

    #[test]
    fn host_relative() {
        assert_eq!(rewrite("/page"), "https://staff.tumblr.com/page");
        assert_eq!(rewrite("/tagged/example"), "/blog/staff/tagged/example");
        assert_eq!(rewrite("/"), "/blog/staff/");
        assert_eq!(rewrite_on("example.com", "/page"), "https://example.com/page");
        assert_eq!(rewrite_on("example.com", "/post/1"), "/blog/example.com/post/1");
    }

    #[test]
    fn pathless_relative_untouched() {
        assert_eq!(rewrite("#"), "#");
        assert_eq!(rewrite("#notes"), "#notes");
        assert_eq!(rewrite("?offset=20"), "?offset=20");
    }

    #[test]
    fn shortener() {
        assert_eq!(rewrite("http://tmblr.co/ZE5Fby1Lq7sVx"), "/tmblr/ZE5Fby1Lq7sVx");
        assert_eq!(rewrite("https://tmblr.co/a-b_c"), "/tmblr/a-b_c");
        assert_eq!(rewrite("http://tmblr.co/a/b"), "https://tmblr.co/a/b");
        assert_eq!(rewrite("http://tmblr.co/"), "https://tmblr.co/");
    }

    #[test]
    fn trusted_hosts_upgraded() {
        assert_eq!(rewrite("http://imgur.com/"), "https://imgur.com/");
        assert_eq!(rewrite("http://i.imgur.com/a.png"), "https://i.imgur.com/a.png");
        assert_eq!(rewrite("http://www.tumblr.com/"), "https://www.tumblr.com/");
        assert_eq!(rewrite("http://api.tumblr.com/"), "https://api.tumblr.com/");
        assert!(!embeddable("http://i.imgur.com/a.png"));
    }

    #[test]
    fn media_hosts_embeddable() {
        assert_eq!(rewrite("http://37.media.tumblr.com/foo.png"), "https://37.media.tumblr.com/foo.png");
        assert!(embeddable("http://37.media.tumblr.com/foo.png"));
        assert!(embeddable("http://media.tumblr.com/foo.png"));
        assert!(embeddable("https://41.media.tumblr.com/foo.png"));
        assert!(embeddable("http://i.ytimg.com/vi/x/0.jpg"));
        assert!(!embeddable("http://x.media.tumblr.com/foo.png"));
        assert!(!embeddable("http://media.tumblr.com.evil.example/foo.png"));
        assert!(!embeddable("http://idioticimages.com/foo.gif"));
    }

    #[test]
    fn blog_links() {
        assert_eq!(rewrite("http://staff.tumblr.com/"), "/blog/staff/");
        assert_eq!(rewrite("http://staff.tumblr.com/post/69608789310"), "/blog/staff/post/69608789310");
        assert_eq!(
            rewrite("http://staff.tumblr.com/post/69608789310/love-the-new-search"),
            "/blog/staff/post/69608789310/love-the-new-search"
        );
        assert_eq!(rewrite("http://other-blog.tumblr.com/tagged/cats"), "/blog/other-blog/tagged/cats");
        assert_eq!(rewrite("https://staff.tumblr.com/?offset=20#top"), "/blog/staff/?offset=20#top");
    }

    #[test]
    fn blog_links_trailing_slashes() {
        assert_eq!(rewrite("http://staff.tumblr.com"), "/blog/staff/");
        assert_eq!(rewrite("http://staff.tumblr.com/post/1/"), "/blog/staff/post/1/");
        assert_eq!(rewrite("http://staff.tumblr.com/tagged/cats/"), "http://staff.tumblr.com/tagged/cats/");
        assert_eq!(rewrite("http://staff.tumblr.com/tagged/"), "http://staff.tumblr.com/tagged/");
        assert_eq!(rewrite("http://staff.tumblr.com/post/"), "http://staff.tumblr.com/post/");
    }

    #[test]
    fn blog_links_to_other_pages() {
        assert_eq!(rewrite("http://staff.tumblr.com/archive"), "http://staff.tumblr.com/archive");
        assert_eq!(rewrite("http://staff.tumblr.com/post/abc"), "http://staff.tumblr.com/post/abc");
        assert_eq!(
            rewrite("http://staff.tumblr.com/post/1/slug/extra"),
            "http://staff.tumblr.com/post/1/slug/extra"
        );
        assert_eq!(
            rewrite("http://staff.tumblr.com/tagged/cats/page/2"),
            "http://staff.tumblr.com/tagged/cats/page/2"
        );
        assert_eq!(rewrite("/archive"), "https://staff.tumblr.com/archive");
    }

    #[test]
    fn custom_domain_is_base() {
        assert_eq!(rewrite_on("example.com", "http://example.com/"), "/blog/example.com/");
        assert_eq!(rewrite("http://example.com/"), "http://example.com/");
    }

    #[test]
    fn unknown_hosts_keep_scheme() {
        assert_eq!(rewrite("http://idioticimages.com/foo.gif"), "http://idioticimages.com/foo.gif");
        assert_eq!(rewrite("https://charmander.me/"), "https://charmander.me/");
    }
}
