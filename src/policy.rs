use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Settings for HTML cleaning.
///
/// Every table is an allowlist: anything not named here is dropped. The
/// default value is what [`sanitize`](crate::sanitize) uses.
#[derive(Clone, Debug)]
pub struct Policy<'a> {
    /// Elements that are allowed. Disallowed elements lose their own markup
    /// but their children are still cleaned and kept.
    pub tags: HashSet<&'a str>,
    /// Attributes that are allowed on every allowed element.
    pub generic_attributes: HashSet<&'a str>,
    /// Attributes that are allowed on certain tags, as a map from tag name to
    /// set of attribute name.
    pub tag_attributes: HashMap<&'a str, HashSet<&'a str>>,
    /// Attributes holding a URL. Their values are parsed, checked against
    /// `url_schemes` and passed through the link rewriter; the attribute is
    /// dropped when the scheme is not permitted.
    pub link_attributes: HashMap<&'a str, HashSet<&'a str>>,
    /// Permitted URL schemes on link attributes and image sources, without
    /// the trailing colon.
    pub url_schemes: HashSet<&'a str>,
    /// Permit links with no scheme at all (relative and scheme-relative).
    pub url_relative: bool,
}

impl<'a> Default for Policy<'a> {
    fn default() -> Self {
        let tags = hashset![
            "section", "nav", "article", "aside",
            "h1", "h2", "h3", "h4", "h5", "h6",
            "header", "footer",
            "address",
            "p", "hr", "pre", "blockquote", "ol", "ul", "li", "dl", "dt", "dd",
            "figure", "figcaption", "div",
            "a", "em", "strong", "small", "s", "cite", "q", "dfn", "abbr",
            "data", "time", "code", "var", "samp", "kbd", "sub", "sup",
            "i", "b", "u", "mark",
            "ruby", "rt", "rp", "bdi", "bdo",
            "span", "br", "wbr",
            "ins", "del",
            "table", "caption", "tbody", "thead", "tfoot", "tr", "td", "th"
        ];
        let generic_attributes = hashset![
            "title", "dir", "lang"
        ];
        let tag_attributes = hashmap![
            "data" => hashset!["value"],
            "img" => hashset!["alt", "longdesc"],
            "ol" => hashset!["type", "start"],
            "ul" => hashset!["type"],
            "time" => hashset!["datetime"]
        ];
        let link_attributes = hashmap![
            "a" => hashset!["href"],
            "img" => hashset!["longdesc"]
        ];
        // Adapted from https://www.iana.org/assignments/uri-schemes/uri-schemes.xhtml
        let url_schemes = hashset![
            // common
            "ftp", "http", "https", "mailto", "sftp", "shttp", "ssh",
            // source control
            "git", "hg", "svn", "cvs",
            // telephony
            "tel", "sms", "fax", "callto", "facetime", "skype",
            // chat
            "irc", "irc6", "ircs", "jabber", "xmpp",
            // miscellaneous
            "bitcoin", "magnet", "maps", "news", "nntp", "rtsp", "snews", "steam",
            "telnet", "tv", "view-source", "ymsgr", "finger", "feed"
        ];
        Policy {
            tags,
            generic_attributes,
            tag_attributes,
            link_attributes,
            url_schemes,
            url_relative: true,
        }
    }
}

impl<'a> Policy<'a> {
    /// `None` stands for a link without a scheme.
    pub fn is_safe_protocol(&self, scheme: Option<&str>) -> bool {
        match scheme {
            Some(scheme) => self.url_schemes.contains(scheme),
            None => self.url_relative,
        }
    }

    pub fn is_safe_element(&self, name: &str) -> bool {
        self.tags.contains(name)
    }

    /// Void elements are fixed by HTML syntax, so this is the same set the
    /// tokenizer uses and not part of the policy.
    pub fn is_void_element(&self, name: &str) -> bool {
        void_elements().contains(name)
    }

    /// Whether a plain (non-link) attribute may be kept on `element`.
    pub fn is_safe_attribute(&self, element: &str, attribute: &str) -> bool {
        self.generic_attributes.contains(attribute)
            || self
                .tag_attributes
                .get(element)
                .map(|ta| ta.contains(attribute))
                == Some(true)
    }

    pub fn is_link_attribute(&self, element: &str, attribute: &str) -> bool {
        self.link_attributes
            .get(element)
            .map(|la| la.contains(attribute))
            == Some(true)
    }
}

/// The HTML void elements, which the tokenizer never expects to see closed.
pub(crate) fn void_elements() -> &'static HashSet<&'static str> {
    static VOID: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
        hashset![
            "area", "base", "br", "col", "embed", "hr", "img", "input",
            "link", "meta", "param", "source", "track", "wbr"
        ]
    });
    &VOID
}
