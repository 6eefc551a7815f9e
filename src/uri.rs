//! A loose, mutable view of a URI reference.
//!
//! [`Url`] only represents absolute URLs, while links in blog posts are just
//! as often relative (`/tagged/cats`, `#top`, `//host/path`). `ParsedUri`
//! holds either kind as a set of optional components, so the rewriter can
//! move a link between absolute and relative form and serialize it back.

use std::borrow::Cow;
use std::fmt;

use url::Url;

use crate::error::Result;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedUri {
    /// Lowercase scheme without the trailing colon. `None` for relative and
    /// scheme-relative references.
    pub scheme: Option<String>,
    /// Whether `//` and an authority follow the scheme.
    pub slashes: bool,
    /// `user` or `user:password`, without the `@`.
    pub auth: Option<String>,
    pub hostname: Option<String>,
    /// Only ever set for a port other than the scheme's default.
    pub port: Option<u16>,
    pub pathname: Option<String>,
    /// Query without the leading `?`.
    pub search: Option<String>,
    /// Fragment without the leading `#`.
    pub hash: Option<String>,
    /// Set by the rewriter for links that may be rendered as live media.
    pub embeddable: bool,
}

impl ParsedUri {
    /// Parse a URI reference the way a browser reading an `href` would.
    ///
    /// Surrounding whitespace and control characters are stripped, as are
    /// tabs and newlines anywhere in the text.
    pub fn parse(text: &str) -> Result<ParsedUri> {
        let text = text.trim_matches(|c: char| c <= ' ');
        let text: Cow<str> = if text.contains(['\t', '\n', '\r']) {
            Cow::Owned(text.chars().filter(|c| !matches!(c, '\t' | '\n' | '\r')).collect())
        } else {
            Cow::Borrowed(text)
        };

        match Url::parse(&text) {
            Ok(url) => Ok(ParsedUri::from(&url)),
            Err(url::ParseError::RelativeUrlWithoutBase) => Self::parse_relative(&text),
            Err(e) => Err(e.into()),
        }
    }

    fn parse_relative(text: &str) -> Result<ParsedUri> {
        let mut leading = text.chars().take(2);
        let scheme_relative = matches!(
            (leading.next(), leading.next()),
            (Some('/' | '\\'), Some('/' | '\\'))
        );
        if scheme_relative {
            let url = Url::parse(&format!("https:{}", text))?;
            return Ok(ParsedUri {
                scheme: None,
                ..ParsedUri::from(&url)
            });
        }

        let (rest, hash) = match text.split_once('#') {
            Some((rest, hash)) => (rest, Some(hash.to_owned())),
            None => (text, None),
        };
        let (path, search) = match rest.split_once('?') {
            Some((path, search)) => (path, Some(search.to_owned())),
            None => (rest, None),
        };
        Ok(ParsedUri {
            pathname: Some(path.to_owned()).filter(|p| !p.is_empty()),
            search,
            hash,
            ..ParsedUri::default()
        })
    }

    pub fn is_relative(&self) -> bool {
        self.scheme.is_none() && self.hostname.is_none()
    }
}

impl From<&Url> for ParsedUri {
    fn from(url: &Url) -> Self {
        let auth = match (url.username(), url.password()) {
            ("", None) => None,
            (user, None) => Some(user.to_owned()),
            (user, Some(password)) => Some(format!("{}:{}", user, password)),
        };
        ParsedUri {
            scheme: Some(url.scheme().to_owned()),
            slashes: url.has_authority(),
            auth,
            hostname: url.host_str().map(str::to_owned),
            port: url.port(),
            pathname: Some(url.path().to_owned()).filter(|p| !p.is_empty()),
            search: url.query().map(str::to_owned),
            hash: url.fragment().map(str::to_owned),
            embeddable: false,
        }
    }
}

impl fmt::Display for ParsedUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{}:", scheme)?;
        }
        let authority = self.slashes || self.hostname.is_some();
        if authority {
            f.write_str("//")?;
            if let Some(auth) = &self.auth {
                write!(f, "{}@", auth)?;
            }
            if let Some(hostname) = &self.hostname {
                f.write_str(hostname)?;
            }
            if let Some(port) = self.port {
                write!(f, ":{}", port)?;
            }
        }
        if let Some(pathname) = &self.pathname {
            if authority && !pathname.starts_with('/') {
                f.write_str("/")?;
            } else if !authority && pathname.starts_with("//") {
                // would otherwise read back as an authority
                f.write_str("/.")?;
            }
            f.write_str(pathname)?;
        }
        if let Some(search) = &self.search {
            write!(f, "?{}", search)?;
        }
        if let Some(hash) = &self.hash {
            write!(f, "#{}", hash)?;
        }
        Ok(())
    }
}
