use std::fmt::{self, Display};
use std::io;

/// HTML that has been through the sanitizer and can be embedded as is.
///
/// Template layers should write it out without escaping it a second time.
/// The only way to get one is from [`Policy::sanitize`](crate::Policy::sanitize).
///
///     let markup = splash_clean::sanitize("<B>Uppercase.</B>", "staff").unwrap();
///     assert_eq!(markup.to_string(), "<b>Uppercase.</b>");
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct SafeMarkup(String);

impl SafeMarkup {
    pub(crate) fn new(html: String) -> SafeMarkup {
        SafeMarkup(html)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Write the markup to `writer`, without copying it into another buffer.
    pub fn write_to<W>(&self, mut writer: W) -> io::Result<()>
    where
        W: io::Write,
    {
        writer.write_all(self.0.as_bytes())
    }
}

impl AsRef<str> for SafeMarkup {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for SafeMarkup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SafeMarkup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SafeMarkup({})", self.0)
    }
}

impl From<SafeMarkup> for String {
    fn from(markup: SafeMarkup) -> Self {
        markup.0
    }
}
