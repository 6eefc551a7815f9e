//! html5ever's tokenizer, reduced to a stream of open, text and close events.
//!
//! The tokenizer on its own knows nothing about nesting, so this adapter
//! keeps a stack of every element opened so far (allowed or not) and evens
//! out the event stream the way a forgiving parser would:
//!
//!  * a close tag for an element further down the stack closes everything
//!    above it first;
//!  * a close tag for an element that was never opened is dropped, except
//!    `</p>` and `</br>`, which browsers treat as `<p></p>` and `<br>`;
//!  * some elements implicitly close their open siblings (`<li>` after
//!    `<li>`, block elements after `<p>`, table cells and rows);
//!  * at the end of input, every open element is closed.
//!
//! Character references in text and attribute values are decoded by the
//! tokenizer, exactly once. That includes the content of `<script>` and
//! `<style>`, which is read as escapable raw text.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use html5ever::{Attribute, LocalName};
use log::{debug, trace};
use tendril::StrTendril;

use crate::policy::void_elements;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Open {
        name: LocalName,
        attrs: Vec<Attribute>,
    },
    Text(StrTendril),
    Close(LocalName),
}

/// Receives the events for one document, in order.
pub trait EventHandler {
    fn handle(&mut self, event: Event);
}

impl<F> EventHandler for F
where
    F: FnMut(Event),
{
    fn handle(&mut self, event: Event) {
        self(event)
    }
}

static IMPLIED_CLOSES: LazyLock<HashMap<&'static str, HashSet<&'static str>>> =
    LazyLock::new(|| {
        let p = hashset!["p"];
        let form = hashset!["input", "option", "optgroup", "select", "button", "datalist", "textarea"];
        let mut closes = hashmap![
            "tr" => hashset!["tr", "th", "td"],
            "th" => hashset!["th"],
            "td" => hashset!["thead", "th", "td"],
            "body" => hashset!["head", "link", "script"],
            "li" => hashset!["li"],
            "option" => hashset!["option"],
            "optgroup" => hashset!["optgroup", "option"],
            "dd" => hashset!["dt", "dd"],
            "dt" => hashset!["dt", "dd"],
            "rt" => hashset!["rt", "rp"],
            "rp" => hashset!["rt", "rp"],
            "tbody" => hashset!["thead", "tbody"],
            "tfoot" => hashset!["thead", "tbody"]
        ];
        for name in ["input", "select", "button", "datalist", "textarea"] {
            closes.insert(name, form.clone());
        }
        for name in [
            "p", "h1", "h2", "h3", "h4", "h5", "h6", "address", "article", "aside",
            "blockquote", "details", "div", "dl", "fieldset", "figcaption", "figure",
            "footer", "form", "header", "hr", "main", "nav", "ol", "pre", "section",
            "table", "ul",
        ] {
            closes.insert(name, p.clone());
        }
        closes
    });

/// Elements whose content the tokenizer must read as text rather than markup.
///
/// All of them are read as RCDATA so that character references in the text
/// are decoded like everywhere else, since the text is escaped again on
/// output.
fn raw_kind(name: &str) -> Option<RawKind> {
    match name {
        "script" | "style" | "xmp" | "iframe" | "noembed" | "noframes" | "title"
        | "textarea" => Some(RawKind::Rcdata),
        _ => None,
    }
}

struct Normalizer<H> {
    open: Vec<LocalName>,
    /// How many times each name appears in `open`.
    counts: HashMap<LocalName, usize>,
    handler: H,
}

impl<H: EventHandler> Normalizer<H> {
    fn open_tag(&mut self, name: LocalName, attrs: Vec<Attribute>) {
        if let Some(closes) = IMPLIED_CLOSES.get(&*name) {
            while self.open.last().is_some_and(|top| closes.contains(&**top)) {
                self.pop();
            }
        }
        if !void_elements().contains(&*name) {
            *self.counts.entry(name.clone()).or_insert(0) += 1;
            self.open.push(name.clone());
        }
        self.handler.handle(Event::Open { name, attrs });
    }

    /// Close the innermost open element.
    fn pop(&mut self) {
        let Some(name) = self.open.pop() else {
            return;
        };
        match self.counts.get_mut(&name) {
            Some(count) if *count > 1 => *count -= 1,
            _ => {
                self.counts.remove(&name);
            }
        }
        self.handler.handle(Event::Close(name));
    }

    fn close_tag(&mut self, name: LocalName) {
        // Every element the search walks past is closed, so checking the
        // counts first keeps stray close tags from rescanning the stack.
        if self.counts.contains_key(&name) {
            while let Some(top) = self.open.last() {
                let done = *top == name;
                self.pop();
                if done {
                    break;
                }
            }
        } else if &*name == "p" {
            self.open_tag(name.clone(), Vec::new());
            self.close_tag(name);
        } else if &*name == "br" {
            self.open_tag(name, Vec::new());
        } else {
            debug!("dropping close tag without open element: {}", &*name);
        }
    }

    fn text(&mut self, text: StrTendril) {
        self.handler.handle(Event::Text(text));
    }

    fn end(&mut self) {
        while !self.open.is_empty() {
            self.pop();
        }
    }
}

struct Sink<H> {
    inner: RefCell<Normalizer<H>>,
}

impl<H: EventHandler> TokenSink for Sink<H> {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let mut inner = self.inner.borrow_mut();
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => {
                    let raw = raw_kind(&tag.name);
                    inner.open_tag(tag.name, tag.attrs);
                    if let Some(kind) = raw {
                        return TokenSinkResult::RawData(kind);
                    }
                }
                TagKind::EndTag => inner.close_tag(tag.name),
            },
            Token::CharacterTokens(text) => inner.text(text),
            Token::ParseError(e) => trace!("error tokenizing html: {}", e),
            _ => {}
        }
        TokenSinkResult::Continue
    }

    fn end(&self) {
        self.inner.borrow_mut().end();
    }
}

/// Tokenize `html`, feeding every event to `handler`, and hand the handler
/// back once the input is exhausted.
///
/// ```
/// use splash_clean::{tokenize, Event};
///
/// let mut names = Vec::new();
/// tokenize("<b>1 <i>2</b>", |event| {
///     if let Event::Close(name) = event {
///         names.push(name.to_string());
///     }
/// });
/// assert_eq!(names, ["i", "b"]);
/// ```
pub fn tokenize<H: EventHandler>(html: &str, handler: H) -> H {
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));

    let sink = Sink {
        inner: RefCell::new(Normalizer {
            open: Vec::new(),
            counts: HashMap::new(),
            handler,
        }),
    };
    let tok = Tokenizer::new(sink, TokenizerOpts::default());
    let _ = tok.feed(&input);
    tok.end();

    tok.sink.inner.into_inner().handler
}

#[cfg(test)]
mod test {
    use super::*;

    fn events(html: &str) -> Vec<String> {
        let mut out = Vec::new();
        tokenize(html, |event| {
            out.push(match event {
                Event::Open { name, attrs } => {
                    let attrs: Vec<String> = attrs
                        .iter()
                        .map(|a| format!(" {}={}", &*a.name.local, &*a.value))
                        .collect();
                    format!("<{}{}>", &*name, attrs.concat())
                }
                Event::Text(text) => text.to_string(),
                Event::Close(name) => format!("</{}>", &*name),
            })
        });
        out
    }

    #[test]
    fn lowercases_names() {
        assert_eq!(events("<B TITLE=x>y</B>"), ["<b title=x>", "y", "</b>"]);
    }

    #[test]
    fn decodes_references_once() {
        assert_eq!(events("<i title='&amp;lt;'>&amp;lt;</i>").concat(), "<i title=&lt;>&lt;</i>");
        assert_eq!(events("&mdash;&#x2019;&#x1f60a;").concat(), "—’😊");
    }

    #[test]
    fn misnested_close() {
        assert_eq!(
            events("<blockquote><b>1 <i>2</b> 3</i> 4</u>").concat(),
            "<blockquote><b>1 <i>2</i></b> 3 4</blockquote>"
        );
    }

    #[test]
    fn closes_at_end() {
        assert_eq!(events("<b><i>x").concat(), "<b><i>x</i></b>");
    }

    #[test]
    fn void_elements_are_not_closed() {
        assert_eq!(events("<br><hr/><img src=a>").concat(), "<br><hr><img src=a>");
    }

    #[test]
    fn stray_paragraph_and_break_close() {
        assert_eq!(events("a</p>b</br>c").concat(), "a<p></p>b<br>c");
    }

    #[test]
    fn implied_closes() {
        assert_eq!(events("<p>a<p>b").concat(), "<p>a</p><p>b</p>");
        assert_eq!(events("<ul><li>a<li>b</ul>").concat(), "<ul><li>a</li><li>b</li></ul>");
        assert_eq!(events("<p>a<div>b</div>").concat(), "<p>a</p><div>b</div>");
        assert_eq!(events("<dl><dt>a<dd>b<dt>c</dl>").concat(), "<dl><dt>a</dt><dd>b</dd><dt>c</dt></dl>");
    }

    #[test]
    fn script_content_is_text() {
        assert_eq!(
            events("<script>if (a<b) x()</script>after").concat(),
            "<script>if (a<b) x()</script>after"
        );
        assert_eq!(events("<style>b > i {}</style>").concat(), "<style>b > i {}</style>");
        assert_eq!(events("<title>&amp;<b></title>").concat(), "<title>&<b></title>");
    }

    #[test]
    fn script_content_is_decoded() {
        assert_eq!(events("<script>a &amp; b</script>").concat(), "<script>a & b</script>");
        assert_eq!(events("<style>a &lt; b</style>").concat(), "<style>a < b</style>");
    }

    #[test]
    fn repeated_names_close_innermost() {
        assert_eq!(
            events("<b><i><b>x</b>y</b>z</i>").concat(),
            "<b><i><b>x</b>y</i></b>z"
        );
        assert_eq!(events("<i><b></b></b>x</i>").concat(), "<i><b></b>x</i>");
    }

    #[test]
    fn many_stray_close_tags() {
        let html = "<x>".repeat(50_000) + &"</y>".repeat(50_000) + "</x>";
        let events = events(&html);
        assert_eq!(events.len(), 100_000);
        assert_eq!(events[50_000], "</x>");
    }

    #[test]
    fn comments_and_doctype_vanish() {
        assert_eq!(events("<!DOCTYPE html><!-- <b> -->x").concat(), "x");
    }
}
