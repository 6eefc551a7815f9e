use html5ever::{Attribute, LocalName};
use log::debug;

use crate::escape::{escape_attribute_value, escape_content};
use crate::markup::SafeMarkup;
use crate::policy::Policy;
use crate::rewrite::{rewrite_link, BaseDomain};
use crate::tokenizer::{tokenize, Event, EventHandler};
use crate::uri::ParsedUri;

impl<'a> Policy<'a> {
    /// Clean a fragment of untrusted HTML written for the blog `base`.
    ///
    /// Disallowed elements lose their tags but keep their content, disallowed
    /// attributes are dropped, links are checked and rewritten, and close
    /// tags that don't match the innermost open element are ignored. Elements
    /// still open at the end are closed, so the result is always balanced.
    pub fn sanitize(&self, html: &str, base: &BaseDomain) -> SafeMarkup {
        tokenize(html, Renderer::new(self, base)).finish()
    }
}

fn attr_value<'t>(attrs: &'t [Attribute], name: &str) -> Option<&'t str> {
    attrs
        .iter()
        .find(|attr| &*attr.name.local == name)
        .map(|attr| &*attr.value)
}

struct Renderer<'p, 'a> {
    policy: &'p Policy<'a>,
    base: &'p BaseDomain,
    open: Vec<LocalName>,
    output: String,
}

impl<'p, 'a> Renderer<'p, 'a> {
    fn new(policy: &'p Policy<'a>, base: &'p BaseDomain) -> Self {
        Renderer {
            policy,
            base,
            open: Vec::new(),
            output: String::new(),
        }
    }

    fn finish(mut self) -> SafeMarkup {
        while let Some(name) = self.open.pop() {
            self.output.push_str("</");
            self.output.push_str(&name);
            self.output.push('>');
        }
        SafeMarkup::new(self.output)
    }

    fn link(&self, element: &str, value: &str) -> Option<ParsedUri> {
        match ParsedUri::parse(value) {
            Ok(uri) if self.policy.is_safe_protocol(uri.scheme.as_deref()) => {
                Some(rewrite_link(uri, self.base))
            }
            Ok(uri) => {
                debug!("dropping {} link with scheme {:?}", element, uri.scheme);
                None
            }
            Err(e) => {
                debug!("dropping {} link: {}", element, e);
                None
            }
        }
    }

    fn open_tag(&mut self, name: LocalName, attrs: &[Attribute]) {
        if &*name == "img" {
            if let Some(src) = attr_value(attrs, "src").filter(|src| !src.is_empty()) {
                self.image(src, attrs);
                return;
            }
        }

        if !self.policy.is_safe_element(&name) {
            debug!("dropping element {}", &*name);
            return;
        }

        self.output.push('<');
        self.output.push_str(&name);
        self.write_attributes(&name, attrs);
        self.output.push('>');

        if !self.policy.is_void_element(&name) {
            self.open.push(name);
        }
    }

    fn image(&mut self, src: &str, attrs: &[Attribute]) {
        let Some(uri) = self.link("img", src) else {
            return;
        };
        let href = escape_attribute_value(&uri.to_string());
        let alt = attr_value(attrs, "alt").filter(|alt| !alt.is_empty());

        if uri.embeddable {
            self.output.push_str(&format!("<img src=\"{}\"", href));
            self.write_attributes("img", attrs);
            self.output.push('>');
        } else if !self.open.iter().any(|open| &**open == "a") {
            let label = escape_content(alt.unwrap_or(src));
            self.output.push_str(&format!("<a href=\"{}\">[{}]</a>", href, label));
        } else if let Some(alt) = alt {
            self.output.push_str(&format!(
                "[Image “{}” at {}]",
                escape_content(alt),
                escape_content(src)
            ));
        } else {
            self.output.push_str(&format!("[Image at {}]", escape_content(src)));
        }
    }

    fn write_attributes(&mut self, element: &str, attrs: &[Attribute]) {
        for attr in attrs {
            let name = &*attr.name.local;
            let value = if self.policy.is_link_attribute(element, name) {
                match self.link(element, &attr.value) {
                    Some(uri) => uri.to_string(),
                    None => continue,
                }
            } else if self.policy.is_safe_attribute(element, name) {
                attr.value.to_string()
            } else {
                if name != "src" {
                    debug!("dropping attribute {} on {}", name, element);
                }
                continue;
            };
            self.output.push(' ');
            self.output.push_str(name);
            self.output.push_str("=\"");
            self.output.push_str(&escape_attribute_value(&value));
            self.output.push('"');
        }
    }

    fn close_tag(&mut self, name: LocalName) {
        if self.open.last() == Some(&name) {
            self.open.pop();
            self.output.push_str("</");
            self.output.push_str(&name);
            self.output.push('>');
        }
    }
}

impl EventHandler for Renderer<'_, '_> {
    fn handle(&mut self, event: Event) {
        match event {
            Event::Open { name, attrs } => self.open_tag(name, &attrs),
            Event::Text(text) => self.output.push_str(&escape_content(&text)),
            Event::Close(name) => self.close_tag(name),
        }
    }
}
