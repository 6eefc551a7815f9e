/// Escape text for use as element content.
///
/// Only `&` and `<` can change the meaning of text between tags, so nothing
/// else is touched: `"a > b"` stays readable in the output.
pub fn escape_content(src: &str) -> String {
    let mut ret_val = String::with_capacity(src.len());
    for c in src.chars() {
        match c {
            '&' => ret_val.push_str("&amp;"),
            '<' => ret_val.push_str("&lt;"),
            _ => ret_val.push(c),
        }
    }
    ret_val
}

/// Escape text for use inside a double-quoted attribute value.
pub fn escape_attribute_value(src: &str) -> String {
    let mut ret_val = String::with_capacity(src.len());
    for c in src.chars() {
        match c {
            '&' => ret_val.push_str("&amp;"),
            '"' => ret_val.push_str("&quot;"),
            _ => ret_val.push(c),
        }
    }
    ret_val
}
