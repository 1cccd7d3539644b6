//! Allowlist sanitizer for rich-text description fields.
//!
//! Descriptions come from the admin rich-text editor and are embedded into
//! public pages as-is, so they are filtered through a fixed allowlist before
//! they are stored. The filter is a single streaming pass over the input:
//!
//! - Allowed tags (`p`, `br`, `b`, `strong`, `i`, `em`, `u`, `ul`, `ol`, `li`,
//!   `blockquote`, `code`, `pre`, `a`) are re-emitted without attributes.
//! - Anchors keep only an `href` whose scheme is `http`, `https` or `mailto`,
//!   and always get `target="_blank"` and `rel="noopener noreferrer nofollow"`.
//!   An anchor without an acceptable href is dropped, its text is kept.
//! - Any other tag is dropped and its content passes through as text, except
//!   `script` and `style` whose content is dropped along with the tag.
//! - Text is escaped; well-formed character references pass through.
//! - An end tag closes the nearest open tag of the same name and everything
//!   opened after it. End tags with no open counterpart are ignored, and
//!   whatever is still open at the end of input is closed in reverse order.
//!
//! The output is always well-formed, and sanitizing it again returns it
//! unchanged.

use std::borrow::Cow;
use url::Url;

const ALLOWED_TAGS: &[&str] = &[
    "p",
    "br",
    "b",
    "strong",
    "i",
    "em",
    "u",
    "ul",
    "ol",
    "li",
    "blockquote",
    "code",
    "pre",
    "a",
];

const VOID_TAGS: &[&str] = &["br"];

/// Tags whose content is never rendered as text.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

const ANCHOR_TARGET: &str = "_blank";
const ANCHOR_REL: &str = "noopener noreferrer nofollow";

/// Longest named reference we accept (`&CounterClockwiseContourIntegral;` is 31).
const MAX_REFERENCE_NAME: usize = 32;

/// Sanitize rich-text HTML against the allowlist. Never fails.
pub fn sanitize_html(input: &str) -> String {
    let mut sanitizer = Sanitizer::with_capacity(input.len());
    for token in Tokenizer::new(input) {
        sanitizer.feed(token);
    }
    sanitizer.finish()
}

/// Escape text for use in HTML content or a quoted attribute value.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Text(&'a str),
    /// A complete character reference including `&` and `;`
    Reference(&'a str),
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
}

struct Sanitizer {
    out: String,
    open: Vec<&'static str>,
}

impl Sanitizer {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
            open: Vec::new(),
        }
    }

    fn feed(&mut self, token: Token<'_>) {
        match token {
            Token::Text(text) => self.out.push_str(&escape_html(text)),
            Token::Reference(reference) => self.out.push_str(reference),
            Token::StartTag { name, attrs, self_closing } => self.start_tag(&name, &attrs, self_closing),
            Token::EndTag { name } => self.end_tag(&name),
        }
    }

    fn start_tag(&mut self, name: &str, attrs: &[(String, String)], self_closing: bool) {
        let Some(tag) = allowed_tag(name) else {
            return;
        };

        if tag == "a" {
            let Some(href) = safe_href(attrs) else {
                return;
            };
            self.out.push_str("<a href=\"");
            self.out.push_str(&escape_html(&href));
            self.out.push_str("\" target=\"");
            self.out.push_str(ANCHOR_TARGET);
            self.out.push_str("\" rel=\"");
            self.out.push_str(ANCHOR_REL);
            self.out.push_str("\">");
        } else {
            self.out.push('<');
            self.out.push_str(tag);
            self.out.push('>');
        }

        if VOID_TAGS.contains(&tag) {
            return;
        }

        self.open.push(tag);
        if self_closing {
            self.end_tag(tag);
        }
    }

    fn end_tag(&mut self, name: &str) {
        let Some(index) = self.open.iter().rposition(|open| *open == name) else {
            return;
        };
        while self.open.len() > index {
            if let Some(tag) = self.open.pop() {
                self.close(tag);
            }
        }
    }

    fn close(&mut self, tag: &str) {
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    fn finish(mut self) -> String {
        while let Some(tag) = self.open.pop() {
            self.close(tag);
        }
        self.out
    }
}

fn allowed_tag(name: &str) -> Option<&'static str> {
    ALLOWED_TAGS.iter().copied().find(|tag| *tag == name)
}

/// The anchor's href, if present and using an allowed scheme.
fn safe_href(attrs: &[(String, String)]) -> Option<String> {
    let (_, raw) = attrs.iter().find(|(name, _)| name == "href")?;
    // Encoded whitespace is trimmed too
    let decoded = decode_references(raw);
    let href = decoded.trim();
    if href.is_empty() {
        return None;
    }

    let url = Url::parse(href).ok()?;
    ALLOWED_SCHEMES.contains(&url.scheme()).then(|| href.to_string())
}

/// Decode the character references that commonly appear in attribute values.
///
/// Unknown named references are left as they are.
fn decode_references(value: &str) -> Cow<'_, str> {
    if !value.contains('&') {
        return Cow::Borrowed(value);
    }

    let mut decoded = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(amp) = rest.find('&') {
        decoded.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let Some(len) = reference_len(rest) else {
            decoded.push('&');
            rest = &rest[1..];
            continue;
        };

        match decode_reference(&rest[1..len - 1]) {
            Some(c) => decoded.push(c),
            None => decoded.push_str(&rest[..len]),
        }
        rest = &rest[len..];
    }
    decoded.push_str(rest);
    Cow::Owned(decoded)
}

/// Decode the body of a reference (without `&` and `;`).
fn decode_reference(body: &str) -> Option<char> {
    if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse().ok()?,
        };
        return char::from_u32(code);
    }

    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

/// Length of the well-formed character reference at the start of `input`.
///
/// Accepts `&name;`, `&#123;` and `&#x7b;`. The terminating `;` is required.
fn reference_len(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    if bytes.first() != Some(&b'&') {
        return None;
    }

    let (start, max_digits, is_valid): (usize, usize, fn(&u8) -> bool) = match *bytes.get(1)? {
        b'#' => match *bytes.get(2)? {
            b'x' | b'X' => (3, 6, u8::is_ascii_hexdigit),
            _ => (2, 7, u8::is_ascii_digit),
        },
        c if c.is_ascii_alphabetic() => (1, MAX_REFERENCE_NAME, u8::is_ascii_alphanumeric),
        _ => return None,
    };

    let body = bytes[start..].iter().take_while(|b| is_valid(b)).count();
    if body == 0 || body > max_digits {
        return None;
    }

    let end = start + body;
    (bytes.get(end) == Some(&b';')).then_some(end + 1)
}

/// Splits HTML into tokens. Comments, declarations and raw-text elements are
/// consumed without producing tokens; a `<` that does not open well-formed
/// markup is text.
struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Parse markup at the start of `rest` (which begins with `<`).
    ///
    /// Returns the token (if the markup produces one) and the number of bytes
    /// consumed, or `None` if the `<` is literal text.
    fn markup(rest: &str) -> Option<(Option<Token<'_>>, usize)> {
        let bytes = rest.as_bytes();

        if rest.starts_with("<!--") {
            let consumed = rest[4..].find("-->").map_or(rest.len(), |end| 4 + end + 3);
            return Some((None, consumed));
        }

        match *bytes.get(1)? {
            b'!' | b'?' => {
                let end = rest.find('>')?;
                Some((None, end + 1))
            }
            b'/' => {
                if !bytes.get(2)?.is_ascii_alphabetic() {
                    return None;
                }
                let name_len = tag_name_len(&bytes[2..]);
                let name = rest[2..2 + name_len].to_ascii_lowercase();
                let end = rest[2 + name_len..].find('>')?;
                Some((Some(Token::EndTag { name }), 2 + name_len + end + 1))
            }
            c if c.is_ascii_alphabetic() => {
                let name_len = tag_name_len(&bytes[1..]);
                let name = rest[1..1 + name_len].to_ascii_lowercase();
                let (attrs, self_closing, tag_end) = parse_attributes(rest, 1 + name_len)?;

                if RAW_TEXT_TAGS.contains(&name.as_str()) && !self_closing {
                    return Some((None, tag_end + raw_text_len(&rest[tag_end..], &name)));
                }

                Some((
                    Some(Token::StartTag {
                        name,
                        attrs,
                        self_closing,
                    }),
                    tag_end,
                ))
            }
            _ => None,
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let input = self.input;
        loop {
            let rest = &input[self.pos..];
            let first = *rest.as_bytes().first()?;

            match first {
                b'<' => match Self::markup(rest) {
                    Some((Some(token), consumed)) => {
                        self.pos += consumed;
                        return Some(token);
                    }
                    Some((None, consumed)) => {
                        self.pos += consumed;
                    }
                    None => {
                        self.pos += 1;
                        return Some(Token::Text(&rest[..1]));
                    }
                },
                b'&' => {
                    let len = reference_len(rest);
                    self.pos += len.unwrap_or(1);
                    return Some(match len {
                        Some(len) => Token::Reference(&rest[..len]),
                        None => Token::Text(&rest[..1]),
                    });
                }
                _ => {
                    let end = rest.find(['<', '&']).unwrap_or(rest.len());
                    self.pos += end;
                    return Some(Token::Text(&rest[..end]));
                }
            }
        }
    }
}

fn tag_name_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .take_while(|&&b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b':'))
        .count()
}

/// Parse attributes of a start tag from byte offset `pos` up to and including
/// the closing `>`.
///
/// Returns the attributes (names lowercased, values raw), whether the tag was
/// self-closing and the offset just past `>`, or `None` if the tag is not
/// terminated.
fn parse_attributes(tag: &str, mut pos: usize) -> Option<(Vec<(String, String)>, bool, usize)> {
    let bytes = tag.as_bytes();
    let mut attrs = Vec::new();

    loop {
        pos += bytes[pos..].iter().take_while(|b| b.is_ascii_whitespace()).count();

        match *bytes.get(pos)? {
            b'>' => return Some((attrs, false, pos + 1)),
            b'/' => {
                if bytes.get(pos + 1) == Some(&b'>') {
                    return Some((attrs, true, pos + 2));
                }
                pos += 1;
                continue;
            }
            b'=' => {
                pos += 1;
                continue;
            }
            _ => {}
        }

        let name_len = bytes[pos..]
            .iter()
            .take_while(|&&b| !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/'))
            .count();
        let name = tag[pos..pos + name_len].to_ascii_lowercase();
        pos += name_len;

        pos += bytes[pos..].iter().take_while(|b| b.is_ascii_whitespace()).count();
        if bytes.get(pos) != Some(&b'=') {
            attrs.push((name, String::new()));
            continue;
        }

        pos += 1;
        pos += bytes[pos..].iter().take_while(|b| b.is_ascii_whitespace()).count();

        let value = match *bytes.get(pos)? {
            quote @ (b'"' | b'\'') => {
                let close = bytes[pos + 1..].iter().position(|b| *b == quote)?;
                let value = &tag[pos + 1..pos + 1 + close];
                pos += close + 2;
                value
            }
            _ => {
                let len = bytes[pos..]
                    .iter()
                    .take_while(|b| !b.is_ascii_whitespace() && **b != b'>')
                    .count();
                let value = &tag[pos..pos + len];
                pos += len;
                value
            }
        };
        attrs.push((name, value.to_string()));
    }
}

/// Bytes up to and including the end tag closing a raw-text element, or the
/// whole remainder if it is never closed.
fn raw_text_len(rest: &str, name: &str) -> usize {
    let closing = format!("</{name}");
    let Some(start) = rest
        .as_bytes()
        .windows(closing.len())
        .position(|window| window.eq_ignore_ascii_case(closing.as_bytes()))
    else {
        return rest.len();
    };

    let after = start + closing.len();
    rest[after..].find('>').map_or(rest.len(), |end| after + end + 1)
}
