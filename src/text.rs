//! Plain-text projection of block markup and line wrapping

use quick_xml::Reader;
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use quick_xml::events::Event;
use std::borrow::Cow;
use tracing::trace;

/// Tags that end a line of text when they close
const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "li",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "pre",
];

enum Token<'a> {
    Text(&'a str),
    Tag { name: String, closing: bool },
}

/// Walk markup, reporting text runs with entities resolved and tags
///
/// Editor markup is HTML rather than XML: void tags such as `<br>` stay
/// unclosed and text may hold a bare `<` or `&`. Unparseable trailing markup
/// is reported as text, except an unterminated comment.
fn scan(markup: &str, mut emit: impl FnMut(Token<'_>)) {
    let source = escape_stray_markup(markup);
    let mut reader = Reader::from_str(&source);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    loop {
        let offset = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(e)) => emit(Token::Tag {
                name: tag_name(e.name().as_ref()),
                closing: false,
            }),
            Ok(Event::Empty(e)) => {
                let name = tag_name(e.name().as_ref());
                emit(Token::Tag {
                    name: name.clone(),
                    closing: false,
                });
                emit(Token::Tag {
                    name,
                    closing: true,
                });
            }
            Ok(Event::End(e)) => emit(Token::Tag {
                name: tag_name(e.name().as_ref()),
                closing: true,
            }),
            Ok(Event::Text(e)) => {
                let text = e.decode().unwrap_or_else(|_| String::from_utf8_lossy(&e));
                emit(Token::Text(&text));
            }
            Ok(Event::CData(e)) => emit(Token::Text(&String::from_utf8_lossy(&e))),
            Ok(Event::GeneralRef(e)) => {
                let Ok(name) = e.decode() else {
                    continue;
                };
                let entity = format!("&{name};");
                match unescape_with(&entity, resolve_html5_entity) {
                    Ok(resolved) => emit(Token::Text(&resolved)),
                    Err(_) => emit(Token::Text(&entity)),
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                let rest = source.get(offset..).unwrap_or_default();
                trace!(offset, "Unparsed markup kept as text: {err}");
                if !rest.starts_with("<!--") {
                    match unescape_with(rest, resolve_html5_entity) {
                        Ok(resolved) => emit(Token::Text(&resolved)),
                        Err(_) => emit(Token::Text(rest)),
                    }
                }
                break;
            }
        }
    }
}

/// Escape every `<` that cannot open a tag and every `&` that cannot start a reference
fn escape_stray_markup(markup: &str) -> Cow<'_, str> {
    if !markup.contains(['<', '&']) {
        return Cow::Borrowed(markup);
    }

    let mut out = String::with_capacity(markup.len() + 8);
    for (idx, ch) in markup.char_indices() {
        let rest = &markup[idx + ch.len_utf8()..];
        match ch {
            '<' if !opens_tag(rest) => out.push_str("&lt;"),
            '&' if !opens_reference(rest) => out.push_str("&amp;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

fn opens_tag(rest: &str) -> bool {
    rest.starts_with(|c: char| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
}

fn opens_reference(rest: &str) -> bool {
    let body = rest.strip_prefix('#').unwrap_or(rest);
    let len = body.bytes().take_while(u8::is_ascii_alphanumeric).count();
    len > 0 && body[len..].starts_with(';')
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

/// Text content of a markup string with every tag removed and entities decoded
pub fn plain_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    scan(markup, |token| {
        if let Token::Text(text) = token {
            out.push_str(text);
        }
    });
    out
}

/// Length of the plain-text projection, counted in UTF-16 code units like a browser string
pub fn plain_len(markup: &str) -> usize {
    plain_text(markup).encode_utf16().count()
}

/// Split markup into the lines its block elements and line breaks produce
pub fn paragraphs(markup: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut after_break = false;

    scan(markup, |token| match token {
        Token::Text(text) => {
            current.push_str(text);
            after_break = false;
        }
        Token::Tag { name, closing } => {
            if name == "br" {
                if !closing {
                    lines.push(std::mem::take(&mut current));
                    after_break = true;
                }
            } else if BLOCK_TAGS.contains(&name.as_str()) {
                if closing {
                    if !(after_break && current.is_empty()) {
                        lines.push(std::mem::take(&mut current));
                    }
                    after_break = false;
                } else if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            }
        }
    });

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Break text into lines of at most `max_chars_per_line` characters
pub fn wrap_text(text: &str, max_chars_per_line: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    if max_chars_per_line == 0 {
        return vec![text.to_string()];
    }

    let mut all_lines = Vec::new();

    // Explicit newlines always break
    for segment in text.split('\n') {
        let words: Vec<&str> = segment.split_whitespace().collect();

        if words.is_empty() {
            all_lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        let mut current_length = 0;

        for word in words {
            let word_length = word.chars().count();

            if current_length > 0 && current_length + 1 + word_length > max_chars_per_line {
                all_lines.push(std::mem::take(&mut current_line));
                current_length = 0;
            }

            if word_length > max_chars_per_line {
                // Hard-break words longer than a line on char boundaries
                let mut remaining = word;
                while remaining.chars().count() > max_chars_per_line {
                    let split_byte = remaining
                        .char_indices()
                        .nth(max_chars_per_line)
                        .map(|(idx, _)| idx)
                        .unwrap_or(remaining.len());
                    let (chunk, rest) = remaining.split_at(split_byte);
                    if !current_line.is_empty() {
                        all_lines.push(std::mem::take(&mut current_line));
                    }
                    all_lines.push(chunk.to_string());
                    remaining = rest;
                }
                current_line = remaining.to_string();
                current_length = remaining.chars().count();
                continue;
            }

            if !current_line.is_empty() {
                current_line.push(' ');
                current_length += 1;
            }
            current_line.push_str(word);
            current_length += word_length;
        }

        if !current_line.is_empty() {
            all_lines.push(current_line);
        }
    }

    trace!("Wrapped text into {} lines", all_lines.len());
    all_lines
}
