//! Shared PDF object helpers used across multiple modules.

use lopdf::{Dictionary, Object, ObjectId, StringFormat};
use std::fmt::Write;

/// Extract a text string from a PDF dictionary for a given key.
///
/// Returns `Some(String)` if the key exists and contains a non-empty string,
/// `None` otherwise. See [`decode_text_string`] for the decoding rules.
pub fn text_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key)
        .ok()
        .and_then(|v| v.as_str().ok())
        .map(decode_text_string)
        .filter(|s| !s.is_empty())
}

/// Decode a PDF text string.
///
/// UTF-16BE and UTF-8 strings are recognised by their byte-order mark.
/// Anything else is read as PDFDocEncoding, which agrees with Latin-1 for
/// every printable character.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(utf8).into_owned()
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Resolve the catalog's object id through the trailer's `/Root` entry.
pub fn catalog_id(document: &lopdf::Document) -> Option<ObjectId> {
    document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .ok()
}

/// Render an object in PDF syntax for audit output.
///
/// Indirect references are printed as `N G R` and never followed, so the
/// output stays bounded on cyclic graphs. Streams are shown by their
/// dictionary only. Text strings are escaped like PDF literal strings;
/// hexadecimal and binary strings are printed as `<hex>`.
///
/// ```
/// use lopdf::{dictionary, Object};
/// use pdfscrub::pdf_utils::describe;
///
/// let action = Object::Dictionary(dictionary! {
///     "S" => "JavaScript",
///     "JS" => Object::string_literal("app.alert(1)"),
///     "Next" => Object::Reference((7, 0)),
/// });
/// assert_eq!(describe(&action), r"<</S /JavaScript /JS (app.alert\(1\)) /Next 7 0 R>>");
/// assert_eq!(describe(&Object::Null), "null");
/// ```
pub fn describe(object: &Object) -> String {
    let mut out = String::new();
    write_object(&mut out, object);
    out
}

fn write_object(out: &mut String, object: &Object) {
    match object {
        Object::Null => out.push_str("null"),
        Object::Boolean(value) => out.push_str(if *value { "true" } else { "false" }),
        Object::Integer(value) => {
            let _ = write!(out, "{value}");
        }
        Object::Real(value) => {
            let _ = write!(out, "{value}");
        }
        Object::Name(name) => {
            out.push('/');
            out.push_str(&String::from_utf8_lossy(name));
        }
        Object::String(bytes, format) => write_string(out, bytes, format),
        Object::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_object(out, item);
            }
            out.push(']');
        }
        Object::Dictionary(dict) => write_dictionary(out, dict),
        Object::Stream(stream) => write_dictionary(out, &stream.dict),
        Object::Reference((number, generation)) => {
            let _ = write!(out, "{number} {generation} R");
        }
    }
}

fn write_string(out: &mut String, bytes: &[u8], format: &StringFormat) {
    let text = decode_text_string(bytes);
    let is_text = !text
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'));

    if matches!(format, StringFormat::Hexadecimal) || !is_text {
        out.push('<');
        for byte in bytes {
            let _ = write!(out, "{byte:02X}");
        }
        out.push('>');
        return;
    }

    out.push('(');
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push(')');
}

fn write_dictionary(out: &mut String, dict: &Dictionary) {
    out.push_str("<<");
    for (i, (key, value)) in dict.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push('/');
        out.push_str(&String::from_utf8_lossy(key));
        out.push(' ');
        write_object(out, value);
    }
    out.push_str(">>");
}
