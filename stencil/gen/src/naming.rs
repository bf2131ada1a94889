//! Identifier conversion for generated Rust code.
//!
//! Model names arrive in whatever case the model author used (`cityId`,
//! `CityID`, `max-items`). Generated code needs snake_case fields and
//! locals, PascalCase types and variants, and must never collide with a
//! Rust keyword.
//!
//! ## Examples
//!
//! ```
//! use stencil_gen::naming::{field_name, to_pascal_case, to_snake_case};
//!
//! assert_eq!(to_snake_case("HTTPStatusCode"), "http_status_code");
//! assert_eq!(to_pascal_case("max-items"), "MaxItems");
//! assert_eq!(field_name("type"), "r#type");
//! ```

/// Rust keywords that cannot be used as bare identifiers.
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait",
    "true", "try", "type", "unsafe", "use", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers either.
const NON_RAW_KEYWORDS: &[&str] = &["crate", "self", "Self", "super"];

/// Splits an identifier into words.
///
/// Handles CamelCase, acronyms, digits, and `_`/`-`/space separators:
/// - "cityId" -> ["city", "Id"]
/// - "HTTPClient" -> ["HTTP", "Client"]
/// - "max-items" -> ["max", "items"]
pub fn split_words(s: &str) -> Vec<&str> {
    let mut words = Vec::new();

    for part in s.split(|c: char| c == '_' || c == '-' || c == ' ' || c == '.') {
        if part.is_empty() {
            continue;
        }

        let chars: Vec<(usize, char)> = part.char_indices().collect();
        let mut word_start = 0;

        for i in 1..chars.len() {
            let (idx, current) = chars[i];
            let prev = chars[i - 1].1;

            // "cityId" -> "city", "Id"; "HTTPClient" -> "HTTP", "Client"
            let is_new_word = current.is_uppercase()
                && (prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase()
                        && i + 1 < chars.len()
                        && chars[i + 1].1.is_lowercase()));

            if is_new_word {
                words.push(&part[word_start..idx]);
                word_start = idx;
            }
        }

        words.push(&part[word_start..]);
    }

    words
}

/// Converts an identifier to snake_case.
pub fn to_snake_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Converts an identifier to PascalCase.
pub fn to_pascal_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect()
}

pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

/// Field or method name for a model member: snake_case, raw if a keyword.
pub fn field_name(member: &str) -> String {
    let snake = to_snake_case(member);
    escape_keyword(snake)
}

/// Type or variant name for a model name: PascalCase, suffixed if a keyword.
pub fn type_name(name: &str) -> String {
    let pascal = to_pascal_case(name);
    if is_keyword(&pascal) {
        format!("{}Value", pascal)
    } else {
        pascal
    }
}

/// Base for generated temporaries.
///
/// Temporaries always get a role and depth suffix appended
/// (`type` -> `type_buffer0`), so keywords need no escaping here.
pub fn temp_base(member: &str) -> String {
    let snake = to_snake_case(member);
    if snake.is_empty() {
        "value".to_string()
    } else if snake.starts_with(|c: char| c.is_ascii_digit()) {
        format!("m{}", snake)
    } else {
        snake
    }
}

fn escape_keyword(ident: String) -> String {
    if NON_RAW_KEYWORDS.contains(&ident.as_str()) {
        format!("{}_", ident)
    } else if is_keyword(&ident) {
        format!("r#{}", ident)
    } else if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", ident)
    } else {
        ident
    }
}
