//! String transformation utilities for code generation

/// Rust keywords (strict and reserved) that cannot be used as bare identifiers.
const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be written as raw identifiers either.
const NON_RAW_KEYWORDS: &[&str] = &["self", "Self", "super", "crate"];

/// Convert a string to snake_case
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let mut prev_is_lowercase = false;

    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            // Add underscore before uppercase letter if:
            // - Not at the start
            // - Previous character was lowercase
            if i > 0 && prev_is_lowercase {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
            prev_is_lowercase = false;
        } else if ch.is_alphanumeric() {
            result.push(ch);
            prev_is_lowercase = ch.is_lowercase() || ch.is_ascii_digit();
        } else if !result.is_empty() && !result.ends_with('_') {
            // Any separator (`-`, ` `, `/`, `.`, `{`, ...) becomes a single underscore
            result.push('_');
            prev_is_lowercase = false;
        } else {
            prev_is_lowercase = false;
        }
    }

    // Remove duplicate underscores and trim
    let mut final_result = String::new();
    let mut prev_underscore = false;
    for ch in result.chars() {
        if ch == '_' {
            if !prev_underscore && !final_result.is_empty() {
                final_result.push(ch);
            }
            prev_underscore = true;
        } else {
            final_result.push(ch);
            prev_underscore = false;
        }
    }

    final_result.trim_matches('_').to_string()
}

/// Convert a string to UpperCamelCase (PascalCase)
pub fn to_upper_camel_case(s: &str) -> String {
    // First convert to snake_case to normalize the input
    let snake = to_snake_case(s);

    // Then split on underscores and capitalize each word
    snake
        .split('_')
        .filter(|s| !s.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect()
}

/// Whether `s` is a Rust keyword.
pub fn is_rust_keyword(s: &str) -> bool {
    RUST_KEYWORDS.contains(&s)
}

/// Turn an arbitrary wire name into a valid snake_case Rust identifier.
///
/// Keywords become raw identifiers (`type` -> `r#type`), except those that
/// cannot be raw, which get a trailing underscore (`self` -> `self_`).
/// Names starting with a digit are prefixed with `_`.
pub fn to_rust_ident(s: &str) -> String {
    let mut ident = to_snake_case(s);
    if ident.is_empty() {
        ident.push_str("value");
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    escape_keyword(ident)
}

/// Turn an arbitrary name into a valid UpperCamelCase Rust type name.
pub fn to_rust_type_name(s: &str) -> String {
    let mut name = to_upper_camel_case(s);
    if name.is_empty() {
        name.push_str("Value");
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, 'T');
    }
    if name == "Self" {
        name.push('_');
    }
    name
}

/// Turn an arbitrary name into a module name usable in `mod` and `use` paths.
pub fn to_module_name(s: &str) -> String {
    let mut name = to_snake_case(s);
    if name.is_empty() {
        name.push_str("root");
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, 'm');
        name.insert(1, '_');
    }
    escape_keyword(name)
}

fn escape_keyword(ident: String) -> String {
    if NON_RAW_KEYWORDS.contains(&ident.as_str()) {
        format!("{ident}_")
    } else if is_rust_keyword(&ident) {
        format!("r#{ident}")
    } else {
        ident
    }
}

/// Collapse a free-text description into lines safe for `///` doc comments.
pub fn doc_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim_end().replace("*/", "* /"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .lines()
        .map(String::from)
        .collect()
}
