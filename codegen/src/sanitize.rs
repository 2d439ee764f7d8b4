use inflector::Inflector;
use proc_macro2::Ident;
use quote::format_ident;

const KEYWORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub",
    "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "union", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Maps an XML name onto an exported type identifier.
///
/// Keywords gain a `Value` suffix, then everything that is not a letter or digit is removed
/// (so `My_Type` and `MyType` collide) and the first letter is upper-cased.
pub fn sanitize(name: &str) -> String {
    let alphanumeric: String = name.chars().filter(|c| c.is_alphanumeric()).collect();

    let name = if is_keyword(&alphanumeric) {
        format!("{}Value", name)
    } else {
        name.to_owned()
    };

    let mut chars = name
        .chars()
        .filter(|c| *c != '_')
        .filter(|c| c.is_alphanumeric());

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn strip_namespace(name: &str) -> &str {
    match name.rsplit_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

/// `unbounded` or an integer above one.
pub fn is_array(max_occurs: Option<&str>) -> bool {
    match max_occurs {
        Some("unbounded") => true,
        Some(value) => value.trim().parse::<u64>().map_or(false, |max| max > 1),
        None => false,
    }
}

fn snake(name: &str) -> String {
    let snake: String = name
        .to_snake_case()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();

    if !snake.chars().any(char::is_alphanumeric) {
        return String::new();
    }

    let snake = if snake.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", snake)
    } else {
        snake
    };

    if is_keyword(&snake) {
        format!("{}_", snake)
    } else {
        snake
    }
}

pub fn field_name(name: &str) -> String {
    match snake(name) {
        name if name.is_empty() => "value".into(),
        name => name,
    }
}

pub fn module_name(package: &str) -> String {
    match snake(package) {
        name if name.is_empty() => "schema".into(),
        name => name,
    }
}

pub fn constant_name(name: &str) -> String {
    name.to_screaming_snake_case()
}

/// Identifier tokens for an already sanitized type name.
pub fn type_ident(name: &str) -> Ident {
    if name.is_empty() {
        format_ident!("Value")
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format_ident!("_{}", name)
    } else {
        format_ident!("{}", name)
    }
}
