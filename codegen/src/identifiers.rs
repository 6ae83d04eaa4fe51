use std::collections::HashMap;

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "try", "type", "unsafe", "use", "where", "while", "yield", "abstract", "become", "do",
    "final", "macro", "override", "priv", "typeof", "unsized", "virtual",
];

/// One naming scope.
///
/// Every name handed out by [`Identifiers::add_unique`] is distinct from
/// every other name registered in the same scope. Allocation only depends
/// on the sequence of calls, so replaying a run yields the same names.
#[derive(Debug, Clone)]
pub struct Identifiers<T = ()> {
    names: HashMap<String, Option<T>>,
    order: Vec<String>,
}

impl<T> Default for Identifiers<T> {
    fn default() -> Self {
        Self {
            names: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T> Identifiers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `candidate`, appending `1`, `2`, ... until it is unused.
    pub fn add_unique(&mut self, candidate: &str, owner: T) -> String {
        let name = self.make_unique(candidate);
        self.names.insert(name.clone(), Some(owner));
        self.order.push(name.clone());
        name
    }

    /// Occupies `name` without an owner.
    pub fn add_reserved(&mut self, name: &str) {
        if !self.names.contains_key(name) {
            self.names.insert(name.to_owned(), None);
            self.order.push(name.to_owned());
        }
    }

    pub fn make_unique(&self, candidate: &str) -> String {
        if !self.is_in_use(candidate) {
            return candidate.to_owned();
        }

        let mut suffix = 1;
        loop {
            let name = format!("{}{}", candidate, suffix);
            if !self.is_in_use(&name) {
                return name;
            }
            suffix += 1;
        }
    }

    pub fn is_in_use(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn owner(&self, name: &str) -> Option<&T> {
        self.names.get(name).and_then(Option::as_ref)
    }

    /// Names in registration order, reserved ones included.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
        self.order.clear();
    }
}

fn words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let chars = name.chars().collect::<Vec<_>>();

    for (index, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        let boundary = c.is_uppercase()
            && !current.is_empty()
            && (chars[index - 1].is_lowercase()
                || chars[index - 1].is_numeric()
                || chars.get(index + 1).map_or(false, |next| next.is_lowercase()));

        if boundary {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}

/// `GetQuoteResult` -> `get_quote_result`.
pub fn to_snake_case(name: &str) -> String {
    make_valid(
        &words(name)
            .iter()
            .map(|word| word.to_lowercase())
            .collect::<Vec<_>>()
            .join("_"),
    )
}

/// `get_quote-result` -> `GetQuoteResult`.
pub fn to_pascal_case(name: &str) -> String {
    make_valid(
        &words(name)
            .iter()
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<String>(),
    )
}

/// Turns arbitrary text into a usable Rust identifier.
pub fn make_valid(name: &str) -> String {
    let mut result = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect::<String>();

    if result.is_empty() {
        result.push('_');
    }

    if result.starts_with(|c: char| c.is_numeric()) {
        result.insert(0, '_');
    }

    if KEYWORDS.contains(&result.as_str()) {
        result.push('_');
    }

    result
}
