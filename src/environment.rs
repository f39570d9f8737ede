use std::collections::HashMap;

/// Layered key-value property lookup with placeholder resolution.
///
/// This module is the stand-in for a host framework's environment
/// abstraction: an ordered list of named property sources where earlier
/// sources shadow later ones, plus `${key}` placeholder substitution.
///
/// The bootstrap publishes derived values (application name, encoder
/// patterns, default root level) into a dedicated lowest-priority source
/// named [`DEFAULT_PROPERTIES`], so any value the host or user supplies
/// in a regular source always wins.

/// Name of the lowest-priority source that receives published defaults.
pub const DEFAULT_PROPERTIES: &str = "defaultProperties";

/// Guard against self-referential placeholder chains.
const MAX_PLACEHOLDER_DEPTH: usize = 8;

/// A single named bag of properties.
#[derive(Debug, Clone, Default)]
pub struct PropertySource {
    name: String,
    values: HashMap<String, String>,
}

impl PropertySource {
    pub fn new(name: &str) -> Self {
        PropertySource {
            name: name.to_string(),
            values: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn put(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

/// An ordered stack of [`PropertySource`]s.
///
/// Lookup walks the sources front to back and returns the first hit, so
/// a source added with [`Environment::add_first`] shadows everything
/// added after it.
///
/// # Examples
///
/// ```
/// use logspace::{Environment, PropertySource};
///
/// let mut overrides = PropertySource::new("overrides");
/// overrides.put("application.name", "orders");
///
/// let mut env = Environment::new();
/// env.add_first(overrides);
///
/// assert_eq!(env.property("application.name"), Some("orders"));
/// assert_eq!(env.resolve_placeholders("${application.name}.log"), "orders.log");
/// ```
#[derive(Debug, Default)]
pub struct Environment {
    sources: Vec<PropertySource>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    /// Adds a source with the highest priority.
    pub fn add_first(&mut self, source: PropertySource) {
        self.sources.insert(0, source);
    }

    /// Adds a source with the lowest priority.
    pub fn add_last(&mut self, source: PropertySource) {
        self.sources.push(source);
    }

    pub fn contains_source(&self, name: &str) -> bool {
        self.sources.iter().any(|s| s.name == name)
    }

    /// Looks a key up across all sources, first source wins.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.sources.iter().find_map(|s| s.get(key))
    }

    /// Ambient flag semantics: the key is present and its value is not
    /// literally the string `"false"`.
    pub fn is_flag_set(&self, key: &str) -> bool {
        match self.property(key) {
            Some(value) => value != "false",
            None => false,
        }
    }

    /// Returns the `defaultProperties` source, creating it at the lowest
    /// priority if it does not exist yet.
    pub fn default_properties(&mut self) -> &mut PropertySource {
        let position = match self.sources.iter().position(|s| s.name == DEFAULT_PROPERTIES) {
            Some(position) => position,
            None => {
                self.sources.push(PropertySource::new(DEFAULT_PROPERTIES));
                self.sources.len() - 1
            }
        };
        &mut self.sources[position]
    }

    /// Substitutes `${key}` and `${key:default}` tokens in `input`.
    ///
    /// Resolution is recursive: resolved values and default text may
    /// themselves contain placeholders. A token whose key is unknown and
    /// which carries no default is left verbatim in the output, it is
    /// never an error.
    pub fn resolve_placeholders(&self, input: &str) -> String {
        self.resolve_recursive(input, 0)
    }

    fn resolve_recursive(&self, input: &str, depth: usize) -> String {
        if depth > MAX_PLACEHOLDER_DEPTH {
            return input.to_string();
        }

        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let body = &rest[start + 2..];

            match find_closing_brace(body) {
                Some(end) => {
                    let token = &body[..end];
                    let (key, default) = split_key_default(token);
                    match self.property(key) {
                        Some(value) => {
                            out.push_str(&self.resolve_recursive(value, depth + 1));
                        }
                        None => match default {
                            Some(default) => {
                                out.push_str(&self.resolve_recursive(default, depth + 1));
                            }
                            None => {
                                // Unresolvable and no default: keep the token verbatim.
                                out.push_str("${");
                                out.push_str(token);
                                out.push('}');
                            }
                        },
                    }
                    rest = &body[end + 1..];
                }
                None => {
                    // Unterminated token, emit as-is.
                    out.push_str("${");
                    rest = body;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// Finds the `}` closing the placeholder that starts right at the
/// beginning of `body`, skipping over nested `${...}` tokens.
fn find_closing_brace(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            depth += 1;
            i += 2;
            continue;
        }
        if bytes[i] == b'}' {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
        i += 1;
    }

    None
}

/// Splits a placeholder body into key and optional default at the first
/// `:` that is not inside a nested placeholder.
fn split_key_default(token: &str) -> (&str, Option<&str>) {
    let bytes = token.as_bytes();
    let mut depth = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            depth += 1;
            i += 2;
            continue;
        }
        if bytes[i] == b'}' && depth > 0 {
            depth -= 1;
        } else if bytes[i] == b':' && depth == 0 {
            return (&token[..i], Some(&token[i + 1..]));
        }
        i += 1;
    }

    (token, None)
}
