//! Target name normalization
//!
//! Users address namespaced targets as `namespace:Method`; mage itself expects
//! the flattened camel-case form (`namespaceMethod`).

/// Separator between a namespace and its method
pub const NAMESPACE_SEPARATOR: char = ':';

/// Convert `namespace:Method` to the runner's flattened form
///
/// The namespace is lower-cased entirely; only the first character of the
/// method is lower-cased. Input without a separator is returned unchanged.
///
/// ```
/// use magefilehub::runner::normalize;
///
/// assert_eq!(normalize("Build:Linux"), "buildlinux");
/// assert_eq!(normalize("test:RunAll"), "testrunAll");
/// assert_eq!(normalize("deploy"), "deploy");
/// ```
pub fn normalize(command: &str) -> String {
    let Some((namespace, method)) = command.split_once(NAMESPACE_SEPARATOR) else {
        return command.to_string();
    };

    let mut flattened = namespace.to_lowercase();
    let mut chars = method.chars();
    if let Some(first) = chars.next() {
        flattened.extend(first.to_lowercase());
        flattened.push_str(chars.as_str());
    }
    flattened
}

/// Case-folded key used for every catalog lookup
pub fn lookup_key(query: &str) -> String {
    normalize(query).to_lowercase()
}
