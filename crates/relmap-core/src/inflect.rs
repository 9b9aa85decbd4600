//! English noun inflection for accessor naming.
//!
//! Only the last `_`-separated segment of a word is inflected, so
//! `employee_dept_id` pluralizes to `employee_dept_ids`. Callers can override
//! individual words with a map or a function; an override that yields nothing
//! falls through to the built-in rules.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Custom inflection callback. Returning `None` or an empty string defers to
/// the default rules.
pub type InflectFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// A per-direction inflection override.
#[derive(Clone, Default)]
pub enum Inflection {
    /// Built-in English rules only.
    #[default]
    Default,
    /// Explicit word table, consulted before the rules.
    Map(HashMap<String, String>),
    /// Custom function, consulted before the rules.
    Function(InflectFn),
}

impl fmt::Debug for Inflection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inflection::Default => write!(f, "Default"),
            Inflection::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Inflection::Function(_) => write!(f, "Function(..)"),
        }
    }
}

impl Inflection {
    /// Build a map override from word pairs.
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Inflection::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a function override.
    pub fn function(f: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Inflection::Function(Arc::new(f))
    }

    fn resolve(&self, word: &str) -> Option<String> {
        let resolved = match self {
            Inflection::Default => None,
            Inflection::Map(map) => map.get(word).cloned(),
            Inflection::Function(f) => f(word),
        };
        resolved.filter(|w| !w.is_empty())
    }
}

/// Pluralizer/singularizer with optional overrides.
#[derive(Debug, Clone, Default)]
pub struct Inflector {
    plural: Inflection,
    singular: Inflection,
}

impl Inflector {
    /// Create an inflector using only the built-in rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the plural override.
    pub fn with_plural(mut self, plural: Inflection) -> Self {
        self.plural = plural;
        self
    }

    /// Set the singular override.
    pub fn with_singular(mut self, singular: Inflection) -> Self {
        self.singular = singular;
        self
    }

    /// Plural form of `word`.
    pub fn pluralize(&self, word: &str) -> String {
        self.plural
            .resolve(word)
            .unwrap_or_else(|| pluralize(word))
    }

    /// Singular form of `word`.
    pub fn singularize(&self, word: &str) -> String {
        self.singular
            .resolve(word)
            .unwrap_or_else(|| singularize(word))
    }
}

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
    "news",
];

// (singular, plural)
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("child", "children"),
    ("sex", "sexes"),
    ("move", "moves"),
    ("zombie", "zombies"),
    ("goose", "geese"),
    ("foot", "feet"),
    ("tooth", "teeth"),
];

const PLURAL_RULES: &[(&str, &str)] = &[
    (r"(?i)(quiz)$", "${1}zes"),
    (r"(?i)^(oxen)$", "${1}"),
    (r"(?i)^(ox)$", "${1}en"),
    (r"(?i)^(m|l)ice$", "${1}ice"),
    (r"(?i)^(m|l)ouse$", "${1}ice"),
    (r"(?i)(matr|vert|ind)(?:ix|ex)$", "${1}ices"),
    (r"(?i)(x|ch|ss|sh)$", "${1}es"),
    (r"(?i)([^aeiouy]|qu)y$", "${1}ies"),
    (r"(?i)(hive)$", "${1}s"),
    (r"(?i)(?:([^f])fe|([lr])f)$", "${1}${2}ves"),
    (r"(?i)sis$", "ses"),
    (r"(?i)([ti])a$", "${1}a"),
    (r"(?i)([ti])um$", "${1}a"),
    (r"(?i)(buffal|tomat|potat|her)o$", "${1}oes"),
    (r"(?i)(bu)s$", "${1}ses"),
    (r"(?i)(alias|status)$", "${1}es"),
    (r"(?i)(octop|vir)i$", "${1}i"),
    (r"(?i)(octop|vir)us$", "${1}i"),
    (r"(?i)^(ax|test)is$", "${1}es"),
    (r"(?i)s$", "s"),
    (r"$", "s"),
];

const SINGULAR_RULES: &[(&str, &str)] = &[
    (r"(?i)(database)s$", "${1}"),
    (r"(?i)(quiz)zes$", "${1}"),
    (r"(?i)(matr)ices$", "${1}ix"),
    (r"(?i)(vert|ind)ices$", "${1}ex"),
    (r"(?i)^(ox)en", "${1}"),
    (r"(?i)(alias|status)(?:es)?$", "${1}"),
    (r"(?i)(octop|vir)(?:us|i)$", "${1}us"),
    (r"(?i)^(a)x[ie]s$", "${1}xis"),
    (r"(?i)(cris|test)(?:is|es)$", "${1}is"),
    (r"(?i)(shoe)s$", "${1}"),
    (r"(?i)(o)es$", "${1}"),
    (r"(?i)(bus)(?:es)?$", "${1}"),
    (r"(?i)^(m|l)ice$", "${1}ouse"),
    (r"(?i)(x|ch|ss|sh)es$", "${1}"),
    (r"(?i)(m)ovies$", "${1}ovie"),
    (r"(?i)(s)eries$", "${1}eries"),
    (r"(?i)([^aeiouy]|qu)ies$", "${1}y"),
    (r"(?i)([lr])ves$", "${1}f"),
    (r"(?i)(tive)s$", "${1}"),
    (r"(?i)(hive)s$", "${1}"),
    (r"(?i)([^f])ves$", "${1}fe"),
    (r"(?i)(^analy)(?:sis|ses)$", "${1}sis"),
    (
        r"(?i)((a)naly|(b)a|(d)iagno|(p)arenthe|(p)rogno|(s)ynop|(t)he)(?:sis|ses)$",
        "${1}sis",
    ),
    (r"(?i)([ti])a$", "${1}um"),
    (r"(?i)(n)ews$", "${1}ews"),
    (r"(?i)(ss)$", "${1}"),
    (r"(?i)s$", ""),
];

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn compile(rules: &'static [(&'static str, &'static str)]) -> Vec<Rule> {
    rules
        .iter()
        .map(|(pattern, replacement)| Rule {
            pattern: Regex::new(pattern)
                .unwrap_or_else(|error| panic!("inflection rule {pattern} is invalid: {error}")),
            replacement: *replacement,
        })
        .collect()
}

static PLURALS: LazyLock<Vec<Rule>> = LazyLock::new(|| compile(PLURAL_RULES));
static SINGULARS: LazyLock<Vec<Rule>> = LazyLock::new(|| compile(SINGULAR_RULES));

/// Plural form of `word` using the built-in English rules.
pub fn pluralize(word: &str) -> String {
    inflect_last_segment(word, |segment| {
        if let Some((_, plural)) = find_irregular(segment) {
            return (*plural).to_string();
        }
        apply_rules(&PLURALS, segment)
    })
}

/// Singular form of `word` using the built-in English rules.
pub fn singularize(word: &str) -> String {
    inflect_last_segment(word, |segment| {
        if let Some((singular, _)) = find_irregular(segment) {
            return (*singular).to_string();
        }
        apply_rules(&SINGULARS, segment)
    })
}

fn find_irregular(segment: &str) -> Option<&'static (&'static str, &'static str)> {
    IRREGULAR.iter().find(|(singular, plural)| {
        segment.eq_ignore_ascii_case(singular) || segment.eq_ignore_ascii_case(plural)
    })
}

fn inflect_last_segment(word: &str, inflect: impl Fn(&str) -> String) -> String {
    let (prefix, segment) = match word.rfind('_') {
        Some(idx) => word.split_at(idx + 1),
        None => ("", word),
    };

    if segment.is_empty()
        || UNCOUNTABLE
            .iter()
            .any(|u| segment.eq_ignore_ascii_case(u))
    {
        return word.to_string();
    }

    let inflected = match_case(segment, inflect(segment));
    format!("{prefix}{inflected}")
}

fn apply_rules(rules: &[Rule], segment: &str) -> String {
    rules
        .iter()
        .find(|rule| rule.pattern.is_match(segment))
        .map(|rule| {
            rule.pattern
                .replace(segment, rule.replacement)
                .into_owned()
        })
        .unwrap_or_else(|| segment.to_string())
}

fn match_case(original: &str, inflected: String) -> String {
    let starts_upper = original
        .chars()
        .next()
        .is_some_and(|c| c.is_uppercase());
    if !starts_upper {
        return inflected;
    }
    let mut chars = inflected.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => inflected,
    }
}
