//! Word splitting and key casing for payload field names.

/// Target casing for [`convert`] and [`crate::dicts::convert_keys`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Casing {
    /// `ConcatenatedWords`, the casing the API uses for payload keys.
    Pascal,
    /// `concatenatedWords`.
    Camel,
    /// `words_with_underscores`.
    Snake,
}

/// Splits a string into words.
///
/// Runs of non-alphanumeric characters separate words and are discarded; an
/// uppercase letter always starts a new word.
pub fn words(value: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for c in value.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else if c.is_uppercase() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            current.push(c);
        } else {
            current.push(c);
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Converts to `camelCase`, or to `PascalCase` when `upper_first` is set.
///
/// ```
/// use performline_api::strings::camelize;
/// assert_eq!(camelize("traffic_source_id", true), "TrafficSourceId");
/// assert_eq!(camelize("TeSt VaLue", false), "teStVaLue");
/// ```
pub fn camelize(value: &str, upper_first: bool) -> String {
    let joined: String = words(value).iter().map(|w| capitalize(w)).collect();
    if upper_first {
        return joined;
    }

    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => joined,
    }
}

/// Converts to lowercase words joined by `joiner` (`snake_case` for `"_"`).
pub fn underscore(value: &str, joiner: &str) -> String {
    words(value)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(joiner)
}

/// Converts a single key to the given casing.
pub fn convert(value: &str, casing: Casing) -> String {
    match casing {
        Casing::Pascal => camelize(value, true),
        Casing::Camel => camelize(value, false),
        Casing::Snake => underscore(value, "_"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camelize_variants() {
        assert_eq!(camelize("test_value", false), "testValue");
        assert_eq!(camelize("test-Value", false), "testValue");
        assert_eq!(camelize("test value", false), "testValue");
        assert_eq!(camelize("TestValue", false), "testValue");
        assert_eq!(camelize("testValue", false), "testValue");
        assert_eq!(camelize("TeSt VaLue", false), "teStVaLue");

        assert_eq!(camelize("test_value", true), "TestValue");
        assert_eq!(camelize("test-Value", true), "TestValue");
        assert_eq!(camelize("test value", true), "TestValue");
        assert_eq!(camelize("TestValue", true), "TestValue");
        assert_eq!(camelize("testValue", true), "TestValue");
        assert_eq!(camelize("TeSt VaLue", true), "TeStVaLue");
    }

    #[test]
    fn underscore_variants() {
        assert_eq!(underscore("test_value", "_"), "test_value");
        assert_eq!(underscore("test-Value", "_"), "test_value");
        assert_eq!(underscore("test value", "_"), "test_value");
        assert_eq!(underscore("TestValue", "_"), "test_value");
        assert_eq!(underscore("testValue", "_"), "test_value");
        assert_eq!(underscore("TeSt VaLue", "_"), "te_st_va_lue");
        assert_eq!(underscore("TestValue", "-"), "test-value");
    }

    #[test]
    fn empty_and_separator_only() {
        assert_eq!(camelize("", true), "");
        assert_eq!(camelize("__", false), "");
        assert_eq!(underscore("", "_"), "");
    }

    #[test]
    fn single_words_round_trip() {
        for word in ["id", "name", "score", "statuses"] {
            assert_eq!(underscore(&camelize(word, true), "_"), word);
            assert_eq!(camelize(word, false), word);
            assert_eq!(underscore(word, "_"), word);
        }
    }

    #[test]
    fn repeated_conversion_is_stable() {
        for key in ["brand_id", "TrafficSourceId", "ID", "last scored-at", "Value2x"] {
            for casing in [Casing::Pascal, Casing::Camel, Casing::Snake] {
                let once = convert(key, casing);
                assert_eq!(convert(&once, casing), once, "{key} {casing:?}");
            }
        }
    }

    #[test]
    fn snake_and_pascal_are_inverse_for_api_keys() {
        assert_eq!(convert("TrafficSourceId", Casing::Snake), "traffic_source_id");
        assert_eq!(convert("traffic_source_id", Casing::Pascal), "TrafficSourceId");
        assert_eq!(convert("LastScoredAt", Casing::Snake), "last_scored_at");
    }
}
