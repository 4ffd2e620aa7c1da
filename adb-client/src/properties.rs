//! Device property dump parsing.
//!
//! `shell:getprop` without arguments dumps every property as
//! `[name]: [value]`, one per line. Lines are split at the first `]:`; a
//! line whose value bracket cannot be parsed still yields the property name
//! with an absent value, and lines without the `]:` boundary are skipped.

/// One parsed `name=value` style device property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProperty {
    /// Property name, e.g. `ro.build.version.sdk`.
    pub name: String,
    /// Property value, or `None` when the value could not be parsed.
    pub value: Option<String>,
}

/// Split one `[name]: [value]` line into name and optional value.
fn parse_line(line: &str) -> Option<(&str, Option<&str>)> {
    let rest = line.strip_prefix('[')?;
    let (name, value_part) = rest.split_once("]:")?;
    if name.is_empty() {
        return None;
    }

    let value = value_part
        .trim_start()
        .strip_prefix('[')
        .and_then(|v| v.split_once(']'))
        .map(|(value, _)| value);

    Some((name, value))
}

/// Parse just the property names out of a property dump.
///
/// # Examples
///
/// ```
/// use adb_client::parse_property_names;
///
/// let names = parse_property_names("[ro.xapd.caps.scr]: [on]");
/// assert_eq!(names, ["ro.xapd.caps.scr"]);
/// ```
pub fn parse_property_names(text: &str) -> Vec<String> {
    text.split('\n')
        .filter_map(|line| parse_line(line).map(|(name, _)| name.to_string()))
        .collect()
}

/// Parse a property dump into name/value records.
///
/// Malformed lines are skipped; a parsable name with an unparsable value
/// yields a property with `value: None` rather than failing the parse.
pub fn parse_properties(text: &str) -> Vec<DeviceProperty> {
    text.split('\n')
        .filter_map(|line| {
            parse_line(line).map(|(name, value)| DeviceProperty {
                name: name.to_string(),
                value: value.map(str::to_string),
            })
        })
        .collect()
}
