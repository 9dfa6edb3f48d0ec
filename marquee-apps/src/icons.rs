//! Weather icon mapping

use marquee_core::traits::Icon;

/// Map a weather icon code (`"01d"`, `"10n"`, ...) to a panel glyph
///
/// Clear and few-clouds codes win over the night variant; any other
/// night code draws the moon.
pub fn icon_for(code: &str) -> Icon {
    let starts = |prefixes: &[&str]| prefixes.iter().any(|p| code.starts_with(*p));

    if starts(&["01", "02"]) {
        Icon::Sun
    } else if starts(&["03", "04"]) {
        Icon::Cloud
    } else if code.ends_with('n') {
        Icon::Moon
    } else if starts(&["09", "10", "11", "13"]) {
        Icon::Rain
    } else {
        Icon::Unknown
    }
}
