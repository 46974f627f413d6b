//! User-agent classification
//!
//! Substring heuristics over the raw user-agent string, expressed as
//! ordered rule tables so the first-match-wins policy is visible and
//! testable rather than buried in nested conditionals.

/// Fallback label when no rule matches a non-empty user-agent.
pub const UNKNOWN: &str = "Unknown";

/// Sentinel label recorded when the user-agent header is missing entirely.
pub const UNKNOWN_DEVICE: &str = "Unknown Device";

/// OS rules: (needle, label, implies mobile). First match wins.
const OS_RULES: &[(&str, &str, bool)] = &[
    ("Windows", "Windows", false),
    ("Mac OS", "MacOS", false),
    ("Linux", "Linux", false),
    ("Android", "Android", true),
    ("iPhone", "iOS", true),
    ("iPad", "iOS", true),
];

/// Browser rules. First match wins: "Chrome" is checked before "Safari"
/// and "Safari" before "Edge", so WebKit user-agents carrying several of
/// these tokens classify as the earliest one.
const BROWSER_RULES: &[(&str, &str)] = &[
    ("Chrome", "Chrome"),
    ("Firefox", "Firefox"),
    ("Safari", "Safari"),
    ("Edge", "Edge"),
];

/// Device-type rules; anything unmatched is Desktop.
const DEVICE_RULES: &[(&str, &str)] = &[("Mobile", "Mobile"), ("Tablet", "Tablet")];

/// Result of classifying a user-agent string.
///
/// A missing or empty user-agent yields the bare `UnknownDevice` sentinel
/// rather than a profile of `Unknown` fields; callers must handle both
/// shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    UnknownDevice,
    Known(DeviceProfile),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    pub os: &'static str,
    pub browser: &'static str,
    pub device_type: &'static str,
    pub is_mobile: bool,
}

/// Classify a user-agent string. Pure: same input, same output.
pub fn classify(user_agent: Option<&str>) -> Classification {
    let ua = match user_agent {
        Some(ua) if !ua.is_empty() => ua,
        _ => return Classification::UnknownDevice,
    };

    let (os, is_mobile) = OS_RULES
        .iter()
        .find(|(needle, _, _)| ua.contains(needle))
        .map(|(_, label, mobile)| (*label, *mobile))
        .unwrap_or((UNKNOWN, false));

    let browser = BROWSER_RULES
        .iter()
        .find(|(needle, _)| ua.contains(needle))
        .map(|(_, label)| *label)
        .unwrap_or(UNKNOWN);

    let device_type = DEVICE_RULES
        .iter()
        .find(|(needle, _)| ua.contains(needle))
        .map(|(_, label)| *label)
        .unwrap_or("Desktop");

    Classification::Known(DeviceProfile {
        os,
        browser,
        device_type,
        is_mobile,
    })
}
