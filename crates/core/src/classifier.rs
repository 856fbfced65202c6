//! User-agent classification.
//!
//! Deterministic, case-insensitive mapping from the raw user-agent string
//! to a device class. Membership is tested by substring against an ordered
//! rule list; the first matching rule wins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Device class derived from the user-agent string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UaClass {
    Android,
    Ios,
    Tv,
    Stb,
    StreamingServer,
    Desktop,
    Other,
}

impl UaClass {
    /// The wire/table representation of this class.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
            Self::Tv => "tv",
            Self::Stb => "stb",
            Self::StreamingServer => "streaming_server",
            Self::Desktop => "desktop",
            Self::Other => "other",
        }
    }

    /// All classes, in rule order.
    pub const ALL: [UaClass; 7] = [
        Self::StreamingServer,
        Self::Tv,
        Self::Stb,
        Self::Android,
        Self::Ios,
        Self::Desktop,
        Self::Other,
    ];
}

impl fmt::Display for UaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UaClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "android" => Ok(Self::Android),
            "ios" => Ok(Self::Ios),
            "tv" => Ok(Self::Tv),
            "stb" => Ok(Self::Stb),
            "streaming_server" => Ok(Self::StreamingServer),
            "desktop" => Ok(Self::Desktop),
            "other" => Ok(Self::Other),
            _ => Err(Error::validation(format!("unknown user-agent class: {s}"))),
        }
    }
}

/// Ordered rule list. Specific platforms come before the generic OS rules:
/// an Android smart-TV UA must classify as `tv`, not `android`, and the
/// `linux` substring only applies once every earlier rule has passed.
const RULES: &[(&[&str], UaClass)] = &[
    (
        &["lavf", "ffmpeg", "gstreamer", "curl", "wget", "okhttp"],
        UaClass::StreamingServer,
    ),
    (
        &["smart-tv", "smarttv", "hbbtv", "webos", "tizen", "appletv"],
        UaClass::Tv,
    ),
    (&["stb", "mag", "aura", "dune", "infomir"], UaClass::Stb),
    (&["android"], UaClass::Android),
    (
        &["iphone", "ipad", "ios", "cfnetwork", "darwin"],
        UaClass::Ios,
    ),
    (&["windows", "macintosh", "linux", "x11"], UaClass::Desktop),
];

/// Classify a user-agent string into a device class.
///
/// Total and pure: every input maps to exactly one class, the empty string
/// maps to [`UaClass::Other`], and the same input always yields the same
/// output.
pub fn classify(user_agent: &str) -> UaClass {
    if user_agent.is_empty() {
        return UaClass::Other;
    }

    let ua = user_agent.to_ascii_lowercase();
    for (needles, class) in RULES {
        if needles.iter().any(|needle| ua.contains(needle)) {
            return *class;
        }
    }

    UaClass::Other
}
