//! Device detection. Pure function of the user-agent, no I/O.

use crate::model::DeviceClass;

const TV_TOKENS: &[&str] = &[
    "smart-tv",
    "smarttv",
    "tizen",
    "webos",
    "vidaa",
    "roku",
    "fire-tv",
    "firetv",
    "android-tv",
    "androidtv",
    "chromecast",
    "shield",
    "lg browser",
];

const MOBILE_TOKENS: &[&str] = &["android", "iphone", "ipad", "mobile", "phone"];

/// Classify a user-agent string into the device class that parameterizes
/// scoring. Deterministic and side-effect free.
#[must_use]
pub fn classify_device(user_agent: &str) -> DeviceClass {
    let ua = user_agent.to_lowercase();

    if TV_TOKENS.iter().any(|token| ua.contains(token)) {
        return DeviceClass::Tv;
    }

    if MOBILE_TOKENS.iter().any(|token| ua.contains(token)) {
        return DeviceClass::Mobile;
    }

    DeviceClass::Web
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_tv_tokens() {
        assert_eq!(classify_device("Mozilla/5.0 (SMART-TV; Tizen 6.0)"), DeviceClass::Tv);
        assert_eq!(classify_device("AndroidTV/1.0"), DeviceClass::Tv);
        assert_eq!(classify_device("Roku/DVP-9.10"), DeviceClass::Tv);
    }

    #[test]
    fn detects_mobile_tokens() {
        assert_eq!(
            classify_device("Mozilla/5.0 (Linux; Android 13; Pixel 7)"),
            DeviceClass::Mobile
        );
        assert_eq!(
            classify_device("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)"),
            DeviceClass::Mobile
        );
    }

    #[test]
    fn android_tv_takes_priority_over_mobile() {
        // Contains both "android" and an explicit tv token; tv must win.
        assert_eq!(classify_device("Android-TV Mozilla/5.0 (Android 13)"), DeviceClass::Tv);
    }

    #[test]
    fn falls_back_to_web() {
        assert_eq!(
            classify_device("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"),
            DeviceClass::Web
        );
    }
}
