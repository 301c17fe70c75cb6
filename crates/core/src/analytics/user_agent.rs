//! Browser and OS labels derived from a raw `User-Agent` header.
//!
//! Each facet is an ordered rule list; the first matching predicate wins, so
//! the order of the entries is the priority contract (Edge before Chrome,
//! Chrome before Safari).

use crate::domain::{Browser, OsFamily};

type Rule<L> = (fn(&str) -> bool, L);

const BROWSER_RULES: &[Rule<Browser>] = &[
    (|ua| ua.contains("edg"), Browser::Edge),
    (|ua| ua.contains("chrome") && !ua.contains("edg"), Browser::Chrome),
    (|ua| ua.contains("firefox"), Browser::Firefox),
    (|ua| ua.contains("safari") && !ua.contains("chrome"), Browser::Safari),
    (|ua| ua.contains("opera"), Browser::Opera),
];

const OS_RULES: &[Rule<OsFamily>] = &[
    (|ua| ua.contains("windows"), OsFamily::Windows),
    (|ua| ua.contains("mac os x") || ua.contains("macintosh"), OsFamily::MacOs),
    (|ua| ua.contains("android"), OsFamily::Android),
    (|ua| ua.contains("iphone") || ua.contains("ipad"), OsFamily::Ios),
    (|ua| ua.contains("linux"), OsFamily::Linux),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientLabels {
    pub browser: Browser,
    pub os: OsFamily,
}

pub fn classify(user_agent: &str) -> ClientLabels {
    let ua = user_agent.to_lowercase();
    ClientLabels {
        browser: first_match(BROWSER_RULES, &ua).unwrap_or(Browser::Unknown),
        os: first_match(OS_RULES, &ua).unwrap_or(OsFamily::Unknown),
    }
}

pub fn classify_browser(user_agent: &str) -> Browser {
    first_match(BROWSER_RULES, &user_agent.to_lowercase()).unwrap_or(Browser::Unknown)
}

pub fn classify_os(user_agent: &str) -> OsFamily {
    first_match(OS_RULES, &user_agent.to_lowercase()).unwrap_or(OsFamily::Unknown)
}

fn first_match<L: Copy>(rules: &[Rule<L>], lowered: &str) -> Option<L> {
    rules
        .iter()
        .find(|(matches, _)| matches(lowered))
        .map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const EDGE_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";
    const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.144 Mobile Safari/537.36";
    const OPERA_PRESTO: &str = "Opera/9.80 (Windows NT 6.1; U; en) Presto/2.12.388 Version/12.16";

    #[test]
    fn chrome_wins_over_safari_token() {
        assert_eq!(classify_browser(CHROME_WINDOWS), Browser::Chrome);
        assert_eq!(
            classify_browser("Mozilla/5.0 (X11) Chrome/100 Safari/537"),
            Browser::Chrome
        );
    }

    #[test]
    fn edge_wins_over_chrome_token() {
        assert_eq!(classify_browser(EDGE_WINDOWS), Browser::Edge);
        assert_eq!(
            classify_browser("Mozilla/5.0 (X11) Edg/100 Chrome/100"),
            Browser::Edge
        );
    }

    #[test]
    fn safari_and_firefox() {
        assert_eq!(classify_browser(SAFARI_MAC), Browser::Safari);
        assert_eq!(classify_browser(FIREFOX_LINUX), Browser::Firefox);
    }

    #[test]
    fn opera_presto() {
        assert_eq!(classify_browser(OPERA_PRESTO), Browser::Opera);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify_browser("FIREFOX/1.0"), Browser::Firefox);
        assert_eq!(classify_os("WINDOWS"), OsFamily::Windows);
    }

    #[test]
    fn os_labels() {
        assert_eq!(classify_os(CHROME_WINDOWS), OsFamily::Windows);
        assert_eq!(classify_os(SAFARI_MAC), OsFamily::MacOs);
        assert_eq!(classify_os(CHROME_ANDROID), OsFamily::Android);
        assert_eq!(classify_os(FIREFOX_LINUX), OsFamily::Linux);
        assert_eq!(classify_os("Mozilla/5.0 (iPad; CPU OS 17_0)"), OsFamily::Ios);
    }

    #[test]
    fn iphone_with_mac_os_token_hits_macos_rule_first() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15";
        assert_eq!(classify_os(ua), OsFamily::MacOs);
    }

    #[test]
    fn unrecognized_is_unknown() {
        let labels = classify("curl/8.4.0");
        assert_eq!(labels.browser, Browser::Unknown);
        assert_eq!(labels.os, OsFamily::Unknown);
    }
}
