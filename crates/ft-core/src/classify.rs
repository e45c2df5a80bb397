//! Window title classification.
//!
//! Maps a foreground process and its window title to an application
//! category, a display name and an optional sub-window (browser site, chat
//! contact, editor file).
//!
//! Every rule table here is an ordered slice and the first match wins, so
//! the result for a given input never depends on hashing or iteration order.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::AppType;

/// Sub-window key used when a chat client shows its contact list.
pub const CHAT_MAIN_VIEW: &str = "main view";

/// Sub-window titles and browser-derived keys are capped at this many characters.
const MAX_KEY_CHARS: usize = 50;

/// Known processes, matched against the lowercased process name.
const PROCESS_TABLE: &[(&str, AppType, &str)] = &[
    // Browsers
    ("chrome.exe", AppType::Browser, "Google Chrome"),
    ("msedge.exe", AppType::Browser, "Microsoft Edge"),
    ("firefox.exe", AppType::Browser, "Firefox"),
    ("opera.exe", AppType::Browser, "Opera"),
    ("brave.exe", AppType::Browser, "Brave"),
    ("360se.exe", AppType::Browser, "360浏览器"),
    ("qqbrowser.exe", AppType::Browser, "QQ浏览器"),
    ("sogouexplorer.exe", AppType::Browser, "搜狗浏览器"),
    ("chrome", AppType::Browser, "Google Chrome"),
    ("google-chrome", AppType::Browser, "Google Chrome"),
    ("chromium", AppType::Browser, "Chromium"),
    ("msedge", AppType::Browser, "Microsoft Edge"),
    ("firefox", AppType::Browser, "Firefox"),
    ("opera", AppType::Browser, "Opera"),
    ("brave", AppType::Browser, "Brave"),
    // Chat clients
    ("wechat.exe", AppType::Chat, "微信"),
    ("qq.exe", AppType::Chat, "QQ"),
    ("tim.exe", AppType::Chat, "TIM"),
    ("telegram.exe", AppType::Chat, "Telegram"),
    ("discord.exe", AppType::Chat, "Discord"),
    ("slack.exe", AppType::Chat, "Slack"),
    ("dingtalk.exe", AppType::Chat, "钉钉"),
    ("wework.exe", AppType::Chat, "企业微信"),
    ("feishu.exe", AppType::Chat, "飞书"),
    ("telegram-desktop", AppType::Chat, "Telegram"),
    ("discord", AppType::Chat, "Discord"),
    ("slack", AppType::Chat, "Slack"),
    // Editors and IDEs
    ("code.exe", AppType::Editor, "VS Code"),
    ("devenv.exe", AppType::Editor, "Visual Studio"),
    ("idea64.exe", AppType::Editor, "IntelliJ IDEA"),
    ("pycharm64.exe", AppType::Editor, "PyCharm"),
    ("webstorm64.exe", AppType::Editor, "WebStorm"),
    ("sublime_text.exe", AppType::Editor, "Sublime Text"),
    ("notepad++.exe", AppType::Editor, "Notepad++"),
    ("code", AppType::Editor, "VS Code"),
    ("idea", AppType::Editor, "IntelliJ IDEA"),
    ("pycharm", AppType::Editor, "PyCharm"),
    ("webstorm", AppType::Editor, "WebStorm"),
    ("sublime_text", AppType::Editor, "Sublime Text"),
];

/// Browser window chrome appended to page titles.
const BROWSER_SUFFIXES: &[&str] = &[
    " - Google Chrome",
    " - Mozilla Firefox",
    " - Microsoft Edge",
    " - Opera",
    " - Brave",
    " — Mozilla Firefox",
    " - 360安全浏览器",
    " - QQ浏览器",
    " - 搜狗浏览器",
    " - Chromium",
];

/// Title patterns that identify a site, checked in order.
const DOMAIN_RULES: &[(&str, &str)] = &[
    (r"(?i)bilibili", "bilibili.com"),
    ("哔哩哔哩", "bilibili.com"),
    (r"(?i)YouTube", "youtube.com"),
    ("知乎", "zhihu.com"),
    ("百度", "baidu.com"),
    (r"(?i)Google", "google.com"),
    (r"(?i)GitHub", "github.com"),
    (r"(?i)Stack Overflow", "stackoverflow.com"),
    ("微博", "weibo.com"),
    ("淘宝", "taobao.com"),
    ("京东", "jd.com"),
    ("抖音", "douyin.com"),
    ("今日头条", "toutiao.com"),
    ("网易", "163.com"),
    ("腾讯", "qq.com"),
    (r"(?i)CSDN", "csdn.net"),
    ("掘金", "juejin.cn"),
    ("简书", "jianshu.com"),
];

/// Titles chat clients show when no conversation is open.
const CHAT_MAIN_TITLES: &[&str] = &[
    "微信",
    "WeChat",
    "QQ",
    "TIM",
    "Telegram",
    "Discord",
    "Slack",
    "钉钉",
    "企业微信",
    "飞书",
    "Feishu",
    "DingTalk",
    "WeCom",
];

const VS_CODE_SUFFIXES: &[&str] = &[" — Visual Studio Code", " - Visual Studio Code"];

const EDITOR_SUFFIXES: &[&str] = &[
    " - Visual Studio",
    " - IntelliJ IDEA",
    " - PyCharm",
    " - WebStorm",
    " - Sublime Text",
    " - Notepad++",
];

static DOMAIN_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    DOMAIN_RULES
        .iter()
        .map(|(pattern, domain)| (Regex::new(pattern).unwrap(), *domain))
        .collect()
});

/// Group chat titles carry a member count: `name(12)`.
static CHAT_GROUP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+?)\(\d+\)$").unwrap());

/// A logical unit inside a tracked application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubWindow {
    /// Stable key children are accumulated under.
    pub key: String,
    /// Display title.
    pub title: String,
    /// Site domain, browsers only.
    pub domain: Option<String>,
}

/// Result of classifying one foreground window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub app_type: AppType,
    /// Canonical application name.
    pub name: String,
    pub sub_window: Option<SubWindow>,
}

/// Classifies a foreground window.
///
/// `process_name` is matched case-insensitively against the known process
/// table. Unknown processes are `Normal` and named from their title.
pub fn classify(process_name: &str, window_title: &str) -> Classification {
    let lowered = process_name.to_lowercase();
    let Some((app_type, name)) = PROCESS_TABLE
        .iter()
        .find(|(process, _, _)| *process == lowered)
        .map(|(_, app_type, name)| (*app_type, *name))
    else {
        return Classification {
            app_type: AppType::Normal,
            name: fallback_name(process_name, window_title),
            sub_window: None,
        };
    };

    let sub_window = match app_type {
        AppType::Browser => browser_sub_window(window_title),
        AppType::Chat => chat_contact(window_title).map(|contact| SubWindow {
            key: contact.clone(),
            title: contact,
            domain: None,
        }),
        AppType::Editor => editor_file(window_title).map(|file| SubWindow {
            key: truncate_chars(&file, MAX_KEY_CHARS),
            title: file,
            domain: None,
        }),
        AppType::Normal => None,
    };

    Classification {
        app_type,
        name: name.to_string(),
        sub_window,
    }
}

/// Names an unknown application from its window title.
///
/// Titles are commonly `document - Application`, so the last segment is
/// preferred when it is long enough to be a name.
fn fallback_name(process_name: &str, window_title: &str) -> String {
    if let Some((_, tail)) = window_title.rsplit_once(" - ") {
        if tail.chars().count() > 2 {
            return tail.to_string();
        }
    }
    if window_title.is_empty() {
        process_name.to_string()
    } else {
        window_title.to_string()
    }
}

/// Extracts the page title and, when recognizable, the site domain.
pub fn extract_browser_info(window_title: &str) -> (Option<String>, Option<String>) {
    let title = BROWSER_SUFFIXES
        .iter()
        .find_map(|suffix| window_title.strip_suffix(suffix))
        .unwrap_or(window_title);

    let domain = DOMAIN_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(title))
        .map(|(_, domain)| (*domain).to_string());

    let title = title.trim();
    if title.is_empty() {
        (None, domain)
    } else {
        (Some(title.to_string()), domain)
    }
}

fn browser_sub_window(window_title: &str) -> Option<SubWindow> {
    let (title, domain) = extract_browser_info(window_title);
    let title = title?;
    let key = domain
        .clone()
        .unwrap_or_else(|| truncate_chars(&title, MAX_KEY_CHARS));
    Some(SubWindow { key, title, domain })
}

/// Extracts the conversation partner from a chat client title.
pub fn chat_contact(window_title: &str) -> Option<String> {
    let title = window_title.trim();
    if title.is_empty() {
        return None;
    }

    if CHAT_MAIN_TITLES.contains(&title) {
        return Some(CHAT_MAIN_VIEW.to_string());
    }

    let contact = if let Some((head, _)) = title.split_once(" - ") {
        head.trim()
    } else if let Some(caps) = CHAT_GROUP_RE.captures(title) {
        caps.get(1).map_or(title, |m| m.as_str().trim())
    } else {
        title
    };

    (!contact.is_empty()).then(|| contact.to_string())
}

/// Extracts the open file (and project, when known) from an editor title.
pub fn editor_file(window_title: &str) -> Option<String> {
    let title = window_title.trim();
    if title.is_empty() {
        return None;
    }

    // "<file> - <project> - Visual Studio Code"
    if VS_CODE_SUFFIXES.iter().any(|suffix| title.contains(suffix)) {
        let stripped = VS_CODE_SUFFIXES
            .iter()
            .fold(title.to_string(), |acc, suffix| acc.replace(suffix, ""));
        let separator = if stripped.contains(" - ") { " - " } else { " — " };
        let mut parts = stripped.split(separator);
        let file = parts.next().unwrap_or_default();
        return Some(match parts.next() {
            Some(project) => format!("{file} ({project})"),
            None => file.to_string(),
        });
    }

    if let Some(head) = EDITOR_SUFFIXES
        .iter()
        .find_map(|suffix| title.split_once(suffix).map(|(head, _)| head))
    {
        return Some(head.trim().to_string());
    }

    Some(title.to_string())
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Process Table Tests ==========

    #[test]
    fn chrome_title_strips_browser_suffix() {
        let result = classify("chrome.exe", "Rust Book - Google Chrome");
        assert_eq!(result.app_type, AppType::Browser);
        assert_eq!(result.name, "Google Chrome");
        assert_eq!(
            result.sub_window,
            Some(SubWindow {
                key: "Rust Book".to_string(),
                title: "Rust Book".to_string(),
                domain: None,
            })
        );
    }

    #[test]
    fn process_lookup_is_case_insensitive() {
        let result = classify("Chrome.EXE", "Rust Book - Google Chrome");
        assert_eq!(result.app_type, AppType::Browser);
        assert_eq!(result.name, "Google Chrome");
    }

    #[test]
    fn linux_process_names_are_known() {
        assert_eq!(classify("firefox", "x").app_type, AppType::Browser);
        assert_eq!(classify("telegram-desktop", "x").app_type, AppType::Chat);
        assert_eq!(classify("code", "x").app_type, AppType::Editor);
    }

    // ========== Unknown Process Tests ==========

    #[test]
    fn unknown_process_uses_last_title_segment() {
        let result = classify("winword.exe", "report.docx - Microsoft Word");
        assert_eq!(result.app_type, AppType::Normal);
        assert_eq!(result.name, "Microsoft Word");
        assert!(result.sub_window.is_none());
    }

    #[test]
    fn unknown_process_short_segment_falls_back_to_title() {
        let result = classify("tool.exe", "Project - UI");
        assert_eq!(result.name, "Project - UI");
    }

    #[test]
    fn unknown_process_without_separator_uses_title() {
        let result = classify("calc.exe", "Calculator");
        assert_eq!(result.name, "Calculator");
    }

    #[test]
    fn unknown_process_without_title_uses_process_name() {
        let result = classify("Spotify.exe", "");
        assert_eq!(result.name, "Spotify.exe");
    }

    #[test]
    fn segment_length_counts_characters_not_bytes() {
        // Two CJK characters are six bytes but only two characters
        let result = classify("notes.exe", "草稿 - 记事");
        assert_eq!(result.name, "草稿 - 记事");
    }

    // ========== Browser Tests ==========

    #[test]
    fn browser_domain_rule_sets_key() {
        let result = classify("msedge.exe", "Rust std docs - YouTube - Microsoft Edge");
        let sub = result.sub_window.unwrap();
        assert_eq!(sub.title, "Rust std docs - YouTube");
        assert_eq!(sub.domain.as_deref(), Some("youtube.com"));
        assert_eq!(sub.key, "youtube.com");
    }

    #[test]
    fn domain_rules_are_first_match_wins() {
        // Matches both the bilibili and the Google rule; bilibili comes first
        let (_, domain) = extract_browser_info("bilibili search on Google - Google Chrome");
        assert_eq!(domain.as_deref(), Some("bilibili.com"));
    }

    #[test]
    fn domain_rules_ignore_ascii_case() {
        let (_, domain) = extract_browser_info("github - where code lives");
        assert_eq!(domain.as_deref(), Some("github.com"));
    }

    #[test]
    fn only_first_matching_suffix_is_stripped() {
        let (title, _) = extract_browser_info("A - Chromium - Google Chrome");
        assert_eq!(title.as_deref(), Some("A - Chromium"));
    }

    #[test]
    fn browser_key_truncates_long_titles() {
        let long = "x".repeat(80);
        let result = classify("firefox.exe", &format!("{long} - Mozilla Firefox"));
        let sub = result.sub_window.unwrap();
        assert_eq!(sub.key.chars().count(), 50);
        assert_eq!(sub.title.chars().count(), 80);
    }

    #[test]
    fn browser_with_blank_page_title_has_no_sub_window() {
        let result = classify("chrome.exe", " - Google Chrome");
        assert!(result.sub_window.is_none());
    }

    // ========== Chat Tests ==========

    #[test]
    fn chat_group_count_is_removed() {
        let result = classify("wechat.exe", "小明(3)");
        assert_eq!(result.app_type, AppType::Chat);
        assert_eq!(result.sub_window.unwrap().key, "小明");
    }

    #[test]
    fn chat_main_window_maps_to_sentinel() {
        assert_eq!(chat_contact("  WeChat "), Some(CHAT_MAIN_VIEW.to_string()));
    }

    #[test]
    fn chat_separator_takes_text_before_first_occurrence() {
        assert_eq!(chat_contact("Alice - Bob - QQ"), Some("Alice".to_string()));
    }

    #[test]
    fn chat_plain_title_is_contact() {
        assert_eq!(chat_contact("Release team"), Some("Release team".to_string()));
        assert_eq!(chat_contact("   "), None);
    }

    // ========== Editor Tests ==========

    #[test]
    fn vs_code_title_yields_file_and_project() {
        let result = classify("code.exe", "main.py - myproj - Visual Studio Code");
        assert_eq!(result.app_type, AppType::Editor);
        assert_eq!(result.sub_window.unwrap().title, "main.py (myproj)");
    }

    #[test]
    fn vs_code_em_dash_variant() {
        assert_eq!(
            editor_file("lib.rs — crate — Visual Studio Code"),
            Some("lib.rs (crate)".to_string())
        );
    }

    #[test]
    fn vs_code_without_project_keeps_file() {
        assert_eq!(
            editor_file("Welcome - Visual Studio Code"),
            Some("Welcome".to_string())
        );
    }

    #[test]
    fn ide_suffix_is_stripped() {
        assert_eq!(
            editor_file("app – Main.java - IntelliJ IDEA"),
            Some("app – Main.java".to_string())
        );
    }

    #[test]
    fn unknown_editor_title_is_unchanged() {
        assert_eq!(editor_file("scratch.txt"), Some("scratch.txt".to_string()));
    }

    #[test]
    fn classification_is_deterministic() {
        let first = classify("chrome.exe", "知乎 - 有问题 - Google Chrome");
        for _ in 0..10 {
            assert_eq!(classify("chrome.exe", "知乎 - 有问题 - Google Chrome"), first);
        }
    }
}
