//! Placeholder substitution for snippet content.
//!
//! Passes run in a fixed order (dates, times, clipboard, system identity) and
//! each one only touches its own literal, case-sensitive tokens. A value that
//! cannot be produced leaves its placeholder in the text untouched.

use crate::clipboard::clipboard_text_if_any;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local};
use std::fmt::Write;

pub const CURSOR_MARKER: &str = "{{CURSOR}}";

const DATE_SHORT: &str = "{{DATE}}";
const DATE_MEDIUM: &str = "{{DATE:MEDIUM}}";
const DATE_LONG: &str = "{{DATE:LONG}}";
const DATE_FULL: &str = "{{DATE:FULL}}";
const DATE_CUSTOM_OPEN: &str = "{{DATE:CUSTOM:";
const PLACEHOLDER_CLOSE: &str = "}}";

const TIME_SHORT: &str = "{{TIME}}";
const TIME_MEDIUM: &str = "{{TIME:MEDIUM}}";
const TIME_LONG: &str = "{{TIME:LONG}}";
const TIME_24: &str = "{{TIME:24}}";

const CLIPBOARD: &str = "{{CLIPBOARD}}";

const USERNAME: &str = "{{USERNAME}}";
const USER: &str = "{{USER}}";
const HOSTNAME: &str = "{{HOSTNAME}}";

/// Where placeholder values come from
pub trait VariableSource: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
    fn clipboard_text(&self) -> Option<String>;
    fn full_name(&self) -> Option<String>;
    fn login_name(&self) -> Option<String>;
    fn hostname(&self) -> Option<String>;
}

/// Live values: local clock, system clipboard, current user and machine
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemVariables;

impl VariableSource for SystemVariables {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }

    fn clipboard_text(&self) -> Option<String> {
        clipboard_text_if_any()
    }

    fn full_name(&self) -> Option<String> {
        whoami::fallible::realname()
            .ok()
            .filter(|name| !name.is_empty())
    }

    fn login_name(&self) -> Option<String> {
        whoami::fallible::username()
            .ok()
            .filter(|name| !name.is_empty())
    }

    fn hostname(&self) -> Option<String> {
        whoami::fallible::hostname()
            .ok()
            .filter(|name| !name.is_empty())
    }
}

/// Resolve every known placeholder using live system values
pub fn resolve(content: &str) -> String {
    resolve_with(content, &SystemVariables)
}

/// Resolve every known placeholder using values from `source`
pub fn resolve_with(content: &str, source: &dyn VariableSource) -> String {
    if !content.contains("{{") {
        return content.to_string();
    }

    // One instant for the whole snippet so {{DATE}} and {{TIME}} agree.
    let now = source.now();

    let text = resolve_dates(content, &now);
    let text = resolve_times(&text, &now);
    let text = resolve_clipboard(&text, source);
    resolve_system(&text, source)
}

/// Strip every cursor marker, returning the text and the first marker's
/// character offset. Text without a marker comes back unchanged.
pub fn extract_cursor(content: &str) -> (String, Option<usize>) {
    match content.find(CURSOR_MARKER) {
        Some(at) => {
            let offset = content[..at].chars().count();
            (content.replace(CURSOR_MARKER, ""), Some(offset))
        }
        None => (content.to_string(), None),
    }
}

// ============================================================================
// Passes
// ============================================================================

fn resolve_dates(text: &str, now: &DateTime<FixedOffset>) -> String {
    let text = substitute(text, DATE_SHORT, || format_instant(now, "%-m/%-d/%y"));
    let text = substitute(&text, DATE_LONG, || format_instant(now, "%B %-d, %Y"));
    let text = substitute(&text, DATE_MEDIUM, || format_instant(now, "%b %-d, %Y"));
    let text = substitute(&text, DATE_FULL, || format_instant(now, "%A, %B %-d, %Y"));
    resolve_custom_dates(&text, now)
}

fn resolve_times(text: &str, now: &DateTime<FixedOffset>) -> String {
    let text = substitute(text, TIME_SHORT, || format_instant(now, "%-I:%M %p"));
    let text = substitute(&text, TIME_LONG, || format_instant(now, "%-I:%M:%S %p %Z"));
    let text = substitute(&text, TIME_MEDIUM, || format_instant(now, "%-I:%M:%S %p"));
    substitute(&text, TIME_24, || format_instant(now, "%H:%M"))
}

fn resolve_clipboard(text: &str, source: &dyn VariableSource) -> String {
    substitute(text, CLIPBOARD, || source.clipboard_text())
}

fn resolve_system(text: &str, source: &dyn VariableSource) -> String {
    let text = substitute(text, USERNAME, || source.full_name());
    let text = substitute(&text, USER, || source.login_name());
    substitute(&text, HOSTNAME, || source.hostname())
}

/// Replace all `token`s, asking for the value only if the token is present
fn substitute(text: &str, token: &str, value: impl FnOnce() -> Option<String>) -> String {
    if !text.contains(token) {
        return text.to_string();
    }
    match value() {
        Some(value) => text.replace(token, &value),
        None => text.to_string(),
    }
}

fn format_instant(now: &DateTime<FixedOffset>, pattern: &str) -> Option<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }

    let mut out = String::new();
    write!(out, "{}", now.format_with_items(items.iter())).ok()?;
    Some(out)
}

// ============================================================================
// Custom date formats
// ============================================================================

/// Byte span of one `{{DATE:CUSTOM:<fmt>}}` placeholder and its `<fmt>`
struct CustomDate<'a> {
    start: usize,
    end: usize,
    pattern: &'a str,
}

fn resolve_custom_dates(text: &str, now: &DateTime<FixedOffset>) -> String {
    let placeholders = scan_custom_dates(text);
    if placeholders.is_empty() {
        return text.to_string();
    }

    // Right to left so earlier spans stay valid as lengths change.
    let mut result = text.to_string();
    for placeholder in placeholders.iter().rev() {
        let chrono_pattern = translate_date_pattern(placeholder.pattern);
        if let Some(formatted) = format_instant(now, &chrono_pattern) {
            result.replace_range(placeholder.start..placeholder.end, &formatted);
        }
    }
    result
}

/// Find custom date placeholders; each ends at the first `}}` after its opening
fn scan_custom_dates(text: &str) -> Vec<CustomDate<'_>> {
    let mut found = Vec::new();
    let mut from = 0;

    while let Some(rel) = text[from..].find(DATE_CUSTOM_OPEN) {
        let start = from + rel;
        let pattern_start = start + DATE_CUSTOM_OPEN.len();

        let Some(rel_close) = text[pattern_start..].find(PLACEHOLDER_CLOSE) else {
            break;
        };
        let pattern_end = pattern_start + rel_close;
        let pattern = &text[pattern_start..pattern_end];

        // Formats are single-line; anything else is left as written.
        if pattern.contains('\n') {
            from = pattern_start;
            continue;
        }

        let end = pattern_end + PLACEHOLDER_CLOSE.len();
        found.push(CustomDate {
            start,
            end,
            pattern,
        });
        from = end;
    }

    found
}

/// Translate a Unicode date pattern (`yyyy-MM-dd`, `EEEE h:mm a`) into a
/// chrono strftime string. Unrecognized letters are kept as literal text.
fn translate_date_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            // Quoted literal up to the closing quote; '' inside is one quote.
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    i += 1;
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            continue;
        }

        if c.is_ascii_alphabetic() {
            let mut run = 1;
            while chars.get(i + run) == Some(&c) {
                run += 1;
            }
            match date_field(c, run) {
                Some(directive) => out.push_str(directive),
                None => (0..run).for_each(|_| push_literal(&mut out, c)),
            }
            i += run;
            continue;
        }

        push_literal(&mut out, c);
        i += 1;
    }

    out
}

fn date_field(letter: char, width: usize) -> Option<&'static str> {
    let directive = match letter {
        'y' | 'u' => {
            if width == 2 {
                "%y"
            } else {
                "%Y"
            }
        }
        'M' | 'L' => match width {
            1 => "%-m",
            2 => "%m",
            3 => "%b",
            _ => "%B",
        },
        'd' => pick(width, "%-d", "%d"),
        'D' => pick(width, "%-j", "%j"),
        'E' => {
            if width <= 3 {
                "%a"
            } else {
                "%A"
            }
        }
        'H' => pick(width, "%-H", "%H"),
        'h' => pick(width, "%-I", "%I"),
        'm' => pick(width, "%-M", "%M"),
        's' => pick(width, "%-S", "%S"),
        'S' => match width {
            1..=3 => "%3f",
            4..=6 => "%6f",
            _ => "%9f",
        },
        'a' => "%p",
        'z' => {
            if width <= 3 {
                "%Z"
            } else {
                "%:z"
            }
        }
        'Z' => "%z",
        _ => return None,
    };
    Some(directive)
}

fn pick(width: usize, single: &'static str, padded: &'static str) -> &'static str {
    if width == 1 {
        single
    } else {
        padded
    }
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}
