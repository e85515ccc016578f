//! Short display strings for counts, durations and timestamps.
//!
//! These follow the platform's own conventions (万/亿 for large counts,
//! Beijing time for publish dates).

use time::{Date, OffsetDateTime, UtcOffset, Weekday};

/// Platform timestamps are rendered in UTC+8.
pub const PLATFORM_OFFSET: UtcOffset = match UtcOffset::from_hms(8, 0, 0) {
    Ok(offset) => offset,
    Err(_) => UtcOffset::UTC,
};

/// `123456` → `"12.3万"`, `250000000` → `"2.50亿"`.
pub fn format_number(n: i64) -> String {
    if n >= 100_000_000 {
        format!("{:.2}亿", n as f64 / 100_000_000.0)
    } else if n >= 10_000 {
        format!("{:.1}万", n as f64 / 10_000.0)
    } else {
        n.to_string()
    }
}

/// `H:MM:SS` when there are hours, else `M:SS`. Zero renders empty.
pub fn format_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return String::new();
    }
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 { format!("{}:{:02}:{:02}", h, m, s) } else { format!("{}:{:02}", m, s) }
}

/// Relative publish time as shown on the platform.
///
/// Both instants are compared in [`PLATFORM_OFFSET`]; `now` is a parameter so
/// the output is reproducible.
pub fn format_pub_time(timestamp: i64, now: OffsetDateTime) -> String {
    let Ok(date) = OffsetDateTime::from_unix_timestamp(timestamp) else {
        return String::new();
    };
    let date = date.to_offset(PLATFORM_OFFSET);
    let now = now.to_offset(PLATFORM_OFFSET);
    let clock = format!("{:02}:{:02}", date.hour(), date.minute());

    if date.year() != now.year() {
        return format!(
            "{}年{:02}月{:02}日 {}",
            date.year(),
            u8::from(date.month()),
            date.day(),
            clock
        );
    }

    let diff_minutes = (now - date).whole_minutes();
    if diff_minutes < 1 {
        return "刚刚".to_string();
    }
    if diff_minutes < 60 {
        return format!("{}分钟前", diff_minutes);
    }

    match calendar_days_between(date.date(), now.date()) {
        0 => format!("{}小时前", (now - date).whole_hours()),
        1 => format!("昨天 {}", clock),
        2 => format!("前天 {}", clock),
        _ => format!("{:02}月{:02}日 {}", u8::from(date.month()), date.day(), clock),
    }
}

fn calendar_days_between(earlier: Date, later: Date) -> i64 {
    (later - earlier).whole_days()
}

/// Single-character weekday name, Sunday first.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sunday => "日",
        Weekday::Monday => "一",
        Weekday::Tuesday => "二",
        Weekday::Wednesday => "三",
        Weekday::Thursday => "四",
        Weekday::Friday => "五",
        Weekday::Saturday => "六",
    }
}
