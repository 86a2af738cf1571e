use chrono::{DateTime, Local, Utc};

/// 格式化时间为本地时间显示格式
pub fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// 格式化相对时间 (例如: "2 天前")
pub fn format_relative_time(time: DateTime<Utc>) -> String {
    format_relative_to(time, Utc::now())
}

fn format_relative_to(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(time).num_seconds();
    if seconds < 0 {
        // 时钟偏差或未来时间
        return format_time(time);
    }

    match seconds {
        0..=59 => "刚刚".to_string(),
        60..=3599 => format!("{} 分钟前", seconds / 60),
        3600..=86399 => format!("{} 小时前", seconds / 3600),
        86400..=2591999 => format!("{} 天前", seconds / 86400),
        2592000..=31535999 => format!("{} 个月前", seconds / 2592000),
        _ => format!("{} 年前", seconds / 31536000),
    }
}

/// 格式化耗时，例如 "1.25s" 或 "830ms"
pub fn format_duration(duration: std::time::Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_time() {
        let formatted = format_time(Utc::now());
        assert!(formatted.contains('-'));
        assert!(formatted.contains(':'));
    }

    #[test]
    fn test_format_relative_time() {
        let now = Utc::now();

        assert_eq!(format_relative_to(now, now), "刚刚");
        assert_eq!(format_relative_to(now - Duration::seconds(120), now), "2 分钟前");
        assert_eq!(format_relative_to(now - Duration::hours(2), now), "2 小时前");
        assert_eq!(format_relative_to(now - Duration::days(3), now), "3 天前");
        assert_eq!(format_relative_to(now - Duration::days(65), now), "2 个月前");
        assert_eq!(format_relative_to(now - Duration::days(800), now), "2 年前");
    }

    #[test]
    fn test_future_time_falls_back_to_absolute() {
        let now = Utc::now();
        let future = now + Duration::hours(1);
        assert_eq!(format_relative_to(future, now), format_time(future));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(std::time::Duration::from_millis(830)), "830ms");
        assert_eq!(format_duration(std::time::Duration::from_millis(1250)), "1.25s");
    }
}
