use chrono::{DateTime, Duration, Utc};

/// 过期时间解析器
pub struct TimeParser;

impl TimeParser {
    /// 解析时间字符串，支持多种格式：
    /// - RFC3339 格式：2023-10-01T12:00:00Z
    /// - 相对时间：1d, 2w, 3M, 1y, 1h30m, 2d12h
    pub fn parse_expire_time(input: &str) -> Result<DateTime<Utc>, String> {
        Self::parse_expire_time_at(input, Utc::now())
    }

    /// 同 [`parse_expire_time`](Self::parse_expire_time)，相对时间以 `now` 为起点
    pub fn parse_expire_time_at(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
        let input = input.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(dt.with_timezone(&Utc));
        }

        let duration = Self::parse_duration(input)?;
        now.checked_add_signed(duration)
            .ok_or_else(|| "Computed expiry is out of range".to_string())
    }

    /// 解析相对时长，例如 `30d`、`1h30m`
    ///
    /// 单位区分大小写：`m` 为分钟，`M` 为月（30 天）
    pub fn parse_duration(input: &str) -> Result<Duration, String> {
        let input = input.trim();
        if input.is_empty() {
            return Err("Duration cannot be empty".to_string());
        }

        let mut total = Duration::zero();
        let mut rest = input;

        while !rest.is_empty() {
            let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            if digits == 0 {
                return Err(format!("Invalid time format: '{}'", input));
            }
            let num: i64 = rest[..digits]
                .parse()
                .map_err(|_| format!("Invalid number: '{}'", &rest[..digits]))?;
            rest = &rest[digits..];

            let unit_len = rest
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(rest.len());
            if unit_len == 0 {
                return Err(format!("Missing time unit after '{}'", num));
            }
            let unit = &rest[..unit_len];
            rest = &rest[unit_len..];

            let step = match unit {
                "M" => Duration::try_days(num.saturating_mul(30)),
                _ => match unit.to_lowercase().as_str() {
                    "s" | "sec" | "second" | "seconds" => Duration::try_seconds(num),
                    "m" | "min" | "minute" | "minutes" => Duration::try_minutes(num),
                    "h" | "hour" | "hours" => Duration::try_hours(num),
                    "d" | "day" | "days" => Duration::try_days(num),
                    "w" | "week" | "weeks" => Duration::try_weeks(num),
                    "month" | "months" => Duration::try_days(num.saturating_mul(30)),
                    "y" | "year" | "years" => Duration::try_days(num.saturating_mul(365)),
                    _ => return Err(format!("Unsupported time unit: '{}'", unit)),
                },
            }
            .ok_or_else(|| format!("Duration out of range: '{}'", input))?;

            total = total
                .checked_add(&step)
                .ok_or_else(|| format!("Duration out of range: '{}'", input))?;
        }

        if total <= Duration::zero() {
            return Err("Duration must be greater than zero".to_string());
        }
        Ok(total)
    }

    /// 格式化剩余时间为人类可读的字符串
    pub fn format_duration_human(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
        let duration = to.signed_duration_since(from);

        if duration.num_seconds() < 0 {
            return "expired".to_string();
        }

        let days = duration.num_days();
        let hours = (duration.num_seconds() % 86400) / 3600;
        let minutes = (duration.num_seconds() % 3600) / 60;

        if days > 0 {
            if hours > 0 {
                format!("{}d {}h", days, hours)
            } else {
                format!("{}d", days)
            }
        } else if hours > 0 {
            if minutes > 0 {
                format!("{}h {}m", hours, minutes)
            } else {
                format!("{}h", hours)
            }
        } else if minutes > 0 {
            format!("{}m", minutes)
        } else {
            format!("{}s", duration.num_seconds())
        }
    }
}
