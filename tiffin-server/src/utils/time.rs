//! 时间工具

use chrono::{DateTime, SecondsFormat, Utc};

/// 当前时间的 RFC3339 字符串 (毫秒精度, UTC)
///
/// 订单与通知文档统一使用该格式存储时间戳
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 解析存储层时间戳；无效输入返回 None
pub fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let s = now_rfc3339();
        let parsed = parse_rfc3339(&s).expect("generated timestamp should parse");
        assert_eq!(parsed.to_rfc3339_opts(SecondsFormat::Millis, true), s);
    }

    #[test]
    fn test_invalid_timestamp() {
        assert!(parse_rfc3339("yesterday").is_none());
    }
}
