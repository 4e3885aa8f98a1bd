use crate::domain::ports::Clock;
use chrono::{DateTime, Local, NaiveDate, TimeZone};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// 固定時間，用於測試
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Local>,
}

impl FixedClock {
    pub fn new(at: DateTime<Local>) -> Self {
        Self { at }
    }

    /// 本地時區的 `y-m-d h:m:s`；不存在或有歧義的時間回傳 None
    pub fn at_local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Option<Self> {
        Local
            .with_ymd_and_hms(y, m, d, h, min, s)
            .single()
            .map(Self::new)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.at
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_datetime(at: &DateTime<Local>) -> String {
    at.format(TIME_FORMAT).to_string()
}

/// epoch 毫秒轉成 `YYYY-MM-DD HH:mm:ss`（本地時區）
pub fn format_millis(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(at) => format_datetime(&at),
        None => String::new(),
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}
