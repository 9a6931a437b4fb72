//! # 時刻
//!
//! ユースケースが参照する「現在時刻」と、サイトのローカル日付の境界を扱う。
//!
//! 公開一覧は「サイトのローカル日付で今日以降」の予想記事を出すため、
//! UTC の現在時刻をサイトのオフセットで日付に丸めてから UTC に戻す。
//! オフセットは固定（夏時間なし）で、設定値 `SITE_UTC_OFFSET_HOURS` から与えられる。

use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc};

/// 現在時刻の取得元
///
/// 本番は [`SystemClock`]、テストは [`FixedClock`] を注入する。
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// サイトのローカル日付で今日の 0 時（UTC）
    fn start_of_local_day(&self, site_offset: FixedOffset) -> DateTime<Utc> {
        start_of_local_day(self.now(), site_offset)
    }
}

/// `at` を含むローカル日付の 0 時を UTC で返す
///
/// ```
/// use chrono::{FixedOffset, TimeZone, Utc};
/// use tipster_domain::clock::start_of_local_day;
///
/// // UTC 22:30 は UTC+3 では翌日 01:30
/// let at = Utc.with_ymd_and_hms(2026, 5, 1, 22, 30, 0).unwrap();
/// let offset = FixedOffset::east_opt(3 * 3600).unwrap();
///
/// assert_eq!(
///     start_of_local_day(at, offset),
///     Utc.with_ymd_and_hms(2026, 5, 1, 21, 0, 0).unwrap()
/// );
/// ```
pub fn start_of_local_day(at: DateTime<Utc>, site_offset: FixedOffset) -> DateTime<Utc> {
    let midnight = at
        .with_timezone(&site_offset)
        .date_naive()
        .and_time(NaiveTime::MIN);
    // 固定オフセットでは常に single
    site_offset
        .from_local_datetime(&midnight)
        .single()
        .map_or(at, |local| local.with_timezone(&Utc))
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 常に同じ時刻を返す
///
/// キャンペーン名のタイムスタンプや作成日時をテストで固定する。
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
