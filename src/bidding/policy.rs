/// 자동 연장(소프트 클로즈) 정책
/// 독립 타이머가 아니라 입찰 커밋과 같은 원자 단위 안에서 평가된다.
// region:    --- Imports
use chrono::{DateTime, Duration, Utc};

use crate::bidding::model::{AuctionRecord, SystemSetting};
// endregion: --- Imports

// region:    --- Policy
/// 낙찰 직전 입찰에 대한 마감 연장 판정
/// 마감까지 남은 시간이 auto_extend_before(분) 이하이면
/// 마감을 now + auto_extend_duration(분)으로 민다.
/// 마감 시각은 늘어나기만 해야 하므로, 현재 마감보다 늦어지는 경우에만 제안한다.
/// 연장 횟수 제한은 두지 않는다.
pub fn extended_end_time(
    auction: &AuctionRecord,
    settings: &SystemSetting,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if !auction.auto_extend_enabled {
        return None;
    }
    if auction.end_time - now > Duration::minutes(settings.auto_extend_before) {
        return None;
    }
    let candidate = now + Duration::minutes(settings.auto_extend_duration);
    (candidate > auction.end_time).then_some(candidate)
}
// endregion: --- Policy
