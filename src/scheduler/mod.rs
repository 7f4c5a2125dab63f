/// 경매 종료 스윕 스케줄러
/// 마감 처리의 기본 경로는 조회/입찰 시의 지연 확인이고,
/// 이 스윕은 아무도 들여다보지 않는 경매도 제때 닫히게 하는 보조 경로다.
// region:    --- Imports
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error};

use crate::bidding::expiry;
use crate::store::SharedStore;

// endregion: --- Imports

// region:    --- Expiry Scheduler
pub struct ExpiryScheduler {
    store: SharedStore,
}

impl ExpiryScheduler {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// 스윕 루프 시작
    pub fn start(&self) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1)); // 1초마다 실행
            loop {
                interval.tick().await;
                match expiry::sweep(store.as_ref(), Utc::now()).await {
                    Ok(0) => {}
                    Ok(n) => debug!("{:<12} --> 경매 {}건 종료 처리", "Scheduler", n),
                    Err(e) => {
                        error!("{:<12} --> 경매 종료 스윕 중 오류 발생: {:?}", "Scheduler", e)
                    }
                }
            }
        });
    }
}
// endregion: --- Expiry Scheduler
