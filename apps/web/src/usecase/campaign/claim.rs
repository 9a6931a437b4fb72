//! # 配信中クレーム
//!
//! 同一予想記事に対する配信の同時実行をプロセス内で排他する。
//! クレームは [`ClaimGuard`] のドロップで解放されるため、
//! リクエスト future がキャンセルされた場合も取り残されない。

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use tipster_domain::prediction::PredictionId;

/// 配信中の予想記事 ID の集合
#[derive(Clone, Default)]
pub(crate) struct InFlightClaims {
    ids: Arc<Mutex<HashSet<PredictionId>>>,
}

impl InFlightClaims {
    /// クレームを取得する。既に配信中なら `None`
    pub(crate) fn try_claim(&self, id: PredictionId) -> Option<ClaimGuard> {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        if !ids.insert(id) {
            return None;
        }
        Some(ClaimGuard {
            ids: Arc::clone(&self.ids),
            id,
        })
    }

    #[cfg(test)]
    pub(crate) fn is_claimed(&self, id: PredictionId) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }
}

/// ドロップ時にクレームを解放するガード
pub(crate) struct ClaimGuard {
    ids: Arc<Mutex<HashSet<PredictionId>>>,
    id:  PredictionId,
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}
