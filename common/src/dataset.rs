//! データセット保持モジュール
//!
//! 市町村一覧を一度だけ読み込み、以降は読み取り専用で共有する。
//! 読み込み状態は Pending → Ready / Failed の一方向のみ。

use crate::error::{Error, Result};
use crate::types::{Unit, UnitId};
use std::collections::HashSet;
use std::sync::Arc;

/// 読み込み状態
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    Pending,
    Ready(Arc<[Unit]>),
    Failed(String),
}

/// データセットJSONをパース
///
/// 重複したIDや名前は警告のみ（先勝ちで検索される）。
pub fn parse_units(json: &str) -> Result<Vec<Unit>> {
    let units: Vec<Unit> = serde_json::from_str(json)
        .map_err(|e| Error::Parse(format!("dataset JSON: {}", e)))?;

    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for unit in &units {
        if !ids.insert(unit.id) {
            log::warn!("duplicate unit id in dataset: {}", unit.id);
        }
        if !names.insert(unit.name.as_str()) {
            log::warn!("duplicate unit name in dataset: {}", unit.name);
        }
    }

    Ok(units)
}

/// 純位置ランキング（収支の降順、1始まり）
///
/// 同値は同順位: `1 + (収支がより大きい件数)`
pub fn balance_ranking(units: &[Unit], id: UnitId) -> Option<usize> {
    let target = units.iter().find(|u| u.id == id)?;
    Some(1 + units.iter().filter(|u| u.balance > target.balance).count())
}

/// データセットストア
#[derive(Debug, Clone, Default)]
pub struct DatasetStore {
    state: LoadState,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, LoadState::Pending)
    }

    /// 読み込み結果を反映
    ///
    /// 二度目以降の呼び出しは無視する（セッション中は再検証しない）。
    pub fn finish(&mut self, result: Result<Vec<Unit>>) -> &LoadState {
        if !self.is_pending() {
            log::debug!("dataset already resolved, ignoring second load result");
            return &self.state;
        }

        self.state = match result {
            Ok(units) => {
                log::info!("dataset loaded: {} units", units.len());
                LoadState::Ready(units.into())
            }
            Err(e) => {
                log::error!("dataset load failed: {}", e);
                LoadState::Failed(e.to_string())
            }
        };
        &self.state
    }

    /// 全件（読み込み完了時のみ）
    pub fn units(&self) -> Option<&Arc<[Unit]>> {
        match &self.state {
            LoadState::Ready(units) => Some(units),
            _ => None,
        }
    }

    /// 全件、未完了ならエラー
    pub fn require_units(&self) -> Result<&Arc<[Unit]>> {
        match &self.state {
            LoadState::Ready(units) => Ok(units),
            LoadState::Pending => Err(Error::DatasetUnavailable("still loading".into())),
            LoadState::Failed(reason) => Err(Error::DatasetUnavailable(reason.clone())),
        }
    }

    pub fn len(&self) -> usize {
        self.units().map_or(0, |u| u.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Unit> {
        self.units()?.iter().find(|u| u.name == name)
    }

    pub fn find_by_id(&self, id: UnitId) -> Option<&Unit> {
        self.units()?.iter().find(|u| u.id == id)
    }

    pub fn ranking(&self, id: UnitId) -> Option<usize> {
        balance_ranking(self.units()?, id)
    }
}
