//! 選択状態の調停
//!
//! 地図クリックとピッカー選択を受け取り、選択中の市町村を一つに決めて
//! 購読者（地図・詳細パネル）へ同期的に通知する。
//! フィルタ状態には依存しない: フィルタは「選択肢」を絞るだけで、
//! 選択できる対象は常に全データセット。

use crate::types::{Unit, UnitId};
use std::sync::Arc;

/// データセット読み込み時に外部指定がなければ選択される市町村
pub const DEFAULT_UNIT_NAME: &str = "BUCARAMANGA";

type Subscriber = Box<dyn FnMut(&Unit)>;

/// 選択コーディネータ
pub struct SelectionCoordinator {
    units: Arc<[Unit]>,
    loaded: bool,
    selected: Option<UnitId>,
    pending_request: Option<String>,
    subscribers: Vec<Subscriber>,
}

impl Default for SelectionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self {
            units: Arc::from(Vec::new()),
            loaded: false,
            selected: None,
            pending_request: None,
            subscribers: Vec::new(),
        }
    }

    /// 選択変更の購読
    pub fn subscribe(&mut self, subscriber: impl FnMut(&Unit) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// データセット読み込み完了
    ///
    /// 読み込み前に要求された名前があればそれを、なければ既定の市町村を選択する。
    /// 要求名が未知の場合も既定に倒し、画面が空にならないようにする。
    pub fn on_dataset_loaded(&mut self, units: Arc<[Unit]>) -> Option<&Unit> {
        self.units = units;
        self.loaded = true;

        if let Some(requested) = self.pending_request.take() {
            if self.select(&requested).is_some() {
                return self.selected();
            }
            log::warn!("requested unit {} not in dataset, falling back to default", requested);
        }

        if self.selected.is_none() {
            self.select(DEFAULT_UNIT_NAME);
        }
        self.selected()
    }

    /// 名前で選択
    ///
    /// 読み込み前は要求として保留する。未知の名前は何もしない（ログのみ）。
    pub fn select(&mut self, name: &str) -> Option<&Unit> {
        if !self.loaded {
            log::debug!("dataset not loaded yet, deferring selection of {}", name);
            self.pending_request = Some(name.to_string());
            return None;
        }

        let Some(index) = self.units.iter().position(|u| u.name == name) else {
            log::warn!("ignoring selection of unknown unit: {}", name);
            return None;
        };

        let id = self.units[index].id;
        if self.selected != Some(id) {
            self.selected = Some(id);
            log::info!("unit selected: {}", name);
            let units = Arc::clone(&self.units);
            for subscriber in &mut self.subscribers {
                subscriber(&units[index]);
            }
        }
        Some(&self.units[index])
    }

    pub fn selected(&self) -> Option<&Unit> {
        let id = self.selected?;
        self.units.iter().find(|u| u.id == id)
    }

    pub fn selected_id(&self) -> Option<UnitId> {
        self.selected
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// 選択中の市町村が絞込み結果に含まれるか
    pub fn is_selection_visible(&self, visible: &[&Unit]) -> bool {
        self.selected
            .is_some_and(|id| visible.iter().any(|u| u.id == id))
    }

    /// ピッカーに表示する値
    ///
    /// 選択がフィルタで隠れている場合は `None`（値なし表示）。選択自体は保持する。
    pub fn picker_value(&self, visible: &[&Unit]) -> Option<&str> {
        if self.is_selection_visible(visible) {
            self.selected().map(|u| u.name.as_str())
        } else {
            None
        }
    }
}
