//! 地図マーカー層
//!
//! 地図ライブラリ本体は `MapSurface` の実装側（Leaflet ブリッジ等）が持ち、
//! ここではマーカーハンドルと表示中の市町村の対応だけを管理する。
//! ドメインデータは座標・色・ポップアップHTMLといった素の値として渡す。

use crate::format::{escape_html, format_number};
use crate::types::{Classification, Profile, Unit, UnitId};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// 初期表示の中心（サンタンデール県）
pub const INITIAL_CENTER: (f64, f64) = (7.0, -73.3);
pub const INITIAL_ZOOM: u8 = 8;
/// 選択時のズームレベル
pub const FOCUS_ZOOM: u8 = 11;
pub const MARKER_RADIUS: u8 = 8;
/// 未知タグ用の色
pub const FALLBACK_COLOR: &str = "#fbbf24";

/// 色分けモード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// 収支区分（IEC）で色分け
    #[default]
    Balance,
    /// プロファイル（クラスタ）で色分け
    Profile,
}

impl ViewMode {
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Balance => "Por Balance",
            ViewMode::Profile => "Por Perfil",
        }
    }
}

pub fn classification_color(tag: &Classification) -> &'static str {
    match tag {
        Classification::Sumidero => "#10b981",
        Classification::Equilibrio => "#fbbf24",
        Classification::Emisor => "#f43f5e",
        Classification::Other(_) => FALLBACK_COLOR,
    }
}

pub fn profile_color(tag: &Profile) -> &'static str {
    match tag {
        Profile::AgriculturalLivestock => "#16a34a",
        Profile::IndustrialUrban => "#dc2626",
        Profile::MixedTransition => "#eab308",
        Profile::ForestSinks => "#2563eb",
        Profile::Other(_) => FALLBACK_COLOR,
    }
}

/// マーカー色（表示モードとタグの決定的関数）
pub fn marker_color(mode: ViewMode, unit: &Unit) -> &'static str {
    match mode {
        ViewMode::Balance => classification_color(&unit.classification),
        ViewMode::Profile => profile_color(&unit.profile),
    }
}

/// 凡例（色, 説明）
pub fn legend(mode: ViewMode) -> Vec<(&'static str, &'static str)> {
    match mode {
        ViewMode::Balance => vec![
            (classification_color(&Classification::Sumidero), "Sumidero (IEC 0-40)"),
            (classification_color(&Classification::Equilibrio), "Equilibrio (IEC 41-60)"),
            (classification_color(&Classification::Emisor), "Emisor (IEC 61-100)"),
        ],
        ViewMode::Profile => Profile::ALL
            .iter()
            .map(|p| (profile_color(p), profile_legend_label(p)))
            .collect(),
    }
}

fn profile_legend_label(profile: &Profile) -> &'static str {
    match profile {
        Profile::AgriculturalLivestock => "Agrícola-Ganadero",
        Profile::IndustrialUrban => "Industrial-Urbano",
        Profile::MixedTransition => "Mixto-Transición",
        Profile::ForestSinks => "Sumideros Forestales",
        Profile::Other(_) => "Otro",
    }
}

/// ポップアップHTML
pub fn popup_html(unit: &Unit) -> String {
    format!(
        r#"<div style="min-width: 200px;">
  <h3 style="font-weight: bold; margin-bottom: 8px; font-size: 16px;">{name}</h3>
  <div style="font-size: 13px; line-height: 1.6;">
    <div><strong>Balance:</strong> {balance} ton CO₂eq</div>
    <div><strong>Clasificación:</strong> {classification}</div>
    <div><strong>Emisiones:</strong> {emissions} ton</div>
    <div><strong>Captura:</strong> {capture} ton</div>
    <div><strong>Perfil:</strong> {profile}</div>
    <div style="margin-top: 8px; color: #666;"><strong>Población:</strong> {population}</div>
  </div>
</div>"#,
        name = escape_html(&unit.name),
        balance = format_number(unit.balance, 0),
        classification = escape_html(unit.classification.as_str()),
        emissions = format_number(unit.total_emissions, 0),
        capture = format_number(unit.forest_capture, 0),
        profile = escape_html(unit.profile.as_str()),
        population = format_number(unit.population as f64, 0),
    )
}

/// 地図ライブラリへ渡すマーカー定義
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub unit_id: UnitId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub color: &'static str,
    pub radius: u8,
    pub popup_html: String,
}

impl MarkerSpec {
    pub fn for_unit(unit: &Unit, mode: ViewMode) -> Self {
        Self {
            unit_id: unit.id,
            name: unit.name.clone(),
            latitude: unit.latitude,
            longitude: unit.longitude,
            color: marker_color(mode, unit),
            radius: MARKER_RADIUS,
            popup_html: popup_html(unit),
        }
    }
}

/// 命令的な地図描画先
///
/// 実装はライブラリのインスタンスを独占し、他のコンポーネントからは触らせない。
pub trait MapSurface {
    type Marker;

    fn add_marker(&mut self, spec: &MarkerSpec, on_click: Box<dyn Fn()>) -> Self::Marker;
    fn set_marker_color(&mut self, marker: &Self::Marker, color: &str);
    fn remove_marker(&mut self, marker: Self::Marker);
    fn fly_to(&mut self, latitude: f64, longitude: f64, zoom: u8);
    fn open_popup(&mut self, marker: &Self::Marker);
    /// ライブラリ側の資源をすべて解放
    fn destroy(&mut self);
}

struct RenderedMarker<M> {
    handle: M,
    color: &'static str,
}

/// 差分更新の結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub added: usize,
    pub removed: usize,
    pub recolored: usize,
}

/// マーカー層
///
/// 表示中の市町村とマーカーを1:1に保つ。破棄時に地図資源を解放する。
pub struct MarkerLayer<S: MapSurface> {
    surface: S,
    markers: HashMap<UnitId, RenderedMarker<S::Marker>>,
    on_select: Rc<dyn Fn(&str)>,
    destroyed: bool,
}

impl<S: MapSurface> MarkerLayer<S> {
    pub fn new(surface: S, on_select: impl Fn(&str) + 'static) -> Self {
        Self {
            surface,
            markers: HashMap::new(),
            on_select: Rc::new(on_select),
            destroyed: false,
        }
    }

    /// 絞込み結果に合わせてマーカーを差分更新
    ///
    /// 消えた市町村のマーカーを外し、新たに見える市町村を追加し、
    /// 表示モード変更で色が変わったものは塗り直す。
    pub fn sync(&mut self, visible: &[&Unit], mode: ViewMode) -> SyncStats {
        let mut stats = SyncStats::default();
        if self.destroyed {
            return stats;
        }

        let wanted: HashSet<UnitId> = visible.iter().map(|u| u.id).collect();
        let stale: Vec<UnitId> = self
            .markers
            .keys()
            .filter(|id| !wanted.contains(id))
            .copied()
            .collect();
        for id in stale {
            if let Some(marker) = self.markers.remove(&id) {
                self.surface.remove_marker(marker.handle);
                stats.removed += 1;
            }
        }

        for unit in visible {
            let color = marker_color(mode, unit);
            match self.markers.get_mut(&unit.id) {
                Some(marker) => {
                    if marker.color != color {
                        self.surface.set_marker_color(&marker.handle, color);
                        marker.color = color;
                        stats.recolored += 1;
                    }
                }
                None => {
                    let spec = MarkerSpec::for_unit(unit, mode);
                    let on_select = Rc::clone(&self.on_select);
                    let name = unit.name.clone();
                    let handle = self
                        .surface
                        .add_marker(&spec, Box::new(move || on_select(&name)));
                    self.markers.insert(unit.id, RenderedMarker { handle, color });
                    stats.added += 1;
                }
            }
        }

        if stats != SyncStats::default() {
            log::debug!(
                "markers synced: +{} -{} ~{} (total {})",
                stats.added,
                stats.removed,
                stats.recolored,
                self.markers.len()
            );
        }
        stats
    }

    /// 外部からの選択変更に追従
    ///
    /// 表示中なら中心移動とポップアップ表示を行い true を返す。
    /// フィルタで隠れている場合は何もしない。
    pub fn focus(&mut self, unit: &Unit) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(marker) = self.markers.get(&unit.id) else {
            log::debug!("{} is not rendered, skipping focus", unit.name);
            return false;
        };
        self.surface.fly_to(unit.latitude, unit.longitude, FOCUS_ZOOM);
        self.surface.open_popup(&marker.handle);
        true
    }

    pub fn rendered_ids(&self) -> HashSet<UnitId> {
        self.markers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// マーカーと地図インスタンスを解放
    pub fn teardown(&mut self) {
        if self.destroyed {
            return;
        }
        for (_, marker) in self.markers.drain() {
            self.surface.remove_marker(marker.handle);
        }
        self.surface.destroy();
        self.destroyed = true;
    }
}

impl<S: MapSurface> Drop for MarkerLayer<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
