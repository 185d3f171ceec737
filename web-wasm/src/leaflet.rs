//! Leaflet ブリッジ
//!
//! 地図インスタンスを独占し、`MapSurface` として `MarkerLayer` に提供する。
//! Leaflet 本体は index.html で読み込んだグローバル `L` を JS 側で使う。

use ecobalance_common::map::{INITIAL_CENTER, INITIAL_ZOOM};
use ecobalance_common::{MapSurface, MarkerSpec};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(module = "/js/leaflet-bridge.js")]
extern "C" {
    #[wasm_bindgen(js_name = "createMap")]
    fn create_map_js(container: &web_sys::HtmlElement, lat: f64, lng: f64, zoom: u8) -> JsValue;

    #[wasm_bindgen(js_name = "addCircleMarker")]
    fn add_circle_marker_js(map: &JsValue, options: JsValue, on_click: &Closure<dyn Fn()>) -> JsValue;

    #[wasm_bindgen(js_name = "setMarkerColor")]
    fn set_marker_color_js(marker: &JsValue, color: &str);

    #[wasm_bindgen(js_name = "removeMarker")]
    fn remove_marker_js(map: &JsValue, marker: &JsValue);

    #[wasm_bindgen(js_name = "flyTo")]
    fn fly_to_js(map: &JsValue, lat: f64, lng: f64, zoom: u8);

    #[wasm_bindgen(js_name = "openPopup")]
    fn open_popup_js(marker: &JsValue);

    #[wasm_bindgen(js_name = "destroyMap")]
    fn destroy_map_js(map: &JsValue);
}

// ============================================
// データ型定義
// ============================================

/// JavaScript側に渡すマーカー設定
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsMarkerOptions {
    pub lat: f64,
    pub lng: f64,
    pub color: String,
    pub radius: u8,
    pub title: String,
    pub popup_html: String,
}

impl From<&MarkerSpec> for JsMarkerOptions {
    fn from(spec: &MarkerSpec) -> Self {
        Self {
            lat: spec.latitude,
            lng: spec.longitude,
            color: spec.color.to_string(),
            radius: spec.radius,
            title: spec.name.clone(),
            popup_html: spec.popup_html.clone(),
        }
    }
}

/// 描画済みマーカー
///
/// クリックハンドラはマーカーと同じ寿命で保持する。
pub struct LeafletMarker {
    handle: JsValue,
    _on_click: Closure<dyn Fn()>,
}

pub struct LeafletSurface {
    map: JsValue,
}

impl LeafletSurface {
    pub fn new(container: &web_sys::HtmlElement) -> Self {
        let map = create_map_js(container, INITIAL_CENTER.0, INITIAL_CENTER.1, INITIAL_ZOOM);
        log::debug!("leaflet map created");
        Self { map }
    }
}

impl MapSurface for LeafletSurface {
    type Marker = LeafletMarker;

    fn add_marker(&mut self, spec: &MarkerSpec, on_click: Box<dyn Fn()>) -> LeafletMarker {
        let options = serde_wasm_bindgen::to_value(&JsMarkerOptions::from(spec)).unwrap_or_else(|e| {
            log::error!("marker options for {} not serializable: {}", spec.name, e);
            JsValue::UNDEFINED
        });
        let on_click = Closure::wrap(on_click);
        let handle = add_circle_marker_js(&self.map, options, &on_click);
        LeafletMarker {
            handle,
            _on_click: on_click,
        }
    }

    fn set_marker_color(&mut self, marker: &LeafletMarker, color: &str) {
        set_marker_color_js(&marker.handle, color);
    }

    fn remove_marker(&mut self, marker: LeafletMarker) {
        remove_marker_js(&self.map, &marker.handle);
    }

    fn fly_to(&mut self, latitude: f64, longitude: f64, zoom: u8) {
        fly_to_js(&self.map, latitude, longitude, zoom);
    }

    fn open_popup(&mut self, marker: &LeafletMarker) {
        open_popup_js(&marker.handle);
    }

    fn destroy(&mut self) {
        destroy_map_js(&self.map);
        self.map = JsValue::NULL;
        log::debug!("leaflet map destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecobalance_common::map::FALLBACK_COLOR;

    #[test]
    fn test_marker_options_from_spec() {
        let spec = MarkerSpec {
            unit_id: 68001,
            name: "BUCARAMANGA".to_string(),
            latitude: 7.119,
            longitude: -73.122,
            color: FALLBACK_COLOR,
            radius: 8,
            popup_html: "<h3>BUCARAMANGA</h3>".to_string(),
        };

        let options = JsMarkerOptions::from(&spec);
        assert_eq!(options.lat, 7.119);
        assert_eq!(options.lng, -73.122);
        assert_eq!(options.color, "#fbbf24");
        assert_eq!(options.title, "BUCARAMANGA");

        let value = serde_json::to_value(&options).expect("シリアライズ失敗");
        assert_eq!(value["popupHtml"], "<h3>BUCARAMANGA</h3>");
        assert_eq!(value["radius"], 8);
    }
}
