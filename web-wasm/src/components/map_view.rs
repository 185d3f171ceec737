//! 地図コンポーネント
//!
//! 地図インスタンスは `MarkerLayer` が独占する。ここでは絞込み結果と
//! 選択の変化をレイヤーへ流し、アンマウント時に解放するだけ。

use crate::leaflet::LeafletSurface;
use ecobalance_common::map::legend;
use ecobalance_common::{MarkerLayer, Unit, ViewMode};
use leptos::html::Div;
use leptos::prelude::*;

#[component]
pub fn MapView(
    visible: Memo<Vec<Unit>>,
    view_mode: RwSignal<ViewMode>,
    selected: RwSignal<Option<Unit>>,
    on_pick: Callback<String>,
) -> impl IntoView {
    let container = NodeRef::<Div>::new();
    let layer = StoredValue::new_local(None::<MarkerLayer<LeafletSurface>>);

    // マーカー差分更新（初回は地図を生成）
    Effect::new(move |_| {
        let Some(element) = container.get() else {
            return;
        };
        let mode = view_mode.get();
        visible.with(|units| {
            let refs: Vec<&Unit> = units.iter().collect();
            layer.update_value(|slot| {
                let created = slot.is_none();
                let layer = slot.get_or_insert_with(|| {
                    MarkerLayer::new(LeafletSurface::new(&element), move |name: &str| {
                        on_pick.run(name.to_string())
                    })
                });
                layer.sync(&refs, mode);
                if created {
                    if let Some(unit) = selected.get_untracked() {
                        layer.focus(&unit);
                    }
                }
            });
        });
    });

    // 外部からの選択変更に追従
    Effect::new(move |_| {
        let Some(unit) = selected.get() else {
            return;
        };
        layer.update_value(|slot| {
            if let Some(layer) = slot.as_mut() {
                layer.focus(&unit);
            }
        });
    });

    on_cleanup(move || {
        layer.update_value(|slot| {
            if let Some(mut layer) = slot.take() {
                layer.teardown();
            }
        });
    });

    view! {
        <div class="map-view">
            <div class="map-container" node_ref=container></div>
            <div class="legend">
                <h4>{move || view_mode.get().label()}</h4>
                {move || {
                    legend(view_mode.get())
                        .into_iter()
                        .map(|(color, label)| {
                            view! {
                                <div class="legend-item">
                                    <span class="legend-dot" style=format!("background-color: {}", color)></span>
                                    <span>{label}</span>
                                </div>
                            }
                        })
                        .collect_view()
                }}
            </div>
        </div>
    }
}
