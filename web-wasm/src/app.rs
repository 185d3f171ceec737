//! メインアプリケーションコンポーネント

use crate::api;
use crate::components::{
    chat_dialog::ChatDialog,
    detail_panel::DetailPanel,
    filter_bar::FilterBar,
    map_view::MapView,
    unit_picker::UnitPicker,
};
use ecobalance_common::panel::{PickerView, DATASET_UNAVAILABLE};
use ecobalance_common::{
    apply_filter, DatasetStore, FilterCriteria, LoadState, SelectionCoordinator, Unit, ViewMode,
};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::sync::Arc;

/// メインアプリケーションコンポーネント
#[component]
pub fn App() -> impl IntoView {
    // アプリケーション状態
    let load_state = RwSignal::new(LoadState::Pending);
    let criteria = RwSignal::new(FilterCriteria::new());
    let view_mode = RwSignal::new(ViewMode::default());
    let selected = RwSignal::new(None::<Unit>);
    let chat_open = RwSignal::new(false);

    // 選択はコーディネータ経由でのみ変更する
    let coordinator = StoredValue::new_local(SelectionCoordinator::new());
    coordinator.update_value(|c| {
        c.subscribe(move |unit: &Unit| selected.set(Some(unit.clone())));
    });

    // データセット読み込み（セッション中一度だけ）
    spawn_local(async move {
        let mut store = DatasetStore::new();
        let state = store.finish(api::fetch_dataset().await).clone();
        if let LoadState::Ready(units) = &state {
            let units = Arc::clone(units);
            coordinator.update_value(|c| {
                c.on_dataset_loaded(units);
            });
        }
        load_state.set(state);
    });

    let all_units = Signal::derive(move || {
        load_state.with(|s| match s {
            LoadState::Ready(units) => Some(Arc::clone(units)),
            _ => None,
        })
    });

    let visible = Memo::new(move |_| {
        load_state.with(|s| match s {
            LoadState::Ready(units) => {
                criteria.with(|c| apply_filter(units, c).into_iter().cloned().collect::<Vec<Unit>>())
            }
            _ => Vec::new(),
        })
    });

    let picker = Signal::derive(move || {
        selected.track();
        let (loaded, failed) = load_state.with(|s| {
            (matches!(s, LoadState::Ready(_)), matches!(s, LoadState::Failed(_)))
        });
        visible.with(|units| {
            let refs: Vec<&Unit> = units.iter().collect();
            coordinator.with_value(|c| PickerView::build(loaded, failed, &refs, c.picker_value(&refs)))
        })
    });

    let on_pick = Callback::new(move |name: String| {
        coordinator.update_value(|c| {
            c.select(&name);
        });
    });

    view! {
        <div class="container">
            <header class="app-header">
                <h1>"EcoBalance360"</h1>
                <p class="subtitle">"Balance de carbono municipal · Santander"</p>
            </header>

            <Show when=move || load_state.with(|s| matches!(s, LoadState::Failed(_)))>
                <div class="alert alert-error">{DATASET_UNAVAILABLE}</div>
            </Show>

            <FilterBar
                criteria=criteria
                view_mode=view_mode
                visible_count=Signal::derive(move || visible.with(Vec::len))
                total=Signal::derive(move || all_units.with(|u| u.as_ref().map_or(0, |u| u.len())))
            />

            <div class="layout">
                <section class="map-column">
                    <UnitPicker picker=picker on_pick=on_pick />
                    <MapView visible=visible view_mode=view_mode selected=selected on_pick=on_pick />
                </section>
                <aside class="panel-column">
                    <DetailPanel
                        selected=selected
                        all_units=all_units
                        on_open_chat=move |_| chat_open.set(true)
                    />
                </aside>
            </div>

            <ChatDialog open=chat_open selected=selected all_units=all_units />
        </div>
    }
}
