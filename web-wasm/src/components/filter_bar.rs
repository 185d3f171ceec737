//! フィルタバーコンポーネント
//!
//! 区分・プロファイルのタグをトグルし、地図の配色モードを切り替える。

use ecobalance_common::panel::count_label;
use ecobalance_common::{Classification, FilterCriteria, Profile, ViewMode};
use leptos::prelude::*;

#[component]
pub fn FilterBar(
    criteria: RwSignal<FilterCriteria>,
    view_mode: RwSignal<ViewMode>,
    visible_count: Signal<usize>,
    total: Signal<usize>,
) -> impl IntoView {
    let classification_chips = Classification::ALL
        .into_iter()
        .map(|tag| {
            let label = tag.as_str().to_string();
            let current = tag.clone();
            view! {
                <button
                    class="chip"
                    class:active=move || criteria.with(|c| c.classifications.contains(&current))
                    on:click=move |_| criteria.update(|c| c.toggle_classification(tag.clone()))
                >
                    {label}
                </button>
            }
        })
        .collect_view();

    let profile_chips = Profile::ALL
        .into_iter()
        .map(|tag| {
            let label = tag.as_str().to_string();
            let current = tag.clone();
            view! {
                <button
                    class="chip"
                    class:active=move || criteria.with(|c| c.profiles.contains(&current))
                    on:click=move |_| criteria.update(|c| c.toggle_profile(tag.clone()))
                >
                    {label}
                </button>
            }
        })
        .collect_view();

    let mode_button = move |mode: ViewMode| {
        view! {
            <button
                class="btn btn-small"
                class:active=move || view_mode.get() == mode
                on:click=move |_| view_mode.set(mode)
            >
                {mode.label()}
            </button>
        }
    };

    view! {
        <div class="filter-bar">
            <div class="filter-group">
                <span class="filter-title">
                    "Filtros"
                    {move || {
                        let active = criteria.with(FilterCriteria::active_count);
                        (active > 0).then(|| view! { <span class="filter-count">{active}</span> })
                    }}
                </span>
                <div class="chips">{classification_chips}</div>
                <div class="chips">{profile_chips}</div>
                <button
                    class="btn btn-tertiary btn-small"
                    disabled=move || criteria.with(FilterCriteria::is_empty)
                    on:click=move |_| criteria.update(FilterCriteria::clear)
                >
                    "Limpiar filtros"
                </button>
            </div>

            <div class="view-mode">
                {mode_button(ViewMode::Balance)}
                {mode_button(ViewMode::Profile)}
            </div>

            <p class="unit-count">{move || count_label(visible_count.get(), total.get())}</p>
        </div>
    }
}
