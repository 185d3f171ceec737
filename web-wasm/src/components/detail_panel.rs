//! 詳細パネルコンポーネント

use ecobalance_common::panel::PanelView;
use ecobalance_common::Unit;
use leptos::prelude::*;
use std::sync::Arc;

#[component]
pub fn DetailPanel<F>(
    selected: RwSignal<Option<Unit>>,
    all_units: Signal<Option<Arc<[Unit]>>>,
    on_open_chat: F,
) -> impl IntoView
where
    F: Fn(()) + Send + Sync + 'static + Clone,
{
    let panel = Memo::new(move |_| {
        let unit = selected.get()?;
        let units = all_units.get()?;
        Some(PanelView::build(&unit, &units))
    });

    view! {
        <div class="detail-panel">
            {move || match panel.get() {
                None => view! { <p class="text-muted">"Selecciona un municipio en el mapa"</p> }.into_any(),
                Some(p) => {
                    let on_open_chat = on_open_chat.clone();
                    let breakdown = p
                        .breakdown
                        .into_iter()
                        .map(|metric| {
                            view! {
                                <li>
                                    <span class="metric-label">{metric.label}</span>
                                    <span class="metric-value">{metric.value}</span>
                                </li>
                            }
                        })
                        .collect_view();

                    view! {
                        <h2 class="unit-name">{p.name}</h2>
                        <div class=format!("balance-card {}", p.tone.css_class())>
                            <span class="label">"Balance de Carbono"</span>
                            <span class="value">{p.balance}</span>
                        </div>
                        <div class="badges">
                            <span class="badge">{p.classification}</span>
                            <span class="badge badge-ranking">{p.ranking}</span>
                        </div>
                        <p class="profile">{p.profile}</p>

                        <div class="cards">
                            <div class="card">
                                <span class="label">"Emisiones Totales"</span>
                                <span class="value">{p.total_emissions}</span>
                            </div>
                            <div class="card">
                                <span class="label">"Captura Bosques"</span>
                                <span class="value">{p.forest_capture}</span>
                            </div>
                        </div>

                        <h3>"Desglose de Emisiones"</h3>
                        <ul class="breakdown">{breakdown}</ul>

                        <div class="population">
                            <div>{p.population}</div>
                            <div>"Emisiones per cápita: "{p.emissions_per_capita}</div>
                            <div>"Balance per cápita: "{p.balance_per_capita}</div>
                        </div>

                        <button class="btn btn-primary" on:click=move |_| on_open_chat(())>
                            "🤖 Análisis con IA"
                        </button>
                    }
                    .into_any()
                }
            }}
        </div>
    }
}
