//! 市町村ピッカーコンポーネント

use ecobalance_common::panel::PickerView;
use leptos::prelude::*;

#[component]
pub fn UnitPicker(picker: Signal<PickerView>, on_pick: Callback<String>) -> impl IntoView {
    view! {
        <div class="unit-picker">
            <label for="unit-picker">"Municipio"</label>
            {move || {
                let options = picker.get();
                let placeholder = options.placeholder();
                let (names, value) = match options {
                    PickerView::Options { names, value } => (names, value),
                    _ => (Vec::new(), None),
                };
                let disabled = names.is_empty();
                let no_value = value.is_none();
                let items = names
                    .into_iter()
                    .map(|name| {
                        let is_selected = value.as_deref() == Some(name.as_str());
                        view! { <option value=name.clone() selected=is_selected>{name.clone()}</option> }
                    })
                    .collect_view();

                view! {
                    <select
                        id="unit-picker"
                        disabled=disabled
                        prop:value=value.clone().unwrap_or_default()
                        on:change=move |ev| {
                            let name = event_target_value(&ev);
                            if !name.is_empty() {
                                on_pick.run(name);
                            }
                        }
                    >
                        <option value="" disabled=true selected=no_value>{placeholder}</option>
                        {items}
                    </select>
                }
            }}
        </div>
    }
}
