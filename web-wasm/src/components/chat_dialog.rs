//! AI対話ダイアログコンポーネント
//!
//! 会話の状態遷移は `ConversationManager` に任せ、ここでは生成リクエストの
//! 送出と結果の反映、表示の更新だけを行う。

use crate::api::{self, HttpGenerator};
use crate::config::GENERATION_TIMEOUT_SECS;
use crate::download::download_html;
use crate::storage::SessionTranscriptStore;
use ecobalance_common::export::{can_export, render_markdown};
use ecobalance_common::panel::{show_suggestions, status_line};
use ecobalance_common::prompts::{DEFAULT_MODEL, GEMINI_MODELS, SUGGESTED_QUESTIONS};
use ecobalance_common::{
    build_report, ChatMessage, ConversationManager, ExportOptions, PendingGeneration, Role, Unit,
};
use leptos::html::Textarea;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::sync::Arc;

type Manager = ConversationManager<SessionTranscriptStore>;

/// 表示用メッセージ
#[derive(Debug, Clone, PartialEq)]
struct MessageView {
    class: &'static str,
    label: &'static str,
    html: String,
}

fn message_view(message: &ChatMessage) -> MessageView {
    let class = match (message.role, message.is_prompt) {
        (_, true) => "message message-prompt",
        (Role::User, _) => "message message-user",
        _ => "message message-assistant",
    };
    MessageView {
        class,
        label: message.role.label(),
        html: render_markdown(&message.content),
    }
}

/// 質問候補を入力欄へ入れる（送信はしない）
fn fill_suggestion(input: RwSignal<String>, textarea: NodeRef<Textarea>, question: &str) {
    input.set(question.to_string());
    if let Some(element) = textarea.get_untracked() {
        if let Err(e) = element.focus() {
            log::debug!("focus failed: {:?}", e);
        }
    }
}

#[component]
pub fn ChatDialog(
    open: RwSignal<bool>,
    selected: RwSignal<Option<Unit>>,
    all_units: Signal<Option<Arc<[Unit]>>>,
) -> impl IntoView {
    let manager = StoredValue::new_local(Manager::new(SessionTranscriptStore, DEFAULT_MODEL));
    // manager 更新の通知用
    let revision = RwSignal::new(0u64);
    let bump = move || revision.update(|r| *r += 1);

    let input = RwSignal::new(String::new());
    let textarea = NodeRef::<Textarea>::new();
    let show_prompt = RwSignal::new(false);
    let export_error = RwSignal::new(None::<String>);

    let dispatch = move |pending: PendingGeneration| {
        let PendingGeneration { ticket, request, .. } = pending;
        spawn_local(async move {
            let outcome =
                api::generate_with_timeout(&HttpGenerator, &request, GENERATION_TIMEOUT_SECS).await;
            if manager.try_update_value(|m| m.complete(ticket, outcome)).is_none() {
                log::debug!("dialog disposed before response for {}", ticket.unit_id);
                return;
            }
            revision.try_update(|r| *r += 1);
        });
    };

    // 開いている間は選択中の市町村の会話を表示（未開始なら初回分析を依頼）
    Effect::new(move |_| {
        if !open.get() {
            return;
        }
        let Some(unit) = selected.get() else {
            return;
        };
        let pending = manager
            .try_update_value(|m| {
                m.select_unit(&unit);
                m.open_analysis()
            })
            .flatten();
        if let Some(pending) = pending {
            dispatch(pending);
        }
        bump();
    });

    let send_text = move |text: String| {
        let Some(pending) = manager.try_update_value(|m| m.send(&text)).flatten() else {
            return;
        };
        input.set(String::new());
        dispatch(pending);
        bump();
    };

    let messages = move || {
        revision.track();
        let with_prompt = show_prompt.get();
        manager.with_value(|m| {
            m.transcript()
                .iter()
                .filter(|msg| with_prompt || !msg.is_prompt)
                .map(message_view)
                .collect::<Vec<_>>()
        })
    };
    let status = move || {
        revision.track();
        manager.with_value(|m| status_line(m.state()))
    };
    let suggestions_visible = move || {
        revision.track();
        manager.with_value(|m| show_suggestions(m.transcript()))
    };
    let exportable = move || {
        revision.track();
        manager.with_value(|m| can_export(m.transcript()))
    };
    let sendable = move || {
        revision.track();
        let text = input.get();
        manager.with_value(|m| m.can_send(&text))
    };

    let on_export = move |_| {
        let Some(units) = all_units.get_untracked() else {
            return;
        };
        let options = ExportOptions {
            include_prompt: show_prompt.get_untracked(),
        };
        let report = manager.with_value(|m| {
            m.current_unit()
                .map(|unit| build_report(unit, &units, m.transcript(), chrono::Utc::now(), options))
        });
        match report {
            Some(Ok(report)) => match download_html(&report.file_name, &report.html) {
                Ok(()) => export_error.set(None),
                Err(e) => {
                    log::error!("download failed: {:?}", e);
                    export_error.set(Some("No se pudo descargar el informe.".to_string()));
                }
            },
            Some(Err(e)) => {
                log::warn!("export skipped: {}", e);
                export_error.set(Some(e.to_string()));
            }
            None => {}
        }
    };

    view! {
        <Show when=move || open.get()>
            <div class="chat-overlay">
                <div class="chat-dialog" role="dialog">
                    <header class="chat-header">
                        <h2>
                            {move || {
                                selected
                                    .with(|u| u.as_ref().map(|u| format!("🤖 Análisis IA · {}", u.name)))
                                    .unwrap_or_default()
                            }}
                        </h2>
                        <select
                            class="model-select"
                            on:change=move |ev| {
                                let model = event_target_value(&ev);
                                manager.update_value(|m| m.set_model(model));
                                bump();
                            }
                        >
                            {GEMINI_MODELS
                                .iter()
                                .map(|option| {
                                    let id = option.id;
                                    view! {
                                        <option
                                            value=id
                                            selected=move || {
                                                revision.track();
                                                manager.with_value(|m| m.model() == id)
                                            }
                                        >
                                            {option.name}
                                            {if option.free { " (gratis)" } else { "" }}
                                        </option>
                                    }
                                })
                                .collect_view()}
                        </select>
                        <button class="btn-close" on:click=move |_| open.set(false)>"✕"</button>
                    </header>

                    <div class="chat-messages">
                        {move || {
                            messages()
                                .into_iter()
                                .map(|m| {
                                    view! {
                                        <div class=m.class>
                                            <div class="message-role">{m.label}</div>
                                            <div class="message-body" inner_html=m.html></div>
                                        </div>
                                    }
                                })
                                .collect_view()
                        }}
                        {move || {
                            status()
                                .map(|text| {
                                    view! {
                                        <div class="chat-status">
                                            <span class="spinner"></span>
                                            {text}
                                        </div>
                                    }
                                })
                        }}
                    </div>

                    {move || {
                        suggestions_visible()
                            .then(|| {
                                let chips = SUGGESTED_QUESTIONS
                                    .iter()
                                    .map(|question| {
                                        let question = *question;
                                        view! {
                                            <button
                                                class="chip"
                                                on:click=move |_| fill_suggestion(input, textarea, question)
                                            >
                                                {question}
                                            </button>
                                        }
                                    })
                                    .collect_view();
                                view! { <div class="suggestions">{chips}</div> }
                            })
                    }}

                    <div class="chat-input">
                        <textarea
                            node_ref=textarea
                            placeholder="Escribe tu pregunta..."
                            prop:value=move || input.get()
                            on:input=move |ev| input.set(event_target_value(&ev))
                            on:keydown=move |ev| {
                                if ev.key() == "Enter" && !ev.shift_key() {
                                    ev.prevent_default();
                                    send_text(input.get_untracked());
                                }
                            }
                        ></textarea>
                        <button
                            class="btn btn-primary"
                            disabled=move || !sendable()
                            on:click=move |_| send_text(input.get_untracked())
                        >
                            "Enviar"
                        </button>
                    </div>

                    <footer class="chat-footer">
                        <label class="checkbox">
                            <input
                                type="checkbox"
                                prop:checked=move || show_prompt.get()
                                on:change=move |ev| show_prompt.set(event_target_checked(&ev))
                            />
                            "Mostrar contexto del sistema"
                        </label>
                        <button
                            class="btn btn-secondary"
                            disabled=move || !exportable()
                            on:click=on_export
                        >
                            "📄 Exportar conversación"
                        </button>
                        {move || export_error.get().map(|e| view! { <span class="export-error">{e}</span> })}
                    </footer>
                </div>
            </div>
        </Show>
    }
}
