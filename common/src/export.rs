//! 会話レポートのHTMLエクスポート
//!
//! 外部リソースに依存しない単一HTML（インラインCSSのみ）を生成する。
//! メッセージ本文はMarkdownとして描画し、本文中の生HTMLはテキストとして扱う。

use crate::conversation::{ChatMessage, Role};
use crate::dataset::balance_ranking;
use crate::error::{Error, Result};
use crate::format::{escape_html, format_number, format_signed};
use crate::types::Unit;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use pulldown_cmark::{html, Event, Options, Parser};

pub const REPORT_PREFIX: &str = "EcoBalance360";
pub const REPORT_SOURCE: &str = "Chat";

const MONTHS_ES: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio",
    "julio", "agosto", "septiembre", "octubre", "noviembre", "diciembre",
];

/// エクスポート設定
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// システム文脈メッセージも出力する
    pub include_prompt: bool,
}

/// 生成済みレポート
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub file_name: String,
    pub html: String,
}

/// `EcoBalance360_Chat_<市町村名>_<YYYY-MM-DD>.html`
pub fn export_file_name(unit: &Unit, date: NaiveDate) -> String {
    let name: String = unit
        .name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!(
        "{}_{}_{}_{}.html",
        REPORT_PREFIX,
        REPORT_SOURCE,
        name,
        date.format("%Y-%m-%d")
    )
}

/// Markdown → HTML
///
/// 表・取り消し線・タスクリストに対応。生HTMLはエスケープされたテキストになる。
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(content, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// スペイン語の長い日付表記（例: "16 de octubre de 2026"）
pub fn long_date_es(date: NaiveDate) -> String {
    let month = MONTHS_ES[date.month0() as usize];
    format!("{} de {} de {}", date.day(), month, date.year())
}

/// エクスポート可能か（プロンプト以外のメッセージが1件以上）
pub fn can_export(transcript: &[ChatMessage]) -> bool {
    transcript.iter().any(|m| !m.is_prompt)
}

/// レポートを生成
///
/// # Arguments
/// * `unit` - 対象の市町村
/// * `all_units` - 順位計算に使う全データセット
/// * `transcript` - 対象市町村の会話履歴
/// * `generated_at` - 生成日時（ファイル名とフッターに使用）
///
/// # Returns
/// プロンプト以外のメッセージがなければ `Error::EmptyTranscript`
pub fn build_report(
    unit: &Unit,
    all_units: &[Unit],
    transcript: &[ChatMessage],
    generated_at: DateTime<Utc>,
    options: ExportOptions,
) -> Result<ExportReport> {
    if !can_export(transcript) {
        return Err(Error::EmptyTranscript);
    }

    let ranking = balance_ranking(all_units, unit.id)
        .ok_or_else(|| Error::UnknownUnit(unit.name.clone()))?;
    let date = generated_at.date_naive();

    let messages: Vec<String> = transcript
        .iter()
        .filter(|m| options.include_prompt || !m.is_prompt)
        .map(render_message)
        .collect();

    let balance_class = if unit.balance > 0.0 { "positive" } else { "negative" };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="UTF-8">
<title>{prefix} - Chat - {name}</title>
<style>
{style}
</style>
</head>
<body>

<div class="header">
    <div class="title">{prefix} - Reporte de Conversación</div>
    <div class="subtitle">Balance de Carbono Municipal</div>
</div>

<div class="municipality-info">
    <div class="municipality-name">{name}</div>
    <div class="info-row">
        <div class="info-label">Ranking</div>
        <div class="info-value">#{ranking} de {total}</div>
    </div>
    <div class="info-row">
        <div class="info-label">Balance de Carbono</div>
        <div class="info-value {balance_class}">{balance} ton CO₂eq</div>
    </div>
    <div class="info-row">
        <div class="info-label">Emisiones Totales</div>
        <div class="info-value positive">{emissions} ton</div>
    </div>
    <div class="info-row">
        <div class="info-label">Captura de Bosques</div>
        <div class="info-value negative">{capture} ton</div>
    </div>
</div>

<div class="chat-section">
    <div class="chat-header">Conversación con Asistente de IA</div>
{messages}
</div>

<div class="footer">
    <strong>{prefix}</strong> - Colectivo HAGAMOS<br>
    Mapa Nacional de Captura y Emisiones de Carbono<br>
    Datos al Ecosistema 2025 - MinTIC Colombia<br>
    Generado el {generated}
</div>

</body>
</html>
"#,
        prefix = REPORT_PREFIX,
        name = escape_html(&unit.name),
        style = REPORT_STYLE,
        ranking = ranking,
        total = all_units.len(),
        balance_class = balance_class,
        balance = format_signed(unit.balance, 0),
        emissions = format_number(unit.total_emissions, 0),
        capture = format_number(unit.forest_capture, 0),
        messages = messages.join("\n"),
        generated = long_date_es(date),
    );

    log::info!(
        "exported {} messages for {} ({} bytes)",
        messages.len(),
        unit.name,
        html.len()
    );

    Ok(ExportReport {
        file_name: export_file_name(unit, date),
        html,
    })
}

fn render_message(message: &ChatMessage) -> String {
    let class = match message.role {
        Role::User => "message user",
        Role::Assistant => "message",
        Role::System => "message system",
    };
    format!(
        r#"    <div class="{class}">
        <div class="message-label">{label}</div>
        <div class="message-content">{content}</div>
    </div>"#,
        class = class,
        label = message.role.label(),
        content = render_markdown(&message.content),
    )
}

const REPORT_STYLE: &str = r#"    * { margin: 0; padding: 0; box-sizing: border-box; }
    body { font-family: Arial, sans-serif; padding: 20px; background: #fff; color: #000; }
    .header { border-bottom: 2px solid #10b981; padding-bottom: 20px; margin-bottom: 20px; }
    .title { font-size: 24px; font-weight: bold; }
    .subtitle { font-size: 14px; color: #666; margin-top: 5px; }
    .municipality-info { background: #f5f5f5; border: 2px solid #10b981; padding: 20px; margin-bottom: 20px; }
    .municipality-name { font-size: 22px; font-weight: bold; margin-bottom: 10px; }
    .info-row { margin: 10px 0; padding: 10px; background: #fff; border-left: 3px solid #10b981; }
    .info-label { font-size: 10px; text-transform: uppercase; color: #666; }
    .info-value { font-size: 16px; font-weight: bold; }
    .positive { color: #dc2626; }
    .negative { color: #059669; }
    .chat-section { margin-top: 20px; }
    .chat-header { font-size: 18px; font-weight: bold; margin-bottom: 15px; }
    .message { margin: 15px 0; padding: 15px; background: #f5f5f5; border-left: 4px solid #10b981; }
    .message.user { background: #e3f2fd; border-left-color: #3b82f6; }
    .message.system { background: #fafafa; border-left-color: #9ca3af; }
    .message-label { font-size: 11px; font-weight: bold; text-transform: uppercase; color: #666; margin-bottom: 5px; }
    .message-content { font-size: 14px; line-height: 1.6; }
    .message-content p { margin: 8px 0; }
    .message-content ul, .message-content ol { margin: 8px 0; padding-left: 20px; }
    .message-content li { margin: 4px 0; }
    .message-content code { background: #f0f0f0; padding: 2px 4px; border-radius: 3px; font-family: monospace; }
    .message-content pre { background: #f0f0f0; padding: 10px; border-radius: 5px; overflow-x: auto; }
    .message-content table { border-collapse: collapse; margin: 8px 0; }
    .message-content th, .message-content td { border: 1px solid #ddd; padding: 4px 8px; }
    .message-content h1, .message-content h2, .message-content h3 { margin: 12px 0 8px 0; }
    .footer { margin-top: 40px; padding-top: 20px; border-top: 2px solid #e5e5e5; text-align: center; font-size: 12px; color: #666; }
    @media print {
        body { padding: 10mm; }
        .message { page-break-inside: avoid; }
        .municipality-info { page-break-after: avoid; }
    }
    @page { size: A4; margin: 15mm; }"#;
