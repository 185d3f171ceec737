//! HTMLレポート出力の統合テスト

use ecobalance::export::write_report;
use ecobalance_common::export::ExportOptions;
use ecobalance_common::{ChatMessage, EmissionBreakdown, Error as CommonError, Unit};
use ecobalance::error::EcoBalanceError;
use tempfile::tempdir;

fn create_test_unit(id: u32, name: &str, balance: f64) -> Unit {
    Unit {
        id,
        name: name.to_string(),
        population: 20_000,
        total_emissions: 80_000.0,
        forest_capture: 12_345.0,
        balance,
        emissions_per_capita: 4.0,
        balance_per_capita: balance / 20_000.0,
        classification: if balance > 0.0 { "Emisor".into() } else { "Sumidero".into() },
        profile: "Agrícola-Ganadero".into(),
        index: 55.0,
        cluster: 0,
        latitude: 6.5,
        longitude: -73.5,
        emissions: EmissionBreakdown::default(),
    }
}

/// 87件の市町村（収支は id に比例）
fn create_dataset() -> Vec<Unit> {
    (0..87)
        .map(|i| create_test_unit(68000 + i, &format!("MUNICIPIO {}", i), (i as f64 - 40.0) * 1000.0))
        .collect()
}

fn create_transcript() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system_prompt("Eres un experto en análisis ambiental"),
        ChatMessage::assistant("## Situación\n\n1. Energía\n2. Agricultura\n\nUsa *biogás*."),
        ChatMessage::user("¿Y la `deforestación`?"),
        ChatMessage::assistant("Es **baja**."),
    ]
}

#[test]
fn test_report_written_with_ranking() {
    let dir = tempdir().expect("Failed to create temp dir");
    let units = create_dataset();
    // id 68086 は収支最大 → 1位、68000 は最下位
    let top = &units[86];
    let bottom = &units[0];

    let path = write_report(dir.path(), top, &units, &create_transcript(), ExportOptions::default())
        .expect("レポート出力失敗");
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
    assert!(file_name.starts_with("EcoBalance360_Chat_MUNICIPIO 86_"));
    assert!(file_name.ends_with(".html"));

    let html = std::fs::read_to_string(&path).expect("読み込み失敗");
    assert!(html.contains("MUNICIPIO 86"));
    assert!(html.contains("#1 de 87"));
    assert!(html.contains("+46.000 ton CO₂eq"));
    assert!(html.contains("12.345 ton"));
    assert!(html.contains("<h2>Situación</h2>"));
    assert!(html.contains("<em>biogás</em>"));
    assert!(html.contains("<strong>baja</strong>"));
    assert_eq!(html.matches("class=\"message-label\"").count(), 3);
    assert!(!html.contains("Eres un experto"));

    let path = write_report(dir.path(), bottom, &units, &create_transcript(), ExportOptions::default())
        .expect("レポート出力失敗");
    let html = std::fs::read_to_string(path).expect("読み込み失敗");
    assert!(html.contains("#87 de 87"));
    assert!(html.contains("-40.000 ton CO₂eq"));
}

#[test]
fn test_report_is_self_contained() {
    let dir = tempdir().expect("Failed to create temp dir");
    let units = create_dataset();
    let path = write_report(dir.path(), &units[3], &units, &create_transcript(), ExportOptions::default())
        .expect("レポート出力失敗");
    let html = std::fs::read_to_string(path).expect("読み込み失敗");

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<style>"));
    assert!(!html.contains("<link"));
    assert!(!html.contains("<script"));
}

#[test]
fn test_empty_transcript_writes_nothing() {
    let dir = tempdir().expect("Failed to create temp dir");
    let units = create_dataset();
    let result = write_report(
        dir.path(),
        &units[0],
        &units,
        &[ChatMessage::system_prompt("ctx")],
        ExportOptions::default(),
    );

    assert!(matches!(result, Err(EcoBalanceError::Common(CommonError::EmptyTranscript))));
    assert_eq!(std::fs::read_dir(dir.path()).expect("ディレクトリ読み込み失敗").count(), 0);
}
