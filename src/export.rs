use crate::error::Result;
use ecobalance_common::export::{build_report, ExportOptions};
use ecobalance_common::{ChatMessage, Unit};
use std::path::{Path, PathBuf};

/// 会話レポートをHTMLファイルとして書き出す
///
/// # Returns
/// 書き出したファイルのパス
pub fn write_report(
    output_dir: &Path,
    unit: &Unit,
    all_units: &[Unit],
    transcript: &[ChatMessage],
    options: ExportOptions,
) -> Result<PathBuf> {
    let report = build_report(unit, all_units, transcript, chrono::Utc::now(), options)?;

    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(&report.file_name);
    std::fs::write(&path, report.html)?;
    Ok(path)
}
