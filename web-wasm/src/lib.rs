//! EcoBalance360 Web App (Leptos + WASM)
//!
//! サンタンデール県の市町村カーボンバランスを地図・詳細パネルで表示し、
//! 選択した市町村についてAIと対話する。

mod api;
mod app;
mod components;
mod config;
mod download;
mod leaflet;
mod logger;
mod storage;

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    logger::init(config::LOG_LEVEL);
    log::info!("EcoBalance360 starting");
    leptos::mount::mount_to_body(app::App);
}
