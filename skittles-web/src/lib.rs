//! Skittles WASM Web Runtime
//!
//! A ball and five rows of pins on a floor, simulated with rapier3d and drawn
//! with the skittles forward renderer. The hit sound plays on hard impacts and
//! the play button launches the ball once.

#[cfg(target_arch = "wasm32")]
mod app;
pub mod clock;
pub mod config;
pub mod controls;
pub mod demo;
pub mod factory;
pub mod impulse;
pub mod input;
pub mod physics;
pub mod registry;
pub mod scene;
pub mod sound;
pub mod transform;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Entry point, called when the WASM module loads.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("Logger already set: {e}").into());
    }
    log::info!("Skittles Web Runtime initialized");
}

/// Build the scene on the canvas matching `canvas_selector` and start the loop.
///
/// `config_toml` overrides any subset of the defaults.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn run(canvas_selector: String, config_toml: Option<String>) -> Result<(), JsValue> {
    let config = match config_toml {
        Some(source) => config::DemoConfig::from_toml(&source)
            .map_err(|e| JsValue::from_str(&format!("{e:#}")))?,
        None => config::DemoConfig::default(),
    };
    app::start_app(&canvas_selector, config).await
}
