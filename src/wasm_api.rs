//! WASM exports for showing serialized figures from JavaScript.
//!
//! Only compiled when targeting wasm32.

#![cfg(target_arch = "wasm32")]

use tracing::warn;
use wasm_bindgen::prelude::*;

use crate::core::{Dashboard, Figure};
use crate::runtime::run_dashboard;

/// JavaScript-accessible dashboard wrapper
#[wasm_bindgen]
pub struct JsDashboard {
    dashboard: Dashboard,
    /// HTML canvas element ID (without #)
    canvas_id: String,
    started: bool,
}

#[wasm_bindgen]
impl JsDashboard {
    /// Create a dashboard from `Dashboard` JSON
    #[wasm_bindgen(constructor)]
    pub fn new(json: &str, canvas_id: &str) -> Result<JsDashboard, JsValue> {
        let dashboard =
            Dashboard::from_json(json).map_err(|e| JsValue::from_str(&format!("{e:?}")))?;
        Ok(JsDashboard {
            dashboard,
            canvas_id: canvas_id.to_string(),
            started: false,
        })
    }

    /// Append a figure serialized with `Figure::to_json`
    #[wasm_bindgen]
    pub fn add_figure(&mut self, json: &str) -> Result<(), JsValue> {
        if self.started {
            return Err(JsValue::from_str("dashboard already started"));
        }
        let figure = Figure::from_json(json).map_err(|e| JsValue::from_str(&format!("{e:?}")))?;
        self.dashboard.figures.push(figure);
        Ok(())
    }

    /// Start the Bevy render loop; later calls are ignored
    #[wasm_bindgen]
    pub fn start(&mut self) {
        if self.started {
            warn!(canvas = %self.canvas_id, "dashboard already started");
            return;
        }
        self.started = true;
        run_dashboard(self.dashboard.clone(), &self.canvas_id);
    }

    #[wasm_bindgen]
    pub fn to_json(&self) -> Result<String, JsValue> {
        self.dashboard
            .to_json()
            .map_err(|e| JsValue::from_str(&format!("{e:?}")))
    }

    #[wasm_bindgen(getter)]
    pub fn canvas_id(&self) -> String {
        self.canvas_id.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn figure_count(&self) -> usize {
        self.dashboard.figures.len()
    }

    #[wasm_bindgen(getter)]
    pub fn is_started(&self) -> bool {
        self.started
    }
}
