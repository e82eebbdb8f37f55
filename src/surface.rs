// JS-backed alert surface. The content script passes an object with
// `show(alertJson)` and `remove(alertId)`; `show` also arms the dismiss timer
// and calls `engine.alert_expired(token)` when it fires.

use js_sys::{Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::error::EngineError;
use crate::presenter::AlertSurface;
use crate::types::Alert;

#[derive(Debug)]
pub struct JsAlertSurface {
    target: JsValue,
    show: Function,
    remove: Function,
}

impl JsAlertSurface {
    pub fn from_js(target: JsValue) -> Result<Self, EngineError> {
        let show = method(&target, "show")?;
        let remove = method(&target, "remove")?;
        Ok(JsAlertSurface {
            target,
            show,
            remove,
        })
    }
}

fn method(target: &JsValue, name: &str) -> Result<Function, EngineError> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
        .ok_or_else(|| {
            EngineError::InvalidConfig(format!("alert surface has no `{}` function", name))
        })
}

impl AlertSurface for JsAlertSurface {
    fn show(&mut self, alert: &Alert) -> Result<(), EngineError> {
        let alert_json = serde_json::to_string(alert)?;
        self.show
            .call1(&self.target, &JsValue::from_str(&alert_json))
            .map(|_| ())
            .map_err(|err| EngineError::Render(format!("{:?}", err)))
    }

    fn remove(&mut self, alert_id: &str) -> Result<(), EngineError> {
        self.remove
            .call1(&self.target, &JsValue::from_str(alert_id))
            .map(|_| ())
            .map_err(|err| EngineError::Render(format!("{:?}", err)))
    }
}
