use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::asset::amount::AssetAmount;
use crate::broadcast::ErrorClassification;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = JSON)]
    fn parse(s: &str) -> JsValue;

    #[wasm_bindgen(js_namespace = Object, js_name = assign)]
    fn object_assign(target: &JsValue, source: &JsValue) -> JsValue;
}

fn to_js(value: &serde_json::Value) -> JsValue {
    match serde_json::to_string(value) {
        Ok(json_str) => parse(&json_str),
        Err(_) => JsValue::NULL,
    }
}

fn error_result(msg: &str) -> JsValue {
    let obj = serde_json::json!({"error": msg});
    to_js(&obj)
}

/// Parse `"<magnitude> <symbol>"` and describe its wire encoding.
#[wasm_bindgen]
pub fn parse_amount(text: &str) -> JsValue {
    match AssetAmount::parse(text) {
        Ok(amount) => {
            let obj = serde_json::json!({
                "text": amount.to_text(),
                "symbol": amount.symbol(),
                "precision": amount.precision(),
                "scaled": amount.scaled().to_string(),
                "bytes": amount.to_bytes().to_vec(),
            });
            to_js(&obj)
        }
        Err(err) => error_result(&err.to_string()),
    }
}

/// The 16-byte wire form of an amount, or `undefined` when it does not parse.
#[wasm_bindgen]
pub fn amount_to_bytes(text: &str) -> Option<Vec<u8>> {
    AssetAmount::parse(text)
        .ok()
        .map(|amount| amount.to_bytes().to_vec())
}

/// Classify a raw RPC error response (JSON text) from a failed broadcast.
#[wasm_bindgen]
pub fn classify_error(json: Option<String>) -> JsValue {
    let classification = ErrorClassification::classify_json(json.as_deref());
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    let fields = match classification.serialize(&serializer) {
        Ok(v) => v,
        Err(_) => return JsValue::NULL,
    };
    let summary = serde_json::json!({
        "render": classification.render(),
        "action": classification.recommended_action().as_ref(),
        "fallbackAction": classification.fallback_action().as_ref(),
    });
    let summary = to_js(&summary);
    object_assign(&fields, &summary)
}
