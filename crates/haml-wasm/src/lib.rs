//! WASM bindings for the HAML compiler.
//!
//! Exposes `compile()` to JavaScript via wasm-bindgen.
//! Returns a JS object `{ code, diagnostics }` or throws on error.

use haml_parser::{Compilation, CompileOptions};
use wasm_bindgen::prelude::*;

/// Compile a HAML template to a JavaScript function body.
///
/// `options` is an optional object such as `{ tolerateFaults: true }`.
/// Returns `{ code: string, diagnostics: string[] }`; the diagnostics list the
/// faults skipped in tolerant mode. Throws a JS error if the template does not
/// compile.
#[wasm_bindgen]
pub fn compile(template_name: &str, source: &str, options: JsValue) -> Result<JsValue, JsError> {
    let options: CompileOptions = if options.is_undefined() || options.is_null() {
        CompileOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|e| JsError::new(&format!("Invalid options: {e}")))?
    };

    let compilation = compile_source(template_name, source, &options)
        .map_err(|e| JsError::new(&e.to_string()))?;

    let diagnostics = js_sys::Array::new();
    for diagnostic in diagnostic_messages(&compilation) {
        diagnostics.push(&JsValue::from_str(&diagnostic));
    }

    let js_obj = js_sys::Object::new();
    js_sys::Reflect::set(&js_obj, &"code".into(), &compilation.code.into())
        .map_err(|_| JsError::new("Failed to set code property"))?;
    js_sys::Reflect::set(&js_obj, &"diagnostics".into(), &diagnostics.into())
        .map_err(|_| JsError::new("Failed to set diagnostics property"))?;

    Ok(js_obj.into())
}

/// Get the compiler version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn compile_source(
    template_name: &str,
    source: &str,
    options: &CompileOptions,
) -> Result<Compilation, haml_parser::ParseError> {
    haml_codegen::compile_template(template_name, source, options)
}

fn diagnostic_messages(compilation: &Compilation) -> Vec<String> {
    compilation
        .diagnostics
        .iter()
        .map(ToString::to_string)
        .collect()
}
