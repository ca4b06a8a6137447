//! HAML Code Generator
//!
//! Compiles HAML templates into the body of a JavaScript function taking a
//! single `context` argument. The body renders the template to an HTML string
//! with the help of the `haml.HamlRuntime` browser library.
//!
//! ```text
//! source → Compiler (haml-parser) → JavascriptGenerator → function body
//! ```

pub mod js;

pub use js::JavascriptGenerator;

use haml_parser::{compile_with, default_filters, Compilation, CompileOptions, FilterRegistry, ParseError};

/// Compile a template to a JavaScript function body.
///
/// In tolerant mode skipped faults are logged and dropped; use
/// [`compile_template`] to get them back.
pub fn compile(
    template_name: &str,
    source: &str,
    options: &CompileOptions,
) -> Result<String, ParseError> {
    compile_template(template_name, source, options).map(|compilation| compilation.code)
}

/// Compile with the built-in filters, keeping the diagnostics.
pub fn compile_template(
    template_name: &str,
    source: &str,
    options: &CompileOptions,
) -> Result<Compilation, ParseError> {
    compile_template_with(template_name, source, options, default_filters())
}

/// Compile against a caller-supplied filter registry.
pub fn compile_template_with(
    template_name: &str,
    source: &str,
    options: &CompileOptions,
    filters: &FilterRegistry,
) -> Result<Compilation, ParseError> {
    let mut generator = JavascriptGenerator::new();
    compile_with(&mut generator, template_name, source, options, filters)
}
