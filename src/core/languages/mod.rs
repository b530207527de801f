//! Per-language lexical extraction profiles.
//!
//! Each supported language gets one profile implementing a consistent
//! interface: import, export, function, and class rules over raw source
//! text. The rules are deliberately lexical rather than a full parse, so a
//! half-written file yields whatever matches instead of failing the file.

mod ecmascript;
mod go;
mod python;
mod rust_lang;

pub use ecmascript::EcmaScriptProfile;
pub use go::GoProfile;
pub use python::PythonProfile;
pub use rust_lang::RustProfile;

use super::model::{ClassRecord, ExportRecord, FunctionRecord, ImportRecord};

/// Extraction rules for one language (or family sharing a surface syntax)
pub trait LanguageProfile: Send + Sync {
    /// Profile name, for logs
    fn name(&self) -> &str;

    /// File extensions this profile handles
    fn extensions(&self) -> &[&str];

    /// Import statements, normalized to `{source, specifiers, is_relative}`
    fn imports(&self, content: &str) -> Vec<ImportRecord>;

    /// Symbols explicitly marked externally visible
    fn exports(&self, content: &str) -> Vec<ExportRecord>;

    /// Named and bound-variable function declarations
    fn functions(&self, content: &str) -> Vec<FunctionRecord>;

    /// Named class declarations
    fn classes(&self, content: &str) -> Vec<ClassRecord>;
}

/// Split a raw parameter list into parameter names, dropping type
/// annotations and default values.
pub(crate) fn split_params(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|p| {
            p.trim()
                .split(&[':', '='][..])
                .next()
                .unwrap_or("")
                .trim()
                .trim_start_matches(&['*', '&'][..])
                .trim()
                .to_string()
        })
        .filter(|p| !p.is_empty())
        .collect()
}
