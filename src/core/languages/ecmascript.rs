use regex::Regex;

use super::{split_params, LanguageProfile};
use crate::core::model::{ClassRecord, ExportKind, ExportRecord, FunctionRecord, ImportRecord};

/// JavaScript/TypeScript lexical profile. One profile covers both languages;
/// the Language tag on the file record still distinguishes them by extension.
pub struct EcmaScriptProfile {
    import_re: Regex,
    import_bare_re: Regex,
    reexport_re: Regex,
    require_re: Regex,
    func_decl_re: Regex,
    arrow_re: Regex,
    func_expr_re: Regex,
    class_re: Regex,
    export_var_re: Regex,
    export_default_re: Regex,
}

impl EcmaScriptProfile {
    pub fn new() -> Self {
        Self {
            import_re: Regex::new(
                r#"^\s*import\s+(?:type\s+)?(.+?)\s+from\s+['"]([^'"]+)['"]"#,
            )
            .expect("Invalid import regex"),
            import_bare_re: Regex::new(r#"^\s*import\s+['"]([^'"]+)['"]"#)
                .expect("Invalid bare import regex"),
            reexport_re: Regex::new(
                r#"^\s*export\s+(?:\{[^}]*\}|\*(?:\s+as\s+\w+)?)\s+from\s+['"]([^'"]+)['"]"#,
            )
            .expect("Invalid re-export regex"),
            require_re: Regex::new(
                r#"^\s*(?:const|let|var)\s+(\{[^}]*\}|\w+)\s*=\s*require\(\s*['"]([^'"]+)['"]"#,
            )
            .expect("Invalid require regex"),
            func_decl_re: Regex::new(
                r"^\s*(export\s+)?(default\s+)?(async\s+)?function\s*\*?\s*(\w+)\s*\(([^)]*)",
            )
            .expect("Invalid function declaration regex"),
            arrow_re: Regex::new(
                r"^\s*(export\s+)?(?:const|let|var)\s+(\w+)(?:\s*:[^=]*)?\s*=\s*(async\s+)?(?:\(([^)]*)\)|(\w+))\s*=>",
            )
            .expect("Invalid arrow function regex"),
            func_expr_re: Regex::new(
                r"^\s*(export\s+)?(?:const|let|var)\s+(\w+)\s*=\s*(async\s+)?function\b\s*\w*\s*\(([^)]*)",
            )
            .expect("Invalid function expression regex"),
            class_re: Regex::new(r"^\s*(export\s+)?(default\s+)?(?:abstract\s+)?class\s+(\w+)")
                .expect("Invalid class regex"),
            export_var_re: Regex::new(r"^\s*export\s+(?:const|let|var)\s+(\w+)")
                .expect("Invalid export variable regex"),
            export_default_re: Regex::new(r"^\s*export\s+default\b")
                .expect("Invalid export default regex"),
        }
    }

    /// Parse an import clause (`X`, `{ a, b as c }`, `* as ns`, `X, { a }`)
    /// into local binding names.
    fn parse_clause(&self, clause: &str) -> Vec<String> {
        let mut specifiers = Vec::new();
        let cleaned = clause.replace(['{', '}'], ",");

        for part in cleaned.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            // `a as b` / `* as ns` bind the right-hand name
            let name = part
                .rsplit(" as ")
                .next()
                .unwrap_or(part)
                .trim()
                .trim_start_matches('*')
                .trim();
            if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
                specifiers.push(name.to_string());
            }
        }

        specifiers
    }
}

impl Default for EcmaScriptProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageProfile for EcmaScriptProfile {
    fn name(&self) -> &str {
        "ecmascript"
    }

    fn extensions(&self) -> &[&str] {
        &["ts", "tsx", "js", "jsx", "mjs"]
    }

    fn imports(&self, content: &str) -> Vec<ImportRecord> {
        let mut imports = Vec::new();

        for line in content.lines() {
            if let Some(caps) = self.import_re.captures(line) {
                let source = caps[2].to_string();
                imports.push(ImportRecord {
                    is_relative: source.starts_with('.'),
                    specifiers: self.parse_clause(&caps[1]),
                    source,
                });
            } else if let Some(caps) = self.import_bare_re.captures(line) {
                let source = caps[1].to_string();
                imports.push(ImportRecord {
                    is_relative: source.starts_with('.'),
                    specifiers: vec![],
                    source,
                });
            } else if let Some(caps) = self.reexport_re.captures(line) {
                let source = caps[1].to_string();
                imports.push(ImportRecord {
                    is_relative: source.starts_with('.'),
                    specifiers: vec![],
                    source,
                });
            } else if let Some(caps) = self.require_re.captures(line) {
                let source = caps[2].to_string();
                imports.push(ImportRecord {
                    is_relative: source.starts_with('.'),
                    specifiers: self.parse_clause(&caps[1]),
                    source,
                });
            }
        }

        imports
    }

    fn exports(&self, content: &str) -> Vec<ExportRecord> {
        let mut exports = Vec::new();

        for line in content.lines() {
            if let Some(caps) = self.func_decl_re.captures(line) {
                if caps.get(1).is_some() {
                    exports.push(ExportRecord {
                        name: caps[4].to_string(),
                        kind: ExportKind::Function,
                    });
                }
            } else if let Some(caps) = self.class_re.captures(line) {
                if caps.get(1).is_some() {
                    exports.push(ExportRecord {
                        name: caps[3].to_string(),
                        kind: ExportKind::Class,
                    });
                }
            } else if let Some(caps) = self.arrow_re.captures(line) {
                if caps.get(1).is_some() {
                    exports.push(ExportRecord {
                        name: caps[2].to_string(),
                        kind: ExportKind::Function,
                    });
                }
            } else if let Some(caps) = self.export_var_re.captures(line) {
                exports.push(ExportRecord {
                    name: caps[1].to_string(),
                    kind: ExportKind::Variable,
                });
            } else if self.export_default_re.is_match(line) {
                exports.push(ExportRecord {
                    name: "default".to_string(),
                    kind: ExportKind::Default,
                });
            }
        }

        exports
    }

    fn functions(&self, content: &str) -> Vec<FunctionRecord> {
        let mut functions = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            if let Some(caps) = self.func_decl_re.captures(line) {
                functions.push(FunctionRecord {
                    name: caps[4].to_string(),
                    line: idx + 1,
                    params: split_params(caps.get(5).map_or("", |m| m.as_str())),
                    is_async: caps.get(3).is_some(),
                    is_exported: caps.get(1).is_some(),
                });
            } else if let Some(caps) = self.func_expr_re.captures(line) {
                functions.push(FunctionRecord {
                    name: caps[2].to_string(),
                    line: idx + 1,
                    params: split_params(caps.get(4).map_or("", |m| m.as_str())),
                    is_async: caps.get(3).is_some(),
                    is_exported: caps.get(1).is_some(),
                });
            } else if let Some(caps) = self.arrow_re.captures(line) {
                let params = caps
                    .get(4)
                    .map(|m| split_params(m.as_str()))
                    .or_else(|| caps.get(5).map(|m| vec![m.as_str().to_string()]))
                    .unwrap_or_default();
                functions.push(FunctionRecord {
                    name: caps[2].to_string(),
                    line: idx + 1,
                    params,
                    is_async: caps.get(3).is_some(),
                    is_exported: caps.get(1).is_some(),
                });
            }
        }

        functions
    }

    fn classes(&self, content: &str) -> Vec<ClassRecord> {
        let mut classes = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            if let Some(caps) = self.class_re.captures(line) {
                classes.push(ClassRecord {
                    name: caps[3].to_string(),
                    line: idx + 1,
                    is_exported: caps.get(1).is_some(),
                });
            }
        }

        classes
    }
}
