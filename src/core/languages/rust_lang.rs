use regex::Regex;

use super::{split_params, LanguageProfile};
use crate::core::model::{ClassRecord, ExportKind, ExportRecord, FunctionRecord, ImportRecord};

/// Rust lexical profile.
///
/// `mod` declarations and `self::`/`super::` use-paths are treated as
/// relative imports of the first module segment, in sibling-file form
/// (`./name`), which the graph builder resolves through `name.rs` or
/// `name/mod.rs`. `crate::` paths need the crate-root layout to resolve and
/// are flagged non-relative.
pub struct RustProfile {
    use_re: Regex,
    mod_re: Regex,
    fn_re: Regex,
    type_re: Regex,
    const_re: Regex,
}

impl RustProfile {
    pub fn new() -> Self {
        Self {
            use_re: Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?use\s+([^;]+);")
                .expect("Invalid use regex"),
            mod_re: Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?mod\s+(\w+)\s*;")
                .expect("Invalid mod regex"),
            fn_re: Regex::new(
                r"^\s*(pub(?:\([^)]*\))?\s+)?(?:const\s+)?(async\s+)?(?:unsafe\s+)?fn\s+(\w+)\s*(?:<[^>]*>)?\s*\(([^)]*)",
            )
            .expect("Invalid fn regex"),
            type_re: Regex::new(r"^\s*(pub(?:\([^)]*\))?\s+)?(?:struct|enum)\s+(\w+)")
                .expect("Invalid type regex"),
            const_re: Regex::new(r"^\s*pub(?:\([^)]*\))?\s+(?:const|static)\s+(\w+)")
                .expect("Invalid const regex"),
        }
    }

    /// Normalize a use-path to `{source, specifiers, is_relative}`
    fn parse_use(path_text: &str) -> ImportRecord {
        let path_text = path_text.trim();

        // `use a::b::{c, d}` lists its specifiers in braces
        let (base, specifiers) = if let Some(idx) = path_text.find("::{") {
            let inner = path_text[idx + 3..].trim_end_matches('}');
            let specs = inner
                .split(',')
                .map(|s| {
                    s.trim()
                        .rsplit(" as ")
                        .next()
                        .unwrap_or("")
                        .trim()
                        .to_string()
                })
                .filter(|s| !s.is_empty() && s != "*")
                .collect();
            (&path_text[..idx], specs)
        } else {
            let last = path_text
                .rsplit("::")
                .next()
                .unwrap_or("")
                .trim()
                .to_string();
            let specs = if last.is_empty() || last == "*" {
                vec![]
            } else {
                vec![last]
            };
            (path_text, specs)
        };

        let (source, is_relative) = if let Some(rest) = base.strip_prefix("self::") {
            (format!("./{}", Self::first_segment(rest)), true)
        } else if let Some(rest) = base.strip_prefix("super::") {
            (format!("./{}", Self::first_segment(rest)), true)
        } else {
            (base.to_string(), false)
        };

        ImportRecord {
            source,
            specifiers,
            is_relative,
        }
    }

    fn first_segment(path: &str) -> &str {
        path.split("::").next().unwrap_or(path)
    }
}

impl Default for RustProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageProfile for RustProfile {
    fn name(&self) -> &str {
        "rust"
    }

    fn extensions(&self) -> &[&str] {
        &["rs"]
    }

    fn imports(&self, content: &str) -> Vec<ImportRecord> {
        let mut imports = Vec::new();

        for line in content.lines() {
            if let Some(caps) = self.use_re.captures(line) {
                imports.push(Self::parse_use(&caps[1]));
            } else if let Some(caps) = self.mod_re.captures(line) {
                imports.push(ImportRecord {
                    source: format!("./{}", &caps[1]),
                    specifiers: vec![caps[1].to_string()],
                    is_relative: true,
                });
            }
        }

        imports
    }

    fn exports(&self, content: &str) -> Vec<ExportRecord> {
        let mut exports = Vec::new();

        for line in content.lines() {
            if let Some(caps) = self.fn_re.captures(line) {
                if caps.get(1).is_some() {
                    exports.push(ExportRecord {
                        name: caps[3].to_string(),
                        kind: ExportKind::Function,
                    });
                }
            } else if let Some(caps) = self.type_re.captures(line) {
                if caps.get(1).is_some() {
                    exports.push(ExportRecord {
                        name: caps[2].to_string(),
                        kind: ExportKind::Class,
                    });
                }
            } else if let Some(caps) = self.const_re.captures(line) {
                exports.push(ExportRecord {
                    name: caps[1].to_string(),
                    kind: ExportKind::Variable,
                });
            }
        }

        exports
    }

    fn functions(&self, content: &str) -> Vec<FunctionRecord> {
        let mut functions = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            if let Some(caps) = self.fn_re.captures(line) {
                let params = split_params(caps.get(4).map_or("", |m| m.as_str()))
                    .into_iter()
                    .filter(|p| p != "self" && p != "mut self")
                    .collect();
                functions.push(FunctionRecord {
                    name: caps[3].to_string(),
                    line: idx + 1,
                    params,
                    is_async: caps.get(2).is_some(),
                    is_exported: caps.get(1).is_some(),
                });
            }
        }

        functions
    }

    fn classes(&self, content: &str) -> Vec<ClassRecord> {
        let mut classes = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            if let Some(caps) = self.type_re.captures(line) {
                classes.push(ClassRecord {
                    name: caps[2].to_string(),
                    line: idx + 1,
                    is_exported: caps.get(1).is_some(),
                });
            }
        }

        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> RustProfile {
        RustProfile::new()
    }

    #[test]
    fn test_use_and_mod_imports() {
        let src = "use std::fmt;\nuse super::util::slugify;\nuse self::handlers::{create, delete};\nmod routes;\nuse crate::config::Config;\n";
        let imports = profile().imports(src);
        assert_eq!(imports.len(), 5);

        assert_eq!(imports[0].source, "std::fmt");
        assert!(!imports[0].is_relative);

        assert_eq!(imports[1].source, "./util");
        assert!(imports[1].is_relative);
        assert_eq!(imports[1].specifiers, vec!["slugify"]);

        assert_eq!(imports[2].source, "./handlers");
        assert_eq!(imports[2].specifiers, vec!["create", "delete"]);

        assert_eq!(imports[3].source, "./routes");
        assert!(imports[3].is_relative);

        assert!(!imports[4].is_relative);
    }

    #[test]
    fn test_functions_and_visibility() {
        let src = "pub async fn serve(addr: &str) {}\nfn helper(x: u32, y: u32) {}\npub(crate) fn scoped(&self, id: u64) {}\n";
        let functions = profile().functions(src);
        assert_eq!(functions.len(), 3);

        assert!(functions[0].is_exported);
        assert!(functions[0].is_async);
        assert_eq!(functions[0].params, vec!["addr"]);

        assert!(!functions[1].is_exported);
        assert_eq!(functions[1].params, vec!["x", "y"]);

        assert!(functions[2].is_exported);
        assert_eq!(functions[2].params, vec!["id"]);
    }

    #[test]
    fn test_types_and_exports() {
        let src = "pub struct Server {}\nenum State {}\npub const MAX: usize = 10;\n";
        let p = profile();

        let classes = p.classes(src);
        assert_eq!(classes.len(), 2);
        assert!(classes[0].is_exported);
        assert!(!classes[1].is_exported);

        let exports = p.exports(src);
        assert_eq!(exports.len(), 2);
        assert_eq!(exports[0].kind, ExportKind::Class);
        assert_eq!(exports[1].kind, ExportKind::Variable);
    }
}
