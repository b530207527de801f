use regex::Regex;

use super::LanguageProfile;
use crate::core::model::{ClassRecord, ExportKind, ExportRecord, FunctionRecord, ImportRecord};

/// Go lexical profile. Visibility follows the capitalization convention:
/// a symbol is exported iff its name starts with an uppercase letter.
pub struct GoProfile {
    import_single_re: Regex,
    import_block_re: Regex,
    import_line_re: Regex,
    func_re: Regex,
    struct_re: Regex,
    var_re: Regex,
}

impl GoProfile {
    pub fn new() -> Self {
        Self {
            import_single_re: Regex::new(r#"^import\s+(?:(\w+)\s+)?"([^"]+)""#)
                .expect("Invalid import regex"),
            import_block_re: Regex::new(r"^import\s+\(").expect("Invalid import block regex"),
            import_line_re: Regex::new(r#"^\s*(?:(\w+|\.)\s+)?"([^"]+)""#)
                .expect("Invalid import line regex"),
            func_re: Regex::new(r"^func\s+(?:\([^)]*\)\s+)?(\w+)\s*\(([^)]*)")
                .expect("Invalid func regex"),
            struct_re: Regex::new(r"^type\s+(\w+)\s+struct\b").expect("Invalid struct regex"),
            var_re: Regex::new(r"^(?:var|const)\s+([A-Z]\w*)").expect("Invalid var regex"),
        }
    }

    fn is_exported(name: &str) -> bool {
        name.chars().next().map_or(false, |c| c.is_uppercase())
    }

    fn import_record(alias: Option<&str>, source: &str) -> ImportRecord {
        ImportRecord {
            is_relative: source.starts_with('.'),
            specifiers: alias.map(|a| vec![a.to_string()]).unwrap_or_default(),
            source: source.to_string(),
        }
    }
}

impl Default for GoProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageProfile for GoProfile {
    fn name(&self) -> &str {
        "go"
    }

    fn extensions(&self) -> &[&str] {
        &["go"]
    }

    fn imports(&self, content: &str) -> Vec<ImportRecord> {
        let mut imports = Vec::new();
        let mut lines = content.lines();

        while let Some(line) = lines.next() {
            if let Some(caps) = self.import_single_re.captures(line) {
                imports.push(Self::import_record(
                    caps.get(1).map(|m| m.as_str()),
                    &caps[2],
                ));
            } else if self.import_block_re.is_match(line) {
                for block_line in lines.by_ref() {
                    if block_line.trim_start().starts_with(')') {
                        break;
                    }
                    if let Some(caps) = self.import_line_re.captures(block_line) {
                        imports.push(Self::import_record(
                            caps.get(1).map(|m| m.as_str()),
                            &caps[2],
                        ));
                    }
                }
            }
        }

        imports
    }

    fn exports(&self, content: &str) -> Vec<ExportRecord> {
        let mut exports = Vec::new();

        for line in content.lines() {
            if let Some(caps) = self.func_re.captures(line) {
                let name = caps[1].to_string();
                if Self::is_exported(&name) {
                    exports.push(ExportRecord {
                        name,
                        kind: ExportKind::Function,
                    });
                }
            } else if let Some(caps) = self.struct_re.captures(line) {
                let name = caps[1].to_string();
                if Self::is_exported(&name) {
                    exports.push(ExportRecord {
                        name,
                        kind: ExportKind::Class,
                    });
                }
            } else if let Some(caps) = self.var_re.captures(line) {
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
            if let Some(caps) = self.func_re.captures(line) {
                let name = caps[1].to_string();
                let params = caps
                    .get(2)
                    .map_or("", |m| m.as_str())
                    .split(',')
                    .map(|p| p.trim().split_whitespace().next().unwrap_or("").to_string())
                    .filter(|p| !p.is_empty())
                    .collect();
                functions.push(FunctionRecord {
                    is_exported: Self::is_exported(&name),
                    name,
                    line: idx + 1,
                    params,
                    is_async: false,
                });
            }
        }

        functions
    }

    fn classes(&self, content: &str) -> Vec<ClassRecord> {
        let mut classes = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            if let Some(caps) = self.struct_re.captures(line) {
                let name = caps[1].to_string();
                classes.push(ClassRecord {
                    is_exported: Self::is_exported(&name),
                    name,
                    line: idx + 1,
                });
            }
        }

        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> GoProfile {
        GoProfile::new()
    }

    #[test]
    fn test_single_and_block_imports() {
        let src = r#"package api

import "fmt"

import (
    "net/http"
    log "github.com/sirupsen/logrus"
)
"#;
        let imports = profile().imports(src);
        assert_eq!(imports.len(), 3);
        assert_eq!(imports[0].source, "fmt");
        assert_eq!(imports[1].source, "net/http");
        assert_eq!(imports[2].source, "github.com/sirupsen/logrus");
        assert_eq!(imports[2].specifiers, vec!["log"]);
        assert!(imports.iter().all(|i| !i.is_relative));
    }

    #[test]
    fn test_capitalization_visibility() {
        let src = "func GetUser(id string) {}\nfunc helper(x int) {}\ntype User struct {}\ntype cache struct {}\n";
        let p = profile();

        let functions = p.functions(src);
        assert!(functions[0].is_exported);
        assert!(!functions[1].is_exported);
        assert_eq!(functions[0].params, vec!["id"]);

        let classes = p.classes(src);
        assert!(classes[0].is_exported);
        assert!(!classes[1].is_exported);

        let exports = p.exports(src);
        assert_eq!(exports.len(), 2);
        assert_eq!(exports[0].name, "GetUser");
        assert_eq!(exports[1].name, "User");
    }

    #[test]
    fn test_method_receiver_is_skipped() {
        let src = "func (s *Server) HandleRequest(w http.ResponseWriter, r *http.Request) {}\n";
        let functions = profile().functions(src);
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "HandleRequest");
        assert_eq!(functions[0].params, vec!["w", "r"]);
    }
}
