use regex::Regex;

use super::{split_params, LanguageProfile};
use crate::core::model::{ClassRecord, ExportKind, ExportRecord, FunctionRecord, ImportRecord};

/// Python lexical profile.
///
/// Relative `from`-imports are normalized to path form at extraction
/// (`.utils` becomes `./utils`, `..pkg.mod` becomes `../pkg/mod`) so the
/// graph builder resolves them the same way as every other language.
pub struct PythonProfile {
    import_re: Regex,
    from_re: Regex,
    def_re: Regex,
    class_re: Regex,
    var_re: Regex,
}

impl PythonProfile {
    pub fn new() -> Self {
        Self {
            import_re: Regex::new(r"^import\s+(.+)$").expect("Invalid import regex"),
            from_re: Regex::new(r"^from\s+(\.*[\w.]*)\s+import\s+(.+)$")
                .expect("Invalid from-import regex"),
            def_re: Regex::new(r"^(async\s+)?def\s+(\w+)\s*\(([^)]*)")
                .expect("Invalid def regex"),
            class_re: Regex::new(r"^class\s+(\w+)").expect("Invalid class regex"),
            var_re: Regex::new(r"^([A-Za-z]\w*)\s*=[^=]").expect("Invalid assignment regex"),
        }
    }

    /// Convert a dotted module reference to path form. Leading dots mark
    /// relative imports: one dot is the file's own package, each further
    /// dot climbs one package.
    fn normalize_source(source: &str) -> (String, bool) {
        let dots = source.chars().take_while(|&c| c == '.').count();
        if dots == 0 {
            return (source.to_string(), false);
        }

        let rest = source[dots..].replace('.', "/");
        let prefix = if dots == 1 {
            "./".to_string()
        } else {
            "../".repeat(dots - 1)
        };

        let normalized = if rest.is_empty() {
            prefix.trim_end_matches('/').to_string()
        } else {
            format!("{}{}", prefix, rest)
        };

        (normalized, true)
    }

    fn parse_specifiers(raw: &str) -> Vec<String> {
        raw.replace(['(', ')'], "")
            .split(',')
            .map(|s| {
                s.trim()
                    .rsplit(" as ")
                    .next()
                    .unwrap_or("")
                    .trim()
                    .to_string()
            })
            .filter(|s| !s.is_empty() && *s != "\\")
            .collect()
    }
}

impl Default for PythonProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageProfile for PythonProfile {
    fn name(&self) -> &str {
        "python"
    }

    fn extensions(&self) -> &[&str] {
        &["py"]
    }

    fn imports(&self, content: &str) -> Vec<ImportRecord> {
        let mut imports = Vec::new();
        let mut lines = content.lines();

        while let Some(line) = lines.next() {
            if let Some(caps) = self.from_re.captures(line) {
                let (source, is_relative) = Self::normalize_source(&caps[1]);

                // Bracketed multi-import blocks continue until the paren closes
                let mut spec_text = caps[2].to_string();
                if spec_text.contains('(') && !spec_text.contains(')') {
                    for cont in lines.by_ref() {
                        spec_text.push(',');
                        spec_text.push_str(cont);
                        if cont.contains(')') {
                            break;
                        }
                    }
                }

                imports.push(ImportRecord {
                    source,
                    specifiers: Self::parse_specifiers(&spec_text),
                    is_relative,
                });
            } else if let Some(caps) = self.import_re.captures(line) {
                for module in caps[1].split(',') {
                    let module = module.trim();
                    let name = module.split(" as ").next().unwrap_or(module).trim();
                    if name.is_empty() {
                        continue;
                    }
                    imports.push(ImportRecord {
                        source: name.to_string(),
                        specifiers: vec![],
                        is_relative: false,
                    });
                }
            }
        }

        imports
    }

    fn exports(&self, content: &str) -> Vec<ExportRecord> {
        let mut exports = Vec::new();

        for line in content.lines() {
            if let Some(caps) = self.def_re.captures(line) {
                let name = caps[2].to_string();
                if !name.starts_with('_') {
                    exports.push(ExportRecord {
                        name,
                        kind: ExportKind::Function,
                    });
                }
            } else if let Some(caps) = self.class_re.captures(line) {
                let name = caps[1].to_string();
                if !name.starts_with('_') {
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
            if let Some(caps) = self.def_re.captures(line) {
                let name = caps[2].to_string();
                functions.push(FunctionRecord {
                    is_exported: !name.starts_with('_'),
                    name,
                    line: idx + 1,
                    params: split_params(caps.get(3).map_or("", |m| m.as_str()))
                        .into_iter()
                        .filter(|p| p != "self" && p != "cls")
                        .collect(),
                    is_async: caps.get(1).is_some(),
                });
            }
        }

        functions
    }

    fn classes(&self, content: &str) -> Vec<ClassRecord> {
        let mut classes = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            if let Some(caps) = self.class_re.captures(line) {
                let name = caps[1].to_string();
                classes.push(ClassRecord {
                    is_exported: !name.starts_with('_'),
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

    fn profile() -> PythonProfile {
        PythonProfile::new()
    }

    #[test]
    fn test_import_forms() {
        let src = "import os\nimport json, re as regex\nfrom typing import List\n";
        let imports = profile().imports(src);
        assert_eq!(imports.len(), 4);
        assert_eq!(imports[0].source, "os");
        assert_eq!(imports[1].source, "json");
        assert_eq!(imports[2].source, "re");
        assert_eq!(imports[3].source, "typing");
        assert_eq!(imports[3].specifiers, vec!["List"]);
        assert!(imports.iter().all(|i| !i.is_relative));
    }

    #[test]
    fn test_relative_imports_are_normalized() {
        let src = "from .utils import slugify\nfrom ..models.user import User\nfrom . import siblings\n";
        let imports = profile().imports(src);

        assert_eq!(imports[0].source, "./utils");
        assert!(imports[0].is_relative);

        assert_eq!(imports[1].source, "../models/user");
        assert_eq!(imports[1].specifiers, vec!["User"]);

        assert_eq!(imports[2].source, ".");
        assert_eq!(imports[2].specifiers, vec!["siblings"]);
    }

    #[test]
    fn test_bracketed_multi_import_block() {
        let src = "from .handlers import (\n    create_user,\n    delete_user,\n)\n";
        let imports = profile().imports(src);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].source, "./handlers");
        assert_eq!(imports[0].specifiers, vec!["create_user", "delete_user"]);
    }

    #[test]
    fn test_functions_and_visibility_convention() {
        let src = "async def get_user(self, user_id):\n    pass\n\ndef _internal(x):\n    pass\n";
        let functions = profile().functions(src);
        assert_eq!(functions.len(), 2);

        assert_eq!(functions[0].name, "get_user");
        assert!(functions[0].is_async);
        assert!(functions[0].is_exported);
        assert_eq!(functions[0].params, vec!["user_id"]);

        assert!(!functions[1].is_exported);
    }

    #[test]
    fn test_exports_skip_private_names() {
        let src = "MAX_SIZE = 10\nclass UserRepo:\n    pass\ndef _hidden():\n    pass\n";
        let exports = profile().exports(src);
        assert_eq!(exports.len(), 2);
        assert_eq!(exports[0].kind, ExportKind::Variable);
        assert_eq!(exports[1].name, "UserRepo");
        assert_eq!(exports[1].kind, ExportKind::Class);
    }
}
