use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::languages::{
    EcmaScriptProfile, GoProfile, LanguageProfile, PythonProfile, RustProfile,
};
use super::model::{FileRecord, Language};

/// Multi-language symbol extractor that delegates to per-language profiles.
///
/// Extraction is a lexical scan: a malformed or half-written file yields
/// whatever the rules match and never fails the file. A file whose language
/// has no profile produces empty symbol lists.
pub struct SymbolExtractor {
    profiles: Vec<Box<dyn LanguageProfile>>,
    extension_map: HashMap<String, usize>,
}

impl SymbolExtractor {
    pub fn new(languages: &[String]) -> Self {
        let mut profiles: Vec<Box<dyn LanguageProfile>> = Vec::new();
        let mut seen = Vec::new();

        for language in languages {
            let profile: Box<dyn LanguageProfile> = match language.as_str() {
                "typescript" | "javascript" => Box::new(EcmaScriptProfile::new()),
                "python" => Box::new(PythonProfile::new()),
                "go" => Box::new(GoProfile::new()),
                "rust" => Box::new(RustProfile::new()),
                // Skip unsupported languages
                _ => continue,
            };

            if seen.contains(&profile.name().to_string()) {
                continue;
            }
            seen.push(profile.name().to_string());
            profiles.push(profile);
        }

        let mut extension_map = HashMap::new();
        for (idx, profile) in profiles.iter().enumerate() {
            for ext in profile.extensions() {
                extension_map.insert(ext.to_string(), idx);
            }
        }

        Self {
            profiles,
            extension_map,
        }
    }

    fn profile_for(&self, path: &Path) -> Option<&dyn LanguageProfile> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        self.extension_map
            .get(ext)
            .map(|idx| self.profiles[*idx].as_ref())
    }

    /// True iff the extension maps to a configured language profile
    pub fn supports_path(&self, path: &Path) -> bool {
        self.language_of(path).is_some()
    }

    /// Language of the file, when its extension belongs to an active profile
    pub fn language_of(&self, path: &Path) -> Option<Language> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        if !self.extension_map.contains_key(ext) {
            return None;
        }
        Language::from_extension(ext)
    }

    /// Extract one file's record from its content. `path` is repo-relative
    /// and becomes the record's identity.
    pub fn extract(&self, path: &Path, content: &str) -> FileRecord {
        let language = self
            .language_of(path)
            .unwrap_or(Language::JavaScript);

        match self.profile_for(path) {
            Some(profile) => FileRecord {
                path: PathBuf::from(path),
                language,
                imports: profile.imports(content),
                exports: profile.exports(content),
                functions: profile.functions(content),
                classes: profile.classes(content),
            },
            None => FileRecord {
                path: PathBuf::from(path),
                language,
                imports: vec![],
                exports: vec![],
                functions: vec![],
                classes: vec![],
            },
        }
    }
}
