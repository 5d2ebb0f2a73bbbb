//! Core types for the generation domain

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Target SDK languages the generator knows by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    TypeScript,
    Python,
    Kotlin,
    Swift,
    CSharp,
    Go,
}

impl Language {
    /// Get the display name for this language
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::TypeScript => "TypeScript",
            Language::Python => "Python",
            Language::Kotlin => "Kotlin",
            Language::Swift => "Swift",
            Language::CSharp => "C#",
            Language::Go => "Go",
        }
    }

    /// Get the file extension for this language
    pub fn file_extension(&self) -> &'static str {
        match self {
            Language::TypeScript => "ts",
            Language::Python => "py",
            Language::Kotlin => "kt",
            Language::Swift => "swift",
            Language::CSharp => "cs",
            Language::Go => "go",
        }
    }

    /// Get all known languages
    pub fn all() -> Vec<Language> {
        vec![
            Language::TypeScript,
            Language::Python,
            Language::Kotlin,
            Language::Swift,
            Language::CSharp,
            Language::Go,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::TypeScript => write!(f, "typescript"),
            Language::Python => write!(f, "python"),
            Language::Kotlin => write!(f, "kotlin"),
            Language::Swift => write!(f, "swift"),
            Language::CSharp => write!(f, "csharp"),
            Language::Go => write!(f, "go"),
        }
    }
}

impl FromStr for Language {
    type Err = crate::generation::GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "typescript" | "ts" => Ok(Language::TypeScript),
            "python" | "py" => Ok(Language::Python),
            "kotlin" | "kt" => Ok(Language::Kotlin),
            "swift" => Ok(Language::Swift),
            "csharp" | "c#" | "cs" => Ok(Language::CSharp),
            "go" | "golang" => Ok(Language::Go),
            _ => Err(crate::generation::GenerationError::InvalidLanguage(
                s.to_string(),
            )),
        }
    }
}

/// Resolve a comma-separated language list.
///
/// `all` selects every supported language. Unrecognized tokens are
/// dropped; an empty result falls back to `supported`.
pub fn resolve_languages(list: &str, supported: &[Language]) -> Vec<Language> {
    let mut resolved = Vec::new();
    for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if token.eq_ignore_ascii_case("all") {
            return supported.to_vec();
        }
        match token.parse::<Language>() {
            Ok(lang) if !resolved.contains(&lang) => resolved.push(lang),
            Ok(_) => {}
            Err(_) => tracing::debug!(token = %token, "Dropping unrecognized language"),
        }
    }
    if resolved.is_empty() {
        supported.to_vec()
    } else {
        resolved
    }
}

/// Emission categories, one output file each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Methods,
    Streams,
    MethodsInterface,
    Funcs,
    Models,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Methods => "methods",
            Category::Streams => "streams",
            Category::MethodsInterface => "methodsInterface",
            Category::Funcs => "funcs",
            Category::Models => "models",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generated source file awaiting write and post-processing
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Extension key used to bucket files for reformatting
    pub fn extension(&self) -> String {
        extension_key(&self.path)
    }
}

/// Lower-cased file extension, empty when the path has none
pub fn extension_key(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_language_from_str() {
        assert_eq!(Language::from_str("typescript").unwrap(), Language::TypeScript);
        assert_eq!(Language::from_str("python").unwrap(), Language::Python);
        assert_eq!(Language::from_str("kotlin").unwrap(), Language::Kotlin);
        assert_eq!(Language::from_str("swift").unwrap(), Language::Swift);
        assert_eq!(Language::from_str("csharp").unwrap(), Language::CSharp);
        assert_eq!(Language::from_str("go").unwrap(), Language::Go);

        // Aliases
        assert_eq!(Language::from_str("ts").unwrap(), Language::TypeScript);
        assert_eq!(Language::from_str("py").unwrap(), Language::Python);
        assert_eq!(Language::from_str("c#").unwrap(), Language::CSharp);
        assert_eq!(Language::from_str("golang").unwrap(), Language::Go);

        // Case insensitivity
        assert_eq!(Language::from_str("TypeScript").unwrap(), Language::TypeScript);
        assert_eq!(Language::from_str("PYTHON").unwrap(), Language::Python);

        assert!(Language::from_str("cobol").is_err());
        assert!(Language::from_str("").is_err());
    }

    #[test]
    fn test_language_display_and_extension() {
        assert_eq!(Language::TypeScript.to_string(), "typescript");
        assert_eq!(Language::CSharp.to_string(), "csharp");
        assert_eq!(Language::CSharp.display_name(), "C#");
        assert_eq!(Language::Python.file_extension(), "py");
        assert_eq!(Language::Kotlin.file_extension(), "kt");
        assert_eq!(Language::all().len(), 6);
    }

    #[test]
    fn test_resolve_languages() {
        let supported = [Language::TypeScript, Language::Python];

        assert_eq!(resolve_languages("all", &supported), supported.to_vec());
        assert_eq!(
            resolve_languages("python, kotlin", &supported),
            vec![Language::Python, Language::Kotlin]
        );
        // unknown tokens are dropped silently
        assert_eq!(
            resolve_languages("py,klingon,py", &supported),
            vec![Language::Python]
        );
        // nothing recognized falls back to the supported set
        assert_eq!(resolve_languages("klingon", &supported), supported.to_vec());
        assert_eq!(resolve_languages("", &supported), supported.to_vec());
    }

    #[test]
    fn test_category_names() {
        assert_eq!(Category::Methods.as_str(), "methods");
        assert_eq!(Category::MethodsInterface.to_string(), "methodsInterface");
        assert_eq!(Category::Funcs.as_str(), "funcs");
    }

    #[test]
    fn test_generated_file_extension() {
        let file = GeneratedFile::new("sdk/src/4.0/models.TS", "export {}");
        assert_eq!(file.extension(), "ts");
        assert_eq!(extension_key(Path::new("Makefile")), "");
    }
}
