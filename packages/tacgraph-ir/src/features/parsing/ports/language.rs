//! Language identifiers and grammar lookup

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageId {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Ruby,
    Go,
    Php,
    CSharp,
    C,
    Cpp,
    Rust,
    Kotlin,
    Scala,
    Lua,
    Pascal,
}

impl LanguageId {
    pub const ALL: [LanguageId; 15] = [
        LanguageId::Python,
        LanguageId::JavaScript,
        LanguageId::TypeScript,
        LanguageId::Java,
        LanguageId::Ruby,
        LanguageId::Go,
        LanguageId::Php,
        LanguageId::CSharp,
        LanguageId::C,
        LanguageId::Cpp,
        LanguageId::Rust,
        LanguageId::Kotlin,
        LanguageId::Scala,
        LanguageId::Lua,
        LanguageId::Pascal,
    ];

    /// Get language name as string
    pub fn name(&self) -> &'static str {
        match self {
            LanguageId::Python => "python",
            LanguageId::JavaScript => "javascript",
            LanguageId::TypeScript => "typescript",
            LanguageId::Java => "java",
            LanguageId::Ruby => "ruby",
            LanguageId::Go => "go",
            LanguageId::Php => "php",
            LanguageId::CSharp => "csharp",
            LanguageId::C => "c",
            LanguageId::Cpp => "cpp",
            LanguageId::Rust => "rust",
            LanguageId::Kotlin => "kotlin",
            LanguageId::Scala => "scala",
            LanguageId::Lua => "lua",
            LanguageId::Pascal => "pascal",
        }
    }

    /// Parse a language name, accepting common aliases
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "python" | "py" => Some(LanguageId::Python),
            "javascript" | "js" => Some(LanguageId::JavaScript),
            "typescript" | "ts" => Some(LanguageId::TypeScript),
            "java" => Some(LanguageId::Java),
            "ruby" | "rb" => Some(LanguageId::Ruby),
            "go" | "golang" => Some(LanguageId::Go),
            "php" => Some(LanguageId::Php),
            "csharp" | "c#" | "cs" => Some(LanguageId::CSharp),
            "c" => Some(LanguageId::C),
            "cpp" | "c++" | "cxx" => Some(LanguageId::Cpp),
            "rust" | "rs" => Some(LanguageId::Rust),
            "kotlin" | "kt" => Some(LanguageId::Kotlin),
            "scala" => Some(LanguageId::Scala),
            "lua" => Some(LanguageId::Lua),
            "pascal" | "pas" | "delphi" => Some(LanguageId::Pascal),
            _ => None,
        }
    }

    /// Get language from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        LanguageId::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    /// Get supported file extensions
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            LanguageId::Python => &["py", "pyi"],
            LanguageId::JavaScript => &["js", "jsx", "mjs", "cjs"],
            LanguageId::TypeScript => &["ts", "tsx", "mts", "cts"],
            LanguageId::Java => &["java"],
            LanguageId::Ruby => &["rb"],
            LanguageId::Go => &["go"],
            LanguageId::Php => &["php"],
            LanguageId::CSharp => &["cs"],
            LanguageId::C => &["c", "h"],
            LanguageId::Cpp => &["cpp", "cc", "cxx", "hpp", "hh"],
            LanguageId::Rust => &["rs"],
            LanguageId::Kotlin => &["kt", "kts"],
            LanguageId::Scala => &["scala", "sc"],
            LanguageId::Lua => &["lua"],
            LanguageId::Pascal => &["pas", "pp", "dpr"],
        }
    }

    /// Grammar for this language
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self {
            LanguageId::Python => tree_sitter_python::LANGUAGE.into(),
            LanguageId::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            LanguageId::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            LanguageId::Java => tree_sitter_java::LANGUAGE.into(),
            LanguageId::Ruby => tree_sitter_ruby::LANGUAGE.into(),
            LanguageId::Go => tree_sitter_go::LANGUAGE.into(),
            LanguageId::Php => tree_sitter_php::LANGUAGE_PHP.into(),
            LanguageId::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
            LanguageId::C => tree_sitter_c::LANGUAGE.into(),
            LanguageId::Cpp => tree_sitter_cpp::LANGUAGE.into(),
            LanguageId::Rust => tree_sitter_rust::LANGUAGE.into(),
            LanguageId::Kotlin => tree_sitter_kotlin_sg::LANGUAGE.into(),
            LanguageId::Scala => tree_sitter_scala::LANGUAGE.into(),
            LanguageId::Lua => tree_sitter_lua::LANGUAGE.into(),
            LanguageId::Pascal => tree_sitter_pascal::LANGUAGE.into(),
        }
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
