//! Profile registry
//!
//! Profiles are built once on first use and live for the whole process;
//! lowering calls only ever borrow them.

use super::{
    c, cpp, csharp, go, java, javascript, kotlin, lua, pascal, php, python, ruby, rust_lang, scala,
    typescript,
};
use crate::features::lowering::ports::LanguageProfile;
use crate::features::parsing::ports::LanguageId;
use rustc_hash::FxHashMap;

/// Shared profile for a language
pub fn profile_for(language: LanguageId) -> &'static dyn LanguageProfile {
    match language {
        LanguageId::Python => &*python::PROFILE,
        LanguageId::JavaScript => &*javascript::PROFILE,
        LanguageId::TypeScript => &*typescript::PROFILE,
        LanguageId::Java => &*java::PROFILE,
        LanguageId::Ruby => &*ruby::PROFILE,
        LanguageId::Go => &*go::PROFILE,
        LanguageId::Php => &*php::PROFILE,
        LanguageId::CSharp => &*csharp::PROFILE,
        LanguageId::C => &*c::PROFILE,
        LanguageId::Cpp => &*cpp::PROFILE,
        LanguageId::Rust => &*rust_lang::PROFILE,
        LanguageId::Kotlin => &*kotlin::PROFILE,
        LanguageId::Scala => &*scala::PROFILE,
        LanguageId::Lua => &*lua::PROFILE,
        LanguageId::Pascal => &*pascal::PROFILE,
    }
}

/// Lookup of profiles by language or file extension
pub struct ProfileRegistry {
    profiles: FxHashMap<LanguageId, &'static dyn LanguageProfile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self {
            profiles: FxHashMap::default(),
        }
    }

    /// Registry with every built-in profile
    pub fn full() -> Self {
        let mut registry = Self::new();
        for language in LanguageId::ALL {
            registry.register(profile_for(language));
        }
        registry
    }

    /// Registry with only specific languages
    pub fn with_languages(languages: &[LanguageId]) -> Self {
        let mut registry = Self::new();
        for language in languages {
            registry.register(profile_for(*language));
        }
        registry
    }

    /// Register (or replace) a profile
    pub fn register(&mut self, profile: &'static dyn LanguageProfile) {
        self.profiles.insert(profile.language(), profile);
    }

    pub fn get(&self, language: LanguageId) -> Option<&'static dyn LanguageProfile> {
        self.profiles.get(&language).copied()
    }

    pub fn get_by_extension(&self, ext: &str) -> Option<&'static dyn LanguageProfile> {
        let language = LanguageId::from_extension(ext)?;
        self.get(language)
    }

    pub fn supports(&self, ext: &str) -> bool {
        self.get_by_extension(ext).is_some()
    }

    /// Registered languages in declaration order
    pub fn languages(&self) -> Vec<LanguageId> {
        let mut languages: Vec<LanguageId> = self.profiles.keys().copied().collect();
        languages.sort();
        languages
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::full()
    }
}
