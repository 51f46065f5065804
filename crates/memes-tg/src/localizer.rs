//! Read-only store of the localized UI strings.
//!
//! The strings live in a directory of YAML files, each of which is a mapping
//! `key -> { lang -> text }`. All files are merged into a single table once at
//! startup and the table is never mutated after that.

use crate::prelude::*;
use crate::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Language used when the requested one has no translation for a key
pub(crate) const DEFAULT_LANG: &str = "en";

#[derive(Deserialize)]
pub(crate) struct Config {
    #[serde(default = "default_localization_dir")]
    pub(crate) dir: PathBuf,
}

pub(crate) fn default_localization_dir() -> PathBuf {
    concat!(env!("CARGO_MANIFEST_DIR"), "/static/localization").into()
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum LocalizationError {
    #[error("Failed to parse the localization file {path:?}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("There is no localized string with key `{key}`")]
    MissingKey { key: String },

    #[error(
        "Localized string `{key}` has no translation to the default language `{lang}`",
        lang = DEFAULT_LANG
    )]
    MissingDefaultLang { key: String },
}

type Translations = HashMap<String, String>;

#[derive(Debug, Default)]
pub(crate) struct Localizer {
    strings: HashMap<String, Translations>,
}

impl Localizer {
    /// Merges all `*.yml` files in the given directory. The files are visited
    /// in lexicographic order of their paths, the later ones override keys
    /// of the earlier ones.
    pub(crate) fn load(dir: &Path) -> Result<Self> {
        let mut paths = fs_err::read_dir(dir)?
            .map(|entry| Ok(entry?.path()))
            .collect::<std::io::Result<Vec<_>>>()?;

        paths.sort();

        let mut strings = HashMap::new();

        for path in paths {
            if !path.is_file() || path.extension().map_or(true, |ext| ext != "yml") {
                trace!(path = %path.display(), "Skipping non-localization path");
                continue;
            }

            let content = fs_err::read_to_string(&path)?;

            // `serde_yaml` parses an empty document as `null`
            if content.trim().is_empty() {
                continue;
            }

            let file: HashMap<String, Translations> =
                serde_yaml::from_str(&content).map_err(err_ctx!(LocalizationError::Parse {
                    path: path.clone()
                }))?;

            debug!(path = %path.display(), keys = file.len(), "Loaded localization file");

            strings.extend(file);
        }

        info!(
            dir = %dir.display(),
            keys = strings.len(),
            "Loaded localized strings"
        );

        Ok(Self { strings })
    }

    /// Returns the string for `key` in `lang` falling back to [`DEFAULT_LANG`]
    /// when `lang` is not given or has no translation.
    pub(crate) fn lookup(&self, key: &str, lang: Option<&str>) -> Result<&str> {
        let translations = self
            .strings
            .get(key)
            .ok_or_else(|| err!(LocalizationError::MissingKey { key }))?;

        if let Some(text) = lang.and_then(|lang| translations.get(lang)) {
            return Ok(text.as_str());
        }

        translations
            .get(DEFAULT_LANG)
            .map(String::as_str)
            .ok_or_else(|| err!(LocalizationError::MissingDefaultLang { key }))
    }

    /// Same as [`Localizer::lookup`], but substitutes `{name}` placeholders
    /// with the given values.
    pub(crate) fn format(
        &self,
        key: &str,
        lang: Option<&str>,
        args: &[(&str, String)],
    ) -> Result<String> {
        let template = self.lookup(key, lang)?;
        Ok(args.iter().fold(template.to_owned(), |text, (name, value)| {
            text.replace(&format!("{{{name}}}"), value)
        }))
    }
}
