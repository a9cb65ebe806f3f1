use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{error, warn};
use unic_langid::LanguageIdentifier;

/// Bot texts compiled into the binary
pub const RU_RESOURCE: &str = include_str!("../locales/ru/main.ftl");

/// Localization manager for the support bot
pub struct LocalizationManager {
    bundle: FluentBundle<FluentResource>,
}

impl LocalizationManager {
    /// Create a manager from the embedded Russian resource, failing on any syntax error
    pub fn new() -> Result<Self> {
        Self::from_ftl("ru", RU_RESOURCE)
    }

    /// Create a manager from FTL source text
    pub fn from_ftl(locale: &str, source: &str) -> Result<Self> {
        let (manager, problems) = Self::build(locale, source)?;
        if problems > 0 {
            return Err(anyhow!("{problems} problem(s) in {locale} localization resource"));
        }
        Ok(manager)
    }

    /// Build a bundle keeping whatever parsed; returns the number of problems seen
    fn build(locale: &str, source: &str) -> Result<(Self, usize)> {
        let locale: LanguageIdentifier = locale.parse()?;
        let mut bundle = FluentBundle::new_concurrent(vec![locale]);
        bundle.set_use_isolating(false);

        let mut problems = 0;
        let resource = match FluentResource::try_new(source.to_string()) {
            Ok(resource) => resource,
            Err((resource, errors)) => {
                for e in &errors {
                    error!(error = ?e, "Failed to parse localization entry");
                }
                problems += errors.len();
                resource
            }
        };
        if let Err(errors) = bundle.add_resource(resource) {
            for e in &errors {
                error!(error = %e, "Failed to add localization entry");
            }
            problems += errors.len();
        }

        Ok((Self { bundle }, problems))
    }

    /// Check whether `key` has a translated value
    pub fn has_message(&self, key: &str) -> bool {
        self.bundle
            .get_message(key)
            .is_some_and(|msg| msg.value().is_some())
    }

    /// Get a localized message
    pub fn get_message(&self, key: &str, args: Option<&HashMap<&str, &str>>) -> String {
        let msg = match self.bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let fluent_args = args.map(|args| {
            FluentArgs::from_iter(args.iter().map(|(k, v)| (*k, FluentValue::from(*v))))
        });

        let mut value = String::new();
        let mut errors = vec![];
        if let Err(e) = self
            .bundle
            .write_pattern(&mut value, pattern, fluent_args.as_ref(), &mut errors)
        {
            error!(key, error = %e, "Failed to format localized message");
        }
        for e in &errors {
            warn!(key, error = %e, "Localized message formatted with errors");
        }

        value
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message(key, Some(&args_map))
    }
}

/// Global localization instance
static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager, checking the embedded resource
pub fn init_localization() -> Result<()> {
    let manager = LocalizationManager::new()?;
    // A manager created lazily by an earlier `t` call is built from the same resource
    let _ = LOCALIZATION_MANAGER.set(manager);
    Ok(())
}

/// Get the global localization manager
pub fn get_localization_manager() -> Option<&'static LocalizationManager> {
    if let Some(manager) = LOCALIZATION_MANAGER.get() {
        return Some(manager);
    }
    match LocalizationManager::build("ru", RU_RESOURCE) {
        Ok((manager, _)) => Some(LOCALIZATION_MANAGER.get_or_init(|| manager)),
        Err(e) => {
            error!(error = %e, "Localization unavailable");
            None
        }
    }
}

/// Convenience function to get a localized message
pub fn t(key: &str) -> String {
    match get_localization_manager() {
        Some(manager) => manager.get_message(key, None),
        None => key.to_string(),
    }
}

/// Convenience function to get a localized message with arguments
pub fn t_args(key: &str, args: &[(&str, &str)]) -> String {
    match get_localization_manager() {
        Some(manager) => manager.get_message_with_args(key, args),
        None => key.to_string(),
    }
}
