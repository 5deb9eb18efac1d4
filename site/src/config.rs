// kiln/site/src/config.rs

use crate::errors::{Result, SiteError};
use dotenvy::dotenv;
use kiln::Metadata;
use serde_json::Value;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Build profile. Production enables the expensive and output-only stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
  #[default]
  Development,
  Production,
}

impl FromStr for Profile {
  type Err = SiteError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "development" | "dev" => Ok(Profile::Development),
      "production" | "prod" => Ok(Profile::Production),
      other => Err(SiteError::Config(format!(
        "Invalid KILN_ENV '{other}': expected 'development' or 'production'"
      ))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
  pub profile: Profile,
  pub source: PathBuf,
  pub destination: PathBuf,
  pub clean: bool,

  // Published as global metadata
  pub site_url: String,
  pub site_name: String,
  pub site_description: String,

  /// Fan-out limit for stages that process files concurrently.
  pub concurrency: usize,
}

fn parse_bool(var_name: &str, raw: &str) -> Result<bool> {
  match raw.trim().to_ascii_lowercase().as_str() {
    "true" | "1" | "yes" | "on" => Ok(true),
    "false" | "0" | "no" | "off" => Ok(false),
    _ => Err(SiteError::Config(format!("Invalid {var_name} value '{raw}': expected a boolean"))),
  }
}

impl SiteConfig {
  /// Reads the configuration from the process environment, after loading a
  /// `.env` file if one is present.
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from an arbitrary variable lookup.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_or = |var_name: &str, default: &str| lookup(var_name).unwrap_or_else(|| default.to_string());

    let profile = get_or("KILN_ENV", "development").parse::<Profile>()?;
    let source = PathBuf::from(get_or("KILN_SOURCE", "./src"));
    let destination = PathBuf::from(get_or("KILN_DESTINATION", "./build"));
    let clean = parse_bool("KILN_CLEAN", &get_or("KILN_CLEAN", "true"))?;

    let site_url = get_or("KILN_SITE_URL", "https://example.com");
    let site_name = get_or("KILN_SITE_NAME", "My Site");
    let site_description = get_or("KILN_SITE_DESCRIPTION", "");

    let concurrency = get_or("KILN_CONCURRENCY", "5")
      .trim()
      .parse::<usize>()
      .map_err(|e| SiteError::Config(format!("Invalid KILN_CONCURRENCY: {e}")))?;
    if concurrency == 0 {
      return Err(SiteError::Config("KILN_CONCURRENCY must be at least 1".to_string()));
    }

    tracing::info!(?profile, source = %source.display(), destination = %destination.display(), "Site configuration loaded.");

    Ok(Self {
      profile,
      source,
      destination,
      clean,
      site_url,
      site_name,
      site_description,
      concurrency,
    })
  }

  pub fn is_production(&self) -> bool {
    self.profile == Profile::Production
  }

  /// Initial global metadata for every build.
  pub fn metadata(&self) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("siteurl".into(), Value::String(self.site_url.clone()));
    metadata.insert("sitename".into(), Value::String(self.site_name.clone()));
    metadata.insert("sitedescription".into(), Value::String(self.site_description.clone()));
    metadata.insert("production".into(), Value::Bool(self.is_production()));
    metadata
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use std::collections::HashMap;

  fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| vars.get(name).cloned()
  }

  #[test]
  fn defaults_apply_when_nothing_is_set() {
    let config = SiteConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config.profile, Profile::Development);
    assert_eq!(config.source, PathBuf::from("./src"));
    assert_eq!(config.destination, PathBuf::from("./build"));
    assert!(config.clean);
    assert_eq!(config.site_url, "https://example.com");
    assert_eq!(config.concurrency, 5);
    assert!(!config.is_production());
  }

  #[test]
  fn reads_every_variable() {
    let config = SiteConfig::from_lookup(lookup(&[
      ("KILN_ENV", "Production"),
      ("KILN_SOURCE", "content"),
      ("KILN_DESTINATION", "public"),
      ("KILN_CLEAN", "no"),
      ("KILN_SITE_URL", "https://blog.test"),
      ("KILN_SITE_NAME", "Notes"),
      ("KILN_SITE_DESCRIPTION", "Things I wrote down"),
      ("KILN_CONCURRENCY", "8"),
    ]))
    .unwrap();

    assert!(config.is_production());
    assert_eq!(config.source, PathBuf::from("content"));
    assert_eq!(config.destination, PathBuf::from("public"));
    assert!(!config.clean);
    assert_eq!(config.concurrency, 8);

    let metadata = config.metadata();
    assert_eq!(metadata["sitename"], "Notes");
    assert_eq!(metadata["sitedescription"], "Things I wrote down");
    assert_eq!(metadata["production"], true);
  }

  #[test]
  fn rejects_invalid_values() {
    for vars in [
      [("KILN_ENV", "staging")],
      [("KILN_CLEAN", "maybe")],
      [("KILN_CONCURRENCY", "lots")],
      [("KILN_CONCURRENCY", "0")],
    ] {
      let err = SiteConfig::from_lookup(lookup(&vars)).unwrap_err();
      assert!(matches!(err, SiteError::Config(_)), "expected config error for {vars:?}, got {err:?}");
    }
  }

  #[test]
  #[serial]
  fn from_env_reads_the_process_environment() {
    env::set_var("KILN_SITE_NAME", "From Env");
    let config = SiteConfig::from_env();
    env::remove_var("KILN_SITE_NAME");
    assert_eq!(config.unwrap().site_name, "From Env");
  }
}
