// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, fs, path::Path, time::Duration};
use url::Url;

use crate::fetch::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "http://vitibrasil.cnpuv.embrapa.br/index.php";

/// Runtime settings. Every field has a default so an empty YAML file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub retry: RetrySettings,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    /// Max in-flight report fetches when scraping every report for a year.
    pub concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_secs: u64,
    pub max_delay_secs: u64,
    pub jitter_min_secs: f64,
    pub jitter_max_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetrySettings::default(),
            connect_timeout_secs: 10,
            read_timeout_secs: 30,
            concurrency: 3,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 5,
            max_delay_secs: 60,
            jitter_min_secs: 1.0,
            jitter_max_secs: 3.0,
        }
    }
}

impl Config {
    /// Defaults, then the YAML file named by `VITISCRAPER_CONFIG`, then env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match env::var("VITISCRAPER_CONFIG") {
            Ok(path) => Self::from_yaml_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(url) = env::var("VITISCRAPER_BASE_URL") {
            cfg.base_url = url;
        }
        if let Ok(n) = env::var("VITISCRAPER_MAX_ATTEMPTS") {
            cfg.retry.max_attempts = n
                .parse()
                .with_context(|| format!("VITISCRAPER_MAX_ATTEMPTS={n:?} is not a number"))?;
        }
        if let Ok(n) = env::var("VITISCRAPER_CONCURRENCY") {
            cfg.concurrency = n
                .parse()
                .with_context(|| format!("VITISCRAPER_CONCURRENCY={n:?} is not a number"))?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url)
            .with_context(|| format!("base_url {:?} is not a valid URL", self.base_url))?;
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        if !(self.retry.jitter_min_secs >= 0.0
            && self.retry.jitter_min_secs < self.retry.jitter_max_secs)
        {
            anyhow::bail!(
                "jitter range [{}, {}) is empty",
                self.retry.jitter_min_secs,
                self.retry.jitter_max_secs
            );
        }
        for (name, secs) in [
            ("jitter_min_secs", self.retry.jitter_min_secs),
            ("jitter_max_secs", self.retry.jitter_max_secs),
        ] {
            Duration::try_from_secs_f64(secs)
                .with_context(|| format!("retry.{name} {secs} is not a valid duration"))?;
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_secs(self.retry.base_delay_secs),
            max_delay: Duration::from_secs(self.retry.max_delay_secs),
            jitter_min: Duration::from_secs_f64(self.retry.jitter_min_secs),
            jitter_max: Duration::from_secs_f64(self.retry.jitter_max_secs),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_documented_policy() {
        let policy = Config::default().retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_secs(5));
        assert_eq!(policy.max_delay, Duration::from_secs(60));
        assert_eq!(policy.jitter_min, Duration::from_secs(1));
        assert_eq!(policy.jitter_max, Duration::from_secs(3));
        assert_eq!(Config::default().connect_timeout(), Duration::from_secs(10));
        assert_eq!(Config::default().read_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "base_url: http://localhost:9000/index.php")?;
        writeln!(tmp, "retry:")?;
        writeln!(tmp, "  max_attempts: 2")?;

        let cfg = Config::from_yaml_file(tmp.path())?;
        assert_eq!(cfg.base_url, "http://localhost:9000/index.php");
        assert_eq!(cfg.retry.max_attempts, 2);
        assert_eq!(cfg.retry.base_delay_secs, 5);
        assert_eq!(cfg.concurrency, 3);
        Ok(())
    }

    #[test]
    fn rejects_zero_attempts() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "retry:\n  max_attempts: 0")?;
        assert!(Config::from_yaml_file(tmp.path()).is_err());
        Ok(())
    }

    #[test]
    fn rejects_unbounded_jitter() -> Result<()> {
        for raw in [".inf", "1e30"] {
            let mut tmp = NamedTempFile::new()?;
            writeln!(tmp, "retry:\n  jitter_max_secs: {raw}")?;
            let err = Config::from_yaml_file(tmp.path()).unwrap_err();
            assert!(format!("{err:#}").contains("jitter_max_secs"), "{err:#}");
        }
        Ok(())
    }

    #[test]
    fn rejects_bad_url() {
        let cfg = Config {
            base_url: "not a url".into(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
