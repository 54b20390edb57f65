//! Configuration management for ruleforge.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// How a source document is decoded into raw entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    /// Plain text, one entry per line.
    List,
    /// Clash rule-provider document (`payload:` list), `+.` wildcard prefix stripped.
    RuleProvider,
    /// Clash rule-provider document carrying CIDR literals verbatim.
    RuleProviderCidr,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::List => write!(f, "list"),
            SourceFormat::RuleProvider => write!(f, "rule-provider"),
            SourceFormat::RuleProviderCidr => write!(f, "rule-provider-cidr"),
        }
    }
}

/// The kind of rule a source contributes.
///
/// `Other` carries provider-specific directive keywords verbatim so new
/// Clash rule types pass through without a code change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleKind {
    DomainSuffix,
    #[serde(rename = "IpCidr")]
    Cidr,
    ProcessName,
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::DomainSuffix => write!(f, "DomainSuffix"),
            RuleKind::Cidr => write!(f, "IpCidr"),
            RuleKind::ProcessName => write!(f, "ProcessName"),
            RuleKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Routing class a rule belongs to. One directive file is emitted per class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NetworkClass {
    Direct,
    Proxy,
    AdBlock,
    Privacy,
}

impl fmt::Display for NetworkClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkClass::Direct => write!(f, "Direct"),
            NetworkClass::Proxy => write!(f, "Proxy"),
            NetworkClass::AdBlock => write!(f, "AdBlock"),
            NetworkClass::Privacy => write!(f, "Privacy"),
        }
    }
}

/// A configured upstream rule list.
///
/// Declaration order is semantic: earlier sources win when the same entry
/// appears in more than one list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSource {
    pub name: String,
    pub url: String,
    pub format: SourceFormat,
    pub kind: RuleKind,
    pub class: NetworkClass,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for generated rule files
    pub output_dir: PathBuf,

    /// Subdirectory of `output_dir` for Clash directive files
    pub directive_dir: String,

    /// Append `,no-resolve` to IP-CIDR / IP-CIDR6 directives
    pub no_resolve: bool,

    /// Upstream rule lists, in precedence order
    pub sources: Vec<RuleSource>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("rules"),
            directive_dir: "clash".to_string(),
            no_resolve: true,
            sources: default_sources(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration, falling back to the built-in defaults when the
    /// file does not exist. A present-but-broken file is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            tracing::info!(
                "No config file at {:?}, using built-in source list",
                path.as_ref()
            );
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            anyhow::bail!("output_dir must not be empty");
        }

        if self.directive_dir.is_empty() {
            anyhow::bail!("directive_dir must not be empty");
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.is_empty() {
                anyhow::bail!("Source with URL {} has an empty name", source.url);
            }
            if !names.insert(source.name.as_str()) {
                anyhow::bail!("Duplicate source name: {}", source.name);
            }
            if source.enabled && !source.url.starts_with("https://") {
                anyhow::bail!(
                    "Source '{}' URL must use HTTPS: {}",
                    source.name,
                    source.url
                );
            }
        }

        Ok(())
    }

    /// Save configuration to YAML file atomically
    ///
    /// Uses tempfile + rename pattern to prevent corruption on crash.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let path = path.as_ref();
        let content = serde_yaml::to_string(self).with_context(|| "Failed to serialize config")?;

        // Create temporary file in the same directory for atomic rename
        let parent_dir = path.parent().unwrap_or(Path::new("."));
        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .context("Failed to create temporary file for config")?;

        temp_file.write_all(content.as_bytes())?;
        temp_file.as_file().sync_all()?;

        temp_file
            .persist(path)
            .with_context(|| format!("Failed to persist config file: {:?}", path))?;

        Ok(())
    }

    /// Sources that take part in an update run, in declaration order.
    pub fn enabled_sources(&self) -> Vec<&RuleSource> {
        self.sources.iter().filter(|s| s.enabled).collect()
    }

    /// Path of the JSON run-state file inside the output directory.
    pub fn state_path(&self) -> PathBuf {
        self.output_dir.join("state.json")
    }

    /// Path of the advisory lock file inside the output directory.
    pub fn lock_path(&self) -> PathBuf {
        self.output_dir.join(".ruleforge.lock")
    }
}

fn source(
    name: &str,
    url: &str,
    format: SourceFormat,
    kind: RuleKind,
    class: NetworkClass,
) -> RuleSource {
    RuleSource {
        name: name.to_string(),
        url: url.to_string(),
        format,
        kind,
        class,
        enabled: true,
    }
}

fn default_sources() -> Vec<RuleSource> {
    use NetworkClass::{AdBlock, Direct, Proxy};
    use RuleKind::{Cidr, DomainSuffix, ProcessName};
    use SourceFormat::{List, RuleProvider, RuleProviderCidr};

    vec![
        source(
            "curated-direct-domains",
            "https://raw.githubusercontent.com/ruleforge/ruleforge/main/seeds/Direct_DomainSuffix.txt",
            List,
            DomainSuffix,
            Direct,
        ),
        source(
            "curated-proxy-domains",
            "https://raw.githubusercontent.com/ruleforge/ruleforge/main/seeds/Proxy_DomainSuffix.txt",
            List,
            DomainSuffix,
            Proxy,
        ),
        source(
            "google-cn-ban",
            "https://raw.githubusercontent.com/cobaltdisco/Google-Chinese-Results-Blocklist/master/GHHbD_perma_ban_list.txt",
            List,
            DomainSuffix,
            AdBlock,
        ),
        source(
            "v2ray-reject",
            "https://raw.githubusercontent.com/Loyalsoldier/v2ray-rules-dat/release/reject-list.txt",
            List,
            DomainSuffix,
            AdBlock,
        ),
        source(
            "telegram-cidr",
            "https://raw.githubusercontent.com/Loyalsoldier/clash-rules/release/telegramcidr.txt",
            RuleProviderCidr,
            Cidr,
            Proxy,
        ),
        source(
            "clash-google",
            "https://raw.githubusercontent.com/Loyalsoldier/clash-rules/release/google.txt",
            RuleProvider,
            DomainSuffix,
            Proxy,
        ),
        source(
            "v2ray-proxy",
            "https://raw.githubusercontent.com/Loyalsoldier/v2ray-rules-dat/release/proxy-list.txt",
            List,
            DomainSuffix,
            Proxy,
        ),
        source(
            "clash-greatfire",
            "https://raw.githubusercontent.com/Loyalsoldier/clash-rules/release/greatfire.txt",
            RuleProvider,
            DomainSuffix,
            Proxy,
        ),
        source(
            "v2ray-greatfire",
            "https://raw.githubusercontent.com/Loyalsoldier/v2ray-rules-dat/release/greatfire.txt",
            List,
            DomainSuffix,
            Proxy,
        ),
        source(
            "v2ray-gfw",
            "https://raw.githubusercontent.com/Loyalsoldier/v2ray-rules-dat/release/gfw.txt",
            List,
            DomainSuffix,
            Proxy,
        ),
        source(
            "cn-blocked-domains",
            "https://raw.githubusercontent.com/Loyalsoldier/cn-blocked-domain/release/domains.txt",
            List,
            DomainSuffix,
            Proxy,
        ),
        source(
            "v2ray-direct",
            "https://raw.githubusercontent.com/Loyalsoldier/v2ray-rules-dat/release/direct-list.txt",
            List,
            DomainSuffix,
            Direct,
        ),
        source(
            "cn-ip-cidr",
            "https://raw.githubusercontent.com/Hackl0us/GeoIP2-CN/release/CN-ip-cidr.txt",
            List,
            Cidr,
            Direct,
        ),
        source(
            "iplist-china",
            "https://raw.githubusercontent.com/metowolf/iplist/master/data/special/china.txt",
            List,
            Cidr,
            Direct,
        ),
        source(
            "lan-cidr",
            "https://raw.githubusercontent.com/Loyalsoldier/clash-rules/release/lancidr.txt",
            RuleProviderCidr,
            Cidr,
            Direct,
        ),
        source(
            "curated-direct-process",
            "https://raw.githubusercontent.com/ruleforge/ruleforge/main/seeds/Direct_ProcessName.txt",
            List,
            ProcessName,
            Direct,
        ),
        source(
            "curated-proxy-process",
            "https://raw.githubusercontent.com/ruleforge/ruleforge/main/seeds/Proxy_ProcessName.txt",
            List,
            ProcessName,
            Proxy,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output_dir, PathBuf::from("rules"));
        assert_eq!(config.directive_dir, "clash");
        assert!(config.no_resolve);
        assert_eq!(config.sources.len(), 17);
    }

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.sources.len(), config.sources.len());
        assert_eq!(parsed.directive_dir, config.directive_dir);
        assert_eq!(parsed.sources[0].name, config.sources[0].name);
        assert_eq!(parsed.sources[0].kind, config.sources[0].kind);
    }

    #[test]
    fn test_validation_http_url_rejected() {
        let mut config = Config::default();
        config.sources[0].url = "http://example.com/list.txt".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("HTTPS"));
    }

    #[test]
    fn test_validation_disabled_http_allowed() {
        let mut config = Config::default();
        config.sources[0].url = "http://example.com/list.txt".to_string();
        config.sources[0].enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_duplicate_names() {
        let mut config = Config::default();
        let dup = config.sources[0].name.clone();
        config.sources[1].name = dup;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Duplicate"));
    }

    #[test]
    fn test_validation_empty_name() {
        let mut config = Config::default();
        config.sources[0].name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_empty_output_dir() {
        let config = Config {
            output_dir: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enabled_sources_order_preserved() {
        let mut config = Config::default();
        config.sources[2].enabled = false;
        let enabled = config.enabled_sources();
        assert_eq!(enabled.len(), 16);
        assert_eq!(enabled[0].name, config.sources[0].name);
        assert_eq!(enabled[2].name, config.sources[3].name);
    }

    #[test]
    fn test_rule_kind_other_roundtrip() {
        let kind: RuleKind = serde_yaml::from_str("DST-PORT").unwrap();
        assert_eq!(kind, RuleKind::Other("DST-PORT".to_string()));
        assert_eq!(kind.to_string(), "DST-PORT");
    }

    #[test]
    fn test_rule_kind_known_names() {
        let kind: RuleKind = serde_yaml::from_str("IpCidr").unwrap();
        assert_eq!(kind, RuleKind::Cidr);
        assert_eq!(RuleKind::DomainSuffix.to_string(), "DomainSuffix");
        assert_eq!(RuleKind::Cidr.to_string(), "IpCidr");
        assert_eq!(RuleKind::ProcessName.to_string(), "ProcessName");
    }

    #[test]
    fn test_source_format_serde_names() {
        let fmt: SourceFormat = serde_yaml::from_str("rule-provider-cidr").unwrap();
        assert_eq!(fmt, SourceFormat::RuleProviderCidr);
        let fmt: SourceFormat = serde_yaml::from_str("list").unwrap();
        assert_eq!(fmt, SourceFormat::List);
    }

    #[test]
    fn test_enabled_defaults_to_true() {
        let yaml = r#"
name: test
url: "https://example.com/list.txt"
format: list
kind: DomainSuffix
class: Direct
"#;
        let source: RuleSource = serde_yaml::from_str(yaml).unwrap();
        assert!(source.enabled);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let config = Config::default();
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.sources.len(), config.sources.len());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("missing.yaml")).unwrap();
        assert_eq!(config.sources.len(), 17);
    }

    #[test]
    fn test_state_and_lock_paths() {
        let config = Config::default();
        assert_eq!(config.state_path(), PathBuf::from("rules/state.json"));
        assert_eq!(config.lock_path(), PathBuf::from("rules/.ruleforge.lock"));
    }
}
