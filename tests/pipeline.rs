//! End-to-end pipeline tests: document decoding through dedup,
//! aggregation, rendering, and on-disk output layout.

use ruleforge::config::{Config, NetworkClass, RuleKind, SourceFormat};
use ruleforge::formatter::RenderOptions;
use ruleforge::parser::parse_document;
use ruleforge::ruleset::Ruleset;
use ruleforge::sink::write_outputs;

/// Feed a decoded document into the ruleset, mirroring the update command.
fn ingest(ruleset: &mut Ruleset, content: &str, format: &SourceFormat, kind: &RuleKind, class: NetworkClass) -> usize {
    let entries = parse_document(content, format).unwrap();
    entries
        .iter()
        .filter(|entry| ruleset.add(entry, kind, class))
        .count()
}

#[test]
fn test_full_pipeline_output_layout() {
    let dir = tempfile::tempdir().unwrap();

    let mut ruleset = Ruleset::new();

    // Plain domain list
    ingest(
        &mut ruleset,
        "google.com\nexample.com\n",
        &SourceFormat::List,
        &RuleKind::DomainSuffix,
        NetworkClass::Proxy,
    );

    // Rule-provider domain list with wildcard prefixes, one duplicate
    ingest(
        &mut ruleset,
        "payload:\n  - '+.example.com'\n  - '+.baidu.com'\n",
        &SourceFormat::RuleProvider,
        &RuleKind::DomainSuffix,
        NetworkClass::Direct,
    );

    // Rule-provider CIDR list with mergeable siblings
    ingest(
        &mut ruleset,
        "payload:\n  - 10.0.0.0/25\n  - 10.0.0.128/25\n",
        &SourceFormat::RuleProviderCidr,
        &RuleKind::Cidr,
        NetworkClass::Direct,
    );

    assert_eq!(ruleset.unique_len(), 5);

    let output = ruleset.finalize(&RenderOptions::default());
    let written = write_outputs(dir.path(), "clash", &output);

    // Three plain categories plus two directive classes
    assert_eq!(written, 5);

    assert_eq!(
        std::fs::read_to_string(dir.path().join("Proxy_DomainSuffix.txt")).unwrap(),
        "example.com\ngoogle.com"
    );
    // example.com already belongs to Proxy; Direct keeps only baidu.com
    assert_eq!(
        std::fs::read_to_string(dir.path().join("Direct_DomainSuffix.txt")).unwrap(),
        "baidu.com"
    );
    // The two /25 siblings collapse into their /24 parent
    assert_eq!(
        std::fs::read_to_string(dir.path().join("Direct_IpCidr.txt")).unwrap(),
        "10.0.0.0/24"
    );

    let direct_doc = std::fs::read_to_string(dir.path().join("clash/Direct.txt")).unwrap();
    let lines: Vec<&str> = direct_doc.lines().collect();
    assert_eq!(lines, vec!["DOMAIN-SUFFIX,baidu.com", "IP-CIDR,10.0.0.0/24,no-resolve"]);

    assert_eq!(
        std::fs::read_to_string(dir.path().join("clash/Proxy.txt")).unwrap(),
        "DOMAIN-SUFFIX,example.com\nDOMAIN-SUFFIX,google.com"
    );
}

#[test]
fn test_pipeline_first_source_wins() {
    let mut ruleset = Ruleset::new();

    let first = ingest(
        &mut ruleset,
        "shared.com\nonly-first.com\n",
        &SourceFormat::List,
        &RuleKind::DomainSuffix,
        NetworkClass::Proxy,
    );
    let second = ingest(
        &mut ruleset,
        "shared.com\nonly-second.com\n",
        &SourceFormat::List,
        &RuleKind::DomainSuffix,
        NetworkClass::Direct,
    );

    assert_eq!(first, 2);
    assert_eq!(second, 1);

    let output = ruleset.finalize(&RenderOptions::default());
    assert_eq!(
        output.plain.get("Proxy_DomainSuffix").map(String::as_str),
        Some("only-first.com\nshared.com")
    );
    assert_eq!(
        output.plain.get("Direct_DomainSuffix").map(String::as_str),
        Some("only-second.com")
    );
}

#[test]
fn test_pipeline_bare_domain_becomes_exact_directive() {
    let mut ruleset = Ruleset::new();
    ingest(
        &mut ruleset,
        "cn\nexample.com\n",
        &SourceFormat::List,
        &RuleKind::DomainSuffix,
        NetworkClass::Direct,
    );

    let output = ruleset.finalize(&RenderOptions::default());
    let doc = output.directives.get(&NetworkClass::Direct).unwrap();
    let lines: Vec<&str> = doc.lines().collect();
    assert_eq!(lines, vec!["DOMAIN,cn", "DOMAIN-SUFFIX,example.com"]);
}

#[test]
fn test_pipeline_provider_blanks_never_reach_output() {
    let mut ruleset = Ruleset::new();
    ingest(
        &mut ruleset,
        "payload:\n  - ''\n  - '+.'\n  - real.com\n",
        &SourceFormat::RuleProvider,
        &RuleKind::DomainSuffix,
        NetworkClass::Proxy,
    );

    let output = ruleset.finalize(&RenderOptions::default());
    assert_eq!(
        output.plain.get("Proxy_DomainSuffix").map(String::as_str),
        Some("real.com")
    );
    assert_eq!(
        output.directives.get(&NetworkClass::Proxy).map(String::as_str),
        Some("DOMAIN-SUFFIX,real.com")
    );
}

#[test]
fn test_pipeline_mixed_family_cidrs() {
    let mut ruleset = Ruleset::new();
    ingest(
        &mut ruleset,
        "payload:\n  - 10.0.0.0/8\n  - 2001:db8::/32\n",
        &SourceFormat::RuleProviderCidr,
        &RuleKind::Cidr,
        NetworkClass::Proxy,
    );

    let output = ruleset.finalize(&RenderOptions { no_resolve: true });
    let doc = output.directives.get(&NetworkClass::Proxy).unwrap();
    let lines: Vec<&str> = doc.lines().collect();
    assert_eq!(
        lines,
        vec!["IP-CIDR,10.0.0.0/8,no-resolve", "IP-CIDR6,2001:db8::/32,no-resolve"]
    );
}

#[test]
fn test_pipeline_no_resolve_disabled() {
    let mut ruleset = Ruleset::new();
    ingest(
        &mut ruleset,
        "192.168.0.0/16\n",
        &SourceFormat::List,
        &RuleKind::Cidr,
        NetworkClass::Direct,
    );

    let output = ruleset.finalize(&RenderOptions { no_resolve: false });
    assert_eq!(
        output.directives.get(&NetworkClass::Direct).map(String::as_str),
        Some("IP-CIDR,192.168.0.0/16")
    );
}

#[test]
fn test_pipeline_rerun_overwrites_outputs() {
    let dir = tempfile::tempdir().unwrap();

    let mut first = Ruleset::new();
    first.add("old.com", &RuleKind::DomainSuffix, NetworkClass::Proxy);
    write_outputs(dir.path(), "clash", &first.finalize(&RenderOptions::default()));

    let mut second = Ruleset::new();
    second.add("new.com", &RuleKind::DomainSuffix, NetworkClass::Proxy);
    write_outputs(dir.path(), "clash", &second.finalize(&RenderOptions::default()));

    assert_eq!(
        std::fs::read_to_string(dir.path().join("Proxy_DomainSuffix.txt")).unwrap(),
        "new.com"
    );
}

#[test]
fn test_config_save_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ruleforge.yaml");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.output_dir, config.output_dir);
    assert_eq!(loaded.directive_dir, config.directive_dir);
    assert_eq!(loaded.no_resolve, config.no_resolve);
    assert_eq!(loaded.sources.len(), config.sources.len());
    for (a, b) in loaded.sources.iter().zip(config.sources.iter()) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.url, b.url);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.class, b.class);
    }
}

#[test]
fn test_partial_config_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ruleforge.yaml");
    std::fs::write(&path, "output_dir: custom-rules\nsources: []\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.output_dir, std::path::PathBuf::from("custom-rules"));
    assert_eq!(config.directive_dir, "clash");
    assert!(config.no_resolve);
    assert!(config.sources.is_empty());
}
