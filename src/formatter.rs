//! Rendering of finalized entries as plain lists and Clash directives.

use ipnet::IpNet;
use tracing::warn;

use crate::config::RuleKind;

/// Output rendering options.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Append `,no-resolve` to IP-CIDR / IP-CIDR6 directives so the client
    /// never resolves a hostname just to match these rules.
    pub no_resolve: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { no_resolve: true }
    }
}

/// Render one entry as a Clash routing directive.
///
/// Entries without a dot are bare hostnames and map to an exact `DOMAIN`
/// match; everything else under `DomainSuffix` is a suffix match. CIDR
/// entries pick `IP-CIDR` or `IP-CIDR6` by address family; a literal that
/// fails to parse is reported and produces no line.
pub fn directive_line(kind: &RuleKind, entry: &str, options: &RenderOptions) -> Option<String> {
    match kind {
        RuleKind::DomainSuffix => {
            if entry.contains('.') {
                Some(format!("DOMAIN-SUFFIX,{}", entry))
            } else {
                Some(format!("DOMAIN,{}", entry))
            }
        }
        RuleKind::Cidr => match entry.parse::<IpNet>() {
            Ok(IpNet::V4(_)) if options.no_resolve => {
                Some(format!("IP-CIDR,{},no-resolve", entry))
            }
            Ok(IpNet::V4(_)) => Some(format!("IP-CIDR,{}", entry)),
            Ok(IpNet::V6(_)) if options.no_resolve => {
                Some(format!("IP-CIDR6,{},no-resolve", entry))
            }
            Ok(IpNet::V6(_)) => Some(format!("IP-CIDR6,{}", entry)),
            Err(_) => {
                warn!("Skipping directive for invalid CIDR: {}", entry);
                None
            }
        },
        RuleKind::ProcessName => Some(format!("PROCESS-NAME,{}", entry)),
        RuleKind::Other(keyword) => Some(format!("{},{}", keyword, entry)),
    }
}

/// Render lines as a sorted newline-joined document, dropping empties.
pub fn render_lines(mut lines: Vec<String>) -> String {
    lines.retain(|line| !line.is_empty());
    lines.sort_unstable();
    lines.join("\n")
}

/// Render raw entries as a plain per-category list.
pub fn render_plain(entries: &[String]) -> String {
    render_lines(entries.to_vec())
}
