//! Table format strings for the container CLI (`psFormat`, `imagesFormat`, ...).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Listing categories the CLI accepts a `*Format` key for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormatCategory {
    Ps,
    Images,
    Plugins,
    Stats,
    Services,
    Secrets,
    Configs,
    Nodes,
}

impl FormatCategory {
    pub fn all() -> &'static [FormatCategory] {
        &[
            FormatCategory::Ps,
            FormatCategory::Images,
            FormatCategory::Plugins,
            FormatCategory::Stats,
            FormatCategory::Services,
            FormatCategory::Secrets,
            FormatCategory::Configs,
            FormatCategory::Nodes,
        ]
    }

    /// Config key the CLI reads for this category.
    pub fn key(self) -> &'static str {
        match self {
            FormatCategory::Ps => "psFormat",
            FormatCategory::Images => "imagesFormat",
            FormatCategory::Plugins => "pluginsFormat",
            FormatCategory::Stats => "statsFormat",
            FormatCategory::Services => "servicesFormat",
            FormatCategory::Secrets => "secretFormat",
            FormatCategory::Configs => "configFormat",
            FormatCategory::Nodes => "nodesFormat",
        }
    }
}

impl fmt::Display for FormatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormatCategory::Ps => "ps",
            FormatCategory::Images => "images",
            FormatCategory::Plugins => "plugins",
            FormatCategory::Stats => "stats",
            FormatCategory::Services => "services",
            FormatCategory::Secrets => "secrets",
            FormatCategory::Configs => "configs",
            FormatCategory::Nodes => "nodes",
        };
        f.write_str(name)
    }
}

impl FromStr for FormatCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ps" => Ok(FormatCategory::Ps),
            "images" => Ok(FormatCategory::Images),
            "plugins" => Ok(FormatCategory::Plugins),
            "stats" => Ok(FormatCategory::Stats),
            "services" => Ok(FormatCategory::Services),
            "secret" | "secrets" => Ok(FormatCategory::Secrets),
            "config" | "configs" => Ok(FormatCategory::Configs),
            "nodes" => Ok(FormatCategory::Nodes),
            other => Err(format!("unknown format category '{other}'")),
        }
    }
}

/// Column separator: the CLI expands the two-character `\t` escape itself.
pub const COLUMN_SEPARATOR: &str = "\\t";

/// `table {{sel1}}\t{{sel2}}...`
pub fn build(selectors: &[String]) -> String {
    let columns: Vec<String> = selectors.iter().map(|s| format!("{{{{{s}}}}}")).collect();
    format!("table {}", columns.join(COLUMN_SEPARATOR))
}

/// Built format keys plus the categories that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatReport {
    pub formats: BTreeMap<FormatCategory, String>,
    pub skipped: Vec<String>,
}

/// Build every whitelisted, non-empty category; skip the rest.
pub fn build_formats(formats: &BTreeMap<String, Vec<String>>) -> FormatReport {
    let mut report = FormatReport::default();
    for (name, selectors) in formats {
        match name.parse::<FormatCategory>() {
            Ok(_) if selectors.is_empty() => report.skipped.push(name.clone()),
            Ok(category) => {
                report.formats.insert(category, build(selectors));
            }
            Err(_) => report.skipped.push(name.clone()),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn build_wraps_and_joins() {
        assert_eq!(
            build(&sel(&[".ID", ".Image"])),
            r"table {{.ID}}\t{{.Image}}"
        );
        assert_eq!(build(&sel(&[".ID"])), "table {{.ID}}");
    }

    #[test]
    fn keys_are_distinct() {
        let mut keys: Vec<_> = FormatCategory::all().iter().map(|c| c.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), FormatCategory::all().len());
    }

    #[test]
    fn unknown_and_empty_categories_are_skipped() {
        let mut input = BTreeMap::new();
        input.insert("volumes".to_string(), sel(&[".Name"]));
        input.insert("ps".to_string(), Vec::new());
        input.insert("secret".to_string(), sel(&[".ID", ".Name"]));

        let report = build_formats(&input);
        assert_eq!(report.formats.len(), 1);
        assert_eq!(
            report.formats.get(&FormatCategory::Secrets).map(String::as_str),
            Some(r"table {{.ID}}\t{{.Name}}")
        );
        assert_eq!(report.skipped, vec!["ps".to_string(), "volumes".to_string()]);
    }
}
