/// Static image tables keyed by Kubernetes `major.minor`
use anyhow::Result;
use tracing::warn;

use super::version::KubernetesVersion;

/// Container image per supported Kubernetes release for one component
pub struct VersionTable {
    component: &'static str,
    entries: &'static [(&'static str, &'static str)],
}

impl VersionTable {
    pub const fn new(
        component: &'static str,
        entries: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { component, entries }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }

    /// Exact lookup by table key
    pub fn get(&self, key: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, image)| *image)
    }

    /// Like [`VersionTable::get`] but a missing key is an error
    pub fn image(&self, key: &str) -> Result<&'static str> {
        self.get(key)
            .ok_or_else(|| anyhow::anyhow!("no {} image for kubernetes {}", self.component, key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    /// Lowest and highest supported keys, ordered by minor version
    fn bounds(&self) -> Option<(&'static str, &'static str)> {
        let mut parsed: Vec<(u32, &'static str)> = self
            .keys()
            .filter_map(|k| KubernetesVersion::parse(k).ok().map(|v| (v.minor, k)))
            .collect();
        parsed.sort_unstable();
        let lowest = parsed.first()?.1;
        let highest = parsed.last()?.1;
        Some((lowest, highest))
    }

    /// Pick the table key to use for `version`.
    ///
    /// An exact match wins. Otherwise versions newer than the newest entry
    /// fall back to the newest one and everything else to the oldest one.
    pub fn resolve_key(&self, version: &KubernetesVersion) -> Result<&'static str> {
        let requested = version.major_minor();
        if let Some(key) = self.keys().find(|k| *k == requested) {
            return Ok(key);
        }

        let (lowest, highest) = self
            .bounds()
            .ok_or_else(|| anyhow::anyhow!("{} version table is empty", self.component))?;

        let highest_minor = KubernetesVersion::parse(highest)?.minor;
        let fallback = if version.minor > highest_minor {
            highest
        } else {
            lowest
        };

        warn!(
            server_version = %requested,
            table = self.component(),
            "officially unsupported host server version, will fallback to virtual cluster version v{}",
            fallback
        );
        Ok(fallback)
    }
}

/// Replace every `(placeholder, value)` pair in `template`
pub fn substitute(template: &str, replacements: &[(&str, &str)]) -> String {
    replacements
        .iter()
        .fold(template.to_string(), |acc, (placeholder, value)| {
            acc.replace(placeholder, value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    static SAMPLE: VersionTable = VersionTable::new(
        "sample",
        &[
            ("1.28", "img:1.28"),
            ("1.27", "img:1.27"),
            ("1.26", "img:1.26"),
            ("1.25", "img:1.25"),
            ("1.24", "img:1.24"),
        ],
    );

    fn resolve(version: &str) -> &'static str {
        SAMPLE
            .resolve_key(&KubernetesVersion::parse(version).unwrap())
            .unwrap()
    }

    #[test]
    fn test_exact_match() {
        assert_eq!(resolve("1.26"), "1.26");
        assert_eq!(resolve("v1.26.9"), "1.26");
        assert_eq!(SAMPLE.get("1.26"), Some("img:1.26"));
    }

    #[test]
    fn test_fallback_above_newest() {
        assert_eq!(resolve("1.30"), "1.28");
    }

    #[test]
    fn test_fallback_below_oldest() {
        assert_eq!(resolve("1.10"), "1.24");
        assert_eq!(resolve("1.9"), "1.24");
    }

    #[test]
    fn test_empty_table() {
        static EMPTY: VersionTable = VersionTable::new("empty", &[]);
        let err = EMPTY
            .resolve_key(&KubernetesVersion::new(1, 27))
            .unwrap_err();
        assert_eq!(err.to_string(), "empty version table is empty");
    }

    #[test]
    fn test_missing_image_error() {
        let err = SAMPLE.image("1.99").unwrap_err();
        assert_eq!(err.to_string(), "no sample image for kubernetes 1.99");
    }

    #[test]
    fn test_substitute() {
        let out = substitute(
            "a: ##A##\nb: ##B##\nagain: ##A##\n",
            &[("##A##", "one"), ("##B##", "two")],
        );
        assert_eq!(out, "a: one\nb: two\nagain: one\n");
    }
}
