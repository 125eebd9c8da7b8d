//! Ignore manifests for source collection
//!
//! Handles `.npmignore`/`.gitignore` style rule files.

use globset::{GlobBuilder, GlobMatcher};
use std::fs;
use std::path::Path;

/// Errors for ignore rules
#[derive(Debug, thiserror::Error)]
pub enum IgnoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Glob pattern error: {0}")]
    GlobError(#[from] globset::Error),
}

#[derive(Debug, Clone)]
struct IgnoreRule {
    matcher: GlobMatcher,
    negated: bool,
    dir_only: bool,
}

impl IgnoreRule {
    /// Parse one manifest line. Blank lines and comments yield `None`.
    fn parse(line: &str) -> Result<Option<Self>, IgnoreError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line.strip_prefix('\\').unwrap_or(line)),
        };

        let (dir_only, body) = match body.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, body),
        };

        // A slash anywhere but the end anchors the pattern to the root
        let anchored = body.contains('/');
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            return Ok(None);
        }

        let pattern = if anchored {
            body.to_string()
        } else {
            format!("**/{}", body)
        };

        let matcher = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()?
            .compile_matcher();

        Ok(Some(Self {
            matcher,
            negated,
            dir_only,
        }))
    }

    fn matches(&self, path: &str, is_dir: bool) -> bool {
        (!self.dir_only || is_dir) && self.matcher.is_match(path)
    }
}

/// Ordered ignore rules with gitignore semantics.
///
/// The last rule matching a path decides; `!pattern` re-includes.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<IgnoreRule>,
}

impl IgnoreRules {
    /// Empty rule set, ignores nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse rules from manifest lines
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Self, IgnoreError> {
        Self::new().with_lines(lines)
    }

    /// Load rules from an ignore manifest
    pub fn from_file(path: &Path) -> Result<Self, IgnoreError> {
        let contents = fs::read_to_string(path)?;
        Self::from_lines(contents.lines())
    }

    /// Append more rules; later rules take precedence
    pub fn with_lines<'a>(
        mut self,
        lines: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, IgnoreError> {
        for line in lines {
            if let Some(rule) = IgnoreRule::parse(line)? {
                self.rules.push(rule);
            }
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check whether a root-relative path is ignored
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(&path_str, is_dir))
            .map(|rule| !rule.negated)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(lines: &[&str]) -> IgnoreRules {
        IgnoreRules::from_lines(lines.iter().copied()).unwrap()
    }

    #[test]
    fn test_unanchored_matches_any_depth() {
        let rules = rules(&["*.log"]);

        assert!(rules.is_ignored(Path::new("debug.log"), false));
        assert!(rules.is_ignored(Path::new("lib/deep/trace.log"), false));
        assert!(!rules.is_ignored(Path::new("lib/index.js"), false));
    }

    #[test]
    fn test_anchored_matches_root_only() {
        let rules = rules(&["/coverage", "test/fixtures"]);

        assert!(rules.is_ignored(Path::new("coverage"), true));
        assert!(!rules.is_ignored(Path::new("lib/coverage"), true));
        assert!(rules.is_ignored(Path::new("test/fixtures"), true));
        assert!(!rules.is_ignored(Path::new("lib/test/fixtures"), true));
    }

    #[test]
    fn test_dir_only_pattern() {
        let rules = rules(&["build/"]);

        assert!(rules.is_ignored(Path::new("build"), true));
        assert!(!rules.is_ignored(Path::new("build"), false));
    }

    #[test]
    fn test_negation_last_match_wins() {
        let rules = rules(&["*.json", "!package.json"]);

        assert!(rules.is_ignored(Path::new("tsconfig.json"), false));
        assert!(!rules.is_ignored(Path::new("package.json"), false));

        let reversed = self::rules(&["!package.json", "*.json"]);
        assert!(reversed.is_ignored(Path::new("package.json"), false));
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let rules = rules(&["/lib/*.js"]);

        assert!(rules.is_ignored(Path::new("lib/a.js"), false));
        assert!(!rules.is_ignored(Path::new("lib/sub/a.js"), false));
    }

    #[test]
    fn test_ignore_file_parsing() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# Comment").unwrap();
        writeln!(file, "*.tmp").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  test/  ").unwrap();

        let rules = IgnoreRules::from_file(file.path()).unwrap();

        assert!(rules.is_ignored(Path::new("a.tmp"), false));
        assert!(rules.is_ignored(Path::new("test"), true));
        assert!(!rules.is_ignored(Path::new("index.js"), false));
    }

    #[test]
    fn test_empty_rules_ignore_nothing() {
        let rules = IgnoreRules::new();
        assert!(rules.is_empty());
        assert!(!rules.is_ignored(Path::new("anything"), false));
    }
}
