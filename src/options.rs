//! Run parameters given as `key=value` tokens.
//!
//! ```text
//! patchget patch=6880880,16867777 platform=226P regexp=.*1120.* download=all
//! ```
//!
//! Tokens without `=` and unknown keys are reported and ignored. The value is
//! everything after the first `=`, so patterns may contain `=` themselves.
//! A repeated key keeps its last value.

use std::path::PathBuf;

use tracing::warn;

use crate::extract::FilenameFilter;

/// Typed run parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Patch numbers in the order given; blank entries are dropped.
    pub patches: Vec<String>,
    /// Platform codes given on the command line.
    pub platforms: Vec<String>,
    /// Filename filter pattern.
    pub regexp: String,
    /// `reset=yes`: ask the portal for the platform list again.
    pub reset: bool,
    /// `download=all`: take every offered file without asking.
    pub download_all: bool,
    /// Directory downloads are written to.
    pub stage_dir: PathBuf,
    /// Portal username.
    pub username: Option<String>,
    /// Portal password.
    pub password: Option<String>,
    /// `silent=yes`: no progress spinner.
    pub silent: bool,
    /// `debug=yes`: print phase timings at the end.
    pub debug: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            patches: Vec::new(),
            platforms: Vec::new(),
            regexp: FilenameFilter::MATCH_ALL.to_string(),
            reset: false,
            download_all: false,
            stage_dir: PathBuf::from("."),
            username: None,
            password: None,
            silent: false,
            debug: false,
        }
    }
}

impl std::fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOptions")
            .field("patches", &self.patches)
            .field("platforms", &self.platforms)
            .field("regexp", &self.regexp)
            .field("reset", &self.reset)
            .field("download_all", &self.download_all)
            .field("stage_dir", &self.stage_dir)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("silent", &self.silent)
            .field("debug", &self.debug)
            .finish()
    }
}

impl RunOptions {
    /// Builds options from `key=value` tokens on top of the defaults.
    pub fn from_params<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        for param in params {
            let param = param.as_ref();
            let Some((key, value)) = param.split_once('=') else {
                warn!(parameter = %param, "ignoring parameter without '='");
                continue;
            };
            options.apply(key, value);
        }
        options
    }

    /// True when there is something to do beyond logging in.
    #[must_use]
    pub fn has_work(&self) -> bool {
        !self.patches.is_empty() || self.reset
    }

    fn apply(&mut self, key: &str, value: &str) {
        match key {
            "patch" => self.patches = split_list(value),
            "platform" => self.platforms = split_list(value),
            "regexp" => self.regexp = value.to_string(),
            "reset" => self.reset = flag(key, value, "yes"),
            "download" => self.download_all = flag(key, value, "all"),
            "stagedir" => self.stage_dir = PathBuf::from(value),
            "MOSUser" => self.username = Some(value.to_string()),
            "MOSPass" => self.password = Some(value.to_string()),
            "silent" => self.silent = flag(key, value, "yes"),
            "debug" => self.debug = flag(key, value, "yes"),
            _ => warn!(key = %key, "ignoring unknown parameter"),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn flag(key: &str, value: &str, enabled: &str) -> bool {
    if value == enabled {
        return true;
    }
    warn!(key = %key, value = %value, expected = %enabled, "parameter value not recognised; treated as off");
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RunOptions::from_params(Vec::<String>::new());
        assert_eq!(options, RunOptions::default());
        assert_eq!(options.regexp, ".*");
        assert_eq!(options.stage_dir, PathBuf::from("."));
        assert!(!options.has_work());
    }

    #[test]
    fn test_all_known_keys() {
        let options = RunOptions::from_params([
            "patch=6880880",
            "platform=226P,46P",
            "regexp=.*1120.*",
            "reset=yes",
            "download=all",
            "stagedir=/tmp/stage",
            "MOSUser=dba@example.com",
            "MOSPass=s3cret",
            "silent=yes",
            "debug=yes",
        ]);
        assert_eq!(options.patches, vec!["6880880"]);
        assert_eq!(options.platforms, vec!["226P", "46P"]);
        assert_eq!(options.regexp, ".*1120.*");
        assert!(options.reset);
        assert!(options.download_all);
        assert_eq!(options.stage_dir, PathBuf::from("/tmp/stage"));
        assert_eq!(options.username.as_deref(), Some("dba@example.com"));
        assert_eq!(options.password.as_deref(), Some("s3cret"));
        assert!(options.silent);
        assert!(options.debug);
    }

    #[test]
    fn test_empty_patch_tokens_are_skipped() {
        let options = RunOptions::from_params(["patch=6880880,,16867777"]);
        assert_eq!(options.patches, vec!["6880880", "16867777"]);
    }

    #[test]
    fn test_value_is_everything_after_first_equals() {
        let options = RunOptions::from_params(["regexp=a=b", "MOSPass=x=y="]);
        assert_eq!(options.regexp, "a=b");
        assert_eq!(options.password.as_deref(), Some("x=y="));
    }

    #[test]
    fn test_tokens_without_equals_and_unknown_keys_are_ignored() {
        let options = RunOptions::from_params(["verbose", "colour=red", "patch=1"]);
        assert_eq!(options.patches, vec!["1"]);
        assert_eq!(
            RunOptions {
                patches: Vec::new(),
                ..options
            },
            RunOptions::default()
        );
    }

    #[test]
    fn test_flags_need_their_exact_value() {
        let options = RunOptions::from_params(["reset=true", "download=some", "silent=YES"]);
        assert!(!options.reset);
        assert!(!options.download_all);
        assert!(!options.silent);
    }

    #[test]
    fn test_reset_alone_has_work() {
        assert!(RunOptions::from_params(["reset=yes"]).has_work());
    }

    #[test]
    fn test_debug_output_redacts_password() {
        let options = RunOptions::from_params(["MOSPass=s3cret"]);
        let rendered = format!("{options:?}");
        assert!(!rendered.contains("s3cret"), "password leaked: {rendered}");
    }
}
