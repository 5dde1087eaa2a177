//! Run configuration: repository and deployment tables, resolved options,
//! and the positional-token command line dialect.

use anyhow::bail;

use crate::store::KeyPrefix;

/// Known deployments, default first.
pub const DEPLOYMENTS: &[&str] = &["production", "staging"];
pub const DEF_DEPLOYMENT: &str = "production";

/// Member repository codes and their descriptive names.
pub const REPO_TABLE: &[(&str, &str)] = &[
    ("ia", "archive"),
    ("ht", "hathi"),
    ("bs", "bookshare"),
];

/// Repositories processed when none are selected explicitly.
pub const TARGET_REPOS: &[&str] = &["ia"];
pub const DEF_REPO: &str = "ia";

/// Requested control action instead of a processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Check,
    Clear,
    Pause,
    Resume,
}

/// Fully resolved options for one invocation, threaded explicitly into the
/// pipeline and controller rather than read from ambient process state.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Selected repository codes; empty means [`TARGET_REPOS`].
    pub repos: Vec<String>,
    /// Selected deployments; empty means every deployment.
    pub deployments: Vec<String>,
    /// Control action, if any; suppresses pipeline runs for this invocation.
    pub action: Option<ControlAction>,
    /// Simulate remote side effects without performing them.
    pub dry_run: bool,
    pub debug: bool,
    /// Which staged keys discovery considers.
    pub prefix: KeyPrefix,
    /// Send file-level metadata separately from the title entry.
    pub split_file_metadata: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            repos: Vec::new(),
            deployments: Vec::new(),
            action: None,
            dry_run: false,
            debug: false,
            prefix: KeyPrefix::TopLevel,
            split_file_metadata: false,
        }
    }
}

impl RunOptions {
    /// Interpret the positional command-line tokens. Tokens select a control
    /// action, specific repositories, specific deployments, or `all`
    /// repositories, in any order; anything else is a usage error.
    pub fn from_tokens<T: AsRef<str>>(tokens: &[T]) -> anyhow::Result<RunOptions> {
        let mut options = RunOptions::default();
        let mut all_repos = false;
        for token in tokens {
            match token.as_ref() {
                "check" | "check_pause" => options.action = Some(ControlAction::Check),
                "clear" | "reset" => options.action = Some(ControlAction::Clear),
                "halt" | "pause" => options.action = Some(ControlAction::Pause),
                "resume" | "unpause" => options.action = Some(ControlAction::Resume),
                "all" => all_repos = true,
                token if REPO_TABLE.iter().any(|(code, _)| *code == token) => {
                    options.repos.push(token.to_string());
                }
                token if DEPLOYMENTS.contains(&token) => {
                    options.deployments.push(token.to_string());
                }
                other => bail!("{other}: invalid command-line option"),
            }
        }
        if all_repos {
            options.repos = REPO_TABLE.iter().map(|(code, _)| code.to_string()).collect();
        }
        Ok(options)
    }

    /// The repositories this invocation covers.
    pub fn selected_repos(&self) -> Vec<String> {
        if self.repos.is_empty() {
            TARGET_REPOS.iter().map(|repo| repo.to_string()).collect()
        } else {
            self.repos.clone()
        }
    }

    /// The deployments this invocation covers.
    pub fn selected_deployments(&self) -> Vec<String> {
        if self.deployments.is_empty() {
            DEPLOYMENTS.iter().map(|dep| dep.to_string()).collect()
        } else {
            self.deployments.clone()
        }
    }
}

const TRUE_VALUES: &[&str] = &["1", "yes", "true", "on"];
const FALSE_VALUES: &[&str] = &["0", "no", "false", "off"];

/// Resolve a boolean environment variable, accepting the usual spellings in
/// either case. Unset or unrecognised values yield the default.
pub fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => {
            let value = value.to_lowercase();
            if TRUE_VALUES.contains(&value.as_str()) {
                true
            } else if FALSE_VALUES.contains(&value.as_str()) {
                false
            } else {
                default
            }
        }
        Err(_) => default,
    }
}
