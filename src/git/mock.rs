//! Scripted git runner for testing

use super::runner::{GitInvocation, GitRunner, ToolOutput};
use crate::error::{SyncError, SyncResult};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Response to a scripted invocation
#[derive(Debug, Clone)]
pub enum MockResponse {
    Output(ToolOutput),
    TimedOut,
}

struct Rule {
    prefix: Vec<String>,
    responses: VecDeque<MockResponse>,
}

#[derive(Default)]
struct MockGitState {
    rules: Vec<Rule>,
    calls: Vec<GitInvocation>,
}

/// In-memory git that answers from a script and records every invocation
///
/// Rules match on a prefix of the subcommand arguments (everything after
/// `-C <repo>`). The most recently added matching rule wins. A rule given
/// several responses hands them out in order and then keeps repeating the
/// last one. Unmatched invocations succeed with empty output.
///
/// # Example
/// ```
/// use tracksync::git::{GitInvocation, GitRunner, MockGit, ToolOutput};
/// use std::path::Path;
///
/// let git = MockGit::new().on(&["status"], ToolOutput::success("M  a.txt"));
/// let out = git
///     .run(&GitInvocation::in_repo(Path::new("/r"), ["status", "--porcelain"]))
///     .unwrap();
/// assert_eq!(out.stdout, "M  a.txt");
/// assert!(git.was_called(&["status"]));
/// ```
#[derive(Clone, Default)]
pub struct MockGit {
    state: Arc<Mutex<MockGitState>>,
}

impl MockGit {
    /// A mock with no rules
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer invocations starting with `prefix` with `output`
    #[must_use]
    pub fn on(self, prefix: &[&str], output: ToolOutput) -> Self {
        self.on_sequence(prefix, vec![MockResponse::Output(output)])
    }

    /// Make invocations starting with `prefix` time out
    #[must_use]
    pub fn on_timeout(self, prefix: &[&str]) -> Self {
        self.on_sequence(prefix, vec![MockResponse::TimedOut])
    }

    /// Answer successive invocations starting with `prefix` in order
    #[must_use]
    pub fn on_sequence(self, prefix: &[&str], responses: Vec<MockResponse>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.rules.push(Rule {
                prefix: prefix.iter().map(|s| (*s).to_owned()).collect(),
                responses: responses.into(),
            });
        }
        self
    }

    /// Every invocation so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<GitInvocation> {
        self.state
            .lock()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }

    /// Subcommand arguments of every invocation so far
    #[must_use]
    pub fn call_args(&self) -> Vec<Vec<String>> {
        self.calls().into_iter().map(|c| c.args).collect()
    }

    /// Whether any invocation started with `prefix`
    #[must_use]
    pub fn was_called(&self, prefix: &[&str]) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    /// How many invocations started with `prefix`
    #[must_use]
    pub fn count(&self, prefix: &[&str]) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

impl GitRunner for MockGit {
    fn run(&self, invocation: &GitInvocation) -> SyncResult<ToolOutput> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| SyncError::tool(format!("mock git poisoned: {e}")))?;
        state.calls.push(invocation.clone());

        let response = state.rules.iter_mut().rev().find_map(|rule| {
            let prefix: Vec<&str> = rule.prefix.iter().map(String::as_str).collect();
            if !invocation.starts_with(&prefix) {
                return None;
            }
            if rule.responses.len() > 1 {
                rule.responses.pop_front()
            } else {
                rule.responses.front().cloned()
            }
        });
        drop(state);

        match response {
            Some(MockResponse::Output(output)) => Ok(output),
            Some(MockResponse::TimedOut) => Err(SyncError::timeout(invocation.timeout_message)),
            None => Ok(ToolOutput::success("")),
        }
    }
}
