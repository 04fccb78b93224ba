//! Busy flag, worker messages and push pre-check

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::{Arc, Mutex};
    use tracksync::config::Config;
    use tracksync::error::SyncResult;
    use tracksync::git::{GitInvocation, GitRunner, MockGit, ToolOutput};
    use tracksync::operations::RepoState;
    use tracksync::session::{Action, Outcome, Session, Startup};
    use tracksync::system::MockSystem;

    /// Git whose every call blocks until the test releases it
    struct GatedGit {
        gate: Mutex<Receiver<()>>,
    }

    impl GatedGit {
        fn new() -> (Self, Sender<()>) {
            let (tx, rx) = mpsc::channel();
            (Self { gate: Mutex::new(rx) }, tx)
        }
    }

    impl GitRunner for GatedGit {
        fn run(&self, _invocation: &GitInvocation) -> SyncResult<ToolOutput> {
            let _ = self.gate.lock().unwrap().recv();
            Ok(ToolOutput::success(""))
        }
    }

    /// Git that dies mid-action without reporting
    struct PanickingGit;

    impl GitRunner for PanickingGit {
        fn run(&self, _invocation: &GitInvocation) -> SyncResult<ToolOutput> {
            panic!("git runner crashed");
        }
    }

    fn list_config() -> Config {
        serde_json::from_str(r#"{"repo_path": "/r", "files": ["a.txt"], "folders": []}"#).unwrap()
    }

    fn session(config: Config, git: &MockGit, system: &MockSystem) -> Session {
        Session::new(config, Arc::new(git.clone()), Arc::new(system.clone()))
    }

    #[test]
    fn test_second_action_ignored_while_busy() {
        let (git, release) = GatedGit::new();
        let session = Session::new(
            Config::default(),
            Arc::new(git),
            Arc::new(MockSystem::new()),
        );

        assert!(session.submit(Action::Probe {
            remote_url: "https://example.com/site.git".to_owned()
        }));
        assert!(session.is_busy());
        assert!(!session.submit(Action::Refresh));
        assert_eq!(session.startup(), Startup::Unconfigured);

        release.send(()).unwrap();
        let outcome = session.wait_for_completion(&mut |_| {}).unwrap();
        assert_eq!(outcome, Outcome::Probe(Ok("Connection successful".to_owned())));
        assert!(!session.is_busy());
        assert!(session.submit(Action::State));
    }

    #[test]
    fn test_settings_refused_while_busy() {
        let (git, release) = GatedGit::new();
        let mut session = Session::new(
            Config::default(),
            Arc::new(git),
            Arc::new(MockSystem::new()),
        );
        assert!(session.submit(Action::Probe {
            remote_url: "u".to_owned()
        }));

        let mut changed = Config::default();
        changed.branch = "live".to_owned();
        let rejected = session.set_config(changed).unwrap_err();
        assert_eq!(rejected.branch, "live");

        release.send(()).unwrap();
        session.wait_for_completion(&mut |_| {}).unwrap();
        session.set_config(rejected).unwrap();
        assert_eq!(session.config().branch(), "live");
    }

    #[test]
    fn test_push_with_nothing_pending_does_not_push() {
        let git = MockGit::new();
        let system = MockSystem::new().with_file("/r/a.txt", b"x");
        let session = session(list_config(), &git, &system);

        assert!(session.submit(Action::Push {
            message: "msg".to_owned()
        }));
        assert_eq!(
            session.wait_for_completion(&mut |_| {}),
            Some(Outcome::NothingToPush)
        );
        assert!(!git.was_called(&["pull"]));
        assert!(!git.was_called(&["push"]));
    }

    #[test]
    fn test_push_reports_each_step() {
        let git = MockGit::new().on(&["status"], ToolOutput::success("M  a.txt"));
        let system = MockSystem::new().with_file("/r/a.txt", b"x");
        let session = session(list_config(), &git, &system);

        assert!(session.submit(Action::Push {
            message: "New photos".to_owned()
        }));
        let mut steps = Vec::new();
        let outcome = session
            .wait_for_completion(&mut |step| steps.push(step.to_owned()))
            .unwrap();

        assert!(matches!(outcome, Outcome::Push(Ok(_))));
        assert_eq!(
            steps,
            vec![
                "Syncing with origin/main…",
                "Staging a.txt…",
                "Committing: \"New photos\"…",
                "Pushing to origin/main…",
            ]
        );
    }

    #[test]
    fn test_pull_without_repo_path_runs_nothing() {
        let git = MockGit::new();
        let system = MockSystem::new();
        let session = session(Config::default(), &git, &system);

        assert!(session.submit(Action::Pull));
        let Some(Outcome::Pull(Err(e))) = session.wait_for_completion(&mut |_| {}) else {
            panic!("expected a failed pull");
        };
        assert_eq!(e.message(), "Please configure the repo first.");
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_startup_chooses_bootstrap_or_check() {
        let config = Config {
            remote_url: "git@example.com:me/site.git".to_owned(),
            repo_path: "/r".to_owned(),
            ..Config::default()
        };

        let git = MockGit::new();
        let system = MockSystem::new();
        let fresh = session(config.clone(), &git, &system);
        assert_eq!(fresh.startup(), Startup::Cloning);
        fresh.wait_for_completion(&mut |_| {}).unwrap();
        assert!(git.was_called(&["clone"]));

        let git = MockGit::new().on(
            &["sparse-checkout", "list"],
            ToolOutput::success("images/portfolio"),
        );
        let system = MockSystem::new().with_dir("/r/.git");
        let cloned = session(config, &git, &system);
        assert_eq!(cloned.startup(), Startup::Checking);
        assert_eq!(
            cloned.wait_for_completion(&mut |_| {}),
            Some(Outcome::Setup(Ok(
                tracksync::git::SetupOutcome::AlreadyConfigured
            )))
        );
        assert!(!git.was_called(&["clone"]));
    }

    #[test]
    fn test_list_startup_refreshes_without_sparse_checkout() {
        let git = MockGit::new().on(&["status"], ToolOutput::success("M  a.txt"));
        let system = MockSystem::new()
            .with_dir("/r/.git")
            .with_file("/r/a.txt", b"x");
        let session = session(list_config(), &git, &system);

        assert_eq!(session.startup(), Startup::Refreshing);
        let Some(Outcome::Status(Ok(statuses))) = session.wait_for_completion(&mut |_| {}) else {
            panic!("expected a status list");
        };
        assert_eq!(statuses.len(), 1);
        assert!(!git.was_called(&["sparse-checkout"]));
        assert!(!git.was_called(&["clone"]));
    }

    #[test]
    fn test_crashed_worker_releases_busy_flag() {
        let session = Session::new(
            Config::default(),
            Arc::new(PanickingGit),
            Arc::new(MockSystem::new()),
        );

        assert!(session.submit(Action::Probe {
            remote_url: "https://example.com/site.git".to_owned()
        }));
        assert_eq!(session.wait_for_completion(&mut |_| {}), None);
        assert!(!session.is_busy());
        assert!(session.submit(Action::State));
        assert_eq!(
            session.wait_for_completion(&mut |_| {}),
            Some(Outcome::State(RepoState::Unconfigured))
        );
    }

    #[test]
    fn test_state_action() {
        let git = MockGit::new();
        let system = MockSystem::new();
        let session = session(Config::default(), &git, &system);
        assert!(session.submit(Action::State));
        assert_eq!(
            session.wait_for_completion(&mut |_| {}),
            Some(Outcome::State(RepoState::Unconfigured))
        );
    }
}
