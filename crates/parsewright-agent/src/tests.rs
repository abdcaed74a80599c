//! Integration tests for the Orchestrator

#[cfg(test)]
mod tests {
    use crate::{AbortReason, AgentConfig, AgentError, Orchestrator, RunOutcome};
    use parsewright_domain::traits::DocumentReader;
    use parsewright_domain::{
        ArtifactOrigin, AttemptOutcome, Cell, Column, Divergence, ExecutionFault, ProfileId,
        TabularResult, TargetProfile,
    };
    use parsewright_fallback::{LayoutExtractor, LayoutRules, PlainTextReader};
    use parsewright_llm::{MockProvider, MockReply};
    use parsewright_sandbox::{SandboxConfig, SubprocessSandbox};
    use parsewright_store::{write_table, ArtifactStore, GroundTruthStore};
    use parsewright_validator::validate;
    use std::io;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    const STATEMENT: &str = "\
Date        Description                      Debit Amt   Credit Amt      Balance

01-08-2024  Salary Credit XYZ Pvt Ltd                       1,935.30     6,864.58
02-08-2024  IMPS UPI Payment Amazon            5,227.19                  1,637.39
03-08-2024  Mobile Recharge Via UPI              396.14                  1,241.25
            Ref 4411
04-08-2024  Interest Credit                                   12.00      1,253.25
";

    /// What the fallback extracts from `STATEMENT`
    fn statement_table() -> TabularResult {
        TabularResult::new(
            LayoutRules::default().columns(),
            vec![
                vec![
                    Cell::text("01-08-2024"),
                    Cell::text("Salary Credit XYZ Pvt Ltd"),
                    Cell::Null,
                    Cell::Number(1935.3),
                    Cell::Number(6864.58),
                ],
                vec![
                    Cell::text("02-08-2024"),
                    Cell::text("IMPS UPI Payment Amazon"),
                    Cell::Number(5227.19),
                    Cell::Null,
                    Cell::Number(1637.39),
                ],
                vec![
                    Cell::text("03-08-2024"),
                    Cell::text("Mobile Recharge Via UPI Ref 4411"),
                    Cell::Number(396.14),
                    Cell::Null,
                    Cell::Number(1241.25),
                ],
                vec![
                    Cell::text("04-08-2024"),
                    Cell::text("Interest Credit"),
                    Cell::Null,
                    Cell::Number(12.0),
                    Cell::Number(1253.25),
                ],
            ],
        )
        .unwrap()
    }

    /// Five rows, four columns
    fn ledger_table() -> TabularResult {
        TabularResult::new(
            vec![
                Column::text("Date"),
                Column::text("Description"),
                Column::number("Amount"),
                Column::number("Balance"),
            ],
            (1..=5)
                .map(|i| {
                    vec![
                        Cell::text(format!("0{}-09-2024", i)),
                        Cell::text(format!("NEFT transfer {}", i)),
                        Cell::Number(i as f64 * 10.5),
                        Cell::Number(1000.0 + i as f64),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    fn without_balance(table: &TabularResult) -> TabularResult {
        TabularResult::new(
            table.columns()[..3].to_vec(),
            table.rows().iter().map(|r| r[..3].to_vec()).collect(),
        )
        .unwrap()
    }

    /// A shell candidate that prints `table`
    fn emit(table: &TabularResult) -> String {
        format!(
            "```sh\ncat <<'EOF'\n{}\nEOF\n```",
            serde_json::to_string(table).unwrap()
        )
    }

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        fn data_dir(&self) -> std::path::PathBuf {
            self.dir.path().join("data")
        }

        fn artifacts_dir(&self) -> std::path::PathBuf {
            self.dir.path().join("artifacts")
        }

        fn profile(&self, id: &str, sample: &str, truth: &TabularResult) -> TargetProfile {
            let dir = self.data_dir().join(id);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(format!("{}_sample.txt", id)), sample).unwrap();
            write_table(&dir.join(format!("{}_sample.csv", id)), truth).unwrap();
            GroundTruthStore::new(self.data_dir())
                .profile(&ProfileId::parse(id).unwrap())
                .unwrap()
        }

        fn orchestrator(
            &self,
            provider: MockProvider,
            config: AgentConfig,
        ) -> Orchestrator<MockProvider, SubprocessSandbox, LayoutExtractor> {
            let sandbox = SubprocessSandbox::new(SandboxConfig {
                interpreter: vec!["sh".to_string()],
                script_extension: "sh".to_string(),
                timeout_secs: 5,
                ..SandboxConfig::default()
            })
            .unwrap();
            let fallback = LayoutExtractor::new(LayoutRules::default(), Arc::new(PlainTextReader)).unwrap();

            Orchestrator::new(
                provider,
                sandbox,
                fallback,
                GroundTruthStore::new(self.data_dir()),
                ArtifactStore::new(self.artifacts_dir()),
                config,
            )
            .unwrap()
        }
    }

    struct FailingReader;

    impl DocumentReader for FailingReader {
        fn read_text(&self, _document: &Path) -> io::Result<String> {
            Err(io::Error::other("unreadable"))
        }
    }

    #[tokio::test]
    async fn test_missing_column_feedback_then_success() {
        let fixture = Fixture::new();
        let truth = ledger_table();
        let profile = fixture.profile("ledger", "statement text", &truth);

        let provider = MockProvider::scripted([
            MockReply::Text(emit(&without_balance(&truth))),
            MockReply::Text(emit(&truth)),
        ]);
        let orchestrator = fixture.orchestrator(provider.clone(), AgentConfig::default());

        let report = orchestrator.run(&profile).await.unwrap();

        assert_eq!(report.attempts.len(), 2);
        assert!(!report.fallback_invoked);
        assert!(matches!(
            report.attempts[0].outcome(),
            AttemptOutcome::ValidationMismatch {
                first: Divergence::MissingColumn { .. },
                total: 1
            }
        ));
        assert!(report.attempts[1].passed());

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(!requests[0].prompt.contains("Previous attempts"));
        assert!(requests[1].prompt.contains("missing column 'Balance'"));

        let artifact = match &report.outcome {
            RunOutcome::Succeeded(artifact) => artifact,
            other => panic!("expected success, got {:?}", other),
        };
        assert_eq!(artifact.origin, ArtifactOrigin::Generated { attempt: 2 });
        assert!(validate(&artifact.result, &truth).is_pass());

        let dir = report.artifact_dir.unwrap();
        assert!(dir.join("parser.sh").is_file());
        let persisted = ArtifactStore::new(fixture.artifacts_dir())
            .load(&ProfileId::parse("ledger").unwrap())
            .unwrap();
        assert_eq!(persisted.manifest.attempt, Some(2));
        assert_eq!(persisted.manifest.model.as_deref(), Some("mock"));
        assert_eq!(persisted.manifest.attempts.len(), 2);
        assert_eq!(persisted.output, truth);
    }

    #[tokio::test]
    async fn test_first_attempt_success_stops_loop() {
        let fixture = Fixture::new();
        let truth = ledger_table();
        let profile = fixture.profile("ledger", "statement text", &truth);

        let provider = MockProvider::new(emit(&truth));
        let orchestrator = fixture.orchestrator(provider.clone(), AgentConfig::default());

        let report = orchestrator.run(&profile).await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.attempts.len(), 1);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_execution_faults_then_fallback_succeeds() {
        let fixture = Fixture::new();
        let truth = statement_table();
        let profile = fixture.profile("icici", STATEMENT, &truth);

        let provider = MockProvider::new("echo 'Traceback: no module named pdfplumber' >&2\nexit 1");
        let orchestrator = fixture.orchestrator(provider.clone(), AgentConfig::default());

        let report = orchestrator.run(&profile).await.unwrap();

        assert_eq!(provider.call_count(), 3);
        assert_eq!(report.attempts.len(), 3);
        assert!(report.fallback_invoked);
        for attempt in &report.attempts {
            assert!(matches!(
                attempt.outcome(),
                AttemptOutcome::ExecutionFault(ExecutionFault::Crashed { exit_code: Some(1), .. })
            ));
        }

        let artifact = match &report.outcome {
            RunOutcome::SucceededViaFallback(artifact) => artifact,
            other => panic!("expected fallback success, got {:?}", other),
        };
        assert_eq!(artifact.origin, ArtifactOrigin::Fallback);
        assert_eq!(
            LayoutRules::from_toml(&artifact.source).unwrap(),
            LayoutRules::default()
        );

        let dir = report.artifact_dir.unwrap();
        assert!(dir.join("parser.toml").is_file());
        assert!(!dir.join("parser.sh").exists());
    }

    #[tokio::test]
    async fn test_fallback_mismatch_aborts_without_artifact() {
        let fixture = Fixture::new();
        let truth = ledger_table();
        let profile = fixture.profile("ledger", STATEMENT, &truth);

        let provider = MockProvider::new("exit 2");
        let orchestrator = fixture.orchestrator(provider, AgentConfig::default());

        let report = orchestrator.run(&profile).await.unwrap();

        assert!(report.fallback_invoked);
        assert!(matches!(
            report.outcome,
            RunOutcome::Aborted(AbortReason::FallbackMismatch { .. })
        ));
        assert!(report.artifact_dir.is_none());
        assert!(!fixture.artifacts_dir().join("ledger").exists());
    }

    #[tokio::test]
    async fn test_fallback_error_aborts() {
        let fixture = Fixture::new();
        let truth = ledger_table();
        let profile = fixture.profile("ledger", "no transactions in here\n", &truth);

        let orchestrator = fixture.orchestrator(MockProvider::new(""), AgentConfig::default());
        let report = orchestrator.run(&profile).await.unwrap();

        // Empty source is an execution fault, not a generation failure
        assert!(matches!(
            report.attempts[0].outcome(),
            AttemptOutcome::ExecutionFault(ExecutionFault::EmptySource)
        ));
        assert!(matches!(
            report.outcome,
            RunOutcome::Aborted(AbortReason::FallbackError(_))
        ));
    }

    #[tokio::test]
    async fn test_generation_timeout_consumes_attempt() {
        let fixture = Fixture::new();
        let truth = ledger_table();
        let profile = fixture.profile("ledger", "statement text", &truth);

        let provider = MockProvider::scripted([
            MockReply::Delayed(Duration::from_secs(5), emit(&truth)),
            MockReply::Text(emit(&truth)),
        ]);
        let config = AgentConfig {
            request_timeout_secs: 1,
            ..AgentConfig::default()
        };
        let orchestrator = fixture.orchestrator(provider.clone(), config);

        let report = orchestrator.run(&profile).await.unwrap();

        assert!(matches!(
            report.attempts[0].outcome(),
            AttemptOutcome::GenerationUnavailable(_)
        ));
        assert!(report.attempts[0].source().is_none());
        assert!(report.attempts[1].passed());
        assert!(matches!(report.outcome, RunOutcome::Succeeded(_)));
        assert!(provider.requests()[1].prompt.contains("[generation_unavailable]"));
    }

    #[tokio::test]
    async fn test_service_error_is_generation_unavailable() {
        let fixture = Fixture::new();
        let truth = ledger_table();
        let profile = fixture.profile("ledger", "statement text", &truth);

        let provider = MockProvider::scripted([MockReply::Error("rate limited".to_string())])
            .with_reply(MockReply::Text(emit(&truth)));
        let orchestrator = fixture.orchestrator(provider, AgentConfig::default());

        let report = orchestrator.run(&profile).await.unwrap();
        match report.attempts[0].outcome() {
            AttemptOutcome::GenerationUnavailable(msg) => assert!(msg.contains("rate limited")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_attempt_budget_is_respected() {
        let fixture = Fixture::new();
        let truth = statement_table();
        let profile = fixture.profile("icici", STATEMENT, &truth);

        let provider = MockProvider::new("exit 1");
        let config = AgentConfig {
            max_attempts: 2,
            ..AgentConfig::default()
        };
        let orchestrator = fixture.orchestrator(provider.clone(), config);

        let report = orchestrator.run(&profile).await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(report.attempts.len(), 2);
        assert!(matches!(report.outcome, RunOutcome::SucceededViaFallback(_)));
    }

    #[tokio::test]
    async fn test_excerpt_is_included_in_prompt() {
        let fixture = Fixture::new();
        let truth = statement_table();
        let profile = fixture.profile("icici", STATEMENT, &truth);

        let provider = MockProvider::new(emit(&truth));
        let config = AgentConfig {
            excerpt_chars: 200,
            ..AgentConfig::default()
        };
        let orchestrator = fixture
            .orchestrator(provider.clone(), config)
            .with_reader(Arc::new(PlainTextReader));

        orchestrator.run(&profile).await.unwrap();
        let prompt = &provider.requests()[0].prompt;
        assert!(prompt.contains("Text of the sample document"));
        assert!(prompt.contains("Salary Credit XYZ Pvt Ltd"));
    }

    #[tokio::test]
    async fn test_unreadable_excerpt_does_not_fail_run() {
        let fixture = Fixture::new();
        let truth = ledger_table();
        let profile = fixture.profile("ledger", "statement text", &truth);

        let provider = MockProvider::new(emit(&truth));
        let orchestrator = fixture
            .orchestrator(provider.clone(), AgentConfig::default())
            .with_reader(Arc::new(FailingReader));

        let report = orchestrator.run(&profile).await.unwrap();
        assert!(report.is_success());
        assert!(!provider.requests()[0].prompt.contains("Text of the sample document"));
    }

    #[tokio::test]
    async fn test_unreadable_ground_truth_is_an_error() {
        let fixture = Fixture::new();
        let profile = TargetProfile::new(
            ProfileId::parse("ghost").unwrap(),
            fixture.dir.path().join("ghost.txt"),
            fixture.dir.path().join("ghost.csv"),
        );

        let provider = MockProvider::new("exit 1");
        let orchestrator = fixture.orchestrator(provider.clone(), AgentConfig::default());

        let result = orchestrator.run(&profile).await;
        assert!(matches!(result, Err(AgentError::GroundTruth(_))));
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let fixture = Fixture::new();
        let sandbox = SubprocessSandbox::new(SandboxConfig::default()).unwrap();
        let fallback = LayoutExtractor::new(LayoutRules::default(), Arc::new(PlainTextReader)).unwrap();
        let result = Orchestrator::new(
            MockProvider::default(),
            sandbox,
            fallback,
            GroundTruthStore::new(fixture.data_dir()),
            ArtifactStore::new(fixture.artifacts_dir()),
            AgentConfig {
                max_attempts: 0,
                ..AgentConfig::default()
            },
        );
        assert!(matches!(result, Err(AgentError::Config(_))));
    }
}
