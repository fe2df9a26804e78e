#[cfg(test)]
mod tests {
    use digicred_config::{CredentialWatchMode, DigiCredConfig, WorkflowConfig};
    use digicred_core::*;
    use digicred_query::{Filter, QuerySpec};
    use digicred_runtime::*;
    use parking_lot::RwLock;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn spec(name: &str, port: u16) -> AgentSpec {
        AgentSpec::new(name, "http://localhost", port)
    }

    fn completed(connection_id: &str, token: &str) -> AgentEvent {
        AgentEvent::ConnectionStateChanged(ConnectionEvent {
            connection_id: connection_id.into(),
            out_of_band_id: Some(token.into()),
            state: DidExchangeState::Completed,
            previous_state: Some(DidExchangeState::ResponseSent),
        })
    }

    fn credential(id: &str, state: CredentialState) -> AgentEvent {
        AgentEvent::CredentialStateChanged(CredentialEvent {
            credential_id: id.into(),
            state,
            previous_state: None,
        })
    }

    async fn eventually(mut condition: impl FnMut() -> bool) {
        for _ in 0..400 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    /// A correlator tracking one memory agent without a pump.
    async fn manual_correlator(mode: CredentialWatchMode) -> (Arc<MemoryRuntime>, WorkflowCorrelator) {
        let runtime = Arc::new(MemoryRuntime::new());
        let handle = runtime.create_agent(&spec("issuer", 3001)).await.unwrap();
        let correlator = WorkflowCorrelator::new(WorkflowConfig {
            credential_watch: mode,
            ..Default::default()
        });
        correlator.register(handle);
        (runtime, correlator)
    }

    fn services(runtime: Arc<MemoryRuntime>) -> Services {
        let mut config = DigiCredConfig::default();
        config.ledger.networks.push(LedgerNetwork {
            indy_namespace: "bcovrin:test".into(),
            is_production: false,
            genesis_transactions: "{}".into(),
            connect_on_startup: true,
        });
        Services::new(runtime, Arc::new(RwLock::new(config)))
    }

    // ── Registry tests ─────────────────────────────────────────

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let registry = AgentRegistry::new(Arc::new(MemoryRuntime::new()));
        let (first, created) = registry.get_or_create(&spec("issuer", 3001)).await.unwrap();
        assert!(created);
        let (second, created) = registry.get_or_create(&spec("issuer", 3001)).await.unwrap();
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.names(), vec!["issuer".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_creation_creates_once() {
        let registry = Arc::new(AgentRegistry::new(Arc::new(MemoryRuntime::new())));
        let calls = (0..8).map(|_| {
            let registry = Arc::clone(&registry);
            async move { registry.get_or_create(&spec("issuer", 3001)).await.unwrap().1 }
        });
        let created = futures::future::join_all(calls).await;
        assert_eq!(created.iter().filter(|c| **c).count(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_absence_is_not_an_error() {
        let registry = AgentRegistry::new(Arc::new(MemoryRuntime::new()));
        assert!(registry.get_by_name("ghost").is_none());
        assert!(registry.latest().is_none());
        let err = registry.resolve(Some("ghost")).err().unwrap();
        assert!(matches!(err, DigiCredError::AgentNotInitialized(_)));
    }

    #[tokio::test]
    async fn test_latest_agent_is_the_default() {
        let registry = AgentRegistry::new(Arc::new(MemoryRuntime::new()));
        registry.get_or_create(&spec("a", 3001)).await.unwrap();
        registry.get_or_create(&spec("b", 3002)).await.unwrap();
        // Re-requesting an existing agent does not change the default.
        registry.get_or_create(&spec("a", 3001)).await.unwrap();
        assert_eq!(registry.resolve(None).unwrap().name(), "b");
        assert_eq!(registry.resolve(Some("a")).unwrap().name(), "a");
    }

    #[tokio::test]
    async fn test_failed_creation_leaves_name_free() {
        let registry = AgentRegistry::new(Arc::new(MemoryRuntime::new()));
        let err = registry.get_or_create(&spec("issuer", 0)).await.err().unwrap();
        assert!(matches!(err, DigiCredError::AgentCreation { .. }));
        assert!(registry.is_empty());
        assert!(registry.get_by_name("issuer").is_none());
        let (_, created) = registry.get_or_create(&spec("issuer", 3001)).await.unwrap();
        assert!(created);
    }

    struct OfflineRuntime;

    #[async_trait::async_trait]
    impl AgentRuntime for OfflineRuntime {
        fn name(&self) -> &str {
            "offline"
        }

        async fn create_agent(&self, _spec: &AgentSpec) -> Result<Arc<dyn AgentHandle>> {
            Err(DigiCredError::runtime("open wallet", "storage offline"))
        }
    }

    #[tokio::test]
    async fn test_runtime_failure_is_returned_unchanged() {
        let registry = AgentRegistry::new(Arc::new(OfflineRuntime));
        let err = registry.get_or_create(&spec("issuer", 3001)).await.err().unwrap();
        match err {
            DigiCredError::Runtime { operation, reason } => {
                assert_eq!(operation, "open wallet");
                assert_eq!(reason, "storage offline");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(registry.is_empty());
    }

    // ── Correlator tests ───────────────────────────────────────

    #[tokio::test]
    async fn test_completion_fires_callback_once_and_installs_credential_watcher() {
        let (_runtime, correlator) = manual_correlator(CredentialWatchMode::PerAgent).await;
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        correlator
            .watch_invitation(
                "issuer",
                "oob-1",
                Some(Box::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap();

        correlator.handle_event("issuer", &completed("c1", "oob-1")).await;
        correlator.handle_event("issuer", &completed("c1", "oob-1")).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(correlator.credential_watchers("issuer"), 1);
        assert_eq!(correlator.pending_watchers("issuer"), 0);
        assert_eq!(correlator.stats().snapshot().connections_completed, 1);
    }

    #[tokio::test]
    async fn test_non_matching_token_is_ignored() {
        let (_runtime, correlator) = manual_correlator(CredentialWatchMode::PerAgent).await;
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        correlator
            .watch_invitation(
                "issuer",
                "oob-1",
                Some(Box::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap();

        correlator.handle_event("issuer", &completed("c9", "oob-other")).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(correlator.credential_watchers("issuer"), 0);
        assert_eq!(correlator.pending_watchers("issuer"), 1);
    }

    #[tokio::test]
    async fn test_intermediate_states_do_not_match() {
        let (_runtime, correlator) = manual_correlator(CredentialWatchMode::PerAgent).await;
        correlator.watch_invitation("issuer", "oob-1", None).unwrap();
        let event = AgentEvent::ConnectionStateChanged(ConnectionEvent {
            connection_id: "c1".into(),
            out_of_band_id: Some("oob-1".into()),
            state: DidExchangeState::RequestReceived,
            previous_state: None,
        });
        correlator.handle_event("issuer", &event).await;
        assert_eq!(correlator.pending_watchers("issuer"), 1);
        assert_eq!(correlator.credential_watchers("issuer"), 0);
    }

    #[tokio::test]
    async fn test_each_request_received_is_accepted() {
        let (runtime, correlator) = manual_correlator(CredentialWatchMode::PerAgent).await;
        correlator.watch_invitation("issuer", "oob-1", None).unwrap();
        correlator.handle_event("issuer", &completed("c1", "oob-1")).await;

        let request = credential("cred-1", CredentialState::RequestReceived);
        correlator.handle_event("issuer", &request).await;
        correlator.handle_event("issuer", &request).await;

        let agent = runtime.agent("issuer").unwrap();
        assert_eq!(agent.accepted_requests(), vec!["cred-1", "cred-1"]);
        // The memory agent has no such exchange, so both accepts fail and are logged.
        assert_eq!(correlator.stats().snapshot().accept_failures, 2);
    }

    #[tokio::test]
    async fn test_other_credential_states_only_log() {
        let (runtime, correlator) = manual_correlator(CredentialWatchMode::PerAgent).await;
        correlator.watch_invitation("issuer", "oob-1", None).unwrap();
        correlator.handle_event("issuer", &completed("c1", "oob-1")).await;
        for state in [
            CredentialState::OfferSent,
            CredentialState::CredentialIssued,
            CredentialState::Done,
            CredentialState::Declined,
            CredentialState::Abandoned,
        ] {
            correlator.handle_event("issuer", &credential("cred-1", state)).await;
        }
        assert!(runtime.agent("issuer").unwrap().accepted_requests().is_empty());
    }

    #[tokio::test]
    async fn test_requests_before_any_completion_are_not_accepted() {
        let (runtime, correlator) = manual_correlator(CredentialWatchMode::PerAgent).await;
        correlator
            .handle_event("issuer", &credential("cred-1", CredentialState::RequestReceived))
            .await;
        assert!(runtime.agent("issuer").unwrap().accepted_requests().is_empty());
    }

    #[tokio::test]
    async fn test_per_agent_mode_installs_one_credential_watcher() {
        let (runtime, correlator) = manual_correlator(CredentialWatchMode::PerAgent).await;
        for token in ["oob-1", "oob-2"] {
            correlator.watch_invitation("issuer", token, None).unwrap();
            correlator.handle_event("issuer", &completed("c", token)).await;
        }
        assert_eq!(correlator.credential_watchers("issuer"), 1);
        correlator
            .handle_event("issuer", &credential("cred-1", CredentialState::RequestReceived))
            .await;
        assert_eq!(runtime.agent("issuer").unwrap().accepted_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_per_completion_mode_stacks_credential_watchers() {
        let (runtime, correlator) = manual_correlator(CredentialWatchMode::PerCompletion).await;
        for token in ["oob-1", "oob-2"] {
            correlator.watch_invitation("issuer", token, None).unwrap();
            correlator.handle_event("issuer", &completed("c", token)).await;
        }
        assert_eq!(correlator.credential_watchers("issuer"), 2);
        correlator
            .handle_event("issuer", &credential("cred-1", CredentialState::RequestReceived))
            .await;
        assert_eq!(runtime.agent("issuer").unwrap().accepted_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_auto_accept_can_be_disabled() {
        let (runtime, correlator) = manual_correlator(CredentialWatchMode::PerAgent).await;
        correlator.update_settings(WorkflowConfig {
            auto_accept_credentials: false,
            ..Default::default()
        });
        correlator.watch_invitation("issuer", "oob-1", None).unwrap();
        correlator.handle_event("issuer", &completed("c1", "oob-1")).await;
        correlator
            .handle_event("issuer", &credential("cred-1", CredentialState::RequestReceived))
            .await;
        assert!(runtime.agent("issuer").unwrap().accepted_requests().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_callback_does_not_stop_dispatch() {
        let (_runtime, correlator) = manual_correlator(CredentialWatchMode::PerAgent).await;
        correlator
            .watch_invitation("issuer", "oob-1", Some(Box::new(|_| panic!("listener bug"))))
            .unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        correlator
            .watch_invitation(
                "issuer",
                "oob-2",
                Some(Box::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap();

        correlator.handle_event("issuer", &completed("c1", "oob-1")).await;
        correlator.handle_event("issuer", &completed("c2", "oob-2")).await;

        assert_eq!(correlator.stats().snapshot().listener_failures, 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(correlator.credential_watchers("issuer"), 1);
    }

    #[tokio::test]
    async fn test_sweep_prunes_matched_watchers() {
        let (_runtime, correlator) = manual_correlator(CredentialWatchMode::PerAgent).await;
        correlator.watch_invitation("issuer", "oob-1", None).unwrap();
        correlator.watch_invitation("issuer", "oob-2", None).unwrap();
        correlator.handle_event("issuer", &completed("c1", "oob-1")).await;

        assert_eq!(correlator.watcher_count("issuer"), 2);
        assert_eq!(correlator.sweep(), 1);
        assert_eq!(correlator.watcher_count("issuer"), 1);
        assert_eq!(correlator.pending_watchers("issuer"), 1);
        assert_eq!(correlator.stats().snapshot().watchers_swept, 1);
    }

    #[tokio::test]
    async fn test_watch_on_unknown_agent_fails() {
        let correlator = WorkflowCorrelator::new(WorkflowConfig::default());
        let err = correlator.watch_invitation("ghost", "oob-1", None).unwrap_err();
        assert!(matches!(err, DigiCredError::AgentNotInitialized(_)));
    }

    // ── End-to-end over the memory runtime ─────────────────────

    #[tokio::test]
    async fn test_invitation_to_issued_credential() {
        let runtime = Arc::new(MemoryRuntime::new());
        let services = services(Arc::clone(&runtime));
        services.agents.create_agent("issuer", "http://localhost", 3001).await.unwrap();
        services.agents.create_agent("holder", "http://localhost", 3002).await.unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel();
        let invitation = services
            .agents
            .create_new_invitation_with(
                "issuer",
                Some(Box::new(move |ev: &ConnectionEvent| {
                    let _ = tx.send(ev.connection_id.clone());
                })),
            )
            .await
            .unwrap();
        assert!(invitation.invitation_url_qrcode.starts_with("data:image/svg+xml;base64,"));
        assert!(invitation.invitation_url.starts_with("http://localhost:3001?oob="));

        services
            .agents
            .receive_invitation("holder", &invitation.invitation_url)
            .await
            .unwrap();

        let connection_id = tokio::time::timeout(Duration::from_secs(2), rx)
            .await
            .unwrap()
            .unwrap();
        let connection = services
            .connections
            .find_by_id(Some("issuer"), &connection_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(connection.state, DidExchangeState::Completed);
        assert_eq!(connection.out_of_band_id.as_deref(), Some(invitation.out_of_band_id.as_str()));
        eventually(|| services.correlator.credential_watchers("issuer") == 1).await;

        let record = services
            .agents
            .issue_credential(
                Some("issuer"),
                &invitation.out_of_band_id,
                "did:indy:bcovrin:test:abc/anoncreds/v0/CLAIM_DEF/1/default",
                &[CredentialAttribute {
                    name: "name".into(),
                    value: "Alice".into(),
                }],
            )
            .await
            .unwrap();
        assert_eq!(record.state, CredentialState::OfferSent);
        assert_eq!(record.connection_id, connection_id);

        let issuer = runtime.agent("issuer").unwrap();
        eventually(|| issuer.accepted_requests() == vec![record.id.clone()]).await;
        eventually(|| services.correlator.stats().snapshot().credential_requests_accepted == 1).await;
        assert_eq!(services.correlator.stats().snapshot().accept_failures, 0);
    }

    #[tokio::test]
    async fn test_declined_offer_is_not_accepted() {
        let runtime = Arc::new(MemoryRuntime::new().with_holder_behavior(HolderBehavior::Decline));
        let services = services(Arc::clone(&runtime));
        services.agents.create_agent("issuer", "http://localhost", 3001).await.unwrap();
        services.agents.create_agent("holder", "http://localhost", 3002).await.unwrap();
        let invitation = services.agents.create_new_invitation("issuer").await.unwrap();
        services
            .agents
            .receive_invitation("holder", &invitation.invitation_url)
            .await
            .unwrap();
        eventually(|| services.correlator.credential_watchers("issuer") == 1).await;

        services
            .agents
            .issue_credential(None, &invitation.out_of_band_id, "cred-def", &[])
            .await
            .unwrap_err();
        // Latest agent is the holder, which has no connection for that invitation.

        services
            .agents
            .issue_credential(Some("issuer"), &invitation.out_of_band_id, "cred-def", &[])
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(runtime.agent("issuer").unwrap().accepted_requests().is_empty());
    }

    #[tokio::test]
    async fn test_issue_credential_without_connection_is_not_found() {
        let services = services(Arc::new(MemoryRuntime::new()));
        services.agents.create_agent("issuer", "http://localhost", 3001).await.unwrap();
        let err = services
            .agents
            .issue_credential(None, "missing-oob", "cred-def", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DigiCredError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_setup_connection_listener_requires_record() {
        let services = services(Arc::new(MemoryRuntime::new()));
        services.agents.create_agent("issuer", "http://localhost", 3001).await.unwrap();
        let invitation = services.agents.create_legacy_invitation("issuer").await.unwrap();
        services
            .agents
            .setup_connection_listener("issuer", &invitation.out_of_band_id)
            .await
            .unwrap();
        assert_eq!(services.correlator.pending_watchers("issuer"), 1);

        let err = services
            .agents
            .setup_connection_listener("issuer", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, DigiCredError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_connection_queries() {
        let runtime = Arc::new(MemoryRuntime::new());
        let services = services(Arc::clone(&runtime));
        services.agents.create_agent("issuer", "http://localhost", 3001).await.unwrap();
        services.agents.create_agent("holder", "http://localhost", 3002).await.unwrap();
        for _ in 0..3 {
            let invitation = services.agents.create_new_invitation("issuer").await.unwrap();
            services
                .agents
                .receive_invitation("holder", &invitation.invitation_url)
                .await
                .unwrap();
        }

        let page = services
            .connections
            .find_all(Some("issuer"), &QuerySpec::new().with_limit(2))
            .await
            .unwrap();
        assert_eq!(page.data.len(), 2);
        assert!(page.next.is_some());

        let by_label = services
            .connections
            .find_all(
                Some("issuer"),
                &QuerySpec::new().with_filter(Filter::attribute("theirLabel", "holder")),
            )
            .await
            .unwrap();
        assert_eq!(by_label.data.len(), 3);

        let responders = services
            .connections
            .find_all_by_query(Some("issuer"), &Filter::attribute("role", "responder"))
            .await
            .unwrap();
        assert_eq!(responders.len(), 3);

        let first = &page.data[0];
        let issuer = runtime.agent("issuer").unwrap();
        issuer.set_connection_metadata(&first.id, "tenant", "acme".into()).unwrap();
        issuer.add_connection_type(&first.id, "mediator").unwrap();

        let by_meta = services
            .connections
            .find_all(Some("issuer"), &QuerySpec::new().with_filter(Filter::metadata("tenant", "acme")))
            .await
            .unwrap();
        assert_eq!(by_meta.data.len(), 1);

        let typed = services
            .connections
            .find_all_by_connection_types(Some("issuer"), &["mediator".to_string()])
            .await
            .unwrap();
        assert_eq!(typed.len(), 1);

        let thread = first.thread_id.clone().unwrap();
        let by_thread = services
            .connections
            .find_by_thread_id(Some("holder"), &thread)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_thread.their_did, first.did);

        let offset = services
            .connections
            .find_all_offset(Some("issuer"), 1, 10)
            .await
            .unwrap();
        assert_eq!(offset.total, 3);
        assert_eq!(offset.data.len(), 2);

        services.connections.delete_by_id(Some("issuer"), &first.id).await.unwrap();
        assert!(
            services
                .connections
                .find_by_id(Some("issuer"), &first.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(services.connections.delete_by_id(Some("issuer"), &first.id).await.is_err());
    }

    #[tokio::test]
    async fn test_basic_messages() {
        let runtime = Arc::new(MemoryRuntime::new());
        let services = services(Arc::clone(&runtime));
        services.agents.create_agent("issuer", "http://localhost", 3001).await.unwrap();
        services.agents.create_agent("holder", "http://localhost", 3002).await.unwrap();
        let invitation = services.agents.create_new_invitation("issuer").await.unwrap();
        services
            .agents
            .receive_invitation("holder", &invitation.invitation_url)
            .await
            .unwrap();

        let mut holder_events = runtime.agent("holder").unwrap().subscribe();
        let sent = services
            .messages
            .send_message(Some("issuer"), &invitation.out_of_band_id, "hello")
            .await
            .unwrap();
        assert_eq!(sent.content, "hello");

        let fetched = services.messages.get_message(Some("issuer"), &sent.id).await.unwrap();
        assert_eq!(fetched, sent);

        match holder_events.recv().await.unwrap() {
            AgentEvent::BasicMessageReceived { message_id, .. } => {
                let received = services.messages.get_message(Some("holder"), &message_id).await.unwrap();
                assert_eq!(received.content, "hello");
                assert_eq!(received.role, BasicMessageRole::Receiver);
            }
            other => panic!("unexpected event {other:?}"),
        }

        let confirmation = services.messages.delete_message(Some("issuer"), &sent.id).await.unwrap();
        assert!(confirmation.contains(&sent.id));
        let err = services.messages.get_message(Some("issuer"), &sent.id).await.unwrap_err();
        assert!(matches!(err, DigiCredError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_ledger_flow() {
        let services = services(Arc::new(MemoryRuntime::new()));
        services.agents.create_agent("issuer", "http://localhost", 3001).await.unwrap();
        let did = "did:indy:bcovrin:test:Th7MpTaRZVRYnPiabds81Y";

        let err = services
            .ledger
            .register_schema(None, did, "person", "1.0", &["name".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, DigiCredError::Ledger(_)));

        services
            .ledger
            .import_did(None, "000000000000000000000000Steward1", did)
            .await
            .unwrap();
        let schema_id = services
            .ledger
            .register_schema(None, did, "person", "1.0", &["name".into()])
            .await
            .unwrap();
        assert!(schema_id.starts_with(did));
        let cred_def = services
            .ledger
            .register_credential_definition(None, did, &schema_id)
            .await
            .unwrap();
        assert!(cred_def.ends_with("/default"));
    }

    #[tokio::test]
    async fn test_short_seed_is_rejected() {
        let services = services(Arc::new(MemoryRuntime::new()));
        services.agents.create_agent("issuer", "http://localhost", 3001).await.unwrap();
        let err = services.ledger.import_did(None, "short", "did:x").await.unwrap_err();
        assert!(matches!(err, DigiCredError::Runtime { .. }));
    }

    #[tokio::test]
    async fn test_bootstrap_creates_configured_agents() {
        let mut config = DigiCredConfig::default();
        config.agents.push(digicred_config::AgentConfig {
            name: "issuer".into(),
            endpoint: "http://localhost".into(),
            port: 3001,
        });
        config.ledger.networks.push(LedgerNetwork {
            indy_namespace: "bcovrin:test".into(),
            is_production: false,
            genesis_transactions: "{}".into(),
            connect_on_startup: true,
        });
        let services = Services::new(Arc::new(MemoryRuntime::new()), Arc::new(RwLock::new(config)));
        let created = services.bootstrap().await.unwrap();
        assert_eq!(created, vec!["issuer".to_string()]);
        assert!(services.correlator.is_attached("issuer"));
        // Configured agents are created on the configured ledgers.
        let did = "did:indy:bcovrin:test:Th7MpTaRZVRYnPiabds81Y";
        services
            .ledger
            .import_did(None, "000000000000000000000000Steward1", did)
            .await
            .unwrap();
        services
            .ledger
            .register_schema(None, did, "person", "1.0", &["name".into()])
            .await
            .unwrap();
        services.shutdown();
        assert!(!services.correlator.is_attached("issuer"));
    }

    #[tokio::test]
    async fn test_shutdown_stops_event_pumps() {
        let runtime = Arc::new(MemoryRuntime::new());
        let services = services(Arc::clone(&runtime));
        services.agents.create_agent("issuer", "http://localhost", 3001).await.unwrap();
        let invitation = services.agents.create_new_invitation("issuer").await.unwrap();
        assert!(services.correlator.is_attached("issuer"));

        services.shutdown();
        assert!(!services.correlator.is_attached("issuer"));

        let issuer = runtime.agent("issuer").unwrap();
        issuer.emit(completed("conn-1", &invitation.out_of_band_id));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(services.correlator.pending_watchers("issuer"), 1);
        assert_eq!(services.correlator.stats().snapshot().connections_completed, 0);
    }

    // ── QR tests ───────────────────────────────────────────────

    #[test]
    fn test_qr_data_url_and_img_tag() {
        let url = qr::to_data_url("http://localhost:3001?oob=abc", 200).unwrap();
        assert!(url.starts_with("data:image/svg+xml;base64,"));
        let tag = qr::img_tag(&url);
        assert!(tag.starts_with("<img src=\"data:image/svg+xml;base64,"));
        assert!(tag.ends_with("alt=\"QR Code\" />"));
    }

    #[test]
    fn test_qr_terminal_rendering() {
        let art = qr::render_terminal("hello").unwrap();
        let lines: Vec<&str> = art.lines().collect();
        assert!(lines.len() > 5);
        let width = lines[0].chars().count();
        assert!(lines.iter().all(|l| l.chars().count() == width));
    }
}
