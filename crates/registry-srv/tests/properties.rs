//! Property tests for the moderation state machine, ban matching and
//! signature binding.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use registry_core::{ModerationAction, ModificationPayload, NetworkRecord, RecordStatus};
use registry_srv::ban::BanRegistry;
use registry_srv::identity::{verify, KeyAlgorithm, SigningKey};
use registry_srv::moderation::{next_status, reachable_from};
use registry_srv::store::MemoryStore;

fn arb_status() -> impl Strategy<Value = RecordStatus> {
    prop::sample::select(RecordStatus::ALL.to_vec())
}

fn arb_action() -> impl Strategy<Value = ModerationAction> {
    prop::sample::select(ModerationAction::ALL.to_vec())
}

fn arb_ipv4() -> impl Strategy<Value = String> {
    any::<[u8; 4]>().prop_map(|b| format!("{}.{}.{}.{}", b[0], b[1], b[2], b[3]))
}

fn arb_domain() -> impl Strategy<Value = String> {
    "[a-z]{1,12}\\.(org|net|example)"
}

fn arb_user_agent() -> impl Strategy<Value = String> {
    "[a-zA-Z]{1,10}/[0-9]\\.[0-9]"
}

fn record_with(ip: &str, domain: &str, user_agent: &str) -> NetworkRecord {
    let now = Utc::now();
    NetworkRecord {
        id: Uuid::new_v4(),
        name: "net".into(),
        description: String::new(),
        connection_info: String::new(),
        nodes: vec![],
        public_key: None,
        status: RecordStatus::Approved,
        registrant_ip: Some(ip.into()),
        registrant_domain: Some(domain.into()),
        registrant_user_agent: Some(user_agent.into()),
        revision: 0,
        created_at: now,
        updated_at: now,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any sequence of actions starting from pending never leaves banned once
    /// entered, and every step lands in a state reachable from the previous.
    #[test]
    fn prop_banned_is_absorbing(actions in prop::collection::vec(arb_action(), 0..24)) {
        let mut status = RecordStatus::Pending;
        for action in actions {
            if let Some(next) = next_status(status, action) {
                prop_assert_ne!(status, RecordStatus::Banned);
                prop_assert!(reachable_from(status).contains(&next));
                status = next;
            }
        }
    }

    /// From pending, only approved, rejected or banned are reachable.
    #[test]
    fn prop_pending_successors(action in arb_action()) {
        if let Some(next) = next_status(RecordStatus::Pending, action) {
            prop_assert!(matches!(
                next,
                RecordStatus::Approved | RecordStatus::Rejected | RecordStatus::Banned
            ));
        }
    }

    /// Ban is available from every non-banned status.
    #[test]
    fn prop_ban_from_any_live_status(status in arb_status()) {
        let next = next_status(status, ModerationAction::Ban);
        if status == RecordStatus::Banned {
            prop_assert_eq!(next, None);
        } else {
            prop_assert_eq!(next, Some(RecordStatus::Banned));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A registrant matching a banned record on exactly one signal is banned,
    /// whatever the other two signals are.
    #[test]
    fn prop_one_signal_suffices(
        banned_ip in arb_ipv4(),
        banned_domain in arb_domain(),
        banned_ua in arb_user_agent(),
        other_ip in arb_ipv4(),
        other_domain in arb_domain(),
        other_ua in arb_user_agent(),
        which in 0usize..3,
    ) {
        let bans = BanRegistry::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(30),
            Duration::from_secs(1),
        );
        let banned = record_with(&banned_ip, &banned_domain, &banned_ua);
        tokio_test::block_on(bans.ban(&banned, "prop")).unwrap();

        let (ip, domain, ua) = match which {
            0 => (banned_ip.as_str(), other_domain.as_str(), other_ua.as_str()),
            1 => (other_ip.as_str(), banned_domain.as_str(), other_ua.as_str()),
            _ => (other_ip.as_str(), other_domain.as_str(), banned_ua.as_str()),
        };
        prop_assert!(tokio_test::block_on(bans.is_banned(Some(ip), Some(domain), Some(ua))));
    }

    /// A registrant sharing no signal with any ban is never banned.
    #[test]
    fn prop_disjoint_signals_pass(
        banned_ip in arb_ipv4(),
        banned_domain in arb_domain(),
        banned_ua in arb_user_agent(),
        other_ip in arb_ipv4(),
        other_domain in arb_domain(),
        other_ua in arb_user_agent(),
    ) {
        prop_assume!(banned_ip != other_ip);
        prop_assume!(banned_domain != other_domain);
        prop_assume!(banned_ua != other_ua);

        let bans = BanRegistry::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(30),
            Duration::from_secs(1),
        );
        tokio_test::block_on(bans.ban(&record_with(&banned_ip, &banned_domain, &banned_ua), "prop"))
            .unwrap();
        prop_assert!(!tokio_test::block_on(bans.is_banned(
            Some(&other_ip),
            Some(&other_domain),
            Some(&other_ua),
        )));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Changing any field of a signed payload breaks the signature.
    #[test]
    fn prop_tampering_invalidates_signature(
        name in "[a-zA-Z ]{1,40}",
        tampered in "[a-zA-Z ]{1,40}",
        revision in 0u64..1000,
    ) {
        prop_assume!(name != tampered);
        let key = SigningKey::generate(KeyAlgorithm::Ed25519).unwrap();
        let pem = key.public_key().to_pem();

        let mut payload = ModificationPayload::new(Uuid::new_v4(), revision);
        payload.name = Some(name);
        let signature = key.sign_payload(&payload).unwrap();
        prop_assert!(verify(&pem, &payload, &signature));

        let mut renamed = payload.clone();
        renamed.name = Some(tampered);
        prop_assert!(!verify(&pem, &renamed, &signature));

        let mut bumped = payload.clone();
        bumped.revision += 1;
        prop_assert!(!verify(&pem, &bumped, &signature));

        let mut moved = payload;
        moved.record_id = Uuid::new_v4();
        prop_assert!(!verify(&pem, &moved, &signature));
    }
}
