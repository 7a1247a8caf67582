//! Property-based tests for registry invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Counters: total == successful issuances, valid == issued − revoked
//! - Revocation monotonicity: a revoked certificate never becomes valid
//! - Ids: sequential from 1, never reused
//! - Authorization: outsiders never change state
//! - Deterministic replay: same transactions → same registry state

use proptest::prelude::*;
use registry_core::{
    config::RegistryConfig,
    registry::{CallContext, CertificateRegistry},
    Address, CertificateId, Config, IssueCertificate, KeyPair, Ledger, QueryResult, RegistryCall,
    RegistryQuery, Role, UnsignedTransaction,
};
use std::collections::HashSet;

const CONTRACT: [u8; 20] = [0xcc; 20];

fn admin() -> Address {
    Address::from_bytes([1u8; 20])
}

fn issuer() -> Address {
    Address::from_bytes([2u8; 20])
}

fn outsider() -> Address {
    Address::from_bytes([3u8; 20])
}

/// Operation applied to a registry
#[derive(Debug, Clone)]
enum Op {
    Issue { sender: Address, student_id: u8 },
    Revoke { sender: Address, id: u64, reason: String },
}

/// Strategy for generating callers
fn sender_strategy() -> impl Strategy<Value = Address> {
    prop_oneof![
        4 => Just(issuer()),
        1 => Just(admin()),
        1 => Just(outsider()),
    ]
}

/// Strategy for generating operations
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (sender_strategy(), 0u8..6)
            .prop_map(|(sender, student_id)| Op::Issue { sender, student_id }),
        2 => (sender_strategy(), 0u64..10, prop_oneof![Just(String::new()), "[a-z ]{1,16}"])
            .prop_map(|(sender, id, reason)| Op::Revoke { sender, id, reason }),
    ]
}

fn issuance(student_id: u8) -> IssueCertificate {
    IssueCertificate {
        student: Address::from_bytes([0x10 + student_id; 20]),
        student_name: format!("Student {}", student_id),
        student_id: format!("SV2024{:04}", student_id),
        degree: "Computer Science".to_string(),
        major: "Software Engineering".to_string(),
        university: "Đại học Bách Khoa Hà Nội".to_string(),
        graduation_date: 1_717_000_000,
        content_hash: "QmTestHash123456789".to_string(),
        gpa: "3.75".to_string(),
    }
}

fn call_for(op: &Op) -> (Address, RegistryCall) {
    match op {
        Op::Issue { sender, student_id } => {
            (*sender, RegistryCall::IssueCertificate(issuance(*student_id)))
        }
        Op::Revoke { sender, id, reason } => (
            *sender,
            RegistryCall::RevokeCertificate {
                id: CertificateId(*id),
                reason: reason.clone(),
            },
        ),
    }
}

fn create_registry() -> CertificateRegistry {
    let mut registry =
        CertificateRegistry::deploy(Address::from_bytes(CONTRACT), admin(), &RegistryConfig::default());
    registry
        .execute(
            &CallContext {
                sender: admin(),
                timestamp: 0,
            },
            &RegistryCall::GrantRole {
                role: Role::issuer(),
                account: issuer(),
            },
        )
        .unwrap();
    registry
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: counters track successful issuances and revocations
    #[test]
    fn prop_counters_match_history(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut registry = create_registry();
        let mut issued = 0u64;
        let mut revoked = 0u64;

        for (step, op) in ops.iter().enumerate() {
            let (sender, call) = call_for(op);
            let ctx = CallContext { sender, timestamp: step as i64 };
            if registry.execute(&ctx, &call).is_ok() {
                match op {
                    Op::Issue { .. } => issued += 1,
                    Op::Revoke { .. } => revoked += 1,
                }
            }

            prop_assert_eq!(registry.total_certificates(), issued);
            prop_assert_eq!(registry.valid_certificates_count(), issued - revoked);
        }
    }

    /// Property: revocation is terminal
    #[test]
    fn prop_revocation_monotonic(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut registry = create_registry();
        let mut revoked_ids: HashSet<u64> = HashSet::new();

        for (step, op) in ops.iter().enumerate() {
            let (sender, call) = call_for(op);
            let ctx = CallContext { sender, timestamp: step as i64 };
            let _ = registry.execute(&ctx, &call);

            for id in 1..=registry.total_certificates() {
                let certificate = registry.get_certificate(CertificateId(id)).unwrap();
                if revoked_ids.contains(&id) {
                    prop_assert!(!certificate.is_valid);
                    prop_assert!(!registry.verify_certificate(CertificateId(id)));
                }
                if !certificate.is_valid {
                    prop_assert!(!certificate.revoke_reason.trim().is_empty());
                    revoked_ids.insert(id);
                }
            }
        }
    }

    /// Property: ids are sequential, owned, and at most one is live per student id
    #[test]
    fn prop_ids_sequential_and_unique(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut registry = create_registry();

        for (step, op) in ops.iter().enumerate() {
            let (sender, call) = call_for(op);
            let ctx = CallContext { sender, timestamp: step as i64 };
            let _ = registry.execute(&ctx, &call);
        }

        let total = registry.total_certificates();
        let mut live_student_ids = HashSet::new();
        let mut owned = 0u64;
        for id in 1..=total {
            let certificate = registry.get_certificate(CertificateId(id)).unwrap();
            prop_assert_eq!(certificate.issuer, issuer());
            if certificate.is_valid {
                prop_assert!(live_student_ids.insert(certificate.student_id.clone()));
            }
            let owner = registry.owner_of(CertificateId(id)).unwrap();
            prop_assert!(registry.student_certificates(&owner).contains(&CertificateId(id)));
        }
        for student_id in 0u8..6 {
            owned += registry.balance_of(&issuance(student_id).student);
        }
        prop_assert_eq!(owned, total);
        prop_assert!(registry.get_certificate(CertificateId(total + 1)).is_err());
    }

    /// Property: outsiders never change state
    #[test]
    fn prop_outsider_cannot_mutate(student_id in 0u8..6, id in 0u64..4) {
        let mut registry = create_registry();
        let ctx = CallContext { sender: issuer(), timestamp: 1 };
        registry.execute(&ctx, &RegistryCall::IssueCertificate(issuance(0))).unwrap();

        let outsider_ctx = CallContext { sender: outsider(), timestamp: 2 };
        prop_assert!(registry
            .execute(&outsider_ctx, &RegistryCall::IssueCertificate(issuance(student_id)))
            .is_err());
        let revoke_call = RegistryCall::RevokeCertificate { id: CertificateId(id), reason: "fraud".to_string() };
        prop_assert!(registry
            .execute(
                &outsider_ctx,
                &revoke_call,
            )
            .is_err());

        prop_assert_eq!(registry.total_certificates(), 1);
        prop_assert_eq!(registry.valid_certificates_count(), 1);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]

    /// Property: replaying the same signed history yields the same registry state
    #[test]
    fn prop_deterministic_replay(ops in prop::collection::vec(op_strategy(), 1..12)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let admin_key = KeyPair::from_seed(&[1u8; 32]);
            let issuer_key = KeyPair::from_seed(&[2u8; 32]);

            let mut snapshots = Vec::new();
            for _ in 0..2 {
                let mut config = Config::default();
                config.genesis.issuers.push(issuer_key.address());
                let ledger = Ledger::open(config, admin_key.address()).await.unwrap();

                for op in &ops {
                    // Only the issuer key signs; the sender strategy picks the call shape
                    let (_, call) = call_for(op);
                    let nonce = ledger.transaction_count(issuer_key.address()).await.unwrap();
                    let tx = issuer_key
                        .sign_transaction(UnsignedTransaction {
                            chain_id: ledger.chain_id(),
                            nonce,
                            from: issuer_key.address(),
                            to: ledger.registry_address(),
                            call,
                        })
                        .unwrap();
                    let _ = ledger.submit_transaction(tx).await;
                }

                let to = ledger.registry_address();
                let total = ledger.call(to, &RegistryQuery::GetTotalCertificates).unwrap();
                let valid = ledger.call(to, &RegistryQuery::GetValidCertificatesCount).unwrap();
                let mut validity = Vec::new();
                if let QueryResult::Count(n) = total {
                    for id in 1..=n {
                        validity.push(
                            ledger
                                .call(to, &RegistryQuery::VerifyCertificate { id: CertificateId(id) })
                                .unwrap(),
                        );
                    }
                }
                snapshots.push((total, valid, validity));
                ledger.shutdown().await.unwrap();
            }

            prop_assert_eq!(&snapshots[0], &snapshots[1]);
            Ok(())
        })?;
    }
}
