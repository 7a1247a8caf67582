//! Registry events and their log encoding
//!
//! Logs follow the indexed/non-indexed split: `topics[0]` is the SHA-256 of
//! the event signature text, indexed fields follow as 32-byte words
//! (addresses left-padded, integers big-endian), and non-indexed fields are
//! bincode-encoded into `data`.

use crate::crypto::event_topic;
use crate::types::{Address, CertificateId, LogEntry, Role};

/// `Transfer(from, to, tokenId)`; from is the zero address on issuance
pub const TRANSFER: &str = "Transfer(address,address,uint256)";
/// `CertificateIssued(tokenId, student, studentId)`
pub const CERTIFICATE_ISSUED: &str = "CertificateIssued(uint256,address,string)";
/// `CertificateRevoked(tokenId, reason)`
pub const CERTIFICATE_REVOKED: &str = "CertificateRevoked(uint256,string)";
/// `RoleGranted(role, account, sender)`
pub const ROLE_GRANTED: &str = "RoleGranted(bytes32,address,address)";
/// `RoleRevoked(role, account, sender)`
pub const ROLE_REVOKED: &str = "RoleRevoked(bytes32,address,address)";
/// `UniversityApproved(name)`
pub const UNIVERSITY_APPROVED: &str = "UniversityApproved(string)";

/// Topic of the `Transfer` event
pub fn transfer_topic() -> [u8; 32] {
    event_topic(TRANSFER)
}

/// Decode a big-endian 32-byte word into a `u64`; `None` if it overflows
pub fn u64_from_topic(topic: &[u8; 32]) -> Option<u64> {
    if topic[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&topic[24..]);
    Some(u64::from_be_bytes(bytes))
}

fn encode_data<T: serde::Serialize>(value: &T) -> Vec<u8> {
    // Plain strings and integers cannot fail to encode
    bincode::serialize(value).unwrap_or_default()
}

/// Mint of certificate `id` to `student`
pub fn transfer(contract: Address, from: Address, to: Address, id: CertificateId) -> LogEntry {
    LogEntry {
        address: contract,
        topics: vec![transfer_topic(), from.to_topic(), to.to_topic(), id.to_topic()],
        data: Vec::new(),
    }
}

/// Certificate issued
pub fn certificate_issued(
    contract: Address,
    id: CertificateId,
    student: Address,
    student_id: &str,
) -> LogEntry {
    LogEntry {
        address: contract,
        topics: vec![event_topic(CERTIFICATE_ISSUED), id.to_topic(), student.to_topic()],
        data: encode_data(&student_id),
    }
}

/// Certificate revoked
pub fn certificate_revoked(contract: Address, id: CertificateId, reason: &str) -> LogEntry {
    LogEntry {
        address: contract,
        topics: vec![event_topic(CERTIFICATE_REVOKED), id.to_topic()],
        data: encode_data(&reason),
    }
}

/// Role granted
pub fn role_granted(contract: Address, role: Role, account: Address, sender: Address) -> LogEntry {
    LogEntry {
        address: contract,
        topics: vec![
            event_topic(ROLE_GRANTED),
            *role.as_bytes(),
            account.to_topic(),
            sender.to_topic(),
        ],
        data: Vec::new(),
    }
}

/// Role revoked
pub fn role_revoked(contract: Address, role: Role, account: Address, sender: Address) -> LogEntry {
    LogEntry {
        address: contract,
        topics: vec![
            event_topic(ROLE_REVOKED),
            *role.as_bytes(),
            account.to_topic(),
            sender.to_topic(),
        ],
        data: Vec::new(),
    }
}

/// University approved
pub fn university_approved(contract: Address, name: &str) -> LogEntry {
    LogEntry {
        address: contract,
        topics: vec![event_topic(UNIVERSITY_APPROVED)],
        data: encode_data(&name),
    }
}
