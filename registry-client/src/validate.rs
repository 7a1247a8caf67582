//! Local input validation
//!
//! Runs before any provider request. Every failure here is a
//! [`ClientError::Validation`] and nothing reaches the network.

use crate::error::{ClientError, Result};
use registry_core::{Address, CertificateId, IssueCertificate, Role};

/// Administrative role name accepted by [`resolve_role`]
pub const DEFAULT_ADMIN_ROLE_NAME: &str = "DEFAULT_ADMIN_ROLE";

/// Parse an account reference
pub fn parse_address(field: &str, value: &str) -> Result<Address> {
    value
        .trim()
        .parse()
        .map_err(|_| ClientError::Validation(format!("{} is not a valid address: {}", field, value)))
}

/// Parse the owner of a new certificate; the zero address is rejected
pub fn parse_student_address(value: &str) -> Result<Address> {
    let address = parse_address("Student address", value)?;
    if address.is_zero() {
        return Err(ClientError::Validation("Invalid student address".to_string()));
    }
    Ok(address)
}

/// Resolve a role by name or as a `0x`-prefixed 32-byte identifier
pub fn resolve_role(name: &str) -> Result<Role> {
    let name = name.trim();
    match name {
        Role::ISSUER_ROLE_NAME => Ok(Role::issuer()),
        DEFAULT_ADMIN_ROLE_NAME => Ok(Role::DEFAULT_ADMIN),
        _ if name.starts_with("0x") => name
            .parse()
            .map_err(|_| ClientError::Validation(format!("Unknown role: {}", name))),
        _ => Err(ClientError::Validation(format!("Unknown role: {}", name))),
    }
}

/// Non-empty after trimming
pub fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClientError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Every text field of an issuance
pub fn issuance(params: &IssueCertificate) -> Result<()> {
    if params.student.is_zero() {
        return Err(ClientError::Validation("Invalid student address".to_string()));
    }
    params
        .text_fields()
        .iter()
        .try_for_each(|(field, value)| require_text(field, value))
}

/// Revocation arguments
pub fn revocation(id: CertificateId, reason: &str) -> Result<()> {
    if id.value() == 0 {
        return Err(ClientError::Validation("Certificate id must be positive".to_string()));
    }
    require_text("Revoke reason", reason)
}
