//! Policies every tokenizer deployment ships with.
//!
//! These ids must stay in sync with the server's built-in policy table.

use uuid::Uuid;

use crate::models::{AccessPolicy, GenerationPolicy};

/// Access policy that permits resolution for any context.
pub const ACCESS_POLICY_OPEN: Uuid = Uuid::from_u128(0x1bf2b775_e521_41d3_8b7e_78e89427e6fe);

pub const GENERATION_POLICY_UUID: Uuid = Uuid::from_u128(0xf5bce640_f866_4464_af1a_9e7474c4a90c);
pub const GENERATION_POLICY_EMAIL: Uuid = Uuid::from_u128(0x0cedf7a4_86ab_450a_9426_478ad0a60faa);
pub const GENERATION_POLICY_FULL_NAME: Uuid =
    Uuid::from_u128(0xb9bf352f_b1ee_4fb2_a2eb_d0c346c6404b);
pub const GENERATION_POLICY_SSN: Uuid = Uuid::from_u128(0x3f65ee22_2241_4694_bbe3_72cefbe59ff2);
pub const GENERATION_POLICY_CREDIT_CARD: Uuid =
    Uuid::from_u128(0x618a4ae7_9979_4ee8_bac5_db87335fe4d9);

pub fn access_open() -> AccessPolicy {
    AccessPolicy::reference(ACCESS_POLICY_OPEN)
}

/// Tokens shaped like random UUIDs.
pub fn generation_uuid() -> GenerationPolicy {
    GenerationPolicy::reference(GENERATION_POLICY_UUID)
}

pub fn generation_email() -> GenerationPolicy {
    GenerationPolicy::reference(GENERATION_POLICY_EMAIL)
}

pub fn generation_full_name() -> GenerationPolicy {
    GenerationPolicy::reference(GENERATION_POLICY_FULL_NAME)
}

pub fn generation_ssn() -> GenerationPolicy {
    GenerationPolicy::reference(GENERATION_POLICY_SSN)
}

pub fn generation_credit_card() -> GenerationPolicy {
    GenerationPolicy::reference(GENERATION_POLICY_CREDIT_CARD)
}

/// Look up a built-in generation policy by its short name.
pub fn generation_by_name(name: &str) -> Option<GenerationPolicy> {
    match name.to_ascii_lowercase().as_str() {
        "uuid" => Some(generation_uuid()),
        "email" => Some(generation_email()),
        "full_name" | "full-name" | "fullname" => Some(generation_full_name()),
        "ssn" => Some(generation_ssn()),
        "credit_card" | "credit-card" | "creditcard" => Some(generation_credit_card()),
        _ => None,
    }
}
