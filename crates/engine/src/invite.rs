//! Invite-code generation.
//!
//! Codes are 8 characters over `A-Z0-9` (36^8 ≈ 2.8e12 values). Uniqueness is
//! guaranteed by the unique index on `groups.invite_code`; the engine retries
//! a bounded number of times when a generated code is already taken.

use std::fmt;

use rand::Rng;

use crate::{EngineError, ResultEngine};

pub const INVITE_CODE_LEN: usize = 8;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Source of candidate invite codes.
pub trait InviteCodeGenerator: Send + Sync + fmt::Debug {
    fn generate(&self) -> String;
}

/// Uniformly random codes from the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomInviteCode;

impl InviteCodeGenerator for RandomInviteCode {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..INVITE_CODE_LEN)
            .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
            .collect()
    }
}

/// Canonical form of a user-typed invite code (trimmed, upper case).
pub(crate) fn normalize_invite_code(code: &str) -> ResultEngine<String> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != INVITE_CODE_LEN || !code.bytes().all(|b| ALPHABET.contains(&b)) {
        return Err(EngineError::KeyNotFound("invite code not exists".to_string()));
    }
    Ok(code)
}
