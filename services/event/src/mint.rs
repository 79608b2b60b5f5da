use rand::Rng;

use crate::domain::repository::CodeMint;

/// Charset for team codes: uppercase alphanumeric, QR and print friendly.
const TEAM_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Charset for access keys (mixed-case alphanumeric).
const ACCESS_KEY_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub const TEAM_CODE_PREFIX: &str = "TEAM-";
const TEAM_CODE_LEN: usize = 6;
const ACCESS_KEY_LEN: usize = 10;

/// Sequential public team id, e.g. `HACK-001`. Widens past 999 teams.
pub fn team_id(prefix: &str, seq: u64) -> String {
    format!("{prefix}-{seq:03}")
}

/// Deterministic per-member id, e.g. `TEAM-K9X2V5-000`.
pub fn participant_id(team_code: &str, member_index: usize) -> String {
    format!("{team_code}-{member_index:03}")
}

/// Uniform random 6-digit decimal OTP, leading zeros included.
pub fn otp_code() -> String {
    let mut rng = rand::rng();
    format!("{:06}", rng.random_range(0..1_000_000))
}

/// Random team code, e.g. `TEAM-K9X2V5`. Uniqueness is enforced by the
/// credential store's unique index; collisions are re-minted there.
pub fn team_code() -> String {
    format!("{TEAM_CODE_PREFIX}{}", random_string(TEAM_CODE_CHARSET, TEAM_CODE_LEN))
}

/// Random download key paired with the team id. Uniqueness not required.
pub fn access_key() -> String {
    random_string(ACCESS_KEY_CHARSET, ACCESS_KEY_LEN)
}

fn random_string(charset: &[u8], len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| charset[rng.random_range(0..charset.len())] as char)
        .collect()
}

/// Shape check for manually entered team ids (`PREFIX-NNN`).
pub fn is_team_id_shape(candidate: &str) -> bool {
    match candidate.rsplit_once('-') {
        Some((prefix, digits)) => {
            !prefix.is_empty()
                && prefix
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
                && digits.len() >= 3
                && digits.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Production mint backed by the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomMint;

impl CodeMint for RandomMint {
    fn team_code(&self) -> String {
        team_code()
    }

    fn access_key(&self) -> String {
        access_key()
    }
}
