/// PDA seed prefix for selector accounts: `["selector", authority, selector_id]`.
pub const SELECTOR_SEED: &[u8] = b"selector";

/// Maximum byte length of a participants / KYC list link.
pub const MAX_LINK_LEN: usize = 256;

/// Maximum byte length of a participants / KYC list digest (hex or base58 text).
pub const MAX_HASH_LEN: usize = 128;

/// Upper bound on draws per instruction.
///
/// Each draw costs one SHA-256 and may grow the account by [`DRAW_GROWTH`]
/// bytes; the realloc limit per instruction is 10 KiB.
pub const MAX_BATCH_SIZE: u32 = 250;

/// Ledger bytes per winner entry (`u32` LE).
pub const WINNER_LEN: usize = 4;

/// Ledger bytes per swap entry (`position: u32`, `value: u32`, both LE).
pub const SWAP_LEN: usize = 8;

/// Worst-case account growth of a single draw: one swap entry plus one winner.
pub const DRAW_GROWTH: usize = SWAP_LEN + WINNER_LEN;

/// Largest winner list that fits the 1024-byte return data buffer
/// (4-byte length prefix + 4 bytes per entry).
pub const MAX_RETURN_WINNERS: usize = 255;

/// Largest event written by [`crate::events::log_event`], discriminator included.
pub const MAX_LOGGED_EVENT_LEN: usize = 128;
