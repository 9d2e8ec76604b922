//! Decoder for the on-chain `Selector` account.
//!
//! The header is Borsh-encoded behind the 8-byte Anchor discriminator:
//!
//! ```text
//! authority (32) | oracle (32) | selector_id (u64) | mode (u8)
//! config   : tickets_count (u32) | participants_list_link (str)
//!            participants_list_hash (str) | kyc_count (u32) | wl_limit (u32)
//!            kyc_list_link (str) | kyc_list_hash (str)
//! flags    : eligibility_finished (bool) | allow_list_reached_limit (bool)
//! seed     : request_id (u64) | requested (bool) | ready (bool)
//!            value ([u8; 32]) | draw_counter (u64)
//! pools    : ticket_pool, kyc_pool = size (u32) | drawn (u32) | swap_count (u32)
//! counts   : eligibility, allow_list, reserve (u32)
//! bump (u8)
//! ```
//!
//! Strings carry a `u32` little-endian length prefix. The winner ledger starts
//! at the fixed [`LEDGER_OFFSET`]: the three winner lists as `u32` LE entries,
//! back to back, followed by the active pool's swap table.
//! The swap table is not decoded; the auditor replays pools from the seed.

use anyhow::{Context, Result, bail, ensure};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

/// Start of the winner ledger: discriminator plus the largest possible header.
pub const LEDGER_OFFSET: usize = 966;

/// Compute the Anchor account discriminator: `sha256("account:<Name>")[..8]`.
pub fn account_discriminator(account_name: &str) -> [u8; 8] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(format!("account:{account_name}"));
    let hash = hasher.finalize();
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

/// Draw stage, in Borsh variant order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Eligibility,
    AllowList,
    Reserve,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Eligibility, Phase::AllowList, Phase::Reserve];

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Phase::Eligibility),
            1 => Some(Phase::AllowList),
            2 => Some(Phase::Reserve),
            _ => None,
        }
    }

    /// Name of the program instruction drawing a batch in this phase.
    pub fn select_instruction(self) -> &'static str {
        match self {
            Phase::Eligibility => "select_eligibility_winners",
            Phase::AllowList => "select_allow_list_winners",
            Phase::Reserve => "select_reserve_winners",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectorMode {
    Whitelist,
    SingleRound,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub size: u32,
    pub drawn: u32,
    /// Entries of this pool in the ledger's swap table.
    pub swap_count: u32,
}

/// Decoded `Selector` account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSnapshot {
    pub authority: Pubkey,
    pub oracle: Pubkey,
    pub selector_id: u64,
    pub mode: SelectorMode,
    pub tickets_count: u32,
    pub participants_list_link: String,
    pub participants_list_hash: String,
    pub kyc_count: u32,
    pub wl_limit: u32,
    pub kyc_list_link: String,
    pub kyc_list_hash: String,
    pub eligibility_finished: bool,
    pub allow_list_reached_limit: bool,
    pub request_id: u64,
    pub seed_requested: bool,
    pub seed_ready: bool,
    pub seed: [u8; 32],
    pub draw_counter: u64,
    pub ticket_pool: PoolSnapshot,
    pub kyc_pool: PoolSnapshot,
    pub eligibility_winners: Vec<u32>,
    pub allow_list_winners: Vec<u32>,
    pub reserve_winners: Vec<u32>,
    pub bump: u8,
}

impl SelectorSnapshot {
    /// Decode raw account data, discriminator included.
    pub fn decode(data: &[u8]) -> Result<Self> {
        ensure!(data.len() >= 8, "account data too short: {} bytes", data.len());
        ensure!(
            data[..8] == account_discriminator("Selector"),
            "account is not a Selector"
        );

        let mut reader = Reader::new(&data[8..]);
        let authority = reader.pubkey().context("authority")?;
        let oracle = reader.pubkey().context("oracle")?;
        let selector_id = reader.u64()?;
        let mode = match reader.u8()? {
            0 => SelectorMode::Whitelist,
            1 => SelectorMode::SingleRound,
            other => bail!("unknown selector mode {other}"),
        };

        let tickets_count = reader.u32()?;
        let participants_list_link = reader.string().context("participants_list_link")?;
        let participants_list_hash = reader.string().context("participants_list_hash")?;
        let kyc_count = reader.u32()?;
        let wl_limit = reader.u32()?;
        let kyc_list_link = reader.string().context("kyc_list_link")?;
        let kyc_list_hash = reader.string().context("kyc_list_hash")?;

        let eligibility_finished = reader.bool()?;
        let allow_list_reached_limit = reader.bool()?;

        let request_id = reader.u64()?;
        let seed_requested = reader.bool()?;
        let seed_ready = reader.bool()?;
        let seed = reader.bytes32()?;
        let draw_counter = reader.u64()?;

        let ticket_pool = reader.pool().context("ticket_pool")?;
        let kyc_pool = reader.pool().context("kyc_pool")?;
        let counts = [reader.u32()?, reader.u32()?, reader.u32()?];
        let bump = reader.u8()?;
        ensure!(
            reader.offset <= LEDGER_OFFSET - 8,
            "header overruns the ledger offset"
        );

        let ledger = data.get(LEDGER_OFFSET..).unwrap_or_default();
        let in_use = counts.iter().map(|count| *count as usize * 4).sum::<usize>()
            + (ticket_pool.swap_count as usize + kyc_pool.swap_count as usize) * 8;
        ensure!(
            ledger.len() >= in_use,
            "ledger holds {} bytes, header describes {in_use}",
            ledger.len()
        );
        let mut ledger = Reader::new(ledger);
        let eligibility_winners = ledger.u32s(counts[0]).context("eligibility_winners")?;
        let allow_list_winners = ledger.u32s(counts[1]).context("allow_list_winners")?;
        let reserve_winners = ledger.u32s(counts[2]).context("reserve_winners")?;

        Ok(Self {
            authority,
            oracle,
            selector_id,
            mode,
            tickets_count,
            participants_list_link,
            participants_list_hash,
            kyc_count,
            wl_limit,
            kyc_list_link,
            kyc_list_hash,
            eligibility_finished,
            allow_list_reached_limit,
            request_id,
            seed_requested,
            seed_ready,
            seed,
            draw_counter,
            ticket_pool,
            kyc_pool,
            eligibility_winners,
            allow_list_winners,
            reserve_winners,
            bump,
        })
    }

    pub fn supports(&self, phase: Phase) -> bool {
        self.mode == SelectorMode::Whitelist || phase == Phase::Eligibility
    }

    pub fn winners(&self, phase: Phase) -> &[u32] {
        match phase {
            Phase::Eligibility => &self.eligibility_winners,
            Phase::AllowList => &self.allow_list_winners,
            Phase::Reserve => &self.reserve_winners,
        }
    }

    pub fn drawn(&self, phase: Phase) -> u32 {
        self.winners(phase).len() as u32
    }

    /// Maximum number of winners the phase may ever hold.
    pub fn winner_cap(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Eligibility => self.tickets_count,
            Phase::AllowList => self.wl_limit,
            Phase::Reserve => self.kyc_count.saturating_sub(self.wl_limit),
        }
    }

    pub fn allow_list_configured(&self) -> bool {
        self.kyc_count > 0
            && self.wl_limit > 0
            && !self.kyc_list_link.is_empty()
            && !self.kyc_list_hash.is_empty()
    }
}

/// Little-endian Borsh cursor.
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .with_context(|| {
                format!(
                    "unexpected end of data: need {len} bytes at offset {}, have {}",
                    self.offset,
                    self.data.len()
                )
            })?;
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn bool(&mut self) -> Result<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => bail!("invalid bool byte {other}"),
        }
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn bytes32(&mut self) -> Result<[u8; 32]> {
        self.array()
    }

    fn pubkey(&mut self) -> Result<Pubkey> {
        Ok(Pubkey::new_from_array(self.array()?))
    }

    fn len_prefix(&mut self, item_size: usize) -> Result<usize> {
        let len = self.u32()? as usize;
        // Reject lengths the remaining bytes cannot hold before allocating.
        ensure!(
            len.saturating_mul(item_size) <= self.data.len() - self.offset,
            "length prefix {len} exceeds remaining data"
        );
        Ok(len)
    }

    fn string(&mut self) -> Result<String> {
        let len = self.len_prefix(1)?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).context("string is not valid UTF-8")
    }

    /// `count` consecutive `u32` values.
    fn u32s(&mut self, count: u32) -> Result<Vec<u32>> {
        let bytes = self.take((count as usize).saturating_mul(4))?;
        Ok(bytes
            .chunks_exact(4)
            .map(|entry| u32::from_le_bytes([entry[0], entry[1], entry[2], entry[3]]))
            .collect())
    }

    fn pool(&mut self) -> Result<PoolSnapshot> {
        Ok(PoolSnapshot {
            size: self.u32()?,
            drawn: self.u32()?,
            swap_count: self.u32()?,
        })
    }
}
