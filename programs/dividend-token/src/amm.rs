// =============================================================================
// External AMM
// =============================================================================
// The fee sweep and manual buyback only need two capabilities from the AMM:
// a price conversion and a liquidity add. `SwapVenue` is that seam; `AmmCpi`
// implements it with manual CPI into the configured AMM program.
//
// Settlement convention: the ledger asset is accounted inside this program,
// so for any leg involving it the ledger moves the tokens between the fee
// holding / dead holder and the pair holder itself, and the AMM settles only
// the other side (lamports in the native vault, reward tokens in the reward
// vault). The AMM reports the output amount as an 8-byte little-endian
// return value.
// =============================================================================

use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::program::{get_return_data, invoke_signed};

use crate::constants::{AMM_ADD_LIQUIDITY_DISCRIMINATOR, AMM_SWAP_DISCRIMINATOR};
use crate::error::TokenError;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Asset {
    Ledger,
    Native,
    Reward,
}

impl Asset {
    fn as_byte(self) -> u8 {
        match self {
            Asset::Ledger => 0,
            Asset::Native => 1,
            Asset::Reward => 2,
        }
    }
}

pub trait SwapVenue {
    /// Best-effort conversion; may return 0.
    fn swap(&mut self, amount_in: u64, asset_in: Asset, asset_out: Asset) -> Result<u64>;

    /// Returns LP tokens minted.
    fn add_liquidity(&mut self, token_amount: u64, native_amount: u64) -> Result<u64>;
}

/// CPI-backed venue. The native vault signs so the AMM can pull lamports
/// from it.
pub struct AmmCpi<'a, 'info> {
    pub amm_program: &'a AccountInfo<'info>,
    pub amm_pool: &'a AccountInfo<'info>,
    pub native_vault: &'a AccountInfo<'info>,
    pub reward_vault: &'a AccountInfo<'info>,
    pub liquidity_receiver: &'a AccountInfo<'info>,
    pub token_program: &'a AccountInfo<'info>,
    pub system_program: &'a AccountInfo<'info>,
    pub native_vault_seeds: &'a [&'a [u8]],
}

impl<'a, 'info> AmmCpi<'a, 'info> {
    #[inline(never)]
    fn invoke(&self, data: Vec<u8>) -> Result<u64> {
        let instruction = Instruction {
            program_id: *self.amm_program.key,
            accounts: vec![
                AccountMeta::new(*self.amm_pool.key, false),
                AccountMeta::new(*self.native_vault.key, true),
                AccountMeta::new(*self.reward_vault.key, false),
                AccountMeta::new(*self.liquidity_receiver.key, false),
                AccountMeta::new_readonly(*self.token_program.key, false),
                AccountMeta::new_readonly(*self.system_program.key, false),
            ],
            data,
        };

        invoke_signed(
            &instruction,
            &[
                self.amm_pool.clone(),
                self.native_vault.clone(),
                self.reward_vault.clone(),
                self.liquidity_receiver.clone(),
                self.token_program.clone(),
                self.system_program.clone(),
                self.amm_program.clone(),
            ],
            &[self.native_vault_seeds],
        )?;

        self.read_amount()
    }

    fn read_amount(&self) -> Result<u64> {
        let (program_id, data) = get_return_data().ok_or(TokenError::AmmReturnDataMissing)?;
        require_keys_eq!(program_id, *self.amm_program.key, TokenError::InvalidAmmProgram);

        let bytes: [u8; 8] = data
            .get(..8)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(TokenError::AmmReturnDataMissing)?;
        Ok(u64::from_le_bytes(bytes))
    }
}

impl<'a, 'info> SwapVenue for AmmCpi<'a, 'info> {
    fn swap(&mut self, amount_in: u64, asset_in: Asset, asset_out: Asset) -> Result<u64> {
        let mut data = AMM_SWAP_DISCRIMINATOR.to_vec();
        data.extend_from_slice(&amount_in.to_le_bytes());
        data.push(asset_in.as_byte());
        data.push(asset_out.as_byte());

        let amount_out = self.invoke(data)?;
        msg!("AMM swap {:?} -> {:?}: {} in, {} out", asset_in, asset_out, amount_in, amount_out);
        Ok(amount_out)
    }

    fn add_liquidity(&mut self, token_amount: u64, native_amount: u64) -> Result<u64> {
        let mut data = AMM_ADD_LIQUIDITY_DISCRIMINATOR.to_vec();
        data.extend_from_slice(&token_amount.to_le_bytes());
        data.extend_from_slice(&native_amount.to_le_bytes());

        let lp_tokens = self.invoke(data)?;
        msg!("AMM liquidity added: {} tokens, {} lamports, {} LP", token_amount, native_amount, lp_tokens);
        Ok(lp_tokens)
    }
}
