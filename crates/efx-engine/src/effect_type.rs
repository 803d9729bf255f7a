//! The closed set of effect kinds and their stable numeric codes.

use std::fmt;

use serde::{Serialize, Serializer};

macro_rules! effect_types {
    ($($variant:ident = $code:literal => $name:literal,)+) => {
        /// Kind of a derived effect. Codes are stable and shared with
        /// downstream consumers.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum EffectType {
            $($variant = $code,)+
        }

        impl EffectType {
            pub const ALL: &'static [EffectType] = &[$(Self::$variant,)+];

            pub fn code(self) -> i32 {
                self as i32
            }

            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }
    };
}

effect_types! {
    AccountCreated = 0 => "account_created",
    AccountRemoved = 1 => "account_removed",
    AccountCredited = 2 => "account_credited",
    AccountDebited = 3 => "account_debited",
    AccountThresholdsUpdated = 4 => "account_thresholds_updated",
    AccountHomeDomainUpdated = 5 => "account_home_domain_updated",
    AccountFlagsUpdated = 6 => "account_flags_updated",
    AccountInflationDestinationUpdated = 7 => "account_inflation_destination_updated",
    SignerCreated = 10 => "signer_created",
    SignerRemoved = 11 => "signer_removed",
    SignerUpdated = 12 => "signer_updated",
    TrustlineCreated = 20 => "trustline_created",
    TrustlineRemoved = 21 => "trustline_removed",
    TrustlineUpdated = 22 => "trustline_updated",
    TrustlineAuthorized = 23 => "trustline_authorized",
    TrustlineDeauthorized = 24 => "trustline_deauthorized",
    TrustlineAuthorizedToMaintainLiabilities = 25 => "trustline_authorized_to_maintain_liabilities",
    TrustlineFlagsUpdated = 26 => "trustline_flags_updated",
    OfferCreated = 30 => "offer_created",
    OfferRemoved = 31 => "offer_removed",
    OfferUpdated = 32 => "offer_updated",
    Trade = 33 => "trade",
    DataCreated = 40 => "data_created",
    DataRemoved = 41 => "data_removed",
    DataUpdated = 42 => "data_updated",
    SequenceBumped = 43 => "sequence_bumped",
    ClaimableBalanceCreated = 50 => "claimable_balance_created",
    ClaimableBalanceClaimantCreated = 51 => "claimable_balance_claimant_created",
    ClaimableBalanceClaimed = 52 => "claimable_balance_claimed",
    AccountSponsorshipCreated = 60 => "account_sponsorship_created",
    AccountSponsorshipUpdated = 61 => "account_sponsorship_updated",
    AccountSponsorshipRemoved = 62 => "account_sponsorship_removed",
    TrustlineSponsorshipCreated = 63 => "trustline_sponsorship_created",
    TrustlineSponsorshipUpdated = 64 => "trustline_sponsorship_updated",
    TrustlineSponsorshipRemoved = 65 => "trustline_sponsorship_removed",
    DataSponsorshipCreated = 66 => "data_sponsorship_created",
    DataSponsorshipUpdated = 67 => "data_sponsorship_updated",
    DataSponsorshipRemoved = 68 => "data_sponsorship_removed",
    ClaimableBalanceSponsorshipCreated = 69 => "claimable_balance_sponsorship_created",
    ClaimableBalanceSponsorshipUpdated = 70 => "claimable_balance_sponsorship_updated",
    ClaimableBalanceSponsorshipRemoved = 71 => "claimable_balance_sponsorship_removed",
    SignerSponsorshipCreated = 72 => "signer_sponsorship_created",
    SignerSponsorshipUpdated = 73 => "signer_sponsorship_updated",
    SignerSponsorshipRemoved = 74 => "signer_sponsorship_removed",
    ClaimableBalanceClawedBack = 80 => "claimable_balance_clawed_back",
    LiquidityPoolDeposited = 90 => "liquidity_pool_deposited",
    LiquidityPoolWithdrew = 91 => "liquidity_pool_withdrew",
    LiquidityPoolTrade = 92 => "liquidity_pool_trade",
    LiquidityPoolCreated = 93 => "liquidity_pool_created",
    LiquidityPoolRemoved = 94 => "liquidity_pool_removed",
    LiquidityPoolRevoked = 95 => "liquidity_pool_revoked",
    ContractCredited = 96 => "contract_credited",
    ContractDebited = 97 => "contract_debited",
    ExtendFootprintTtl = 98 => "extend_footprint_ttl",
    RestoreFootprint = 99 => "restore_footprint",
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for EffectType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}
