//! Account lifecycle and configuration operations.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use efx_types::entry::account_flags;
use efx_types::result::{AccountMergeResult, InflationResult};
use efx_types::{amount, LedgerEntryType, OperationBody, OperationResultTr, OperationType};

use super::{applied_result, body_mismatch};
use crate::accumulator::EffectAccumulator;
use crate::context::OperationContext;
use crate::details::Details;
use crate::effect_type::EffectType;
use crate::error::{EffectError, EffectResult};

/// Weight given to the master key of a new account.
pub const DEFAULT_SIGNER_WEIGHT: u32 = 1;

pub fn create_account(ctx: &OperationContext<'_>, acc: &mut EffectAccumulator) -> EffectResult<()> {
    let OperationBody::CreateAccount(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    let starting_balance = amount::format(op.starting_balance);
    acc.add(
        &op.destination,
        EffectType::AccountCreated,
        Details::new().with("starting_balance", starting_balance.clone()),
    );
    acc.add_muxed(
        &ctx.source_account(),
        EffectType::AccountDebited,
        Details::new()
            .with("asset_type", "native")
            .with("amount", starting_balance),
    );
    acc.add(
        &op.destination,
        EffectType::SignerCreated,
        Details::new()
            .with("public_key", op.destination.address())
            .with("weight", DEFAULT_SIGNER_WEIGHT),
    );
    Ok(())
}

/// Account flag detail keys, by bit.
pub(crate) const ACCOUNT_FLAG_KEYS: [(u32, &str); 4] = [
    (account_flags::AUTH_REQUIRED, "auth_required_flag"),
    (account_flags::AUTH_REVOCABLE, "auth_revocable_flag"),
    (account_flags::AUTH_IMMUTABLE, "auth_immutable_flag"),
    (account_flags::AUTH_CLAWBACK_ENABLED, "auth_clawback_enabled_flag"),
];

pub(crate) fn insert_flags(details: &mut Details, keys: &[(u32, &str)], flags: u32, value: bool) {
    for (bit, key) in keys {
        if flags & bit != 0 {
            details.insert(*key, value);
        }
    }
}

pub fn set_options(ctx: &OperationContext<'_>, acc: &mut EffectAccumulator) -> EffectResult<()> {
    let OperationBody::SetOptions(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    let source = ctx.source_account();

    if let Some(home_domain) = &op.home_domain {
        acc.add_muxed(
            &source,
            EffectType::AccountHomeDomainUpdated,
            Details::new().with("home_domain", home_domain.as_str()),
        );
    }

    let mut thresholds = Details::new();
    for (key, value) in [
        ("low_threshold", op.low_threshold),
        ("med_threshold", op.med_threshold),
        ("high_threshold", op.high_threshold),
    ] {
        if let Some(value) = value {
            thresholds.insert(key, value);
        }
    }
    if !thresholds.is_empty() {
        acc.add_muxed(&source, EffectType::AccountThresholdsUpdated, thresholds);
    }

    let mut flags = Details::new();
    if let Some(set) = op.set_flags {
        insert_flags(&mut flags, &ACCOUNT_FLAG_KEYS, set, true);
    }
    if let Some(clear) = op.clear_flags {
        insert_flags(&mut flags, &ACCOUNT_FLAG_KEYS, clear, false);
    }
    if !flags.is_empty() {
        acc.add_muxed(&source, EffectType::AccountFlagsUpdated, flags);
    }

    if let Some(dest) = &op.inflation_dest {
        acc.add_muxed(
            &source,
            EffectType::AccountInflationDestinationUpdated,
            Details::new().with("inflation_destination", dest.address()),
        );
    }

    for change in ctx.changes()? {
        if change.entry_type != LedgerEntryType::Account {
            continue;
        }
        let (Some(before), Some(after)) = (
            change.pre.as_ref().and_then(|e| e.data.as_account()),
            change.post.as_ref().and_then(|e| e.data.as_account()),
        ) else {
            return Err(EffectError::invalid_state(
                "set options account change without pre and post state",
            ));
        };
        let before = before.signer_summary();
        let after = after.signer_summary();
        if before == after {
            continue;
        }

        for (key, weight) in &before {
            match after.get(key) {
                None => acc.add_muxed(
                    &source,
                    EffectType::SignerRemoved,
                    Details::new().with("public_key", key.as_str()),
                ),
                Some(new_weight) if new_weight != weight => acc.add_muxed(
                    &source,
                    EffectType::SignerUpdated,
                    Details::new()
                        .with("public_key", key.as_str())
                        .with("weight", *new_weight),
                ),
                Some(_) => {}
            }
        }
        for (key, weight) in after.iter().filter(|(key, _)| !before.contains_key(*key)) {
            acc.add_muxed(
                &source,
                EffectType::SignerCreated,
                Details::new()
                    .with("public_key", key.as_str())
                    .with("weight", *weight),
            );
        }
    }
    Ok(())
}

pub fn account_merge(ctx: &OperationContext<'_>, acc: &mut EffectAccumulator) -> EffectResult<()> {
    let OperationBody::AccountMerge { destination } = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    let balance = match applied_result(ctx, OperationType::AccountMerge)? {
        OperationResultTr::AccountMerge(AccountMergeResult::Success {
            source_account_balance,
        }) => *source_account_balance,
        _ => return Err(EffectError::MissingResultArm(OperationType::AccountMerge, ctx.index())),
    };
    let details = Details::new()
        .with("amount", amount::format(balance))
        .with("asset_type", "native");
    let source = ctx.source_account();
    acc.add_muxed(&source, EffectType::AccountDebited, details.clone());
    acc.add_muxed(destination, EffectType::AccountCredited, details);
    acc.add_muxed(&source, EffectType::AccountRemoved, Details::new());
    Ok(())
}

pub fn inflation(ctx: &OperationContext<'_>, acc: &mut EffectAccumulator) -> EffectResult<()> {
    let payouts = match applied_result(ctx, OperationType::Inflation)? {
        OperationResultTr::Inflation(InflationResult::Success { payouts }) => payouts,
        _ => return Err(EffectError::MissingResultArm(OperationType::Inflation, ctx.index())),
    };
    for payout in payouts {
        acc.add(
            &payout.destination,
            EffectType::AccountCredited,
            Details::new()
                .with("amount", amount::format(payout.amount))
                .with("asset_type", "native"),
        );
    }
    Ok(())
}

pub fn manage_data(ctx: &OperationContext<'_>, acc: &mut EffectAccumulator) -> EffectResult<()> {
    let OperationBody::ManageData(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    let Some(change) = ctx
        .changes()?
        .iter()
        .find(|c| c.entry_type == LedgerEntryType::Data)
    else {
        return Ok(());
    };

    let mut details = Details::new().with("name", op.data_name.as_str());
    if let Some(after) = &change.post {
        let data = after
            .data
            .as_data()
            .ok_or_else(|| EffectError::invalid_state("data change without data entry"))?;
        details.insert("value", STANDARD.encode(&data.data_value));
    }
    let effect_type = match (&change.pre, &change.post) {
        (None, Some(_)) => EffectType::DataCreated,
        (Some(_), None) => EffectType::DataRemoved,
        (Some(_), Some(_)) => EffectType::DataUpdated,
        (None, None) => {
            return Err(EffectError::invalid_state(
                "data change has neither pre nor post state",
            ))
        }
    };
    acc.add_muxed(&ctx.source_account(), effect_type, details);
    Ok(())
}

pub fn bump_sequence(ctx: &OperationContext<'_>, acc: &mut EffectAccumulator) -> EffectResult<()> {
    let Some(change) = ctx
        .changes()?
        .iter()
        .find(|c| c.entry_type == LedgerEntryType::Account)
    else {
        return Ok(());
    };
    let (Some(before), Some(after)) = (
        change.pre.as_ref().and_then(|e| e.data.as_account()),
        change.post.as_ref().and_then(|e| e.data.as_account()),
    ) else {
        return Err(EffectError::invalid_state(
            "bump sequence account change without pre and post state",
        ));
    };
    if before.seq_num != after.seq_num {
        acc.add_muxed(
            &ctx.source_account(),
            EffectType::SequenceBumped,
            Details::new().with("new_seq", after.seq_num),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures::*;
    use crate::effect::Effect;
    use crate::generators::Generator;
    use efx_types::operation::{BumpSequenceOp, CreateAccountOp, ManageDataOp, SetOptionsOp};
    use efx_types::result::InflationPayout;
    use efx_types::{
        LedgerEntry, LedgerEntryChange, LedgerEntryData, MuxedAccount, OperationResult, Signer,
        SignerKey,
    };

    fn run(tx: &efx_types::LedgerTransaction, generator: Generator) -> EffectResult<Vec<Effect>> {
        let ctx = OperationContext::new(tx, 0, 7, ledger(), TESTNET)?;
        let mut acc = EffectAccumulator::new(7);
        generator(&ctx, &mut acc)?;
        Ok(acc.finalize(&ledger()))
    }

    #[test]
    fn create_account_effects() {
        let tx = transaction(
            OperationBody::CreateAccount(CreateAccountOp {
                destination: account(2),
                starting_balance: 1_000_000_000,
            }),
            None,
            vec![],
        );
        let effects = run(&tx, create_account).unwrap();
        let types: Vec<_> = effects.iter().map(|e| e.effect_type).collect();
        assert_eq!(
            types,
            vec![EffectType::AccountCreated, EffectType::AccountDebited, EffectType::SignerCreated]
        );
        assert_eq!(effects[0].details.get_str("starting_balance"), Some("100.0000000"));
        assert_eq!(effects[1].details.get_str("amount"), Some("100.0000000"));
        assert_eq!(effects[1].address, account(1).address());
        assert_eq!(effects[2].details.get("weight").and_then(|v| v.as_i64()), Some(1));
    }

    #[test]
    fn set_options_emits_settings_then_signers() {
        let op = SetOptionsOp {
            home_domain: Some("example.com".into()),
            med_threshold: Some(2),
            set_flags: Some(account_flags::AUTH_REQUIRED | account_flags::AUTH_REVOCABLE),
            clear_flags: Some(account_flags::AUTH_IMMUTABLE),
            ..SetOptionsOp::default()
        };
        let before = account_entry(account(1), 10);
        let mut after = before.clone();
        after.thresholds[0] = 3;
        after.signers = vec![Signer { key: SignerKey::Ed25519([4; 32]), weight: 2 }];
        after.signer_sponsoring_ids = vec![None];
        let change = LedgerEntryChange::updated(
            LedgerEntry::new(LedgerEntryData::Account(before)),
            LedgerEntry::new(LedgerEntryData::Account(after)),
        );
        let tx = transaction(OperationBody::SetOptions(op), None, vec![change]);
        let effects = run(&tx, set_options).unwrap();
        let types: Vec<_> = effects.iter().map(|e| e.effect_type).collect();
        assert_eq!(
            types,
            vec![
                EffectType::AccountHomeDomainUpdated,
                EffectType::AccountThresholdsUpdated,
                EffectType::AccountFlagsUpdated,
                EffectType::SignerUpdated,
                EffectType::SignerCreated,
            ]
        );
        assert_eq!(effects[1].details.len(), 1);
        let flags = &effects[2].details;
        assert_eq!(flags.get("auth_required_flag").and_then(|v| v.as_bool()), Some(true));
        assert_eq!(flags.get("auth_immutable_flag").and_then(|v| v.as_bool()), Some(false));
        assert_eq!(effects[3].details.get("weight").and_then(|v| v.as_i64()), Some(3));
    }

    #[test]
    fn set_options_needs_both_sides_of_account_change() {
        let tx = transaction(
            OperationBody::SetOptions(SetOptionsOp::default()),
            None,
            vec![LedgerEntryChange::created(account_ledger_entry(account(1), 1))],
        );
        assert!(matches!(
            run(&tx, set_options).unwrap_err(),
            EffectError::InvalidEntryState(_)
        ));
    }

    #[test]
    fn merge_moves_balance_then_removes() {
        let dest = MuxedAccount::MuxedEd25519 { id: 5, ed25519: account(3) };
        let tx = transaction(
            OperationBody::AccountMerge { destination: dest },
            Some(OperationResult::Tr(OperationResultTr::AccountMerge(
                AccountMergeResult::Success { source_account_balance: 25_000_000 },
            ))),
            vec![],
        );
        let effects = run(&tx, account_merge).unwrap();
        assert_eq!(effects.len(), 3);
        assert_eq!(effects[1].address, account(3).address());
        assert!(effects[1].address_muxed.is_some());
        assert_eq!(effects[1].details.get_str("amount"), Some("2.5000000"));
        assert_eq!(effects[2].effect_type, EffectType::AccountRemoved);
        assert!(effects[2].details.is_empty());
    }

    #[test]
    fn merge_without_result_fails() {
        let tx = transaction(
            OperationBody::AccountMerge { destination: MuxedAccount::from(account(3)) },
            None,
            vec![],
        );
        assert_eq!(
            run(&tx, account_merge).unwrap_err(),
            EffectError::MissingResultArm(OperationType::AccountMerge, 0)
        );
    }

    #[test]
    fn inflation_credits_each_payout() {
        let payouts = vec![
            InflationPayout { destination: account(2), amount: 10 },
            InflationPayout { destination: account(3), amount: 20 },
        ];
        let tx = transaction(
            OperationBody::Inflation,
            Some(OperationResult::Tr(OperationResultTr::Inflation(
                InflationResult::Success { payouts },
            ))),
            vec![],
        );
        let effects = run(&tx, inflation).unwrap();
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[1].address, account(3).address());
        assert_eq!(effects[1].details.get_str("amount"), Some("0.0000020"));
    }

    fn data(value: &[u8]) -> LedgerEntry {
        LedgerEntry::new(LedgerEntryData::Data(efx_types::entry::DataEntry {
            account_id: account(1),
            data_name: "k".into(),
            data_value: value.to_vec(),
        }))
    }

    #[test]
    fn manage_data_kinds() {
        let op = OperationBody::ManageData(ManageDataOp {
            data_name: "k".into(),
            data_value: Some(b"hi".to_vec()),
        });
        let tx = transaction(op.clone(), None, vec![LedgerEntryChange::created(data(b"hi"))]);
        let effects = run(&tx, manage_data).unwrap();
        assert_eq!(effects[0].effect_type, EffectType::DataCreated);
        assert_eq!(effects[0].details.get_str("value"), Some("aGk="));

        let tx = transaction(op.clone(), None, vec![LedgerEntryChange::removed(data(b"hi"))]);
        let effects = run(&tx, manage_data).unwrap();
        assert_eq!(effects[0].effect_type, EffectType::DataRemoved);
        assert!(!effects[0].details.contains_key("value"));

        let tx = transaction(op, None, vec![]);
        assert!(run(&tx, manage_data).unwrap().is_empty());
    }

    #[test]
    fn bump_sequence_only_when_changed() {
        let before = account_ledger_entry(account(1), 10);
        let mut bumped = account_entry(account(1), 10);
        bumped.seq_num = 99;
        let op = OperationBody::BumpSequence(BumpSequenceOp { bump_to: 99 });

        let tx = transaction(
            op.clone(),
            None,
            vec![LedgerEntryChange::updated(
                before.clone(),
                LedgerEntry::new(LedgerEntryData::Account(bumped)),
            )],
        );
        let effects = run(&tx, bump_sequence).unwrap();
        assert_eq!(effects[0].details.get("new_seq").and_then(|v| v.as_i64()), Some(99));

        let tx = transaction(op, None, vec![LedgerEntryChange::updated(before.clone(), before)]);
        assert!(run(&tx, bump_sequence).unwrap().is_empty());
    }
}
