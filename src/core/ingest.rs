//! Ingestion - Parse, match and commit one inbound WebSMS message.
//!
//! Every accepted message produces exactly one log row (or nothing, for a replay of an
//! already-logged message). A message is `processed` only when the configured parser
//! yields an amount and direction and the matcher settles on a single asset; everything
//! else waits in the unmatched queue. The log row, the transaction and the balance
//! update are written in one database transaction.

use crate::{
    core::{
        asset::get_assets_for_groups,
        credentials::Submitter,
        matcher::match_asset,
        parser::Parser,
        transaction::{PostingRequest, post_transaction},
    },
    entities::{LogStatus, WebSmsLog, websms_log},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    Set, TransactionTrait, TryInsertResult, prelude::*, sea_query::OnConflict,
};
use tracing::{info, instrument};

/// Longest stored preview, in characters
pub const PREVIEW_CHARS: usize = 120;

/// Trimmed text cut to [`PREVIEW_CHARS`] characters.
#[must_use]
pub fn preview(text: &str) -> String {
    text.trim().chars().take(PREVIEW_CHARS).collect()
}

/// Character count of the raw text, saturating at `i32::MAX`.
#[must_use]
pub fn text_length(text: &str) -> i32 {
    i32::try_from(text.chars().count()).unwrap_or(i32::MAX)
}

/// What happened to an ingested message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Matched and posted
    Processed {
        log_id: i64,
        asset_id: i64,
        transaction_id: i64,
    },
    /// Logged for human review
    Unmatched { log_id: i64 },
    /// Same group, instant and text were already logged; nothing written
    Duplicate,
}

/// Ingests `text` submitted by `submitter` at `received_at`.
///
/// # Errors
/// `TextRequired` for blank text; database errors roll the whole unit back.
#[instrument(skip(db, submitter, text), fields(group_id = submitter.group_id))]
pub async fn ingest<C>(
    db: &C,
    parser: Parser,
    submitter: &Submitter,
    text: &str,
    received_at: DateTime<Utc>,
) -> Result<IngestOutcome>
where
    C: ConnectionTrait + TransactionTrait,
{
    if text.trim().is_empty() {
        return Err(Error::TextRequired);
    }
    let text_preview = preview(text);

    let posting = parser.posting(text);
    let candidate = parser.candidate(text);
    let assets = get_assets_for_groups(db, &submitter.accessible_group_ids).await?;
    let matched = posting
        .and_then(|posting| match_asset(text, candidate.as_ref(), &assets).map(|a| (a, posting)));

    let group_id = matched.map_or(submitter.group_id, |(asset, _)| asset.group_id);
    let status = if matched.is_some() {
        LogStatus::Processed
    } else {
        LogStatus::Unmatched
    };

    let txn = db.begin().await?;

    let log = websms_log::ActiveModel {
        group_id: Set(group_id),
        asset_id: Set(matched.map(|(asset, _)| asset.id)),
        received_at: Set(received_at),
        text: Set(text.to_string()),
        text_preview: Set(text_preview.clone()),
        text_length: Set(text_length(text)),
        status: Set(status),
        ..Default::default()
    };
    let inserted = WebSmsLog::insert(log)
        .on_conflict(
            OnConflict::columns([
                websms_log::Column::GroupId,
                websms_log::Column::ReceivedAt,
                websms_log::Column::Text,
            ])
            .do_nothing()
            .to_owned(),
        )
        .do_nothing()
        .exec(&txn)
        .await?;

    let log_id = match inserted {
        TryInsertResult::Inserted(result) => result.last_insert_id,
        TryInsertResult::Conflicted | TryInsertResult::Empty => {
            txn.rollback().await?;
            info!(group_id, %received_at, "Duplicate WebSMS ignored");
            return Ok(IngestOutcome::Duplicate);
        }
    };

    let Some((asset, posting)) = matched else {
        txn.commit().await?;
        info!(log_id, group_id, "WebSMS left unmatched");
        return Ok(IngestOutcome::Unmatched { log_id });
    };

    let created = post_transaction(
        &txn,
        PostingRequest {
            asset,
            user_id: submitter.user_id,
            posting,
            memo: Some(text_preview),
            occurred_at: received_at,
            websms_log_id: Some(log_id),
        },
    )
    .await?;
    txn.commit().await?;

    info!(
        log_id,
        asset_id = asset.id,
        transaction_id = created.id,
        "WebSMS processed"
    );
    Ok(IngestOutcome::Processed {
        log_id,
        asset_id: asset.id,
        transaction_id: created.id,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    #![allow(clippy::panic)]
    use super::*;
    use crate::core::asset::get_asset_in_group;
    use crate::core::transaction::get_transactions_for_log;
    use crate::entities::{Direction, Role, Transaction};
    use crate::test_utils::*;

    async fn only_log(db: &DatabaseConnection) -> Result<websms_log::Model> {
        let mut logs = WebSmsLog::find().all(db).await?;
        assert_eq!(logs.len(), 1);
        Ok(logs.remove(0))
    }

    #[test]
    fn test_preview_trims_and_truncates() {
        assert_eq!(preview("  hello  "), "hello");
        let long = "가".repeat(200);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS);
        assert_eq!(text_length(&long), 200);
        assert_eq!(text_length(" 가 "), 3);
    }

    #[tokio::test]
    async fn test_samsung_approval_is_processed() -> Result<()> {
        let (db, group) = setup_with_group().await?;
        let card = create_test_asset(&db, group.id, "삼성카드", Some("1234")).await?;
        let submitter = Submitter::for_group(group.id);
        let text = "삼성카드 1234 승인 15,000원 일시불";

        let outcome = ingest(&db, Parser::Issuer, &submitter, text, fixed_time()).await?;
        let IngestOutcome::Processed { log_id, asset_id, .. } = outcome else {
            panic!("expected processed, got {outcome:?}");
        };
        assert_eq!(asset_id, card.id);

        let log = only_log(&db).await?;
        assert_eq!(log.id, log_id);
        assert_eq!(log.status, LogStatus::Processed);
        assert_eq!(log.asset_id, Some(card.id));
        assert_eq!(log.text_preview, text);

        let transactions = get_transactions_for_log(&db, log_id).await?;
        assert_eq!(transactions.len(), 1);
        let transaction = &transactions[0];
        assert_eq!(transaction.direction, Direction::Withdraw);
        assert_eq!(transaction.amount_cents, 15_000);
        assert_eq!(transaction.principal_cents, Some(15_000));
        assert_eq!(transaction.installment_count, Some(1));
        assert_eq!(transaction.interest_rate, Some(0.0));
        assert_eq!(transaction.memo.as_deref(), Some(text));
        assert_eq!(transaction.occurred_at, fixed_time());

        let card = get_asset_in_group(&db, group.id, card.id).await?.unwrap();
        assert_eq!(card.current_balance_cents, -15_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_suffix_is_unmatched() -> Result<()> {
        let (db, group) = setup_with_group().await?;
        let card = create_test_asset(&db, group.id, "삼성카드", Some("5678")).await?;
        let submitter = Submitter::for_group(group.id);

        let outcome = ingest(
            &db,
            Parser::Issuer,
            &submitter,
            "삼성카드 1234 승인 15,000원 일시불",
            fixed_time(),
        )
        .await?;
        assert!(matches!(outcome, IngestOutcome::Unmatched { .. }));

        let log = only_log(&db).await?;
        assert_eq!(log.status, LogStatus::Unmatched);
        assert_eq!(log.group_id, group.id);
        assert_eq!(log.asset_id, None);
        assert!(Transaction::find().all(&db).await?.is_empty());

        let card = get_asset_in_group(&db, group.id, card.id).await?.unwrap();
        assert_eq!(card.current_balance_cents, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_shinhan_cancel_is_deposit() -> Result<()> {
        let (db, group) = setup_with_group().await?;
        let card = create_test_asset(&db, group.id, "신한카드", Some("9999")).await?;
        let submitter = Submitter::for_group(group.id);

        let outcome = ingest(
            &db,
            Parser::Issuer,
            &submitter,
            "신한카드(9999)취소5,000원(일시불)",
            fixed_time(),
        )
        .await?;
        assert!(matches!(outcome, IngestOutcome::Processed { .. }));

        let card = get_asset_in_group(&db, group.id, card.id).await?.unwrap();
        assert_eq!(card.current_balance_cents, 5_000);
        let transaction = Transaction::find().one(&db).await?.unwrap();
        assert_eq!(transaction.direction, Direction::Deposit);
        Ok(())
    }

    #[tokio::test]
    async fn test_replay_is_duplicate() -> Result<()> {
        let (db, group) = setup_with_group().await?;
        let card = create_test_asset(&db, group.id, "삼성카드", Some("1234")).await?;
        let submitter = Submitter::for_group(group.id);
        let text = "삼성카드 1234 승인 15,000원 일시불";

        ingest(&db, Parser::Issuer, &submitter, text, fixed_time()).await?;
        let outcome = ingest(&db, Parser::Issuer, &submitter, text, fixed_time()).await?;
        assert_eq!(outcome, IngestOutcome::Duplicate);

        only_log(&db).await?;
        assert_eq!(Transaction::find().all(&db).await?.len(), 1);
        let card = get_asset_in_group(&db, group.id, card.id).await?.unwrap();
        assert_eq!(card.current_balance_cents, -15_000);

        // A different instant is a new message
        let later = fixed_time() + chrono::Duration::seconds(1);
        let outcome = ingest(&db, Parser::Issuer, &submitter, text, later).await?;
        assert!(matches!(outcome, IngestOutcome::Processed { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_generic_parser_uses_filter_text() -> Result<()> {
        let (db, group) = setup_with_group().await?;
        let card = create_test_asset(&db, group.id, "국민카드", Some("1111")).await?;
        crate::core::asset::set_filter_text(&db, card.id, "국민카드,스타벅스").await?;
        let submitter = Submitter::for_group(group.id);

        let outcome = ingest(
            &db,
            Parser::Generic,
            &submitter,
            "[Web발신] 국민카드 승인 스타벅스 4,500원",
            fixed_time(),
        )
        .await?;
        assert!(matches!(
            outcome,
            IngestOutcome::Processed { asset_id, .. } if asset_id == card.id
        ));

        // Same issuer text without the second token does not match
        let outcome = ingest(
            &db,
            Parser::Generic,
            &submitter,
            "[Web발신] 국민카드 승인 이마트 9,000원",
            fixed_time(),
        )
        .await?;
        assert!(matches!(outcome, IngestOutcome::Unmatched { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_amount_is_unmatched() -> Result<()> {
        let (db, group) = setup_with_group().await?;
        create_test_asset(&db, group.id, "삼성카드", Some("1234")).await?;
        let submitter = Submitter::for_group(group.id);

        let outcome = ingest(
            &db,
            Parser::Issuer,
            &submitter,
            "삼성카드 1234 승인 금액확인불가",
            fixed_time(),
        )
        .await?;
        assert!(matches!(outcome, IngestOutcome::Unmatched { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_out_of_range_amount_is_unmatched() -> Result<()> {
        let (db, group) = setup_with_group().await?;
        let card = create_test_asset(&db, group.id, "국민카드", Some("1111")).await?;
        crate::core::asset::set_filter_text(&db, card.id, "국민카드").await?;
        let submitter = Submitter::for_group(group.id);

        let text = "국민카드 승인 -9223372036854775808원";
        let outcome = ingest(&db, Parser::Generic, &submitter, text, fixed_time()).await?;
        assert!(matches!(outcome, IngestOutcome::Unmatched { .. }));

        let card = get_asset_in_group(&db, group.id, card.id).await?.unwrap();
        assert_eq!(card.current_balance_cents, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_log_follows_matched_asset_group() -> Result<()> {
        let db = setup_test_db().await?;
        let home = create_test_group(&db, "home").await?;
        let shared = create_test_group(&db, "shared").await?;
        let user = create_test_user(&db, "park", Role::User).await?;
        grant_access(&db, user.id, home.id).await?;
        grant_access(&db, user.id, shared.id).await?;
        let card = create_test_asset(&db, shared.id, "삼성카드", Some("1234")).await?;

        let submitter = Submitter {
            group_id: home.id,
            user_id: Some(user.id),
            accessible_group_ids: vec![home.id, shared.id],
        };
        ingest(
            &db,
            Parser::Issuer,
            &submitter,
            "삼성카드 1234 승인 8,000원",
            fixed_time(),
        )
        .await?;

        let log = only_log(&db).await?;
        assert_eq!(log.group_id, shared.id);
        let transaction = Transaction::find().one(&db).await?.unwrap();
        assert_eq!(transaction.group_id, shared.id);
        assert_eq!(transaction.asset_id, card.id);
        assert_eq!(transaction.user_id, Some(user.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_text_writes_nothing() -> Result<()> {
        let (db, group) = setup_with_group().await?;
        let submitter = Submitter::for_group(group.id);

        let result = ingest(&db, Parser::Generic, &submitter, "   ", fixed_time()).await;
        assert!(matches!(result.unwrap_err(), Error::TextRequired));
        assert!(WebSmsLog::find().all(&db).await?.is_empty());
        Ok(())
    }
}
