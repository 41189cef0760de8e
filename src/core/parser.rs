//! Message parser - Turns raw card/bank notification text into structured data.
//!
//! Two strategies exist and a deployment picks exactly one through [`Parser`]:
//!
//! * **Issuer grammars** ([`Grammar`]): one variant per issuer header format. The first
//!   grammar whose header matches produces a [`ParsedCandidate`] carrying issuer, card
//!   suffix, approve/cancel status, amount and installments.
//! * **Generic keywords** ([`parse_generic`]): direction is inferred from keyword presence
//!   and the amount from the `<digits>원` pattern. No issuer is produced.
//!
//! A message no strategy recognizes is not an error; it simply ends up unmatched.

use crate::entities::Direction;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(-?[\d,]+)원"));
static INSTALLMENT_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(\d{1,2})개월|일시불"));
static PAREN_INSTALLMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\((\d{1,2})개월\)|\(일시불\)"));

static SAMSUNG_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?:\[삼성카드\]|삼성카드|삼성)\s*(\d{4})\s*(승인|취소)"));
static COSTCO_HYUNDAI_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"코스트코현대\s*(승인|취소)"));
static SHINHAN_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"신한카드\((\d{4})\)(승인|취소)"));

const LUMP_SUM: &str = "일시불";
const CANCEL_TOKEN: &str = "취소";

/// Keywords that mark money coming back in (cancellations, deposits, refunds)
const DEPOSIT_KEYWORDS: [&str; 3] = ["취소", "입금", "환불"];
/// Keywords that mark money going out
const WITHDRAW_KEYWORDS: [&str; 4] = ["승인", "출금", "결제", "지급"];

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    // Patterns are literals in this file; a failure is a programming error.
    Regex::new(pattern).expect("static regex must compile")
}

/// Approval or cancellation as stated by the issuer's status token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    /// `승인`: a purchase was approved
    Approve,
    /// `취소`: a purchase was cancelled
    Cancel,
}

impl CardStatus {
    /// Cancellation reverses the usual debit.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::Approve => Direction::Withdraw,
            Self::Cancel => Direction::Deposit,
        }
    }

    fn from_token(token: &str) -> Self {
        if token == CANCEL_TOKEN {
            Self::Cancel
        } else {
            Self::Approve
        }
    }
}

/// Structured result of an issuer grammar, before matching
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedCandidate {
    /// Issuer name as stored on assets (e.g., "삼성카드")
    pub issuer: &'static str,
    /// Last four digits of the card, when the header carries them
    pub card_suffix: Option<String>,
    pub status: CardStatus,
    /// Amount in minor units; `None` when the text has no readable amount
    pub amount_cents: Option<i64>,
    /// 1 for lump sum, N for N months, `None` when not stated
    pub installments: Option<i32>,
}

impl ParsedCandidate {
    /// The booking derived from this candidate, if an amount was found.
    #[must_use]
    pub fn posting(&self) -> Option<Posting> {
        self.amount_cents.map(|amount_cents| Posting {
            direction: self.status.direction(),
            amount_cents,
            installments: self.installments,
        })
    }
}

/// Everything needed to book a transaction from a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub direction: Direction,
    pub amount_cents: i64,
    pub installments: Option<i32>,
}

/// Issuer-specific header grammars, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// `삼성카드 1234 승인 …` / `[삼성카드]1234 취소 …`
    Samsung,
    /// `코스트코현대 승인 …` (no card suffix)
    CostcoHyundai,
    /// `신한카드(1234)승인 …`
    Shinhan,
}

impl Grammar {
    /// Fixed evaluation order.
    pub const ALL: [Self; 3] = [Self::Samsung, Self::CostcoHyundai, Self::Shinhan];

    /// Issuer name this grammar assigns to its candidates
    #[must_use]
    pub const fn issuer(self) -> &'static str {
        match self {
            Self::Samsung => "삼성카드",
            Self::CostcoHyundai => "현대카드",
            Self::Shinhan => "신한카드",
        }
    }

    /// Parses `text` if its header belongs to this grammar.
    #[must_use]
    pub fn parse(self, text: &str) -> Option<ParsedCandidate> {
        let (card_suffix, status_token, installment_re) = match self {
            Self::Samsung => {
                let caps = SAMSUNG_RE.captures(text)?;
                (Some(caps[1].to_string()), caps[2].to_string(), &*INSTALLMENT_RE)
            }
            Self::CostcoHyundai => {
                let caps = COSTCO_HYUNDAI_RE.captures(text)?;
                (None, caps[1].to_string(), &*INSTALLMENT_RE)
            }
            Self::Shinhan => {
                let caps = SHINHAN_RE.captures(text)?;
                (Some(caps[1].to_string()), caps[2].to_string(), &*PAREN_INSTALLMENT_RE)
            }
        };

        Some(ParsedCandidate {
            issuer: self.issuer(),
            card_suffix,
            status: CardStatus::from_token(&status_token),
            amount_cents: extract_amount(text),
            installments: extract_installments(text, installment_re),
        })
    }
}

/// Extracts the first `<digits/commas>원` amount as a non-negative integer.
///
/// A leading minus sign is dropped; the status token decides the direction.
#[must_use]
pub fn extract_amount(text: &str) -> Option<i64> {
    let caps = AMOUNT_RE.captures(text)?;
    let cleaned = caps[1].replace(',', "");
    cleaned.parse::<i64>().ok().and_then(i64::checked_abs)
}

fn extract_installments(text: &str, re: &Regex) -> Option<i32> {
    let caps = re.captures(text)?;
    match caps.get(1) {
        Some(months) => months.as_str().parse().ok(),
        None if caps[0].contains(LUMP_SUM) => Some(1),
        None => None,
    }
}

/// Applies the issuer grammars in order; `None` when no header matches.
#[must_use]
pub fn parse(raw_text: &str) -> Option<ParsedCandidate> {
    let text = raw_text.trim();
    if text.is_empty() {
        return None;
    }
    Grammar::ALL.iter().find_map(|grammar| grammar.parse(text))
}

/// Keyword-based parse: deposit keywords win over withdraw keywords.
#[must_use]
pub fn parse_generic(raw_text: &str) -> Option<Posting> {
    let text = raw_text.trim();
    if text.is_empty() {
        return None;
    }
    let direction = if DEPOSIT_KEYWORDS.iter().any(|k| text.contains(k)) {
        Direction::Deposit
    } else if WITHDRAW_KEYWORDS.iter().any(|k| text.contains(k)) {
        Direction::Withdraw
    } else {
        return None;
    };
    let amount_cents = extract_amount(text)?;
    Some(Posting {
        direction,
        amount_cents,
        installments: extract_installments(text, &INSTALLMENT_RE),
    })
}

/// Parsing strategy chosen once per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Parser {
    /// Keyword inference; pairs with filter-text matching
    #[default]
    Generic,
    /// Issuer header grammars; enables issuer/card-suffix matching
    Issuer,
}

impl Parser {
    /// Issuer candidate for matching. Only the issuer strategy produces one.
    #[must_use]
    pub fn candidate(self, text: &str) -> Option<ParsedCandidate> {
        match self {
            Self::Generic => None,
            Self::Issuer => parse(text),
        }
    }

    /// Direction and amount used for booking, if derivable.
    #[must_use]
    pub fn posting(self, text: &str) -> Option<Posting> {
        match self {
            Self::Generic => parse_generic(text),
            Self::Issuer => parse(text).and_then(|candidate| candidate.posting()),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_samsung_lump_sum_approval() {
        let candidate = parse("삼성카드 1234 승인 15,000원 일시불").unwrap();
        assert_eq!(candidate.issuer, "삼성카드");
        assert_eq!(candidate.card_suffix.as_deref(), Some("1234"));
        assert_eq!(candidate.status, CardStatus::Approve);
        assert_eq!(candidate.amount_cents, Some(15_000));
        assert_eq!(candidate.installments, Some(1));
    }

    #[test]
    fn test_samsung_bracket_header_with_months() {
        let text = "[Web발신]\n[삼성카드]4321 취소\n홍*동\n-120,000원 3개월\n스타벅스";
        let candidate = parse(text).unwrap();
        assert_eq!(candidate.card_suffix.as_deref(), Some("4321"));
        assert_eq!(candidate.status, CardStatus::Cancel);
        // Sign marker does not invert the status token
        assert_eq!(candidate.amount_cents, Some(120_000));
        assert_eq!(candidate.installments, Some(3));
    }

    #[test]
    fn test_costco_hyundai_has_no_suffix() {
        let candidate = parse("코스트코현대 승인 김*수 52,300원 일시불 코스트코 양재").unwrap();
        assert_eq!(candidate.issuer, "현대카드");
        assert_eq!(candidate.card_suffix, None);
        assert_eq!(candidate.amount_cents, Some(52_300));
    }

    #[test]
    fn test_shinhan_cancel() {
        let candidate = parse("신한카드(9999)취소5,000원(일시불)").unwrap();
        assert_eq!(candidate.issuer, "신한카드");
        assert_eq!(candidate.card_suffix.as_deref(), Some("9999"));
        assert_eq!(candidate.status, CardStatus::Cancel);
        assert_eq!(candidate.amount_cents, Some(5_000));
        assert_eq!(candidate.installments, Some(1));

        let posting = candidate.posting().unwrap();
        assert_eq!(posting.direction, Direction::Deposit);
    }

    #[test]
    fn test_shinhan_installments_need_parentheses() {
        let candidate = parse("신한카드(1111)승인 30,000원 2개월").unwrap();
        assert_eq!(candidate.installments, None);

        let candidate = parse("신한카드(1111)승인 30,000원(2개월)").unwrap();
        assert_eq!(candidate.installments, Some(2));
    }

    #[test]
    fn test_unrecognized_text_yields_none() {
        assert!(parse("").is_none());
        assert!(parse("   ").is_none());
        assert!(parse("국민카드 승인 10,000원").is_none());
        assert!(parse("안녕하세요").is_none());
    }

    #[test]
    fn test_missing_amount_keeps_candidate() {
        let candidate = parse("삼성카드 1234 승인 금액미상").unwrap();
        assert_eq!(candidate.amount_cents, None);
        assert!(candidate.posting().is_none());
    }

    #[test]
    fn test_generic_keywords() {
        let posting = parse_generic("[Web발신] 국민카드 승인 스타벅스 4,500원").unwrap();
        assert_eq!(posting.direction, Direction::Withdraw);
        assert_eq!(posting.amount_cents, 4_500);

        let posting = parse_generic("우리은행 입금 1,000,000원 급여").unwrap();
        assert_eq!(posting.direction, Direction::Deposit);
        assert_eq!(posting.amount_cents, 1_000_000);

        // Cancel keyword outranks approval keyword
        let posting = parse_generic("국민카드 승인취소 4,500원").unwrap();
        assert_eq!(posting.direction, Direction::Deposit);
    }

    #[test]
    fn test_generic_requires_keyword_and_amount() {
        assert!(parse_generic("스타벅스 4,500원").is_none());
        assert!(parse_generic("국민카드 승인").is_none());
        assert!(parse_generic("").is_none());
    }

    #[test]
    fn test_parser_strategies_do_not_mix() {
        let text = "국민카드 승인 스타벅스 4,500원";
        assert!(Parser::Generic.candidate(text).is_none());
        assert!(Parser::Generic.posting(text).is_some());
        assert!(Parser::Issuer.candidate(text).is_none());
        assert!(Parser::Issuer.posting(text).is_none());

        let posting = Parser::Issuer.posting("삼성카드 1234 승인 15,000원 일시불").unwrap();
        assert_eq!(posting.direction, Direction::Withdraw);
        assert_eq!(posting.amount_cents, 15_000);
        assert_eq!(posting.installments, Some(1));
    }

    #[test]
    fn test_extract_amount_edge_cases() {
        assert_eq!(extract_amount("1,234,567원"), Some(1_234_567));
        assert_eq!(extract_amount("-3,000원"), Some(3_000));
        assert_eq!(extract_amount(",원"), None);
        assert_eq!(extract_amount("3000"), None);
    }

    #[test]
    fn test_extract_amount_out_of_range() {
        let text = "국민카드 승인 -9223372036854775808원";
        assert_eq!(extract_amount(text), None);
        assert!(Parser::Generic.posting(text).is_none());
        assert_eq!(extract_amount("국민카드 승인 99999999999999999999원"), None);
        assert_eq!(extract_amount("9223372036854775807원"), Some(i64::MAX));
    }
}
