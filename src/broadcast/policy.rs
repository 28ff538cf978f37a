//! Error-code policy table for failed broadcasts.
//!
//! Codes come from the node's `error.data.code`. Anything not listed here is
//! treated as unrecoverable: no retry, no reprepare, not expired.

/// Generic `FC_ASSERT` failure. Mostly fatal, see [`PHRASE_OVERRIDES`].
pub const ASSERT_EXCEPTION: i64 = 10;
pub const STD_EXCEPTION: i64 = 13;
pub const TRANSACTION_VALIDATION_EXCEPTION: i64 = 3_030_000;
/// The transaction's expiration time already elapsed on the node.
pub const TRANSACTION_EXPIRATION_EXCEPTION: i64 = 4_030_100;
/// The reference block (tapos) is unknown to or stale on the node.
pub const TRANSACTION_TAPOS_EXCEPTION: i64 = 4_030_200;

pub const NETWORK_BROADCAST_API: &str = "network_broadcast_api";

pub const DUPE_CHECK_PHRASE: &str = "(skip & skip_transaction_dupe_check) || trx_idx.indices().get<by_trx_id>().find(trx_id) == trx_idx.indices().get<by_trx_id>().end(): Duplicate transaction check failed";

/// Bumped whenever a phrase is added, removed or reworded.
pub const PHRASE_TABLE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseVerdict {
    Reprepare,
    NeverReprepare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseOverride {
    pub code: i64,
    pub phrase: &'static str,
    pub verdict: PhraseVerdict,
}

/// Stack `format` strings (matched exactly) that change the reprepare decision
/// for a code. `NeverReprepare` entries win over `Reprepare` entries.
pub const PHRASE_OVERRIDES: &[PhraseOverride] = &[
    PhraseOverride {
        code: ASSERT_EXCEPTION,
        phrase: "is_canonical( c ): signature is not canonical",
        verdict: PhraseVerdict::Reprepare,
    },
    PhraseOverride {
        code: ASSERT_EXCEPTION,
        phrase: "now < trx.expiration: ",
        verdict: PhraseVerdict::Reprepare,
    },
    PhraseOverride {
        code: ASSERT_EXCEPTION,
        phrase: DUPE_CHECK_PHRASE,
        verdict: PhraseVerdict::NeverReprepare,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct RetryPolicy {
    pub expired: bool,
    pub retryable: bool,
    pub reprepareable: bool,
}

impl RetryPolicy {
    pub const ABANDON: Self = Self {
        expired: false,
        retryable: false,
        reprepareable: false,
    };
}

/// Where the classification's message comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    /// Non-empty stack formats joined with `"; "`.
    StackFormats,
    /// `error.data.message`.
    DataMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyDecision {
    pub policy: RetryPolicy,
    pub message: MessageSource,
}

/// Applies the code table. `api_name` is the raw `call.params` value recovered
/// from the stack; only a bare `"network_broadcast_api"` string qualifies for
/// phrase-based reprepare.
pub fn decide(
    code: Option<i64>,
    api_name: Option<&serde_json::Value>,
    formats: &[&str],
) -> PolicyDecision {
    let stack_message = |policy: RetryPolicy| PolicyDecision {
        policy,
        message: MessageSource::StackFormats,
    };

    match code {
        Some(ASSERT_EXCEPTION) => {
            let on_broadcast_api =
                api_name.and_then(serde_json::Value::as_str) == Some(NETWORK_BROADCAST_API);
            stack_message(RetryPolicy {
                reprepareable: on_broadcast_api && phrases_allow_reprepare(ASSERT_EXCEPTION, formats),
                ..RetryPolicy::ABANDON
            })
        }
        Some(STD_EXCEPTION | TRANSACTION_VALIDATION_EXCEPTION) => PolicyDecision {
            policy: RetryPolicy::ABANDON,
            message: MessageSource::DataMessage,
        },
        Some(TRANSACTION_EXPIRATION_EXCEPTION) => stack_message(RetryPolicy {
            expired: true,
            retryable: true,
            reprepareable: false,
        }),
        Some(TRANSACTION_TAPOS_EXCEPTION) => stack_message(RetryPolicy {
            expired: false,
            retryable: true,
            reprepareable: true,
        }),
        _ => stack_message(RetryPolicy::ABANDON),
    }
}

fn verdict_for(code: i64, format: &str) -> Option<PhraseVerdict> {
    PHRASE_OVERRIDES
        .iter()
        .find(|o| o.code == code && o.phrase == format)
        .map(|o| o.verdict)
}

fn phrases_allow_reprepare(code: i64, formats: &[&str]) -> bool {
    let verdicts: Vec<PhraseVerdict> = formats
        .iter()
        .filter_map(|format| verdict_for(code, format))
        .collect();

    if verdicts.contains(&PhraseVerdict::NeverReprepare) {
        tracing::debug!(code, "stack carries a never-reprepare phrase");
        return false;
    }
    if verdicts.contains(&PhraseVerdict::Reprepare) {
        return true;
    }

    tracing::warn!(
        target: "broadcast_guard::policy",
        code,
        ?formats,
        table_version = PHRASE_TABLE_VERSION,
        "broadcast assert matched no known phrase; node wording may have drifted"
    );
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CapturedEvent, capture_events};
    use tracing::Level;

    const CANONICAL: &str = "is_canonical( c ): signature is not canonical";
    const EXPIRATION: &str = "now < trx.expiration: ";

    fn broadcast_api() -> serde_json::Value {
        serde_json::json!(NETWORK_BROADCAST_API)
    }

    #[test]
    fn table_rows_match_expected_policies() {
        let rows: &[(i64, RetryPolicy)] = &[
            (STD_EXCEPTION, RetryPolicy::ABANDON),
            (TRANSACTION_VALIDATION_EXCEPTION, RetryPolicy::ABANDON),
            (
                TRANSACTION_EXPIRATION_EXCEPTION,
                RetryPolicy {
                    expired: true,
                    retryable: true,
                    reprepareable: false,
                },
            ),
            (
                TRANSACTION_TAPOS_EXCEPTION,
                RetryPolicy {
                    expired: false,
                    retryable: true,
                    reprepareable: true,
                },
            ),
        ];
        for (code, expected) in rows {
            assert_eq!(decide(Some(*code), None, &[]).policy, *expected, "code {code}");
        }
    }

    #[test]
    fn data_message_codes_override_message() {
        assert_eq!(
            decide(Some(STD_EXCEPTION), None, &[]).message,
            MessageSource::DataMessage
        );
        assert_eq!(
            decide(Some(TRANSACTION_VALIDATION_EXCEPTION), None, &[]).message,
            MessageSource::DataMessage
        );
        assert_eq!(
            decide(Some(TRANSACTION_TAPOS_EXCEPTION), None, &[]).message,
            MessageSource::StackFormats
        );
    }

    #[test]
    fn unknown_and_missing_codes_abandon() {
        for code in [None, Some(0), Some(-1), Some(11), Some(4_030_300), Some(i64::MAX)] {
            assert_eq!(decide(code, None, &[]).policy, RetryPolicy::ABANDON);
        }
    }

    #[test]
    fn assert_reprepares_only_for_whitelisted_broadcast_phrases() {
        let api = broadcast_api();
        for phrase in [CANONICAL, EXPIRATION] {
            let decision = decide(Some(ASSERT_EXCEPTION), Some(&api), &["other", phrase]);
            assert!(decision.policy.reprepareable, "{phrase}");
            assert!(!decision.policy.retryable);
            assert!(!decision.policy.expired);
        }

        let near_miss = decide(Some(ASSERT_EXCEPTION), Some(&api), &["now < trx.expiration:"]);
        assert!(!near_miss.policy.reprepareable);
    }

    #[test]
    fn dupe_check_phrase_never_reprepares() {
        let api = broadcast_api();
        let decision = decide(Some(ASSERT_EXCEPTION), Some(&api), &[DUPE_CHECK_PHRASE]);
        assert!(!decision.policy.reprepareable);

        let mixed = decide(
            Some(ASSERT_EXCEPTION),
            Some(&api),
            &[EXPIRATION, DUPE_CHECK_PHRASE],
        );
        assert!(!mixed.policy.reprepareable);
    }

    #[test]
    fn assert_outside_broadcast_api_never_reprepares() {
        let others = [
            serde_json::json!("database_api"),
            serde_json::json!(["network_broadcast_api", "broadcast_transaction", []]),
            serde_json::json!(null),
        ];
        for api in &others {
            let decision = decide(Some(ASSERT_EXCEPTION), Some(api), &[CANONICAL, EXPIRATION]);
            assert!(!decision.policy.reprepareable, "{api}");
        }
        assert!(
            !decide(Some(ASSERT_EXCEPTION), None, &[CANONICAL])
                .policy
                .reprepareable
        );
    }

    #[test]
    fn phrase_table_is_scoped_by_code() {
        assert_eq!(verdict_for(ASSERT_EXCEPTION, CANONICAL), Some(PhraseVerdict::Reprepare));
        assert_eq!(verdict_for(STD_EXCEPTION, CANONICAL), None);
        assert_eq!(
            verdict_for(ASSERT_EXCEPTION, DUPE_CHECK_PHRASE),
            Some(PhraseVerdict::NeverReprepare)
        );
    }

    fn drift_warnings(events: &[CapturedEvent]) -> Vec<&CapturedEvent> {
        events
            .iter()
            .filter(|e| e.level == Level::WARN && e.target == "broadcast_guard::policy")
            .collect()
    }

    #[test]
    fn unmatched_broadcast_assert_warns_about_drift() {
        let api = broadcast_api();
        let (decision, events) = capture_events(|| {
            decide(Some(ASSERT_EXCEPTION), Some(&api), &["now < trx.expiration:"])
        });
        assert!(!decision.policy.reprepareable);

        let drift = drift_warnings(&events);
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].field("code"), Some("10"));
        assert_eq!(drift[0].field("table_version"), Some("1"));
        assert!(
            drift[0]
                .field("formats")
                .is_some_and(|f| f.contains("now < trx.expiration:"))
        );
        assert!(drift[0].message().is_some_and(|m| m.contains("drifted")));
    }

    #[test]
    fn known_phrases_do_not_warn() {
        let api = broadcast_api();
        let stacks: [&[&str]; 4] = [
            &[CANONICAL],
            &[EXPIRATION],
            &[DUPE_CHECK_PHRASE],
            &["other", EXPIRATION, DUPE_CHECK_PHRASE],
        ];
        for formats in stacks {
            let (_, events) =
                capture_events(|| decide(Some(ASSERT_EXCEPTION), Some(&api), formats));
            assert!(drift_warnings(&events).is_empty(), "{formats:?}");
        }
    }

    #[test]
    fn drift_warning_is_limited_to_broadcast_asserts() {
        let database_api = serde_json::json!("database_api");
        let (_, events) = capture_events(|| {
            decide(Some(ASSERT_EXCEPTION), Some(&database_api), &["unknown"]);
            decide(Some(STD_EXCEPTION), Some(&broadcast_api()), &["unknown"]);
            decide(Some(TRANSACTION_TAPOS_EXCEPTION), None, &["unknown"]);
        });
        assert!(events.is_empty(), "{events:?}");
    }

    #[test]
    fn never_reprepare_hit_is_logged_at_debug() {
        let api = broadcast_api();
        let (_, events) =
            capture_events(|| decide(Some(ASSERT_EXCEPTION), Some(&api), &[DUPE_CHECK_PHRASE]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, Level::DEBUG);
        assert_eq!(
            events[0].message(),
            Some("stack carries a never-reprepare phrase")
        );
        assert_eq!(events[0].field("code"), Some("10"));
    }
}
