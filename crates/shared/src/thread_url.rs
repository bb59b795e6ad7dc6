//! Deep links from a synced thread back to the platform it came from.

use crate::protocol::{SerializedAccount, SerializedThread};

const SLACK_SHARED_INVITE: &str = "slack.com/join/shared_invite";
const SLACK_STAMP_SCALE: f64 = 1_000_000.0;
const SLACK_STAMP_FRACTION_DIGITS: usize = 6;

/// Resolves the external URL of `thread` on the platform `community` syncs from.
///
/// Discord communities always link into Discord. Slack communities with a
/// shared-invite URL link into the archive under that invite. Any other
/// invite URL is returned as-is. Without an invite URL the archive is
/// addressed under `community_url`. Threads that were never synced from an
/// external platform have no deep link.
///
/// Empty strings count as absent, and a thread without a channel yields an
/// empty channel segment.
pub fn resolve_thread_url(
    thread: &SerializedThread,
    community: &SerializedAccount,
) -> Option<String> {
    let external_thread_id = present(thread.external_thread_id.as_deref())?;
    let external_channel_id = thread
        .channel
        .as_ref()
        .and_then(|channel| channel.external_channel_id.as_deref())
        .unwrap_or_default();

    if let Some(server_id) = present(community.discord_server_id.as_deref()) {
        return Some(format!(
            "https://discord.com/channels/{server_id}/{external_channel_id}/{external_thread_id}"
        ));
    }

    let url = match present(community.community_invite_url.as_deref()) {
        Some(invite_url) if invite_url.contains(SLACK_SHARED_INVITE) => {
            slack_archive_url(invite_url, external_channel_id, external_thread_id)
        }
        Some(invite_url) => invite_url.to_string(),
        None => slack_archive_url(
            &community.community_url,
            external_channel_id,
            external_thread_id,
        ),
    };
    Some(url)
}

fn slack_archive_url(base: &str, external_channel_id: &str, external_thread_id: &str) -> String {
    format!(
        "{base}/archives/{external_channel_id}/p{}",
        slack_stamp(external_thread_id)
    )
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Renders a Slack timestamp such as `1680000000.123456` as the digit run
/// Slack uses in permalinks: `floor(ts * 1_000_000)` with no decimal point
/// and no exponent.
///
/// The timestamp is read like a lenient float parse, taking the longest
/// numeric prefix. Plain non-negative decimals are scaled on their digits so
/// that microsecond stamps survive exactly. Everything else goes through
/// `f64`.
pub fn slack_stamp(raw: &str) -> String {
    let Some(number) = NumericPrefix::parse(raw) else {
        return "NaN".to_string();
    };

    if !number.negative && number.plain {
        return scale_decimal_digits(number.int_digits, number.frac_digits);
    }

    let value = number.text.parse::<f64>().unwrap_or(f64::NAN);
    format_floored(value * SLACK_STAMP_SCALE)
}

fn scale_decimal_digits(int_digits: &str, frac_digits: &str) -> String {
    let mut digits = String::with_capacity(int_digits.len() + SLACK_STAMP_FRACTION_DIGITS);
    digits.push_str(int_digits);
    for i in 0..SLACK_STAMP_FRACTION_DIGITS {
        digits.push(frac_digits.as_bytes().get(i).map_or('0', |b| *b as char));
    }
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn format_floored(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let floored = value.floor();
    if floored == 0.0 {
        return "0".to_string();
    }
    format!("{floored:.0}")
}

/// Longest prefix of a string that reads as a decimal number.
#[derive(Debug, PartialEq, Eq)]
struct NumericPrefix<'a> {
    text: &'a str,
    negative: bool,
    int_digits: &'a str,
    frac_digits: &'a str,
    /// No exponent and not `Infinity`.
    plain: bool,
}

impl<'a> NumericPrefix<'a> {
    fn parse(raw: &'a str) -> Option<Self> {
        let s = raw.trim_start();
        let bytes = s.as_bytes();
        let mut pos = 0;

        let negative = match bytes.first() {
            Some(b'-') => {
                pos += 1;
                true
            }
            Some(b'+') => {
                pos += 1;
                false
            }
            _ => false,
        };

        if s[pos..].starts_with("Infinity") {
            return Some(Self {
                text: if negative { "-inf" } else { "inf" },
                negative,
                int_digits: "",
                frac_digits: "",
                plain: false,
            });
        }

        let int_start = pos;
        while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
        let int_digits = &s[int_start..pos];

        let mut frac_digits = "";
        if bytes.get(pos) == Some(&b'.') {
            let frac_start = pos + 1;
            let mut end = frac_start;
            while bytes.get(end).is_some_and(u8::is_ascii_digit) {
                end += 1;
            }
            if !int_digits.is_empty() || end > frac_start {
                frac_digits = &s[frac_start..end];
                pos = end;
            }
        }

        if int_digits.is_empty() && frac_digits.is_empty() {
            return None;
        }

        let mut plain = true;
        if matches!(bytes.get(pos), Some(b'e' | b'E')) {
            let mut end = pos + 1;
            if matches!(bytes.get(end), Some(b'+' | b'-')) {
                end += 1;
            }
            let digits_start = end;
            while bytes.get(end).is_some_and(u8::is_ascii_digit) {
                end += 1;
            }
            if end > digits_start {
                plain = false;
                pos = end;
            }
        }

        Some(Self {
            text: &s[..pos],
            negative,
            int_digits,
            frac_digits,
            plain,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        domain::{ChannelId, ChannelType, CommunityId, CommunityType, ThreadId},
        protocol::SerializedChannel,
    };

    fn community() -> SerializedAccount {
        SerializedAccount {
            id: CommunityId::new(),
            name: "rustaceans".into(),
            community_invite_url: None,
            community_url: "https://rustaceans.slack.com".into(),
            discord_server_id: None,
            kind: CommunityType::Public,
            brand_color: None,
            home_url: None,
            docs_url: None,
            logo_url: None,
        }
    }

    fn thread(external_thread_id: Option<&str>, external_channel_id: Option<&str>) -> SerializedThread {
        let community_id = CommunityId::new();
        let channel_id = ChannelId::new();
        SerializedThread {
            id: ThreadId::new(),
            increment_id: 1,
            external_thread_id: external_thread_id.map(str::to_string),
            channel_id,
            title: None,
            slug: None,
            sent_at: Utc::now(),
            last_reply_at: Utc::now(),
            messages: Vec::new(),
            channel: Some(SerializedChannel {
                id: channel_id,
                account_id: community_id,
                channel_name: "general".into(),
                external_channel_id: external_channel_id.map(str::to_string),
                hidden: false,
                kind: ChannelType::Public,
            }),
        }
    }

    #[test]
    fn unsynced_thread_has_no_link() {
        let mut discord = community();
        discord.discord_server_id = Some("42".into());
        discord.community_invite_url = Some("https://join.slack.com/t/x".into());

        assert_eq!(resolve_thread_url(&thread(None, Some("C1")), &community()), None);
        assert_eq!(resolve_thread_url(&thread(None, Some("C1")), &discord), None);
        assert_eq!(resolve_thread_url(&thread(Some(""), Some("C1")), &discord), None);
    }

    #[test]
    fn slack_shared_invite_links_into_archive() {
        let mut account = community();
        let invite = "https://rustaceans.slack.com/join/shared_invite/zt-abc";
        account.community_invite_url = Some(invite.into());

        let url = resolve_thread_url(&thread(Some("1.5"), Some("C024BE91L")), &account);
        assert_eq!(
            url.as_deref(),
            Some("https://rustaceans.slack.com/join/shared_invite/zt-abc/archives/C024BE91L/p1500000")
        );
    }

    #[test]
    fn generic_invite_url_is_returned_unchanged() {
        let mut account = community();
        account.community_invite_url = Some("https://example.com/join".into());

        let url = resolve_thread_url(&thread(Some("1.5"), Some("C1")), &account);
        assert_eq!(url.as_deref(), Some("https://example.com/join"));
    }

    #[test]
    fn falls_back_to_community_url_archive() {
        let url = resolve_thread_url(
            &thread(Some("1680000000.123456"), Some("C1")),
            &community(),
        );
        assert_eq!(
            url.as_deref(),
            Some("https://rustaceans.slack.com/archives/C1/p1680000000123456")
        );
    }

    #[test]
    fn discord_overrides_slack_forms() {
        let mut account = community();
        account.community_invite_url =
            Some("https://x.slack.com/join/shared_invite/zt-abc".into());
        account.discord_server_id = Some("99887766".into());

        let url = resolve_thread_url(&thread(Some("1122334455"), Some("5566")), &account);
        assert_eq!(
            url.as_deref(),
            Some("https://discord.com/channels/99887766/5566/1122334455")
        );
    }

    #[test]
    fn missing_channel_leaves_empty_segment() {
        let mut t = thread(Some("2"), None);
        t.channel = None;
        let url = resolve_thread_url(&t, &community());
        assert_eq!(
            url.as_deref(),
            Some("https://rustaceans.slack.com/archives//p2000000")
        );
    }

    #[test]
    fn stamp_reads_numeric_prefix() {
        assert_eq!(slack_stamp("1.5"), "1500000");
        assert_eq!(slack_stamp("0.000001"), "1");
        assert_eq!(slack_stamp("0.0000009"), "0");
        assert_eq!(slack_stamp("12"), "12000000");
        assert_eq!(slack_stamp("  3.25abc"), "3250000");
        assert_eq!(slack_stamp(".5"), "500000");
        assert_eq!(slack_stamp("1.2345678"), "1234567");
        assert_eq!(slack_stamp("1e2"), "100000000");
        assert_eq!(slack_stamp("-1.5"), "-1500000");
        assert_eq!(slack_stamp("abc"), "NaN");
        assert_eq!(slack_stamp(""), "NaN");
        assert_eq!(slack_stamp("Infinity"), "Infinity");
    }
}
