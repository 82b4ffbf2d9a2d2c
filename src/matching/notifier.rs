//! Mutual-match notifications.

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::html;
use tracing::{info, warn};

use crate::localization::t_args_lang;
use crate::profile::UserProfile;

/// Outbound channel for match notifications
#[async_trait]
pub trait MatchSender: Send + Sync {
    async fn send_html(&self, chat_id: i64, text: String) -> Result<()>;
}

#[async_trait]
impl MatchSender for Bot {
    async fn send_html(&self, chat_id: i64, text: String) -> Result<()> {
        self.send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }
}

/// Which of the two notifications reached their recipient
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchDelivery {
    pub first_delivered: bool,
    pub second_delivered: bool,
}

impl MatchDelivery {
    pub fn all_delivered(&self) -> bool {
        self.first_delivered && self.second_delivered
    }
}

/// How `profile` is addressed in messages: nickname, then real name, then a
/// localized fallback.
pub fn display_identity(profile: &UserProfile, language_code: Option<&str>) -> String {
    [&profile.nickname, &profile.name]
        .into_iter()
        .filter_map(|value| value.as_deref().map(str::trim))
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| crate::localization::t_lang("unknown-user", language_code))
}

/// HTML contact affordance: the public handle, or a deep link by id
pub fn contact_link(profile: &UserProfile, label: &str) -> String {
    match profile.username.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(username) => format!("@{}", html::escape(username.trim_start_matches('@'))),
        None => format!(
            "<a href=\"tg://user?id={}\">{}</a>",
            profile.telegram_id,
            html::escape(label)
        ),
    }
}

/// Notification for `recipient` about `partner`, in the recipient's language
pub fn match_message(recipient: &UserProfile, partner: &UserProfile) -> String {
    let lang = Some(recipient.language_code.as_str());
    let partner_name = display_identity(partner, lang);
    let contact = contact_link(partner, &partner_name);

    t_args_lang(
        "match-notification",
        &[("name", &html::escape(&partner_name)), ("contact", &contact)],
        lang,
    )
}

/// Tell each side of a mutual like about the other.
///
/// Both sends are attempted; a failure is logged and only reflected in the
/// returned [`MatchDelivery`].
pub async fn notify_mutual_match<S>(sender: &S, first: &UserProfile, second: &UserProfile) -> MatchDelivery
where
    S: MatchSender + ?Sized,
{
    let first_delivered = deliver(sender, first, second).await;
    let second_delivered = deliver(sender, second, first).await;

    info!(
        first_id = first.telegram_id,
        second_id = second.telegram_id,
        first_delivered,
        second_delivered,
        "Match notifications sent"
    );

    MatchDelivery {
        first_delivered,
        second_delivered,
    }
}

async fn deliver<S>(sender: &S, recipient: &UserProfile, partner: &UserProfile) -> bool
where
    S: MatchSender + ?Sized,
{
    match sender
        .send_html(recipient.telegram_id, match_message(recipient, partner))
        .await
    {
        Ok(()) => true,
        Err(e) => {
            warn!(
                user_id = recipient.telegram_id,
                partner_id = partner.telegram_id,
                error = %e,
                "Failed to deliver match notification"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(i64, String)>>,
        unreachable: HashSet<i64>,
    }

    #[async_trait]
    impl MatchSender for RecordingSender {
        async fn send_html(&self, chat_id: i64, text: String) -> Result<()> {
            if self.unreachable.contains(&chat_id) {
                anyhow::bail!("Forbidden: bot was blocked by the user");
            }
            self.sent.lock().unwrap().push((chat_id, text));
            Ok(())
        }
    }

    fn user(id: i64, name: Option<&str>, nickname: Option<&str>, username: Option<&str>) -> UserProfile {
        let mut profile = UserProfile::new(id);
        profile.name = name.map(str::to_string);
        profile.nickname = nickname.map(str::to_string);
        profile.username = username.map(str::to_string);
        profile
    }

    #[test]
    fn test_display_identity_precedence() {
        assert_eq!(display_identity(&user(1, Some("Olena"), Some("lena"), None), None), "lena");
        assert_eq!(display_identity(&user(1, Some("Olena"), Some("  "), None), None), "Olena");
        let anonymous = display_identity(&user(1, None, None, None), None);
        assert!(!anonymous.is_empty());
    }

    #[test]
    fn test_contact_link() {
        assert_eq!(contact_link(&user(5, None, None, Some("olena_k")), "x"), "@olena_k");
        assert_eq!(
            contact_link(&user(5, None, None, None), "Ann & Co"),
            "<a href=\"tg://user?id=5\">Ann &amp; Co</a>"
        );
    }

    #[tokio::test]
    async fn test_both_sides_notified_about_each_other() {
        let sender = RecordingSender::default();
        let a = user(1, Some("Anna"), None, Some("anna"));
        let b = user(2, Some("Bohdana"), Some("bo"), None);

        let delivery = notify_mutual_match(&sender, &a, &b).await;
        assert!(delivery.all_delivered());

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        let to_a = sent.iter().find(|(id, _)| *id == 1).unwrap();
        let to_b = sent.iter().find(|(id, _)| *id == 2).unwrap();
        assert!(to_a.1.contains("tg://user?id=2"));
        assert!(to_b.1.contains("@anna"));
        // Third parties get nothing
        assert!(sent.iter().all(|(id, _)| *id != 3));
    }

    #[tokio::test]
    async fn test_failed_send_does_not_block_other_side() {
        let sender = RecordingSender {
            unreachable: HashSet::from([1]),
            ..Default::default()
        };
        let a = user(1, Some("Anna"), None, Some("anna"));
        let b = user(2, Some("Bohdana"), None, Some("bohdana"));

        let delivery = notify_mutual_match(&sender, &a, &b).await;
        assert_eq!(
            delivery,
            MatchDelivery {
                first_delivered: false,
                second_delivered: true,
            }
        );
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }
}
