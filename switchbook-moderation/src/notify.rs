//! Notification and email side effects of moderation transitions.
//!
//! A transition writes its notification rows inside the same transaction as
//! the state change, and hands back the emails to send. Sending happens after
//! the transaction commits, and a failed send never undoes the transition.

use rusqlite::Connection;
use serde::Serialize;
use switchbook_catalog::types::{NewNotification, NotificationKind};
use switchbook_db::operations;

use crate::error::ModerationError;

/// An outbound email, ready for the mailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// The result of a moderation transition plus the emails it wants sent.
#[derive(Debug)]
pub struct Transition<T> {
    pub record: T,
    pub emails: Vec<EmailMessage>,
}

impl<T> Transition<T> {
    pub fn new(record: T) -> Self {
        Self {
            record,
            emails: Vec::new(),
        }
    }
}

/// Store a notification for `user_id` and, if the user still exists, build
/// the matching email.
pub(crate) fn notify(
    conn: &Connection,
    user_id: i64,
    kind: NotificationKind,
    title: String,
    message: String,
    link: Option<String>,
) -> Result<Option<EmailMessage>, ModerationError> {
    let Some(user) = operations::get_user(conn, user_id)? else {
        log::debug!("Skipping {} notification for deleted user {}", kind.as_str(), user_id);
        return Ok(None);
    };

    let body = match &link {
        Some(link) => format!("Hi {},\n\n{}\n\n{}\n", user.username, message, link),
        None => format!("Hi {},\n\n{}\n", user.username, message),
    };
    operations::insert_notification(
        conn,
        &NewNotification {
            user_id,
            kind,
            title: title.clone(),
            message,
            link,
        },
    )?;

    Ok(Some(EmailMessage {
        to: user.email,
        subject: format!("[Switchbook] {title}"),
        body,
    }))
}

pub(crate) fn master_switch_link(id: &str) -> String {
    format!("/master-switches/{id}")
}
