use colored::Colorize;

use super::message::Notification;
use super::{Channel, NotificationSink};
use crate::error::Result;

#[derive(Default)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSink for StdoutSink {
    fn deliver(&self, notification: &Notification) -> Result<()> {
        let to = notification
            .recipient
            .as_deref()
            .map(|r| format!(" -> {r}"))
            .unwrap_or_default();

        println!(
            "{} {} {}{}",
            notification.timestamp.dimmed(),
            "NOTICE".cyan().bold(),
            notification.subject.bold(),
            to.dimmed(),
        );
        for line in notification.body.lines() {
            println!("  {line}");
        }
        Ok(())
    }

    fn channel(&self) -> Channel {
        Channel::Stdout
    }
}
