use serde::Serialize;

use crate::services::notifier::{DeliveryOutcome, Notifier, OutgoingMessage};

/// Per-batch delivery tally reported back to the initiating operator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub delivered: u32,
    pub unreachable: u32,
    pub failed: u32,
}

impl DeliveryReport {
    pub fn record(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered => self.delivered += 1,
            DeliveryOutcome::Unreachable => self.unreachable += 1,
            DeliveryOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.delivered + self.unreachable + self.failed
    }
}

/// Send one message to many recipients and tally the outcomes. A failure
/// for one recipient never prevents attempts to the rest; bulk sends are
/// best-effort and not retried.
pub async fn broadcast<I>(
    notifier: &dyn Notifier,
    recipients: I,
    message: &OutgoingMessage,
) -> DeliveryReport
where
    I: IntoIterator<Item = i64>,
{
    let mut report = DeliveryReport::default();

    for chat_id in recipients {
        let outcome = notifier.notify(chat_id, message).await;
        report.record(outcome);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifier::testing::FakeNotifier;

    #[tokio::test]
    async fn broadcast_tallies_mixed_outcomes() {
        let notifier = FakeNotifier::new();
        notifier.push_outcome(DeliveryOutcome::Delivered);
        notifier.push_outcome(DeliveryOutcome::Unreachable);
        notifier.push_outcome(DeliveryOutcome::Failed);
        notifier.push_outcome(DeliveryOutcome::Delivered);

        let message = OutgoingMessage::plain("Анонс".to_string());
        let report = broadcast(&notifier, [1, 2, 3, 4], &message).await;

        assert_eq!(
            report,
            DeliveryReport {
                delivered: 2,
                unreachable: 1,
                failed: 1,
            }
        );
        assert_eq!(report.total(), 4);
        // One recipient failing never stops the rest from being attempted.
        assert_eq!(notifier.sent_count(), 4);
    }

    #[tokio::test]
    async fn broadcast_with_no_recipients_is_empty() {
        let notifier = FakeNotifier::new();
        let message = OutgoingMessage::plain("Пусто".to_string());
        let report = broadcast(&notifier, Vec::<i64>::new(), &message).await;
        assert_eq!(report.total(), 0);
    }
}
