//! TriggerMessage by name, validated before anything is sent

use crate::application::commands::{v16, CommandError, SharedCommandSender, TriggerType};

pub async fn trigger_message(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    requested_message: &str,
    connector_id: Option<u32>,
) -> Result<String, CommandError> {
    let trigger: TriggerType = requested_message.parse().map_err(CommandError::Validation)?;
    v16::trigger_message(commands, charge_point_id, trigger, connector_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::tests::RecordingSender;
    use crate::application::commands::CommandSender;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn invalid_name_sends_nothing() {
        let rec = Arc::new(RecordingSender::default());
        let cs = Arc::new(CommandSender::new(rec.clone(), Duration::from_secs(5)));
        let err = trigger_message(&cs, "CP1", "StartTransaction", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Validation(_)));
        assert!(rec.sent.lock().unwrap().is_empty());
        assert_eq!(cs.pending_count(), 0);
    }
}
