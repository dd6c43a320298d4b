//! DiagnosticsStatusNotification handler

use rust_ocpp::v1_6::messages::diagnostics_status_notification::{
    DiagnosticsStatusNotificationRequest, DiagnosticsStatusNotificationResponse,
};
use serde_json::Value;
use tracing::info;

use crate::application::handlers::{parse_request, respond, wire_name, Dispatcher, HandlerResult};

pub async fn handle_diagnostics_status_notification(
    ctx: &Dispatcher,
    charge_point_id: &str,
    payload: &Value,
) -> HandlerResult {
    let req: DiagnosticsStatusNotificationRequest =
        parse_request("DiagnosticsStatusNotification", payload)?;

    info!(charge_point_id, status = ?req.status, "DiagnosticsStatusNotification");

    let status = wire_name(&req.status).unwrap_or_default();
    ctx.services
        .firmware
        .record_diagnostics_status(charge_point_id, &status)
        .await?;

    respond(&DiagnosticsStatusNotificationResponse {})
}

#[cfg(test)]
mod tests {
    use crate::application::handlers::tests::{boot, call, fixture};
    use crate::domain::firmware::{Diagnostics, DiagnosticsStatus};
    use crate::domain::RepositoryProvider;
    use crate::shared::OcppFrame;
    use serde_json::json;

    #[tokio::test]
    async fn updates_latest_record_or_does_nothing() {
        let f = fixture();
        boot(&f, "CP1").await;

        // No record yet: answered, nothing stored.
        let reply = f
            .dispatcher
            .handle_inbound(
                "CP1",
                call("d1", "DiagnosticsStatusNotification", json!({"status": "Uploading"})),
            )
            .await;
        assert!(matches!(reply, Some(OcppFrame::CallResult { .. })));
        assert!(f.repos.diagnostics().latest_for_charge_point("CP1").await.unwrap().is_none());

        f.repos
            .diagnostics()
            .create(Diagnostics::new("CP1", "ftp://logs", None, None, None, None))
            .await
            .unwrap();
        f.dispatcher
            .handle_inbound(
                "CP1",
                call("d2", "DiagnosticsStatusNotification", json!({"status": "Uploaded"})),
            )
            .await;
        let latest = f.repos.diagnostics().latest_for_charge_point("CP1").await.unwrap().unwrap();
        assert_eq!(latest.status, DiagnosticsStatus::Uploaded);
    }
}
