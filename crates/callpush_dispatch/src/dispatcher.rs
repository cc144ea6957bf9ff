//! Top-level dispatch of one call event.
//!
//! Steps run strictly in order: validate, route, authenticate, send. Any
//! failure ends the invocation; it is written to the event log and returned to
//! the caller. Nothing is retried.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use callpush_apns::ApnsVoipDispatcher;
use callpush_common::error::{config_error, CallpushError};
use callpush_common::event_log::EventLog;
use callpush_common::http::client::client_from_config;
use callpush_common::logging::{log_error, redact_token};
use callpush_common::models::{DeliveryPath, NotificationOutcome};
use callpush_common::store::BlobStore;
use callpush_config::AppConfig;
use callpush_firebase::{AccessTokenProvider, CredentialStore, FcmDispatcher};

use crate::request::NotificationRequest;
use crate::router::NotificationRouter;

/// A failed invocation, with the path it had been routed to if routing ran.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct DispatchFailure {
    pub path: Option<DeliveryPath>,
    #[source]
    pub error: CallpushError,
}

impl DispatchFailure {
    pub fn outcome(&self) -> NotificationOutcome {
        NotificationOutcome::failed(self.path, self.error.to_string())
    }
}

pub struct PushDispatcher {
    router: NotificationRouter,
    tokens: AccessTokenProvider,
    fcm: FcmDispatcher,
    apns: Option<ApnsVoipDispatcher>,
    event_log: EventLog,
}

impl PushDispatcher {
    pub fn new(
        router: NotificationRouter,
        tokens: AccessTokenProvider,
        fcm: FcmDispatcher,
        apns: Option<ApnsVoipDispatcher>,
        event_log: EventLog,
    ) -> Self {
        Self {
            router,
            tokens,
            fcm,
            apns,
            event_log,
        }
    }

    /// Wires every component from configuration over `store`.
    ///
    /// APNs delivery is only set up when `use_apns` is on and an `[apns]`
    /// section exists.
    pub fn from_config(config: &AppConfig, store: Arc<dyn BlobStore>) -> Result<Self, CallpushError> {
        let client = client_from_config(&config.http)?;

        let credentials = CredentialStore::from_config(store.clone(), &config.storage);
        let tokens = AccessTokenProvider::from_config(credentials, client.clone(), &config.firebase);
        let fcm = FcmDispatcher::from_config(client, &config.firebase);
        let apns = config
            .active_apns()
            .map(|apns| ApnsVoipDispatcher::new(apns, &config.http))
            .transpose()?;
        let event_log = EventLog::from_config(store, &config.storage)?;

        info!(
            "Push dispatcher ready (fcm mode: {:?}, apns: {})",
            config.firebase.mode,
            apns.is_some()
        );

        Ok(Self::new(
            NotificationRouter::new(config.firebase.mode),
            tokens,
            fcm,
            apns,
            event_log,
        ))
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Runs one invocation over the raw inbound fields.
    pub async fn dispatch(
        &self,
        fields: HashMap<String, String>,
    ) -> Result<NotificationOutcome, DispatchFailure> {
        let request = NotificationRequest::from_fields(fields);
        let result = match request {
            Ok(request) => {
                let path = self.router.select_path(&request);
                self.deliver(&request, path)
                    .await
                    .map_err(|error| DispatchFailure {
                        path: Some(path),
                        error,
                    })
                    .map(|outcome| (request, outcome))
            }
            Err(error) => Err(DispatchFailure { path: None, error }),
        };

        match result {
            Ok((request, outcome)) => {
                self.event_log
                    .append(&format!(
                        "Push notification sent to device token: {} with data: {}",
                        request.token,
                        request.fields_json()
                    ))
                    .await;
                Ok(outcome)
            }
            Err(failure) => {
                log_error(&failure.error, "Push dispatch failed");
                self.event_log
                    .append(&format!("Error: {}", failure.error))
                    .await;
                Err(failure)
            }
        }
    }

    /// [`dispatch`](Self::dispatch) with the failure folded into the outcome.
    pub async fn handle(&self, fields: HashMap<String, String>) -> NotificationOutcome {
        match self.dispatch(fields).await {
            Ok(outcome) => outcome,
            Err(failure) => failure.outcome(),
        }
    }

    async fn deliver(
        &self,
        request: &NotificationRequest,
        path: DeliveryPath,
    ) -> Result<NotificationOutcome, CallpushError> {
        let data = self.router.call_data(request, path).to_value();
        info!(
            "Dispatching {} push to {}",
            path,
            redact_token(&request.token)
        );

        match path {
            DeliveryPath::ApnsVoip => {
                let apns = self
                    .apns
                    .as_ref()
                    .ok_or_else(|| config_error("APNs delivery is not configured"))?;
                apns.send(&request.token, &data).await
            }
            DeliveryPath::FcmData | DeliveryPath::FcmAlert => {
                let creds = self.tokens.credentials().load_service_account().await?;
                let access_token = self.tokens.get_access_token(&creds).await?;
                let variant = self.router.fcm_variant(request, path);

                let outcome = self
                    .fcm
                    .send(
                        &access_token,
                        &request.token,
                        creds.project_id(),
                        &data,
                        &variant,
                    )
                    .await?;

                if let Some(name) = &outcome.message_id {
                    self.event_log
                        .append(&format!(
                            "Notification sent successfully. Response ID: {name}"
                        ))
                        .await;
                }
                Ok(outcome)
            }
        }
    }
}
