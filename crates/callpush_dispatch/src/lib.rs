//! Call push dispatch for callpush
//!
//! Takes an inbound call event (a flat map of string fields), picks a
//! delivery path and sends one notification:
//!
//! - iOS VoIP calls (`type=voip`, `platform=ios`) go directly to APNs
//! - everything else goes through FCM, as a silent data message or, in alert
//!   mode, with a visible notification
//!
//! # API Endpoints
//!
//! - `GET|POST /push` - dispatch one call event
//! - `GET /health` - liveness

pub mod dispatcher;
#[cfg(feature = "openapi")]
pub mod doc;
pub mod handlers;
pub mod request;
pub mod router;
pub mod routes;


pub use dispatcher::{DispatchFailure, PushDispatcher};
pub use request::NotificationRequest;
pub use router::{CallData, NotificationRouter};
pub use routes::routes;

#[cfg(feature = "openapi")]
pub mod openapi {
    pub use crate::doc::PushApiDoc;
}
