//! Direct APNs VoIP delivery for callpush.
//!
//! Used for iOS VoIP calls instead of FCM so that the push wakes the app
//! through PushKit. Requires token-based APNs credentials (key id, team id and
//! the .p8 signing key) and the app's VoIP topic.

pub mod client;


pub use client::ApnsVoipDispatcher;
