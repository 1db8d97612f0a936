use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

use libu2fshim::ops::u2f::{RegisterCall, SignCall};
use libu2fshim::proto::{InboundEnvelope, OutboundEnvelope, OutboundName};
use libu2fshim::proto::{RegisterRequest, RegisteredKey, RegisterResult, SignResult};
use libu2fshim::transport::{MemoryChannel, MessageEvent};
use libu2fshim::{Namespace, ShimConfig, U2fApi, U2F};

const ORIGIN: &str = "https://foo.example.org";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Plays the host extension: answers every envelope the page posts.
async fn fake_host(api: Arc<U2fApi<MemoryChannel>>, events: mpsc::Sender<MessageEvent>) {
    loop {
        for posted in api.channel().take_posted() {
            let Ok(request) = OutboundEnvelope::decode(&posted.data) else {
                continue;
            };
            info!(name = ?request.name, app_id = %request.message.app_id, "Host received request");
            let reply = match request.name {
                OutboundName::Register => InboundEnvelope::success(&RegisterResult {
                    registration_data: String::from("BQQtEmhWVgvbh-8GpjsHbj_d5FB9iNoRL8mNEq34"),
                    client_data: String::from("eyJ0eXAiOiJuYXZpZ2F0b3IuaWQuZmluaXNoRW5yb2xsbWVudCJ9"),
                }),
                OutboundName::Sign => InboundEnvelope::success(&SignResult {
                    key_handle: request.message.key_handle.unwrap_or_default(),
                    signature_data: String::from("AQAAAAEwRQIgK_A2Ba6drLHG"),
                    client_data: String::from("eyJ0eXAiOiJuYXZpZ2F0b3IuaWQuZ2V0QXNzZXJ0aW9uIn0"),
                }),
            };
            let event = api.channel().event(&reply.unwrap().encode().unwrap());
            if events.send(event).await.is_err() {
                return;
            }
        }
        sleep(POLL_INTERVAL).await;
    }
}

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    let api = Arc::new(U2fApi::new(
        MemoryChannel::new(ORIGIN),
        ShimConfig::new(env!("CARGO_PKG_VERSION"), "example"),
    ));
    let mut namespace = Namespace::new();
    namespace.install(Arc::clone(&api));

    let (sender, receiver) = mpsc::channel(8);
    let listener = {
        let api = Arc::clone(&api);
        tokio::spawn(async move { api.listen(receiver).await })
    };
    let host = tokio::spawn(fake_host(Arc::clone(&api), sender));

    // Registration ceremony
    let call = RegisterCall::new(vec![RegisterRequest::new_u2f_v2(ORIGIN, "1vQ9mxionq0ngCnjD-wTsv1z")]);
    let response = api.u2f_register(call).await?;
    info!("Response: {:?}", response);

    // Signature ceremony
    let key = RegisteredKey::new_u2f_v2("602CFD267868E84D4852BD5B008BC6CE");
    let call = SignCall::with_app_id(ORIGIN, "1vQ9mxionq0ngCnjD-wTsv1z", vec![key]);
    let response = api.u2f_sign(call).await?;
    info!("Response: {:?}", response);

    host.abort();
    if listener.await.is_err() {
        warn!("Listener task failed");
    }
    return Ok(());
}
