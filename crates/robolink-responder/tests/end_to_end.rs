// ============================================
// File: crates/robolink-responder/tests/end_to_end.rs
// ============================================
//! End-to-end tests: a real responder accept loop, the initiator's key
//! directory and initiator sessions over loopback TCP.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::task::JoinHandle;

use robolink_core::crypto::{
    ciphertext_digest, recover_from_nonce_reuse, AesCbcChannel, NoncePolicy, ScalarRange,
    Signature, SigningKey,
};
use robolink_core::protocol::command::{
    MSG_ADMIN_PREFIX, MSG_CONNECTING, MSG_CONNECT_SUCCESS, MSG_NO_VERIFICATION_KEY,
    MSG_SIGNATURE_FAILED,
};
use robolink_core::protocol::{
    Action, CommandEnvelope, CommandPayload, ResponsePayload, Status, WireInt,
};
use robolink_initiator::{key_gate, Console, Dispatcher, InitiatorSession, KeyDirectory};
use robolink_responder::{CommandHandler, Responder, ResponderConfig, StaticFlag};
use robolink_transport::{bind_listener, FrameLimits, TcpTransport};

const FLAG: &str = "FLAG{nonce_reuse_is_fatal}";

struct Harness {
    responder: Arc<Responder>,
    server: JoinHandle<robolink_responder::Result<()>>,
    addr: String,
    signer: Arc<SigningKey>,
}

impl Harness {
    /// Starts a key directory publishing a fresh key and a responder that
    /// fetches from it.
    fn start(policy: NoncePolicy) -> Self {
        let signer = Arc::new(SigningKey::generate(policy));
        let (publisher, gate) = key_gate();
        publisher.publish(Arc::clone(&signer));

        let directory_listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let directory_addr = directory_listener.local_addr().unwrap();
        tokio::spawn(KeyDirectory::new(gate, 0, FrameLimits::default()).serve(directory_listener));

        let mut config = ResponderConfig::default();
        config.directory.addr = directory_addr.to_string();
        Self::with_config(config, signer)
    }

    /// Starts a responder whose directory address refuses connections.
    fn without_directory() -> Self {
        let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = ResponderConfig::default();
        config.directory.addr = closed.local_addr().unwrap().to_string();
        config.directory.retries = 0;
        config.directory.connect_timeout_ms = 200;
        drop(closed);

        let signer = Arc::new(SigningKey::generate(NoncePolicy::PerSignature));
        Self::with_config(config, signer)
    }

    fn with_config(config: ResponderConfig, signer: Arc<SigningKey>) -> Self {
        let handler = Arc::new(CommandHandler::new(Arc::new(StaticFlag::new(FLAG))));
        let responder = Arc::new(Responder::with_handler(config, handler));

        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let server = {
            let responder = Arc::clone(&responder);
            tokio::spawn(async move { responder.serve(listener).await })
        };

        Self {
            responder,
            server,
            addr,
            signer,
        }
    }

    async fn connect(&self) -> InitiatorSession<TcpTransport> {
        InitiatorSession::connect(
            &self.addr,
            Duration::from_secs(2),
            FrameLimits::default(),
            Arc::clone(&self.signer),
            ScalarRange::default(),
        )
        .await
        .unwrap()
    }

    async fn stop(self) {
        self.responder.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(5), self.server)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}

/// Encrypts `action` under the session key and signs it with `key`.
fn forge(
    session: &InitiatorSession<TcpTransport>,
    key: &SigningKey,
    action: Action,
) -> CommandEnvelope {
    CommandEnvelope::seal(
        &AesCbcChannel,
        session.session_key(),
        key,
        &CommandPayload::new(action),
    )
    .unwrap()
}

async fn exchange(
    session: &mut InitiatorSession<TcpTransport>,
    envelope: &CommandEnvelope,
) -> ResponsePayload {
    let reply = session.send_envelope(envelope).await.unwrap();
    session.open(&reply).unwrap()
}

fn echoed_signature(response: &ResponsePayload) -> (num_bigint::BigUint, Signature) {
    let cipher = hex::decode(response.cipher.as_deref().unwrap()).unwrap();
    let r: WireInt = response.sig_r.as_deref().unwrap().parse().unwrap();
    let s: WireInt = response.sig_s.as_deref().unwrap().parse().unwrap();
    (ciphertext_digest(&cipher), Signature::new(r.0, s.0))
}

#[tokio::test]
async fn test_connect_check_and_public_key() {
    let harness = Harness::start(NoncePolicy::PerSignature);
    let mut session = harness.connect().await;

    let resp = session.command(Action::Connect).await.unwrap();
    assert_eq!(resp, ResponsePayload::ok(MSG_CONNECT_SUCCESS));

    let resp = session.command(Action::Check).await.unwrap();
    assert_eq!(resp, ResponsePayload::ok(MSG_CONNECTING));

    let resp = session.command(Action::GetPublicKey).await.unwrap();
    assert!(resp.is_ok());
    assert_eq!(
        resp.x.as_ref().map(WireInt::as_biguint),
        session.responder_point().x()
    );

    let resp = session
        .command(Action::Unknown("launch".into()))
        .await
        .unwrap();
    assert_eq!(resp.status, Status::Error);

    session.close().await.unwrap();
    harness.stop().await;
}

#[tokio::test]
async fn test_tampered_signature_rejected_and_session_continues() {
    let harness = Harness::start(NoncePolicy::PerSignature);
    let mut session = harness.connect().await;

    let mut envelope = session.seal(Action::Build1).unwrap();
    envelope.sig_r = WireInt(envelope.sig_r.0 + 1u32);
    let resp = exchange(&mut session, &envelope).await;
    assert_eq!(resp, ResponsePayload::error(MSG_SIGNATURE_FAILED));
    assert!(resp.cipher.is_none());

    let resp = session.command(Action::Check).await.unwrap();
    assert_eq!(resp, ResponsePayload::ok(MSG_CONNECTING));

    session.close().await.unwrap();
    harness.stop().await;
}

#[tokio::test]
async fn test_build_echo_uses_response_iv() {
    let harness = Harness::start(NoncePolicy::PerSignature);
    let mut session = harness.connect().await;

    let envelope = session.seal(Action::Build2).unwrap();
    let reply = session.send_envelope(&envelope).await.unwrap();
    let resp = session.open(&reply).unwrap();

    assert_eq!(resp.msg, "build line 2 success");
    assert_eq!(resp.cipher.as_deref(), Some(envelope.cipher.as_str()));
    assert_eq!(resp.iv.as_deref(), Some(reply.iv.as_str()));
    assert_eq!(resp.sig_r, Some(envelope.sig_r.to_hex_string()));

    session.close().await.unwrap();
    harness.stop().await;
}

#[tokio::test]
async fn test_nonce_reuse_recovers_key_and_forges_admin_login() {
    let harness = Harness::start(NoncePolicy::PerSigner);
    let mut session = harness.connect().await;

    let first = session.command(Action::Build1).await.unwrap();
    let second = session.command(Action::Build2).await.unwrap();
    let (e1, sig1) = echoed_signature(&first);
    let (e2, sig2) = echoed_signature(&second);
    assert_eq!(sig1.r, sig2.r);

    let recovered = recover_from_nonce_reuse((&e1, &sig1), (&e2, &sig2)).unwrap();
    let forged_key = recovered.signing_key(NoncePolicy::PerSignature).unwrap();
    assert_eq!(forged_key.verifying_key(), harness.signer.verifying_key());

    // Replaying the recovered nonce reproduces the observed r.
    let digest = ciphertext_digest(b"any ciphertext");
    let replayed = forged_key.sign_with_nonce(&digest, &recovered.nonce).unwrap();
    assert_eq!(replayed.r, sig1.r);

    let envelope = forge(&session, &forged_key, Action::AdminLogin);
    let resp = exchange(&mut session, &envelope).await;
    assert!(resp.is_ok());
    assert_eq!(resp.msg, format!("{MSG_ADMIN_PREFIX} {FLAG}"));

    session.close().await.unwrap();
    harness.stop().await;
}

#[tokio::test]
async fn test_admin_login_with_wrong_key_never_returns_secret() {
    let harness = Harness::start(NoncePolicy::PerSignature);
    let mut session = harness.connect().await;

    let impostor = SigningKey::generate(NoncePolicy::PerSignature);
    let envelope = forge(&session, &impostor, Action::AdminLogin);
    let resp = exchange(&mut session, &envelope).await;
    assert_eq!(resp, ResponsePayload::error(MSG_SIGNATURE_FAILED));
    assert!(!resp.msg.contains(FLAG));

    let mut envelope = session.seal(Action::AdminLogin).unwrap();
    envelope.sig_s = WireInt(envelope.sig_s.0 + 1u32);
    let resp = exchange(&mut session, &envelope).await;
    assert_eq!(resp.status, Status::Error);
    assert!(!resp.msg.contains(FLAG));

    session.close().await.unwrap();
    harness.stop().await;
}

#[tokio::test]
async fn test_unreachable_directory_rejects_every_command() {
    let harness = Harness::without_directory();
    let mut session = harness.connect().await;

    for action in [Action::Connect, Action::Check, Action::AdminLogin] {
        let resp = session.command(action).await.unwrap();
        assert_eq!(resp, ResponsePayload::error(MSG_NO_VERIFICATION_KEY));
    }

    session.close().await.unwrap();
    harness.stop().await;
}

#[tokio::test]
async fn test_sessions_are_served_one_after_another() {
    let harness = Harness::start(NoncePolicy::PerSignature);

    for _ in 0..2 {
        let mut session = harness.connect().await;
        let resp = session.command(Action::Connect).await.unwrap();
        assert!(resp.is_ok());
        session.close().await.unwrap();
    }

    harness.stop().await;
}

#[tokio::test]
async fn test_console_drives_real_responder() {
    let harness = Harness::start(NoncePolicy::PerSignature);
    let mut dispatcher = Dispatcher::new(harness.connect().await);

    let script = "3\n1\n2\n4\nbuild 1\n4\nfly\nx\n";
    let mut console = Console::new(BufReader::new(script.as_bytes()), Vec::new());
    console.run(&mut dispatcher).await.unwrap();
    let out = String::from_utf8(console.into_output()).unwrap();

    assert!(out.contains("It must be connected to a robot!"));
    assert!(out.contains(r#"[Bob response] : {"status":"ok","msg":"Connect Success"}"#));
    assert!(out.contains(r#"{"status":"ok","msg":"Connecting"}"#));
    assert!(out.contains("build line 1 success"));
    assert!(out.contains(r#""status":"error""#));
    assert!(dispatcher.is_connected());

    dispatcher.session_mut().close().await.unwrap();
    harness.stop().await;
}
