//! OSC channel manager
//!
//! Two channels, each with its own listener:
//! - Eye: `/command/...` addresses go to the config command channel, every
//!   other address to the eye engine
//! - Face: every address goes to the expression router
//!
//! A supervisor task watches configuration snapshots. Each new snapshot is
//! pushed to the eye engine and triggers a full listener restart: teardown,
//! a short grace delay for the OS to release the ports, then start.

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use paper_config::{is_command_address, parse_command_address, ConfigManager};
use paper_core::{PaperError, PaperResult, UnifiedConfig};
use paper_tracking::{EyeTrackingEngine, ExpressionRouter};
use paper_transport::{ListenerRegistry, OscHandler};
use paper_wire::OscMessage;

/// Pause between teardown and start on a config-driven restart
pub const RESTART_GRACE: Duration = Duration::from_millis(100);

/// Overall state of the manager's listeners
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OscState {
    Idle,
    Connected,
    /// A listener failed to start; cleared by the next restart
    Error,
}

impl fmt::Display for OscState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OscState::Idle => write!(f, "IDLE"),
            OscState::Connected => write!(f, "CONNECTED"),
            OscState::Error => write!(f, "ERROR"),
        }
    }
}

/// Shared eye engine
pub type SharedEyeEngine = Arc<Mutex<EyeTrackingEngine>>;

/// Shared expression router
pub type SharedExpressionRouter = Arc<Mutex<ExpressionRouter>>;

/// Owns the eye and face listeners
pub struct OscManager {
    config: Arc<ConfigManager>,
    eye: Option<SharedEyeEngine>,
    face: Option<SharedExpressionRouter>,
    registry: tokio::sync::Mutex<ListenerRegistry>,
    state: RwLock<OscState>,
    eye_addr: RwLock<Option<SocketAddr>>,
    face_addr: RwLock<Option<SocketAddr>>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl OscManager {
    pub fn new(
        config: Arc<ConfigManager>,
        eye: Option<SharedEyeEngine>,
        face: Option<SharedExpressionRouter>,
    ) -> Self {
        OscManager {
            config,
            eye,
            face,
            registry: tokio::sync::Mutex::new(ListenerRegistry::new()),
            state: RwLock::new(OscState::Idle),
            eye_addr: RwLock::new(None),
            face_addr: RwLock::new(None),
            supervisor: Mutex::new(None),
        }
    }

    pub fn state(&self) -> OscState {
        *self.state.read()
    }

    /// Bound address of the eye listener
    pub fn eye_addr(&self) -> Option<SocketAddr> {
        *self.eye_addr.read()
    }

    /// Bound address of the face listener
    pub fn face_addr(&self) -> Option<SocketAddr> {
        *self.face_addr.read()
    }

    /// Start listeners for every enabled channel of the current snapshot
    pub async fn start(&self) {
        let config = self.config.config();
        let mut registry = self.registry.lock().await;
        let mut failed = false;

        if config.enable_eye_tracking {
            if let Some(engine) = &self.eye {
                let handler = eye_handler(engine.clone(), Arc::downgrade(&self.config));
                let addr = config.eye_tracking.socket_addr();
                match registry.start(addr, config.osc_framing, handler) {
                    Ok(bound) => *self.eye_addr.write() = Some(bound),
                    Err(e) => {
                        tracing::error!("Eye channel failed to start on {}: {}", addr, e);
                        failed = true;
                    }
                }
            }
        }

        if config.enable_face_tracking {
            if let Some(router) = &self.face {
                let handler = face_handler(router.clone());
                let started = config
                    .face_tracking
                    .socket_addr()
                    .and_then(|addr| registry.start(addr, config.osc_framing, handler));
                match started {
                    Ok(bound) => *self.face_addr.write() = Some(bound),
                    Err(e) => {
                        tracing::error!("Face channel failed to start: {}", e);
                        failed = true;
                    }
                }
            }
        }

        let state = if failed {
            OscState::Error
        } else {
            OscState::Connected
        };
        *self.state.write() = state;
        tracing::info!("OSC manager {}", state);
    }

    /// Stop every listener with a bounded wait
    pub async fn tear_down(&self) {
        self.registry.lock().await.tear_down().await;
        *self.eye_addr.write() = None;
        *self.face_addr.write() = None;
        *self.state.write() = OscState::Idle;
    }

    /// Teardown, grace delay, start
    pub async fn restart(&self) {
        self.tear_down().await;
        tokio::time::sleep(RESTART_GRACE).await;
        self.start().await;
    }

    /// Spawn the task that restarts listeners on every config change.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_supervisor(self: &Arc<Self>) -> PaperResult<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PaperError::TransportError(e.to_string()))?;

        let manager = Arc::downgrade(self);
        let mut changes = self.config.subscribe();

        let handle = runtime.spawn(async move {
            while changes.changed().await.is_ok() {
                let snapshot = changes.borrow_and_update().clone();
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.on_config_changed(&snapshot).await;
            }
        });

        if let Some(previous) = self.supervisor.lock().replace(handle) {
            previous.abort();
        }
        Ok(())
    }

    async fn on_config_changed(&self, config: &UnifiedConfig) {
        tracing::info!("Config changed, restarting OSC listeners");
        if let Some(engine) = &self.eye {
            engine.lock().update_config(&config.eye_tracking);
        }
        self.restart().await;
    }

    /// Stop the supervisor and every listener
    pub async fn shutdown(&self) {
        if let Some(supervisor) = self.supervisor.lock().take() {
            supervisor.abort();
        }
        self.tear_down().await;
    }
}

impl fmt::Debug for OscManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OscManager")
            .field("state", &self.state())
            .field("eye_addr", &self.eye_addr())
            .field("face_addr", &self.face_addr())
            .finish()
    }
}

fn eye_handler(engine: SharedEyeEngine, config: Weak<ConfigManager>) -> Arc<dyn OscHandler> {
    Arc::new(move |message: OscMessage| {
        if is_command_address(&message.address) {
            handle_command(&config, &message);
        } else {
            engine.lock().process_message(&message);
        }
    })
}

fn face_handler(router: SharedExpressionRouter) -> Arc<dyn OscHandler> {
    Arc::new(move |message: OscMessage| {
        router.lock().process_message(&message);
    })
}

fn handle_command(config: &Weak<ConfigManager>, message: &OscMessage) {
    let Some(field) = parse_command_address(&message.address) else {
        tracing::debug!("Ignoring command {}", message.address);
        return;
    };
    let Some(config) = config.upgrade() else {
        return;
    };
    if let Err(e) = config.apply_command(field, &message.value) {
        tracing::debug!("Ignoring command {} = {}: {}", message.address, message.value, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paper_config::MemoryStore;
    use paper_core::{OscFraming, UnifiedExpression};
    use paper_wire::{encode, encode_float, OscValue};
    use std::net::{Ipv4Addr, UdpSocket};
    use std::time::Instant;

    fn ephemeral_config() -> UnifiedConfig {
        let mut config = UnifiedConfig::default();
        config.eye_tracking.listening_address = Ipv4Addr::LOCALHOST.into();
        config.eye_tracking.port_number = 0;
        config.face_tracking.face_port = 0;
        config
    }

    fn manager_with(config: UnifiedConfig) -> (Arc<OscManager>, SharedEyeEngine, SharedExpressionRouter) {
        let config_manager = Arc::new(ConfigManager::new(Box::new(MemoryStore::new())));
        config_manager.update_config(config);
        let eye = Arc::new(Mutex::new(EyeTrackingEngine::new(
            &config_manager.config().eye_tracking,
        )));
        let face = Arc::new(Mutex::new(ExpressionRouter::new()));
        let manager = Arc::new(OscManager::new(config_manager, Some(eye.clone()), Some(face.clone())));
        (manager, eye, face)
    }

    fn send(to: SocketAddr, bytes: &[u8]) {
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.send_to(bytes, to).unwrap();
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(3);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }

    #[tokio::test]
    async fn test_routes_eye_and_face() {
        let (manager, eye, face) = manager_with(ephemeral_config());
        manager.start().await;
        assert_eq!(manager.state(), OscState::Connected);

        let eye_addr = manager.eye_addr().unwrap();
        let face_addr = manager.face_addr().unwrap();
        assert_ne!(eye_addr.port(), face_addr.port());

        send(eye_addr, &encode_float("/v2/EyeLidRight", 0.2, OscFraming::Unpadded).unwrap());
        send(face_addr, &encode_float("/mouthFunnel", 0.2, OscFraming::Unpadded).unwrap());

        assert!(wait_until(|| eye.lock().v2().parameters().eye_lid_right == 0.2).await);
        assert!(
            wait_until(|| (face.lock().table().weight(UnifiedExpression::LipFunnel) - 0.8).abs() < 1e-6)
                .await
        );

        manager.tear_down().await;
        assert_eq!(manager.state(), OscState::Idle);
        assert!(manager.eye_addr().is_none());
    }

    #[tokio::test]
    async fn test_face_channel_ignores_commands() {
        let (manager, _, face) = manager_with(ephemeral_config());
        manager.start().await;

        let cmd = encode_float("/command/set/gui_OutputMultiplier", 0.5, OscFraming::Unpadded).unwrap();
        send(manager.face_addr().unwrap(), &cmd);
        send(
            manager.face_addr().unwrap(),
            &encode_float("/jawOpen", 0.4, OscFraming::Unpadded).unwrap(),
        );

        assert!(wait_until(|| face.lock().table().weight(UnifiedExpression::JawOpen) == 0.4).await);
        assert_eq!(manager.config.config().eye_tracking.output_multiplier(), 1.0);

        manager.tear_down().await;
    }

    #[tokio::test]
    async fn test_disabled_channel_not_started() {
        let mut config = ephemeral_config();
        config.enable_face_tracking = false;
        let (manager, _, _) = manager_with(config);
        manager.start().await;

        assert!(manager.eye_addr().is_some());
        assert!(manager.face_addr().is_none());
        manager.tear_down().await;
    }

    #[tokio::test]
    async fn test_bind_failure_sets_error() {
        let mut config = ephemeral_config();
        config.face_tracking.face_host = "not-an-ip".into();
        let (manager, _, _) = manager_with(config);
        manager.start().await;

        assert_eq!(manager.state(), OscState::Error);
        // The eye channel is unaffected
        assert!(manager.eye_addr().is_some());
        manager.tear_down().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_command_updates_config_and_engine() {
        let (manager, eye, _) = manager_with(ephemeral_config());
        manager.start().await;
        manager.spawn_supervisor().unwrap();

        let eye_addr = manager.eye_addr().unwrap();
        let msg = OscMessage::new("/command/set/gui_ShouldEmulateEyeWiden/", OscValue::Bool(true));
        send(eye_addr, &encode(&msg, OscFraming::Unpadded).unwrap());

        assert!(wait_until(|| manager.config.config().eye_tracking.should_emulate_eye_widen).await);

        // The supervisor pushes the snapshot to the engine; a fully open lid
        // is then widened past 1.0
        let widened = || {
            let mut engine = eye.lock().clone();
            engine.process_message(&OscMessage::new("/v2/EyeLid", OscValue::Float(1.0)));
            let mut out = paper_core::UnifiedTrackingData::new();
            engine.update(&mut out);
            out.eye.left.openness > 1.0
        };
        assert!(wait_until(widened).await);

        manager.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_restart_moves_to_new_port() {
        let (manager, _, _) = manager_with(ephemeral_config());
        manager.start().await;
        manager.spawn_supervisor().unwrap();
        let old = manager.eye_addr().unwrap();

        let new_port = {
            let probe = UdpSocket::bind("127.0.0.1:0").unwrap();
            probe.local_addr().unwrap().port()
        };

        let cmd = OscMessage::new("/command/set/gui_VRCFTModulePort", OscValue::Integer(new_port as i32));
        send(old, &encode(&cmd, OscFraming::Unpadded).unwrap());

        assert!(wait_until(|| manager.eye_addr().map(|a| a.port()) == Some(new_port)).await);

        // Old socket is fully closed
        UdpSocket::bind(old).unwrap();

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_commands_ignored() {
        let config_manager = Arc::new(ConfigManager::new(Box::new(MemoryStore::new())));
        let before = config_manager.config();

        let weak = Arc::downgrade(&config_manager);
        handle_command(&weak, &OscMessage::new("/command/set/gui_Unknown", OscValue::Float(1.0)));
        handle_command(&weak, &OscMessage::new("/command/get/gui_OutputMultiplier", OscValue::Float(1.0)));
        handle_command(&weak, &OscMessage::new("/command", OscValue::Float(1.0)));

        assert!(Arc::ptr_eq(&before, &config_manager.config()));
    }
}
