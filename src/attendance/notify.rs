use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::broadcast;
use utoipa::ToSchema;

pub const DUPLICATE_MESSAGE: &str = "Este número de empleado ya ha sido registrado.";
pub const CHECKIN_FAILED_MESSAGE: &str = "No se pudo registrar la asistencia.";
pub const CLEAR_FAILED_MESSAGE: &str = "No se pudieron eliminar los registros.";

/// What the operator should be told after a workflow finishes.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Recorded {
        numero_empleado: String,
        nombre: String,
    },
    DuplicateWarning {
        numero_empleado: String,
        message: String,
    },
    Failure {
        message: String,
    },
    Cleared {
        deleted: usize,
    },
}

impl Notification {
    pub fn duplicate(numero_empleado: &str) -> Self {
        Self::DuplicateWarning {
            numero_empleado: numero_empleado.to_string(),
            message: DUPLICATE_MESSAGE.to_string(),
        }
    }

    pub fn failure(message: &str) -> Self {
        Self::Failure {
            message: message.to_string(),
        }
    }
}

/// Fan-out of notifications, remembering the latest for late pollers.
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
    latest: Mutex<Option<Notification>>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            latest: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn notify(&self, notification: Notification) {
        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(notification.clone());
        }
        // no subscribers is fine
        let _ = self.sender.send(notification);
    }

    pub fn latest(&self) -> Option<Notification> {
        self.latest.lock().ok().and_then(|l| l.clone())
    }
}
