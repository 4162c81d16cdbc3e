//! Terminal implementations of the screen collaborators.

use async_trait::async_trait;
use shared::protocol::{Toast, ToastKind};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use view_core::{Confirmer, Navigator, Notifier};

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn toast(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Success => println!("[ok] {}", toast.message),
            ToastKind::Error => eprintln!("[error] {}", toast.message),
        }
    }
}

/// There is no router in a terminal; navigation is logged.
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str) {
        info!("screenctl: navigate path={path}");
    }
}

pub struct StdinConfirmer {
    pub assume_yes: bool,
}

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        println!("{message} [y/N]");
        let mut line = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        match stdin.read_line(&mut line).await {
            Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(err) => {
                warn!("screenctl: could not read confirmation error={err}");
                false
            }
        }
    }
}
