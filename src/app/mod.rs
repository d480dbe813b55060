// ABOUTME: Main application structure and state management for the TUI

pub mod actions;
pub mod events;
pub mod forms;
pub mod notification;
pub mod poller;
pub mod pr_flow;
pub mod push;
pub mod state;

pub use actions::App;
pub use events::{AppEvent, EventHandler};
pub use notification::{Notification, NotificationType, Notifications};
pub use poller::{PollTask, Poller};
pub use pr_flow::{PrFlow, PrStage};
pub use state::{AppState, AsyncAction, Focus, Modal, Panel};
