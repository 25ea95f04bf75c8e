pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod models;
pub mod session;
pub mod transport;
pub mod view;

pub use config::Settings;
pub use dispatcher::{DispatchState, Dispatcher, Outcome};
pub use errors::{ConfigError, DispatchError};
pub use models::AgentResult;
pub use session::Session;
pub use view::{ContentKinds, MapView, ResultCard, ResultView};
