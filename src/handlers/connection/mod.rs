//! Connection and registration handlers.
//!
//! Handles PASS, NICK, USER, PING, PONG, QUIT commands.

mod nick;
mod pass;
mod ping;
mod user;
mod welcome;

pub use nick::NickHandler;
pub use pass::PassHandler;
pub use ping::{PingHandler, PongHandler, QuitHandler};
pub use user::UserHandler;
pub use welcome::{send_motd, send_welcome_burst};
