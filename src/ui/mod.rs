//! Terminal front end for interactive chat sessions.
//!
//! - [`chat_loop`]: the REPL that dispatches input to [`crate::commands`]
//!   and prints stream updates from [`crate::core::chat_stream`].
//! - [`render`]: plain-text formatting shared with the one-shot commands.

pub mod chat_loop;
pub mod render;
