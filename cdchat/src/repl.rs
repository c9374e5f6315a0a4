//! Line-oriented conversation loop over any async reader and writer.
//!
//! ```rust
//! use cdchat::DEFAULT_EXIT_COMMAND;
//!
//! assert_eq!(DEFAULT_EXIT_COMMAND, "exit");
//! ```

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::{ChatError, ChatSession, ChatTurnRequest, ConversationService, compose};

pub const DEFAULT_EXIT_COMMAND: &str = "exit";

const USER_PROMPT: &str = "Citizen: ";
const AGENT_PREFIX: &str = "Agent: ";
const GOODBYE: &str = "Goodbye. Stay safe and keep your documents private.";

#[derive(Clone)]
pub struct ConversationLoop {
    service: ConversationService,
    session: ChatSession,
    exit_command: String,
}

impl ConversationLoop {
    pub fn new(service: ConversationService, session: ChatSession) -> Self {
        Self {
            service,
            session,
            exit_command: DEFAULT_EXIT_COMMAND.to_string(),
        }
    }

    pub fn with_exit_command(mut self, exit_command: impl Into<String>) -> Self {
        self.exit_command = exit_command.into();
        self
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    fn is_exit(&self, line: &str) -> bool {
        line.trim().eq_ignore_ascii_case(self.exit_command.trim())
    }

    /// Runs until the exit command or end of input and returns the number of
    /// turns handled. Only I/O failures end the loop early; input that is not
    /// UTF-8 gets the turn-error reply like any other failed turn.
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> Result<usize, ChatError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let banner = format!(
            "Loaded {} tools successfully.\n(Type '{}' to quit)\n",
            self.service.definitions().len(),
            self.exit_command
        );
        writer.write_all(banner.as_bytes()).await?;

        let mut turns = 0;
        let mut line = Vec::new();
        loop {
            writer.write_all(USER_PROMPT.as_bytes()).await?;
            writer.flush().await?;

            line.clear();
            if reader.read_until(b'\n', &mut line).await? == 0 {
                break;
            }

            let reply = match std::str::from_utf8(&line) {
                Ok(text) => {
                    let utterance = text.trim();
                    if utterance.is_empty() {
                        continue;
                    }
                    if self.is_exit(utterance) {
                        break;
                    }

                    let request = ChatTurnRequest::new(self.session.clone(), utterance);
                    match self.service.run_turn(request).await {
                        Ok(result) => result.reply,
                        Err(_) => compose::TURN_ERROR_REPLY.to_string(),
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        phase = "turn",
                        event = "undecodable_input",
                        session_id = %self.session.id,
                        error = %err
                    );
                    compose::TURN_ERROR_REPLY.to_string()
                }
            };
            turns += 1;

            writer
                .write_all(format!("{AGENT_PREFIX}{reply}\n\n").as_bytes())
                .await?;
        }

        writer.write_all(format!("\n{GOODBYE}\n").as_bytes()).await?;
        writer.flush().await?;
        Ok(turns)
    }
}
