//! Line-oriented terminal prompt over any async reader/writer.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tokio::sync::Mutex;

use crate::error::{DialogError, ValidationError};

struct PromptIo<R, W> {
    lines: Lines<R>,
    out: W,
}

/// Question/answer primitive used by the terminal dialogs.
pub struct Prompt<R, W> {
    io: Mutex<PromptIo<R, W>>,
}

impl<R, W> Prompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new(PromptIo {
                lines: reader.lines(),
                out: writer,
            }),
        }
    }

    /// Print a block of text followed by a blank line.
    pub async fn say(&self, text: &str) -> Result<(), DialogError> {
        let mut io = self.io.lock().await;
        io.out.write_all(text.as_bytes()).await?;
        io.out.write_all(b"\n\n").await?;
        io.out.flush().await?;
        Ok(())
    }

    /// Ask a question and return the trimmed answer.
    pub async fn ask(&self, question: &str) -> Result<String, DialogError> {
        let mut io = self.io.lock().await;
        io.out.write_all(question.as_bytes()).await?;
        io.out.write_all(b"\n> ").await?;
        io.out.flush().await?;
        match io.lines.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(DialogError::InputClosed),
        }
    }

    /// Ask until `parse` accepts the answer.
    pub async fn ask_until<T, F>(&self, question: &str, parse: F) -> Result<T, DialogError>
    where
        F: Fn(&str) -> Result<T, ValidationError> + Send + Sync,
    {
        loop {
            let answer = self.ask(question).await?;
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(e) => self.say(&format!("⚠️  {e}")).await?,
            }
        }
    }

    /// Offer a numbered list and return the chosen option's value.
    pub async fn choose<T: Clone>(
        &self,
        question: &str,
        options: &[(String, T)],
    ) -> Result<T, DialogError> {
        let mut text = question.to_string();
        for (i, (label, _)) in options.iter().enumerate() {
            text.push_str(&format!("\n  {}) {}", i + 1, label));
        }
        loop {
            let answer = self.ask(&text).await?;
            let picked = answer
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| options.get(i))
                .or_else(|| {
                    options
                        .iter()
                        .find(|(label, _)| label.eq_ignore_ascii_case(&answer))
                });
            match picked {
                Some((_, value)) => return Ok(value.clone()),
                None => {
                    self.say(&format!("⚠️  Pick a number between 1 and {}", options.len()))
                        .await?
                }
            }
        }
    }

    /// Yes/no question.
    pub async fn confirm(&self, question: &str) -> Result<bool, DialogError> {
        loop {
            let answer = self.ask(&format!("{question} (yes/no)")).await?;
            match answer.to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.say("⚠️  Answer yes or no").await?,
            }
        }
    }
}
