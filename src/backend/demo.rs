// Demo backend: canned answers streamed word by word
//
// Lets the TUI be exercised without an API key or a local model. Replies
// alternate between a complete HTML document (so the preview action has
// something to open) and a markdown tour.
//
// Run with: chatmark --backend demo

use super::{Backend, BackendError, TokenStream};
use crate::chat::{Message, Role};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio::time::sleep;

const HTML_ANSWER: &str = r#"Here's a self-contained page with a counter button:

```html
<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Counter</title>
  <style>
    body { font-family: system-ui, sans-serif; display: grid; place-items: center; height: 100vh; margin: 0; }
    button { font-size: 1.5rem; padding: 0.75rem 1.5rem; border-radius: 0.5rem; border: none; background: #4f46e5; color: white; cursor: pointer; }
  </style>
</head>
<body>
  <button id="counter">Clicked 0 times</button>
  <script>
    let clicks = 0;
    const button = document.getElementById("counter");
    button.addEventListener("click", () => {
      clicks += 1;
      button.textContent = `Clicked ${clicks} times`;
    });
  </script>
</body>
</html>
```

Press `p` on the code block to open it in a sandboxed preview, or `c` to copy it.
"#;

const MARKDOWN_ANSWER: &str = r#"## Quick tour

This answer is **streamed** one word at a time, so you can watch the renderer
cope with *half-finished* markdown.

1. Ordered lists keep their numbering
2. Inline `code` stays inline
3. Links render with their target: [CommonMark](https://commonmark.org)

> Block quotes are indented and dimmed.

| Backend | Transport |
|---------|-----------|
| openai  | SSE       |
| ollama  | NDJSON    |

```rust
fn main() {
    let greeting = "hello";
    println!("{greeting}, world");
}
```

---

Send another message to get an HTML page you can preview.
"#;

/// Default jitter bounds between words, in milliseconds
const MIN_DELAY_MS: u64 = 20;
const MAX_DELAY_MS: u64 = 60;

pub struct DemoBackend {
    min_delay: Duration,
    max_delay: Duration,
}

impl DemoBackend {
    pub fn new() -> Self {
        Self {
            min_delay: Duration::from_millis(MIN_DELAY_MS),
            max_delay: Duration::from_millis(MAX_DELAY_MS),
        }
    }

    /// Fixed pacing, mostly for tests
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            min_delay: delay,
            max_delay: delay,
        }
    }

    /// Alternate answers by turn: the first reply is a page, the next a tour.
    /// The outgoing user turn carries the preamble, so keyword sniffing on it
    /// would always see "HTML".
    fn pick_answer(messages: &[Message]) -> &'static str {
        let user_turns = messages.iter().filter(|m| m.role == Role::User).count();
        if user_turns % 2 == 1 {
            HTML_ANSWER
        } else {
            MARKDOWN_ANSWER
        }
    }
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for DemoBackend {
    fn name(&self) -> &str {
        "demo"
    }

    fn model(&self) -> &str {
        "canned"
    }

    fn stream(&self, messages: Vec<Message>) -> TokenStream {
        let answer = Self::pick_answer(&messages);
        let min = self.min_delay;
        let max = self.max_delay;

        stream::iter(split_words(answer))
            .then(move |word| async move {
                let delay = jitter(min, max);
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                Ok::<_, BackendError>(word)
            })
            .boxed()
    }
}

/// Split text into word-sized fragments that concatenate back to the input
fn split_words(text: &str) -> Vec<String> {
    text.split_inclusive(char::is_whitespace)
        .map(str::to_string)
        .collect()
}

/// Random delay in `[min, max]`
fn jitter(min: Duration, max: Duration) -> Duration {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    if max <= min {
        return min;
    }
    let span = (max - min).as_millis() as u64;
    let random = RandomState::new().build_hasher().finish();
    min + Duration::from_millis(random % (span + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words_is_lossless() {
        for answer in [HTML_ANSWER, MARKDOWN_ANSWER] {
            assert_eq!(split_words(answer).concat(), answer);
        }
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let min = Duration::from_millis(20);
        let max = Duration::from_millis(60);
        for _ in 0..100 {
            let d = jitter(min, max);
            assert!(d >= min && d <= max);
        }
    }

    #[test]
    fn test_answers_alternate_by_turn() {
        let mut messages = vec![Message::user("Build me a landing page")];
        assert_eq!(DemoBackend::pick_answer(&messages), HTML_ANSWER);

        messages.push(Message::assistant(HTML_ANSWER));
        messages.push(Message::user("Now explain it"));
        assert_eq!(DemoBackend::pick_answer(&messages), MARKDOWN_ANSWER);
    }

    #[tokio::test]
    async fn test_stream_reassembles_answer() {
        let backend = DemoBackend::with_delay(Duration::ZERO);
        let fragments: Vec<String> = backend
            .stream(vec![
                Message::user("hello"),
                Message::assistant("hi"),
                Message::user("again"),
            ])
            .map(|item| item.unwrap())
            .collect()
            .await;

        assert!(fragments.len() > 10);
        assert_eq!(fragments.concat(), MARKDOWN_ANSWER);
    }
}
