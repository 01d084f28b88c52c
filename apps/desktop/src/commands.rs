//! Stdin commands of the live board and how they reach the controller.

use std::sync::Arc;

use client_core::SyncController;
use tracing::debug;

#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Say(String),
    Rename(String),
    Refresh,
    Retry,
    Quit,
    Empty,
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    match line {
        "" => Input::Empty,
        "/quit" | "/exit" => Input::Quit,
        "/refresh" => Input::Refresh,
        "/retry" => Input::Retry,
        _ => match line.strip_prefix("/name") {
            Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
                Input::Rename(rest.trim().to_string())
            }
            _ => Input::Say(line.to_string()),
        },
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Applies one input line. Requests run on their own tasks, so the caller
/// goes straight back to draining events and stdin.
pub fn dispatch(controller: &Arc<SyncController>, name: &mut String, input: Input) -> Flow {
    match input {
        Input::Say(text) => spawn_submit(controller, name.clone(), text),
        Input::Retry => {
            let draft = controller.draft();
            if draft.text.trim().is_empty() {
                eprintln!("nothing to retry");
            } else {
                spawn_submit(controller, draft.name, draft.text);
            }
        }
        Input::Rename(new_name) => {
            *name = new_name;
            controller.set_draft(name, &controller.draft().text);
            eprintln!("name set to '{name}'");
        }
        Input::Refresh => {
            let controller = Arc::clone(controller);
            tokio::spawn(async move {
                controller.refresh().await;
            });
        }
        Input::Quit => return Flow::Quit,
        Input::Empty => {}
    }
    Flow::Continue
}

fn spawn_submit(controller: &Arc<SyncController>, name: String, text: String) {
    if controller.busy().submitting {
        eprintln!("still sending the previous message");
        return;
    }
    let controller = Arc::clone(controller);
    tokio::spawn(async move {
        let outcome = controller.submit(&name, &text).await;
        debug!(?outcome, "submit finished");
    });
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Mutex,
        time::{Duration, Instant},
    };

    use client_core::SyncConfig;
    use tokio::{io::AsyncReadExt, net::TcpListener};
    use url::Url;

    use super::*;

    /// Accepts connections and records request bytes but never answers.
    async fn spawn_silent_board() -> (Url, Arc<Mutex<Vec<u8>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    loop {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(read) => sink.lock().expect("sink").extend_from_slice(&buf[..read]),
                        }
                    }
                    // Keep the socket open so the request stays pending.
                    std::future::pending::<()>().await;
                });
            }
        });
        let endpoint = Url::parse(&format!("http://{addr}/projeto/api/v1/chat")).expect("url");
        (endpoint, received)
    }

    async fn wait_until(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "condition not reached");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    fn request_text(received: &Mutex<Vec<u8>>) -> String {
        String::from_utf8_lossy(&received.lock().expect("sink")).into_owned()
    }

    #[test]
    fn parses_commands_and_plain_text() {
        assert_eq!(parse_input("  "), Input::Empty);
        assert_eq!(parse_input("/quit"), Input::Quit);
        assert_eq!(parse_input("/refresh"), Input::Refresh);
        assert_eq!(parse_input(" /retry "), Input::Retry);
        assert_eq!(parse_input("/name  Ana "), Input::Rename("Ana".into()));
        assert_eq!(parse_input("/names"), Input::Say("/names".into()));
        assert_eq!(parse_input(" Oi gente "), Input::Say("Oi gente".into()));
    }

    #[tokio::test]
    async fn hung_submit_does_not_hold_up_further_input() {
        let (endpoint, received) = spawn_silent_board().await;
        let controller = SyncController::connect(SyncConfig::new(endpoint)).expect("controller");
        let mut name = "Ana".to_string();

        let started = Instant::now();
        assert_eq!(
            dispatch(&controller, &mut name, Input::Say("Oi".into())),
            Flow::Continue
        );
        assert!(started.elapsed() < Duration::from_secs(1));
        wait_until(|| controller.busy().submitting && request_text(&received).contains("Oi")).await;

        assert_eq!(
            dispatch(&controller, &mut name, Input::Refresh),
            Flow::Continue
        );
        wait_until(|| controller.busy().refreshing).await;
        assert_eq!(
            dispatch(&controller, &mut name, Input::Rename("Bia".into())),
            Flow::Continue
        );
        assert_eq!(name, "Bia");
        assert_eq!(dispatch(&controller, &mut name, Input::Quit), Flow::Quit);
        assert!(controller.busy().submitting);
    }

    #[tokio::test]
    async fn retry_resubmits_the_kept_draft() {
        let (endpoint, received) = spawn_silent_board().await;
        let controller = SyncController::connect(SyncConfig::new(endpoint)).expect("controller");
        let mut name = "Ana".to_string();

        assert_eq!(dispatch(&controller, &mut name, Input::Retry), Flow::Continue);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!controller.busy().submitting);
        assert!(request_text(&received).is_empty());

        controller.set_draft("Ana", "Oi de novo");
        assert_eq!(dispatch(&controller, &mut name, Input::Retry), Flow::Continue);
        wait_until(|| {
            controller.busy().submitting && request_text(&received).contains("Oi de novo")
        })
        .await;
        assert!(request_text(&received).starts_with("POST "));
    }
}
