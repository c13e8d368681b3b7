use crossterm::event::{Event, KeyEventKind};
use himmle_common::{Activity, ChatStore};
use tokio::{sync::mpsc, time::Duration};

mod app;
mod chat_list;
mod error;
mod keymap;
mod profile;
mod thread;

pub use app::{Action, App, Keymaps};
pub use error::Error;
pub use keymap::{parse_key_sequence, KeyCode, KeyEvent, Keymap};

#[derive(Clone, Debug)]
pub struct Config {
    /// How long a partial key sequence waits for its next key.
    pub key_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_timeout: Duration::from_millis(1000),
        }
    }
}

enum Input {
    Terminal(Option<std::io::Result<Event>>),
    Activity(Option<Activity>),
    KeyTimeout,
}

pub async fn run(
    store: ChatStore,
    activity: mpsc::UnboundedReceiver<Activity>,
    config: Config,
) -> Result<(), Error> {
    // build the keymaps before taking over the terminal so errors print normally
    let app = App::new(store, Keymaps::new(config.key_timeout)?);
    let terminal = ratatui::init();
    let res = run_inner(terminal, app, activity).await;
    ratatui::restore();
    res
}

async fn run_inner(
    mut term: ratatui::DefaultTerminal,
    mut app: App,
    activity: mpsc::UnboundedReceiver<Activity>,
) -> Result<(), Error> {
    use futures::{future::Either, stream::StreamExt};

    let mut activity = Some(activity);
    let mut term_events = crossterm::event::EventStream::new();
    while !app.should_quit() {
        term.draw(|frame| frame.render_widget(&mut app, frame.area()))?;

        let input = {
            let next_activity = async {
                match activity.as_mut() {
                    Some(rx) => rx.recv().await,
                    None => futures::future::pending().await,
                }
            };
            let next_activity = std::pin::pin!(next_activity);
            let next = async {
                match futures::future::select(term_events.next(), next_activity).await {
                    Either::Left((event, _)) => Input::Terminal(event),
                    Either::Right((activity, _)) => Input::Activity(activity),
                }
            };
            match app.key_deadline() {
                Some(deadline) => tokio::time::timeout_at(deadline, next)
                    .await
                    .unwrap_or(Input::KeyTimeout),
                None => next.await,
            }
        };

        match input {
            Input::Terminal(Some(Ok(Event::Key(key)))) if key.kind == KeyEventKind::Press => {
                app.handle_key(key.into())
            }
            Input::Terminal(Some(Ok(event))) => tracing::trace!("{event:?}"),
            Input::Terminal(Some(Err(err))) => tracing::warn!("{err}"),
            Input::Terminal(None) => {
                tracing::info!("term events stream stopped, shutting down");
                break;
            }
            Input::Activity(Some(activity)) => app.apply_activity(activity),
            Input::Activity(None) => {
                tracing::info!("activity stream stopped");
                activity = None;
            }
            Input::KeyTimeout => app.flush_pending_keys(),
        }
    }
    Ok(())
}
