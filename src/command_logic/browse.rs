use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, warn};

use crate::config::Config;
use crate::external_api::tags_api::models::tags_response::TagsResponse;
use crate::external_api::tags_api::TagsApi;
use crate::external_api::ApiError;
use crate::view::query_cache::{FetchTicket, QueryKey};
use crate::view::route_state::RouteStore;
use crate::view::tag_list::{Action, TagListView};

type FetchOutcome = (FetchTicket, Result<TagsResponse, ApiError>);

/// Interactive tag list.
///
/// Reads actions line by line from `input` and writes a new frame to `output`
/// after every change. Fetches run in the background, so input is handled
/// while a page is loading. When `input` ends, pending work is finished first.
pub async fn browse<R, W>(
    route: RouteStore,
    tags_api: Arc<TagsApi>,
    config: &Config,
    input: R,
    mut output: W,
) -> Result<(), ApiError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut view = TagListView::new(route, config.debounce_delay(), config.stale_time());
    let mut debounced = view.subscribe_debounced();
    let (sender, mut receiver) = mpsc::unbounded_channel::<FetchOutcome>();
    let mut lines = input.lines();
    let mut input_open = true;

    let mut synced_key = dispatch(&mut view, &tags_api, &sender);
    draw(&view, &mut output)?;

    loop {
        if !input_open && !view.is_busy() && view.query_key() == synced_key {
            break;
        }
        tokio::select! {
            line = lines.next_line(), if input_open => match line? {
                Some(line) => {
                    if !view.handle(Action::parse(&line)) {
                        debug!("Quit requested");
                        break;
                    }
                    synced_key = dispatch(&mut view, &tags_api, &sender);
                    draw(&view, &mut output)?;
                }
                None => {
                    debug!("Input closed, finishing pending work");
                    input_open = false;
                }
            },
            Ok(()) = debounced.changed() => {
                if view.query_key() != synced_key {
                    synced_key = dispatch(&mut view, &tags_api, &sender);
                    draw(&view, &mut output)?;
                }
            },
            Some((ticket, result)) = receiver.recv() => {
                if let Err(error) = &result {
                    warn!(key = ?ticket.key, %error, "Fetching tags failed");
                }
                let completion = view.complete(ticket, result);
                debug!(?completion, "Fetch finished");
                draw(&view, &mut output)?;
            },
            else => break,
        }
    }
    Ok(())
}

/// Sync the view with its current key and start the fetch it asks for
fn dispatch(
    view: &mut TagListView,
    tags_api: &Arc<TagsApi>,
    sender: &UnboundedSender<FetchOutcome>,
) -> QueryKey {
    if let Some(ticket) = view.sync() {
        let tags_api = Arc::clone(tags_api);
        let sender = sender.clone();
        tokio::spawn(async move {
            let result = tags_api.fetch_page(&ticket.key).await;
            let _ = sender.send((ticket, result));
        });
    }
    view.query_key()
}

fn draw<W: Write>(view: &TagListView, output: &mut W) -> Result<(), ApiError> {
    writeln!(output, "\n{}", view.render())?;
    output.flush()?;
    Ok(())
}
